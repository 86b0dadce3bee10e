//! Lobby status rules: code format, ready convergence and allowed transitions.

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};

pub use crate::entities::lobbies::{Difficulty, LobbyStatus};
use crate::errors::domain::{DomainError, InvalidStateKind};

/// Display fields of a participant, supplied by the profile service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: i32,
    #[serde(default)]
    pub picture: Option<String>,
}

fn default_level() -> i32 {
    1
}

/// Match settings chosen by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySettings {
    #[serde(default)]
    pub question_types: Vec<String>,
    #[serde(default)]
    pub study_material_id: Option<String>,
    #[serde(default)]
    pub study_material_title: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl LobbySettings {
    pub fn question_types_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.question_types.clone())
    }
}

/// Decode a stored question-type list; anything that is not a list of
/// strings decodes as empty.
pub fn question_types_from_json(value: &serde_json::Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Canonical form of a lobby code as stored.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Normalize and validate a lobby code (`^[A-Z0-9]{4,12}$` after upper-casing).
///
/// At least one letter is required: an all-digit path segment names a
/// session id.
pub fn validate_code(raw: &str) -> Result<String, DomainError> {
    let code = normalize_code(raw);
    if !regex_is_match!(r"^[A-Z0-9]{4,12}$", &code) {
        return Err(DomainError::validation(format!(
            "lobby code must be 4 to 12 letters or digits, got '{raw}'"
        )));
    }
    if !code.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(DomainError::validation(format!(
            "lobby code must contain a letter, got '{raw}'"
        )));
    }
    Ok(code)
}

/// Status after a ready flag changed. Only `waiting` and `ready` move.
pub fn converge(status: LobbyStatus, host_ready: bool, guest_ready: bool, has_guest: bool) -> LobbyStatus {
    match status {
        LobbyStatus::Waiting if host_ready && guest_ready && has_guest => LobbyStatus::Ready,
        LobbyStatus::Ready if !(host_ready && guest_ready) => LobbyStatus::Waiting,
        other => other,
    }
}

pub fn is_terminal(status: LobbyStatus) -> bool {
    matches!(status, LobbyStatus::Completed | LobbyStatus::Abandoned)
}

/// Whether `from -> to` is an allowed explicit transition. Setting the
/// current status again is allowed so retries stay idempotent.
pub fn can_transition(from: LobbyStatus, to: LobbyStatus) -> bool {
    use LobbyStatus::*;
    if from == to {
        return true;
    }
    match (from, to) {
        (Waiting, Ready) | (Ready, Waiting) => true,
        (Waiting | Ready, InProgress) => true,
        (InProgress, Completed) => true,
        (f, Abandoned) => !is_terminal(f),
        _ => false,
    }
}

pub fn check_transition(from: LobbyStatus, to: LobbyStatus) -> Result<(), DomainError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(DomainError::invalid_state(
            InvalidStateKind::LobbyStatus,
            format!("lobby cannot move from {from:?} to {to:?}"),
        ))
    }
}
