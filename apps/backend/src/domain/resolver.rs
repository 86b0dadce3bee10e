//! Session lookup precedence.
//!
//! A request may name a session by uuid, by numeric id, or only by lobby
//! code. The first present key wins in that order; a lobby code resolves to
//! the active session if one exists, otherwise the most recent one.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::lobby::normalize_code;
use crate::errors::domain::DomainError;

/// Raw selector as received from a caller; any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSelector {
    pub session_uuid: Option<Uuid>,
    pub session_id: Option<i64>,
    pub lobby_code: Option<String>,
}

/// The single key a selector resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKey {
    Uuid(Uuid),
    Id(i64),
    Lobby(String),
}

impl SessionSelector {
    pub fn by_uuid(uuid: Uuid) -> Self {
        Self {
            session_uuid: Some(uuid),
            ..Self::default()
        }
    }

    pub fn by_lobby(code: impl Into<String>) -> Self {
        Self {
            lobby_code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Pick the key by precedence `uuid > id > lobby_code`.
    pub fn key(&self) -> Result<SessionKey, DomainError> {
        if let Some(uuid) = self.session_uuid {
            return Ok(SessionKey::Uuid(uuid));
        }
        if let Some(id) = self.session_id {
            return Ok(SessionKey::Id(id));
        }
        match self.lobby_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Ok(SessionKey::Lobby(normalize_code(code))),
            _ => Err(DomainError::validation(
                "one of session_uuid, session_id or lobby_code is required",
            )),
        }
    }
}

impl SessionKey {
    /// Interpret a single path segment: a uuid, an all-digit id, or a lobby
    /// code. Lobby codes always carry a letter, so the forms never overlap.
    pub fn parse_path(raw: &str) -> Result<SessionKey, DomainError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::validation("empty session key"));
        }
        if let Ok(uuid) = Uuid::parse_str(raw) {
            return Ok(SessionKey::Uuid(uuid));
        }
        if raw.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = raw.parse::<i64>() {
                return Ok(SessionKey::Id(id));
            }
        }
        Ok(SessionKey::Lobby(normalize_code(raw)))
    }
}

/// Minimal view of a stored session for choosing among a lobby's sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: i64,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

/// Among one lobby's sessions choose the active one, else the most recent.
/// Ties on `created_at` go to the higher id.
pub fn pick_for_lobby(candidates: &[Candidate]) -> Option<Candidate> {
    let newest = |a: &&Candidate, b: &&Candidate| {
        a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
    };
    candidates
        .iter()
        .filter(|c| c.is_active)
        .max_by(newest)
        .or_else(|| candidates.iter().max_by(newest))
        .copied()
}
