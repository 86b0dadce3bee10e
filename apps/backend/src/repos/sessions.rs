//! Battle session repository functions.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::adapters::sessions_sea as sessions_adapter;
pub use crate::adapters::sessions_sea::{SessionCreate, SessionSettings, SessionUpdate};
use crate::domain::lobby::{question_types_from_json, Difficulty};
use crate::domain::resolver::{pick_for_lobby, Candidate, SessionKey};
use crate::domain::{EffectLedger, Role, Seats};
use crate::entities::battle_sessions;
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: i64,
    pub session_uuid: Uuid,
    pub lobby_code: String,
    pub host_id: i64,
    pub guest_id: i64,
    pub current_turn: Option<i64>,
    pub is_active: bool,
    pub host_in_battle: bool,
    pub guest_in_battle: bool,
    pub battle_started: bool,
    pub active_card_effects: EffectLedger,
    pub difficulty_mode: Option<Difficulty>,
    pub study_material_id: Option<String>,
    pub question_types: Vec<String>,
    pub version: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Session {
    pub fn seats(&self) -> Seats {
        Seats {
            host_id: self.host_id,
            guest_id: self.guest_id,
        }
    }

    pub fn in_battle(&self, role: Role) -> bool {
        match role {
            Role::Host => self.host_in_battle,
            Role::Guest => self.guest_in_battle,
        }
    }

    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            difficulty_mode: self.difficulty_mode,
            study_material_id: self.study_material_id.clone(),
            question_types: self.question_types.clone(),
        }
    }
}

fn not_found(what: impl std::fmt::Display) -> DomainError {
    DomainError::not_found(NotFoundKind::Session, format!("Session {what} not found"))
}

pub async fn find_by_uuid<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<Session>, DomainError> {
    sessions_adapter::find_by_uuid(conn, session_uuid)
        .await?
        .map(Session::try_from)
        .transpose()
}

pub async fn find_active_by_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
) -> Result<Option<Session>, DomainError> {
    sessions_adapter::find_active_by_lobby(conn, lobby_code)
        .await?
        .map(Session::try_from)
        .transpose()
}

/// Resolve a [`SessionKey`]; a lobby key picks the active session, else
/// the most recent one.
pub async fn find_by_key<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: &SessionKey,
) -> Result<Option<Session>, DomainError> {
    let model = match key {
        SessionKey::Uuid(uuid) => sessions_adapter::find_by_uuid(conn, *uuid).await?,
        SessionKey::Id(id) => sessions_adapter::find_by_id(conn, *id).await?,
        SessionKey::Lobby(code) => {
            let rows = sessions_adapter::find_all_by_lobby(conn, code).await?;
            let candidates: Vec<Candidate> = rows
                .iter()
                .map(|m| Candidate {
                    id: m.id,
                    is_active: m.is_active,
                    created_at: m.created_at,
                })
                .collect();
            pick_for_lobby(&candidates)
                .and_then(|picked| rows.into_iter().find(|m| m.id == picked.id))
        }
    };
    model.map(Session::try_from).transpose()
}

pub async fn require_by_key<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    key: &SessionKey,
) -> Result<Session, DomainError> {
    find_by_key(conn, key).await?.ok_or_else(|| match key {
        SessionKey::Uuid(uuid) => not_found(uuid),
        SessionKey::Id(id) => not_found(id),
        SessionKey::Lobby(code) => not_found(format_args!("for lobby {code}")),
    })
}

pub async fn require_by_uuid<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Session, DomainError> {
    require_by_key(conn, &SessionKey::Uuid(session_uuid)).await
}

pub async fn create_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: SessionCreate,
) -> Result<Session, DomainError> {
    let model = sessions_adapter::create_session(conn, dto).await?;
    Session::try_from(model)
}

/// Version-guarded update; a stale `expected_version` is
/// `Conflict(OptimisticLock)`.
pub async fn update_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: SessionUpdate,
) -> Result<Session, DomainError> {
    let model = sessions_adapter::update_session(conn, dto).await?;
    Session::try_from(model)
}

impl TryFrom<battle_sessions::Model> for Session {
    type Error = DomainError;

    fn try_from(model: battle_sessions::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            active_card_effects: EffectLedger::from_json(&model.active_card_effects)?,
            question_types: question_types_from_json(&model.question_types),
            id: model.id,
            session_uuid: model.session_uuid,
            lobby_code: model.lobby_code,
            host_id: model.host_id,
            guest_id: model.guest_id,
            current_turn: model.current_turn,
            is_active: model.is_active,
            host_in_battle: model.host_in_battle,
            guest_in_battle: model.guest_in_battle,
            battle_started: model.battle_started,
            difficulty_mode: model.difficulty_mode,
            study_material_id: model.study_material_id,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
