//! Lobby repository functions (generic over ConnectionTrait).

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::lobbies_sea as lobbies_adapter;
pub use crate::adapters::lobbies_sea::LobbyUpdate;
use crate::domain::lobby::{question_types_from_json, LobbySettings, LobbyStatus, PlayerProfile};
use crate::domain::Role;
use crate::entities::lobbies;
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lobby {
    pub id: i64,
    pub code: String,
    pub host: PlayerProfile,
    pub guest: Option<PlayerProfile>,
    pub host_ready: bool,
    pub guest_ready: bool,
    pub status: LobbyStatus,
    pub settings: LobbySettings,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
}

impl Lobby {
    pub fn role_of(&self, user_id: i64) -> Option<Role> {
        Role::of(user_id, self.host.id, self.guest.as_ref().map(|g| g.id))
    }

    pub fn has_guest(&self) -> bool {
        self.guest.is_some()
    }
}

pub async fn find_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Option<Lobby>, DomainError> {
    let lobby = lobbies_adapter::find_by_code(conn, code).await?;
    Ok(lobby.map(Lobby::from))
}

/// Like [`find_by_code`] but absent is `NotFound`.
pub async fn require_by_code<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: &str,
) -> Result<Lobby, DomainError> {
    find_by_code(conn, code).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Lobby, format!("Lobby {code} not found"))
    })
}

pub async fn create_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    code: String,
    host: PlayerProfile,
    settings: LobbySettings,
) -> Result<Lobby, DomainError> {
    let dto = lobbies_adapter::LobbyCreate {
        code,
        host,
        settings,
    };
    let lobby = lobbies_adapter::create_lobby(conn, dto).await?;
    Ok(Lobby::from(lobby))
}

/// Returns `false` when the seat was taken or the lobby left `waiting`.
pub async fn attach_guest<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_id: i64,
    guest: &PlayerProfile,
) -> Result<bool, DomainError> {
    let rows = lobbies_adapter::attach_guest(conn, lobby_id, guest).await?;
    Ok(rows == 1)
}

pub async fn update_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: LobbyUpdate,
) -> Result<Lobby, DomainError> {
    let lobby = lobbies_adapter::update_lobby(conn, dto).await?;
    Ok(Lobby::from(lobby))
}

impl From<lobbies::Model> for Lobby {
    fn from(model: lobbies::Model) -> Self {
        let guest = model.guest_id.map(|id| PlayerProfile {
            id,
            name: model.guest_name.unwrap_or_default(),
            level: model.guest_level.unwrap_or(1),
            picture: model.guest_picture,
        });
        Self {
            id: model.id,
            code: model.code,
            host: PlayerProfile {
                id: model.host_id,
                name: model.host_name,
                level: model.host_level,
                picture: model.host_picture,
            },
            guest,
            host_ready: model.host_ready,
            guest_ready: model.guest_ready,
            status: model.status,
            settings: LobbySettings {
                question_types: question_types_from_json(&model.question_types),
                study_material_id: model.study_material_id,
                study_material_title: model.study_material_title,
                difficulty: model.difficulty,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
            started_at: model.started_at,
            ended_at: model.ended_at,
        }
    }
}
