//! Invitation repository functions.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::adapters::invitations_sea as invitations_adapter;
pub use crate::adapters::invitations_sea::{InvitationCreate, InvitationMirror};
use crate::domain::invitation::InvitationStatus;
use crate::domain::lobby::{question_types_from_json, Difficulty};
use crate::entities::invitations;
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invitation {
    pub id: i64,
    pub lobby_code: String,
    pub sender_id: i64,
    pub sender_name: String,
    pub sender_picture: Option<String>,
    pub receiver_id: Option<i64>,
    pub receiver_name: Option<String>,
    pub receiver_picture: Option<String>,
    pub status: InvitationStatus,
    pub host_ready: bool,
    pub guest_ready: bool,
    pub battle_started: bool,
    pub question_types: Vec<String>,
    pub study_material_title: Option<String>,
    pub selected_difficulty: Option<Difficulty>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub async fn find_latest<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
) -> Result<Option<Invitation>, DomainError> {
    let row = invitations_adapter::find_latest(conn, lobby_code, sender_id, receiver_id).await?;
    Ok(row.map(Invitation::from))
}

pub async fn find_live_for_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
) -> Result<Option<Invitation>, DomainError> {
    let row = invitations_adapter::find_live_for_lobby(conn, lobby_code).await?;
    Ok(row.map(Invitation::from))
}

pub async fn purge_stale<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
) -> Result<u64, DomainError> {
    Ok(invitations_adapter::purge_stale(conn, lobby_code, sender_id, receiver_id).await?)
}

pub async fn find_blocking<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
) -> Result<Option<Invitation>, DomainError> {
    let row = invitations_adapter::find_blocking(conn, lobby_code, sender_id, receiver_id).await?;
    Ok(row.map(Invitation::from))
}

pub async fn create_invitation<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: InvitationCreate,
) -> Result<Invitation, DomainError> {
    let row = invitations_adapter::create_invitation(conn, dto).await?;
    Ok(Invitation::from(row))
}

/// `true` when a pending row moved to `to`.
pub async fn respond_if_pending<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
    to: InvitationStatus,
) -> Result<bool, DomainError> {
    let rows =
        invitations_adapter::respond_if_pending(conn, lobby_code, sender_id, receiver_id, to)
            .await?;
    Ok(rows > 0)
}

/// `true` when an existing live row for the triple was reused.
pub async fn accept_on_join<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    sender_id: i64,
    receiver_id: i64,
    host_ready: bool,
) -> Result<bool, DomainError> {
    let rows =
        invitations_adapter::accept_on_join(conn, lobby_code, sender_id, receiver_id, host_ready)
            .await?;
    Ok(rows > 0)
}

pub async fn mirror_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
    mirror: InvitationMirror,
) -> Result<u64, DomainError> {
    Ok(invitations_adapter::mirror_lobby(conn, lobby_code, mirror).await?)
}

impl From<invitations::Model> for Invitation {
    fn from(model: invitations::Model) -> Self {
        Self {
            id: model.id,
            lobby_code: model.lobby_code,
            sender_id: model.sender_id,
            sender_name: model.sender_name,
            sender_picture: model.sender_picture,
            receiver_id: model.receiver_id,
            receiver_name: model.receiver_name,
            receiver_picture: model.receiver_picture,
            status: model.status,
            host_ready: model.host_ready,
            guest_ready: model.guest_ready,
            battle_started: model.battle_started,
            question_types: question_types_from_json(&model.question_types),
            study_material_title: model.study_material_title,
            selected_difficulty: model.selected_difficulty,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
