//! Battle ending repository functions.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::adapters::endings_sea as endings_adapter;
pub use crate::adapters::endings_sea::EndingCreate;
pub use crate::entities::battle_endings::EndReason;
use crate::entities::battle_endings;
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ending {
    pub id: i64,
    pub session_uuid: Uuid,
    pub session_id: i64,
    pub lobby_code: String,
    pub winner_id: Option<i64>,
    pub battle_end_reason: EndReason,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<Ending>, DomainError> {
    let ending = endings_adapter::find_by_session(conn, session_uuid).await?;
    Ok(ending.map(Ending::from))
}

pub async fn create_ending<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: EndingCreate,
) -> Result<Ending, DomainError> {
    let ending = endings_adapter::create_ending(conn, dto).await?;
    Ok(Ending::from(ending))
}

impl From<battle_endings::Model> for Ending {
    fn from(model: battle_endings::Model) -> Self {
        Self {
            id: model.id,
            session_uuid: model.session_uuid,
            session_id: model.session_id,
            lobby_code: model.lobby_code,
            winner_id: model.winner_id,
            battle_end_reason: model.battle_end_reason,
            created_at: model.created_at,
        }
    }
}
