//! SeaORM adapter for battle endings. Rows are insert-only.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::battle_endings::{self, EndReason};

#[derive(Debug, Clone)]
pub struct EndingCreate {
    pub session_uuid: Uuid,
    pub session_id: i64,
    pub lobby_code: String,
    pub winner_id: Option<i64>,
    pub reason: EndReason,
}

pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<battle_endings::Model>, DbErr> {
    battle_endings::Entity::find()
        .filter(battle_endings::Column::SessionUuid.eq(session_uuid))
        .one(conn)
        .await
}

pub async fn create_ending<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: EndingCreate,
) -> Result<battle_endings::Model, DbErr> {
    battle_endings::ActiveModel {
        id: NotSet,
        session_uuid: Set(dto.session_uuid),
        session_id: Set(dto.session_id),
        lobby_code: Set(dto.lobby_code),
        winner_id: Set(dto.winner_id),
        battle_end_reason: Set(dto.reason),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(conn)
    .await
}
