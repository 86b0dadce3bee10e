//! SeaORM adapter for battle scores.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::rules::MAX_HEALTH;
use crate::entities::battle_scores;

pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<battle_scores::Model>, DbErr> {
    battle_scores::Entity::find()
        .filter(battle_scores::Column::SessionUuid.eq(session_uuid))
        .one(conn)
        .await
}

pub async fn create_score<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<battle_scores::Model, DbErr> {
    let now = OffsetDateTime::now_utc();
    battle_scores::ActiveModel {
        id: NotSet,
        session_uuid: Set(session_uuid),
        host_health: Set(MAX_HEALTH),
        guest_health: Set(MAX_HEALTH),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Overwrite both healths. Callers clamp before writing.
pub async fn set_health<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
    host_health: i32,
    guest_health: i32,
) -> Result<battle_scores::Model, DbErr> {
    let result = battle_scores::Entity::update_many()
        .col_expr(battle_scores::Column::HostHealth, Expr::value(host_health))
        .col_expr(battle_scores::Column::GuestHealth, Expr::value(guest_health))
        .col_expr(
            battle_scores::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(battle_scores::Column::SessionUuid.eq(session_uuid))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!(
            "Score for session {session_uuid} not found"
        )));
    }

    find_by_session(conn, session_uuid)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Score for session {session_uuid} not found")))
}
