//! SeaORM adapter for the battle-owned columns of `user_profiles`.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use time::OffsetDateTime;

use crate::entities::user_profiles;

pub async fn find_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<user_profiles::Model>, DbErr> {
    user_profiles::Entity::find_by_id(user_id).one(conn).await
}

pub async fn require_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<user_profiles::Model, DbErr> {
    find_by_user(conn, user_id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("User {user_id} not found")))
}

/// Persist ban counters; a missing profile is `RecordNotFound`.
pub async fn set_ban_state<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    early_leaves: i32,
    ban_until: Option<OffsetDateTime>,
) -> Result<(), DbErr> {
    let result = user_profiles::Entity::update_many()
        .col_expr(user_profiles::Column::EarlyLeaves, Expr::value(early_leaves))
        .col_expr(user_profiles::Column::BanUntil, Expr::value(ban_until))
        .col_expr(
            user_profiles::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(user_profiles::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!("User {user_id} not found")));
    }
    Ok(())
}

/// Win-streak bookkeeping touches existing rows only; returns rows changed.
pub async fn increment_win_streak<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<u64, DbErr> {
    let result = user_profiles::Entity::update_many()
        .col_expr(
            user_profiles::Column::WinStreak,
            Expr::col(user_profiles::Column::WinStreak).add(1),
        )
        .col_expr(
            user_profiles::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(user_profiles::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn reset_win_streak<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<u64, DbErr> {
    let result = user_profiles::Entity::update_many()
        .col_expr(user_profiles::Column::WinStreak, Expr::value(0))
        .col_expr(
            user_profiles::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(user_profiles::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
