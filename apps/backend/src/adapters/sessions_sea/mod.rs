//! SeaORM adapter for battle sessions - generic over ConnectionTrait.
//!
//! Every update goes through [`update_session`], which bumps `version` and
//! filters on the caller's expected version.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet,
    Order, QueryFilter, QueryOrder, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::battle_sessions;
use crate::infra::db_errors::optimistic_lock_err;

pub mod dto;

pub use dto::{SessionCreate, SessionSettings, SessionUpdate};

pub async fn find_by_uuid<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<battle_sessions::Model>, DbErr> {
    battle_sessions::Entity::find()
        .filter(battle_sessions::Column::SessionUuid.eq(session_uuid))
        .one(conn)
        .await
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<Option<battle_sessions::Model>, DbErr> {
    battle_sessions::Entity::find_by_id(id).one(conn).await
}

/// The active session for a lobby, if any.
pub async fn find_active_by_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
) -> Result<Option<battle_sessions::Model>, DbErr> {
    battle_sessions::Entity::find()
        .filter(battle_sessions::Column::LobbyCode.eq(lobby_code))
        .filter(battle_sessions::Column::IsActive.eq(true))
        .one(conn)
        .await
}

/// Every session ever created for a lobby, newest first.
pub async fn find_all_by_lobby<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lobby_code: &str,
) -> Result<Vec<battle_sessions::Model>, DbErr> {
    battle_sessions::Entity::find()
        .filter(battle_sessions::Column::LobbyCode.eq(lobby_code))
        .order_by(battle_sessions::Column::CreatedAt, Order::Desc)
        .order_by(battle_sessions::Column::Id, Order::Desc)
        .all(conn)
        .await
}

pub async fn create_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: SessionCreate,
) -> Result<battle_sessions::Model, DbErr> {
    let now = OffsetDateTime::now_utc();
    battle_sessions::ActiveModel {
        id: NotSet,
        session_uuid: Set(dto.session_uuid),
        lobby_code: Set(dto.lobby_code),
        host_id: Set(dto.host_id),
        guest_id: Set(dto.guest_id),
        current_turn: Set(None),
        is_active: Set(true),
        host_in_battle: Set(false),
        guest_in_battle: Set(false),
        battle_started: Set(false),
        active_card_effects: Set(serde_json::Value::Array(vec![])),
        difficulty_mode: Set(dto.settings.difficulty_mode),
        study_material_id: Set(dto.settings.study_material_id),
        question_types: Set(serde_json::Value::from(dto.settings.question_types)),
        version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Apply `dto` if the row is still at `expected_version`, then refetch.
///
/// Zero rows affected means either the session is gone (`RecordNotFound`)
/// or another writer got there first (optimistic-lock sentinel).
pub async fn update_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: SessionUpdate,
) -> Result<battle_sessions::Model, DbErr> {
    let now = OffsetDateTime::now_utc();
    let mut update = battle_sessions::Entity::update_many()
        .col_expr(battle_sessions::Column::UpdatedAt, Expr::value(now))
        .col_expr(
            battle_sessions::Column::Version,
            Expr::col(battle_sessions::Column::Version).add(1),
        );

    if let Some((host_id, guest_id)) = dto.participants {
        update = update
            .col_expr(battle_sessions::Column::HostId, Expr::value(host_id))
            .col_expr(battle_sessions::Column::GuestId, Expr::value(guest_id));
    }
    if let Some(settings) = dto.settings {
        update = update
            .col_expr(
                battle_sessions::Column::DifficultyMode,
                Expr::value(settings.difficulty_mode.map(|d| d.to_value())),
            )
            .col_expr(
                battle_sessions::Column::StudyMaterialId,
                Expr::value(settings.study_material_id),
            )
            .col_expr(
                battle_sessions::Column::QuestionTypes,
                Expr::value(serde_json::Value::from(settings.question_types)),
            );
    }
    if let Some(v) = dto.host_in_battle {
        update = update.col_expr(battle_sessions::Column::HostInBattle, Expr::value(v));
    }
    if let Some(v) = dto.guest_in_battle {
        update = update.col_expr(battle_sessions::Column::GuestInBattle, Expr::value(v));
    }
    if let Some(v) = dto.battle_started {
        update = update.col_expr(battle_sessions::Column::BattleStarted, Expr::value(v));
    }
    if let Some(turn) = dto.current_turn {
        update = update.col_expr(battle_sessions::Column::CurrentTurn, Expr::value(turn));
    }
    if let Some(v) = dto.is_active {
        update = update.col_expr(battle_sessions::Column::IsActive, Expr::value(v));
    }
    if let Some(effects) = dto.active_card_effects {
        update = update.col_expr(
            battle_sessions::Column::ActiveCardEffects,
            Expr::value(effects),
        );
    }

    let result = update
        .filter(battle_sessions::Column::Id.eq(dto.id))
        .filter(battle_sessions::Column::Version.eq(dto.expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match find_by_id(conn, dto.id).await? {
            Some(current) => Err(optimistic_lock_err(dto.expected_version, current.version)),
            None => Err(DbErr::RecordNotFound(format!(
                "Session {} not found",
                dto.id
            ))),
        };
    }

    find_by_id(conn, dto.id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("Session {} not found", dto.id)))
}
