//! SeaORM adapter for battle rounds.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::Role;
use crate::entities::battle_rounds;

pub mod dto;

pub use dto::RoundPlayUpdate;

pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<battle_rounds::Model>, DbErr> {
    battle_rounds::Entity::find()
        .filter(battle_rounds::Column::SessionUuid.eq(session_uuid))
        .one(conn)
        .await
}

pub async fn create_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<battle_rounds::Model, DbErr> {
    let now = OffsetDateTime::now_utc();
    battle_rounds::ActiveModel {
        id: NotSet,
        session_uuid: Set(session_uuid),
        host_card: Set(None),
        guest_card: Set(None),
        host_answer_correct: Set(None),
        guest_answer_correct: Set(None),
        host_card_effect: Set(None),
        guest_card_effect: Set(None),
        question_count_total: Set(0),
        question_ids_done: Set(serde_json::Value::Array(vec![])),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Record one side's play and the new counters.
pub async fn record_play<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: RoundPlayUpdate,
) -> Result<battle_rounds::Model, DbErr> {
    let (card_col, correct_col, effect_col) = match dto.role {
        Role::Host => (
            battle_rounds::Column::HostCard,
            battle_rounds::Column::HostAnswerCorrect,
            battle_rounds::Column::HostCardEffect,
        ),
        Role::Guest => (
            battle_rounds::Column::GuestCard,
            battle_rounds::Column::GuestAnswerCorrect,
            battle_rounds::Column::GuestCardEffect,
        ),
    };

    let result = battle_rounds::Entity::update_many()
        .col_expr(card_col, Expr::value(dto.card))
        .col_expr(correct_col, Expr::value(Some(dto.answer_correct)))
        .col_expr(effect_col, Expr::value(dto.card_effect))
        .col_expr(
            battle_rounds::Column::QuestionCountTotal,
            Expr::value(dto.question_count_total),
        )
        .col_expr(
            battle_rounds::Column::QuestionIdsDone,
            Expr::value(dto.question_ids_done),
        )
        .col_expr(
            battle_rounds::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(battle_rounds::Column::SessionUuid.eq(dto.session_uuid))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DbErr::RecordNotFound(format!(
            "Round for session {} not found",
            dto.session_uuid
        )));
    }

    find_by_session(conn, dto.session_uuid)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("Round for session {} not found", dto.session_uuid))
        })
}
