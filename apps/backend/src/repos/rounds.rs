//! Battle round repository functions.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::adapters::rounds_sea as rounds_adapter;
use crate::domain::{Effect, Role};
use crate::entities::battle_rounds;
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Round {
    pub id: i64,
    pub session_uuid: Uuid,
    pub host_card: Option<String>,
    pub guest_card: Option<String>,
    pub host_answer_correct: Option<bool>,
    pub guest_answer_correct: Option<bool>,
    pub host_card_effect: Option<Effect>,
    pub guest_card_effect: Option<Effect>,
    pub question_count_total: i32,
    pub question_ids_done: Vec<String>,
}

/// One side's play to record.
#[derive(Debug, Clone)]
pub struct RoundPlay {
    pub role: Role,
    pub card: Option<String>,
    pub answer_correct: bool,
    pub card_effect: Option<Effect>,
    pub question_count_total: i32,
    pub question_ids_done: Vec<String>,
}

/// Accepts both string and numeric ids; anything else is dropped.
fn question_ids_from_json(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn effect_from_json(value: Option<serde_json::Value>) -> Option<Effect> {
    value.and_then(|v| serde_json::from_value(v).ok())
}

pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<Round>, DomainError> {
    let round = rounds_adapter::find_by_session(conn, session_uuid).await?;
    Ok(round.map(Round::from))
}

pub async fn require_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Round, DomainError> {
    find_by_session(conn, session_uuid).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Round,
            format!("Round for session {session_uuid} not found"),
        )
    })
}

pub async fn create_round<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Round, DomainError> {
    let round = rounds_adapter::create_round(conn, session_uuid).await?;
    Ok(Round::from(round))
}

pub async fn record_play<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
    play: RoundPlay,
) -> Result<Round, DomainError> {
    let dto = rounds_adapter::RoundPlayUpdate {
        session_uuid,
        role: play.role,
        card: play.card,
        answer_correct: play.answer_correct,
        card_effect: play
            .card_effect
            .as_ref()
            .and_then(|e| serde_json::to_value(e).ok()),
        question_count_total: play.question_count_total,
        question_ids_done: serde_json::Value::from(play.question_ids_done),
    };
    let round = rounds_adapter::record_play(conn, dto).await?;
    Ok(Round::from(round))
}

impl From<battle_rounds::Model> for Round {
    fn from(model: battle_rounds::Model) -> Self {
        Self {
            id: model.id,
            session_uuid: model.session_uuid,
            host_card: model.host_card,
            guest_card: model.guest_card,
            host_answer_correct: model.host_answer_correct,
            guest_answer_correct: model.guest_answer_correct,
            host_card_effect: effect_from_json(model.host_card_effect),
            guest_card_effect: effect_from_json(model.guest_card_effect),
            question_count_total: model.question_count_total,
            question_ids_done: question_ids_from_json(&model.question_ids_done),
        }
    }
}
