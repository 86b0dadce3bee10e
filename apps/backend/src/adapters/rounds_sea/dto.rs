//! DTOs for the rounds_sea adapter.

use uuid::Uuid;

use crate::domain::Role;

/// One side's play written onto the round row.
#[derive(Debug, Clone)]
pub struct RoundPlayUpdate {
    pub session_uuid: Uuid,
    pub role: Role,
    pub card: Option<String>,
    pub answer_correct: bool,
    pub card_effect: Option<serde_json::Value>,
    pub question_count_total: i32,
    pub question_ids_done: serde_json::Value,
}
