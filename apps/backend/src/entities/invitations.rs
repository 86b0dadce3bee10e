use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::lobbies::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "expired")]
    Expired,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invitations")]
pub struct Model {
    #[sea_orm(primary_key)]
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
    #[sea_orm(column_type = "Json")]
    pub question_types: Json,
    pub study_material_title: Option<String>,
    pub selected_difficulty: Option<Difficulty>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
