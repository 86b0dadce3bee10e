use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum LobbyStatus {
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "abandoned")]
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[sea_orm(string_value = "easy")]
    Easy,
    #[sea_orm(string_value = "average")]
    Average,
    #[sea_orm(string_value = "hard")]
    Hard,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lobbies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub host_id: i64,
    pub host_name: String,
    pub host_level: i32,
    pub host_picture: Option<String>,
    pub guest_id: Option<i64>,
    pub guest_name: Option<String>,
    pub guest_level: Option<i32>,
    pub guest_picture: Option<String>,
    pub host_ready: bool,
    pub guest_ready: bool,
    pub status: LobbyStatus,
    #[sea_orm(column_type = "Json")]
    pub question_types: Json,
    pub study_material_id: Option<String>,
    pub study_material_title: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub started_at: Option<OffsetDateTime>,
    pub ended_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
