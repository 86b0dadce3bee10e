use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum EndReason {
    #[sea_orm(string_value = "Victory")]
    Victory,
    #[sea_orm(string_value = "Draw")]
    Draw,
    #[sea_orm(string_value = "Left The Game")]
    #[serde(rename = "Left The Game")]
    LeftTheGame,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "battle_endings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub session_uuid: Uuid,
    pub session_id: i64,
    pub lobby_code: String,
    pub winner_id: Option<i64>,
    pub battle_end_reason: EndReason,
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::battle_sessions::Entity",
        from = "Column::SessionUuid",
        to = "super::battle_sessions::Column::SessionUuid"
    )]
    BattleSession,
}

impl Related<super::battle_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BattleSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
