use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::lobbies::Difficulty;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "battle_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub session_uuid: Uuid,
    pub lobby_code: String,
    pub host_id: i64,
    pub guest_id: i64,
    /// User id of the participant to move; null before the battle starts.
    pub current_turn: Option<i64>,
    pub is_active: bool,
    pub host_in_battle: bool,
    pub guest_in_battle: bool,
    pub battle_started: bool,
    #[sea_orm(column_type = "Json")]
    pub active_card_effects: Json,
    pub difficulty_mode: Option<Difficulty>,
    pub study_material_id: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub question_types: Json,
    pub version: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::battle_rounds::Entity")]
    BattleRound,
    #[sea_orm(has_one = "super::battle_scores::Entity")]
    BattleScore,
    #[sea_orm(has_one = "super::battle_endings::Entity")]
    BattleEnding,
}

impl Related<super::battle_rounds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BattleRound.def()
    }
}

impl Related<super::battle_scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BattleScore.def()
    }
}

impl Related<super::battle_endings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BattleEnding.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
