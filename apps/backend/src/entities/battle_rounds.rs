use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "battle_rounds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub session_uuid: Uuid,
    pub host_card: Option<String>,
    pub guest_card: Option<String>,
    pub host_answer_correct: Option<bool>,
    pub guest_answer_correct: Option<bool>,
    #[sea_orm(column_type = "Json", nullable)]
    pub host_card_effect: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub guest_card_effect: Option<Json>,
    pub question_count_total: i32,
    #[sea_orm(column_type = "Json")]
    pub question_ids_done: Json,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
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
