use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "battle_scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub session_uuid: Uuid,
    pub host_health: i32,
    pub guest_health: i32,
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
