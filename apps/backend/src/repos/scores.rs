//! Battle score repository functions.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::adapters::scores_sea as scores_adapter;
use crate::domain::Health;
use crate::entities::battle_scores;
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Score {
    pub session_uuid: Uuid,
    pub host_health: i32,
    pub guest_health: i32,
}

impl Score {
    pub fn health(&self) -> Health {
        Health::new(self.host_health, self.guest_health)
    }
}

pub async fn find_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Option<Score>, DomainError> {
    let score = scores_adapter::find_by_session(conn, session_uuid).await?;
    Ok(score.map(Score::from))
}

pub async fn require_by_session<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Score, DomainError> {
    find_by_session(conn, session_uuid).await?.ok_or_else(|| {
        DomainError::not_found(
            NotFoundKind::Score,
            format!("Score for session {session_uuid} not found"),
        )
    })
}

pub async fn create_score<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
) -> Result<Score, DomainError> {
    let score = scores_adapter::create_score(conn, session_uuid).await?;
    Ok(Score::from(score))
}

pub async fn save_health<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    session_uuid: Uuid,
    health: Health,
) -> Result<Score, DomainError> {
    let score =
        scores_adapter::set_health(conn, session_uuid, health.host, health.guest).await?;
    Ok(Score::from(score))
}

impl From<battle_scores::Model> for Score {
    fn from(model: battle_scores::Model) -> Self {
        Self {
            session_uuid: model.session_uuid,
            host_health: model.host_health,
            guest_health: model.guest_health,
        }
    }
}
