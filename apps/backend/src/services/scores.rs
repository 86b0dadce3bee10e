//! Health pools outside of card play.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::endings::MatchSummary;
use super::rounds::{ensure_score, resolve_knockout};
use crate::domain::Role;
use crate::error::AppError;
use crate::errors::domain::{DomainError, InvalidStateKind};
use crate::repos::scores::{self, Score};
use crate::repos::sessions::{self, Session, SessionUpdate};

#[derive(Debug, Clone, Serialize)]
pub struct ScoreUpdate {
    pub score: Score,
    pub session: Session,
    /// Present when the delta knocked a side out.
    pub ending: Option<MatchSummary>,
}

#[derive(Default)]
pub struct ScoreService;

impl ScoreService {
    pub fn new() -> Self {
        Self
    }

    /// Create the 100/100 score row if missing. Idempotent.
    pub async fn init_score(
        &self,
        txn: &DatabaseTransaction,
        session_uuid: Uuid,
    ) -> Result<Score, AppError> {
        sessions::require_by_uuid(txn, session_uuid).await?;
        ensure_score(txn, session_uuid).await
    }

    pub async fn get_score(
        &self,
        txn: &DatabaseTransaction,
        session_uuid: Uuid,
    ) -> Result<Score, AppError> {
        Ok(scores::require_by_session(txn, session_uuid).await?)
    }

    /// Apply `delta` to one side, clamped to the health range.
    ///
    /// The session version is bumped before the score is read, so a play
    /// racing this update fails its version check instead of overwriting
    /// the delta. A knockout ends the match in the same transaction.
    pub async fn update_score(
        &self,
        txn: &DatabaseTransaction,
        session_uuid: Uuid,
        role: Role,
        delta: i32,
    ) -> Result<ScoreUpdate, AppError> {
        let session = sessions::require_by_uuid(txn, session_uuid).await?;
        if !session.is_active {
            return Err(DomainError::invalid_state(
                InvalidStateKind::SessionInactive,
                format!("Session {session_uuid} has ended"),
            )
            .into());
        }
        let session =
            sessions::update_session(txn, SessionUpdate::new(session.id, session.version)).await?;

        let score = ensure_score(txn, session_uuid).await?;
        let mut health = score.health();
        let after = health.apply(role, delta);
        let score = scores::save_health(txn, session_uuid, health).await?;
        debug!(session_uuid = %session_uuid, %role, delta, after, "Score updated");

        let ending = resolve_knockout(txn, &session, health.knocked_out()).await?;
        let session = if ending.is_some() {
            sessions::require_by_uuid(txn, session_uuid).await?
        } else {
            session
        };
        Ok(ScoreUpdate {
            score,
            session,
            ending,
        })
    }
}
