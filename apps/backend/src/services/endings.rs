//! Match resolution. A session ends exactly once; later calls return the
//! stored ending.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use tracing::{debug, info};

use super::bans::BanService;
use super::lobbies::LobbyService;
use crate::domain::lobby::{is_terminal, LobbyStatus};
use crate::domain::resolver::SessionKey;
use crate::domain::rules::MAX_HEALTH;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::repos::endings::{self, EndReason, Ending, EndingCreate};
use crate::repos::sessions::{self, Session, SessionUpdate};
use crate::repos::{lobbies, profiles, rounds, scores};

/// Hand-off record for downstream reward and history services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub ending: Ending,
    /// True when the ending already existed and nothing was written.
    pub already_ended: bool,
    pub host_id: i64,
    pub guest_id: i64,
    pub host_health: i32,
    pub guest_health: i32,
    pub question_count_total: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndStatus {
    pub session_uuid: uuid::Uuid,
    pub is_active: bool,
    pub ended: bool,
    pub ending: Option<Ending>,
}

#[derive(Debug, Clone)]
pub struct EndRequest {
    pub key: SessionKey,
    pub winner_id: Option<i64>,
    pub reason: EndReason,
    pub leaver_id: Option<i64>,
}

#[derive(Default)]
pub struct EndingService;

impl EndingService {
    pub fn new() -> Self {
        Self
    }

    pub async fn end(
        &self,
        txn: &DatabaseTransaction,
        req: EndRequest,
    ) -> Result<MatchSummary, AppError> {
        let session = sessions::require_by_key(txn, &req.key).await?;
        self.finish(txn, session, req.winner_id, req.reason, req.leaver_id)
            .await
    }

    /// End `session` inside the caller's transaction.
    pub(crate) async fn finish(
        &self,
        txn: &DatabaseTransaction,
        session: Session,
        winner_id: Option<i64>,
        reason: EndReason,
        leaver_id: Option<i64>,
    ) -> Result<MatchSummary, AppError> {
        if let Some(ending) = endings::find_by_session(txn, session.session_uuid).await? {
            debug!(session_uuid = %session.session_uuid, "Session already ended");
            return self.summarize(txn, &session, ending, true).await;
        }

        let seats = session.seats();
        if let Some(winner) = winner_id {
            if seats.role_of(winner).is_none() {
                return Err(AppError::invalid(
                    ErrorCode::ValidationError,
                    format!("Winner {winner} is not a participant"),
                ));
            }
        }
        if reason == EndReason::Draw && winner_id.is_some() {
            return Err(AppError::invalid(
                ErrorCode::ValidationError,
                "A draw has no winner",
            ));
        }

        if reason == EndReason::LeftTheGame {
            let leaver = match (leaver_id, winner_id) {
                (Some(leaver), _) => leaver,
                (None, Some(winner)) => match seats.role_of(winner) {
                    Some(role) => seats.id_of(role.other()),
                    None => winner,
                },
                (None, None) => {
                    return Err(AppError::invalid(
                        ErrorCode::ValidationError,
                        "leaver_id or winner_id is required when a player left the game",
                    ))
                }
            };
            if seats.role_of(leaver).is_none() {
                return Err(AppError::invalid(
                    ErrorCode::ValidationError,
                    format!("Leaver {leaver} is not a participant"),
                ));
            }
            BanService::new().record_early_leave(txn, leaver).await?;
        }

        let ending = endings::create_ending(
            txn,
            EndingCreate {
                session_uuid: session.session_uuid,
                session_id: session.id,
                lobby_code: session.lobby_code.clone(),
                winner_id,
                reason,
            },
        )
        .await?;

        let session = if session.is_active {
            sessions::update_session(
                txn,
                SessionUpdate::new(session.id, session.version).with_is_active(false),
            )
            .await?
        } else {
            session
        };

        if let Some(lobby) = lobbies::find_by_code(txn, &session.lobby_code).await? {
            if !is_terminal(lobby.status) {
                let target = match (reason, lobby.status) {
                    (EndReason::LeftTheGame, _) => LobbyStatus::Abandoned,
                    (_, LobbyStatus::InProgress) => LobbyStatus::Completed,
                    _ => LobbyStatus::Abandoned,
                };
                LobbyService::new().transition(txn, lobby, target).await?;
            }
        }

        if let Some(winner) = winner_id {
            let loser = seats
                .role_of(winner)
                .map(|role| seats.id_of(role.other()));
            profiles::record_result(txn, winner, loser).await?;
        }

        info!(
            session_uuid = %session.session_uuid,
            lobby_code = %session.lobby_code,
            winner_id = ?winner_id,
            reason = ?reason,
            "Battle ended"
        );
        self.summarize(txn, &session, ending, false).await
    }

    async fn summarize(
        &self,
        txn: &DatabaseTransaction,
        session: &Session,
        ending: Ending,
        already_ended: bool,
    ) -> Result<MatchSummary, AppError> {
        let score = scores::find_by_session(txn, session.session_uuid).await?;
        let round = rounds::find_by_session(txn, session.session_uuid).await?;
        Ok(MatchSummary {
            ending,
            already_ended,
            host_id: session.host_id,
            guest_id: session.guest_id,
            host_health: score.map_or(MAX_HEALTH, |s| s.host_health),
            guest_health: score.map_or(MAX_HEALTH, |s| s.guest_health),
            question_count_total: round.map_or(0, |r| r.question_count_total),
        })
    }

    pub async fn end_status(
        &self,
        txn: &DatabaseTransaction,
        key: &SessionKey,
    ) -> Result<EndStatus, AppError> {
        let session = sessions::require_by_key(txn, key).await?;
        let ending = endings::find_by_session(txn, session.session_uuid).await?;
        Ok(EndStatus {
            session_uuid: session.session_uuid,
            is_active: session.is_active,
            ended: ending.is_some(),
            ending,
        })
    }
}
