//! Turn resolution against persisted state.
//!
//! [`RoundService::play`] loads session, round and score, runs
//! [`resolve_play`] in memory, then writes all three back in the caller's
//! transaction. The session write is version-guarded, so of two
//! concurrent plays on the same turn only one commits.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::endings::{EndingService, MatchSummary};
use crate::domain::health::Knockout;
use crate::domain::turn::{resolve_play, Play, PlayOutcome, TurnState};
use crate::domain::{ActiveEffect, CardKind, EffectKind, Role};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, InvalidStateKind};
use crate::errors::ErrorCode;
use crate::repos::endings::{self, EndReason};
use crate::repos::rounds::{self, Round, RoundPlay};
use crate::repos::scores::{self, Score};
use crate::repos::sessions::{self, Session, SessionUpdate};

#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub session_uuid: Uuid,
    pub role: Role,
    pub card: Option<CardKind>,
    pub is_correct: bool,
    pub lobby_code: Option<String>,
    pub question_id: Option<String>,
    /// Reject the play if the session moved past this version.
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayResult {
    pub outcome: PlayOutcome,
    pub session: Session,
    pub round: Round,
    pub score: Score,
    /// Present when the play knocked a side out.
    pub ending: Option<MatchSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsumeResult {
    pub consumed: ActiveEffect,
    pub session: Session,
}

#[derive(Default)]
pub struct RoundService;

impl RoundService {
    pub fn new() -> Self {
        Self
    }

    /// Create the session's round row if missing. Idempotent.
    pub async fn init_round(
        &self,
        txn: &DatabaseTransaction,
        session_uuid: Uuid,
    ) -> Result<Round, AppError> {
        sessions::require_by_uuid(txn, session_uuid).await?;
        ensure_round(txn, session_uuid).await
    }

    pub async fn get_round(
        &self,
        txn: &DatabaseTransaction,
        session_uuid: Uuid,
    ) -> Result<Round, AppError> {
        Ok(rounds::require_by_session(txn, session_uuid).await?)
    }

    pub async fn play(
        &self,
        txn: &DatabaseTransaction,
        req: PlayRequest,
    ) -> Result<PlayResult, AppError> {
        let session = sessions::require_by_uuid(txn, req.session_uuid).await?;
        if let Some(code) = req.lobby_code.as_deref() {
            if !code.eq_ignore_ascii_case(&session.lobby_code) {
                return Err(AppError::invalid(
                    ErrorCode::ValidationError,
                    format!("Session {} does not belong to lobby {code}", session.session_uuid),
                ));
            }
        }
        ensure_playable(txn, &session).await?;
        if let Some(expected) = req.expected_version {
            if expected != session.version {
                return Err(DomainError::conflict(
                    ConflictKind::OptimisticLock,
                    format!(
                        "Session was modified concurrently (expected version {expected}, actual version {}); refresh and retry",
                        session.version
                    ),
                )
                .into());
            }
        }

        let round = ensure_round(txn, session.session_uuid).await?;
        if let Some(qid) = req.question_id.as_deref() {
            if round.question_ids_done.iter().any(|done| done == qid) {
                return Err(DomainError::conflict(
                    ConflictKind::QuestionAlreadyUsed,
                    format!("Question {qid} was already served in this match"),
                )
                .into());
            }
        }
        let score = ensure_score(txn, session.session_uuid).await?;

        let mut state = TurnState {
            seats: session.seats(),
            current_turn: session.current_turn,
            question_count_total: u32::try_from(round.question_count_total).unwrap_or(0),
            effects: session.active_card_effects.clone(),
            health: score.health(),
        };
        let outcome = resolve_play(
            &mut state,
            Play {
                role: req.role,
                card: req.card,
                is_correct: req.is_correct,
            },
            OffsetDateTime::now_utc(),
        )?;

        let mut question_ids = round.question_ids_done.clone();
        question_ids.extend(req.question_id);

        // Session first: a lost race fails here before anything else is written.
        let session = sessions::update_session(
            txn,
            SessionUpdate::new(session.id, session.version)
                .with_current_turn(state.current_turn)
                .with_effects(state.effects.to_json()),
        )
        .await?;

        let round = rounds::record_play(
            txn,
            session.session_uuid,
            RoundPlay {
                role: req.role,
                card: outcome.card_played.map(|c| c.id().to_string()),
                answer_correct: req.is_correct,
                card_effect: outcome.effect.clone(),
                question_count_total: i32::try_from(outcome.turn_number).unwrap_or(i32::MAX),
                question_ids_done: question_ids,
            },
        )
        .await?;

        let score = if state.health != score.health() {
            scores::save_health(txn, session.session_uuid, state.health).await?
        } else {
            score
        };

        debug!(
            session_uuid = %session.session_uuid,
            role = %req.role,
            turn_number = outcome.turn_number,
            card = ?outcome.card_played,
            blocked = outcome.blocked,
            next_turn = outcome.next_turn,
            host_health = score.host_health,
            guest_health = score.guest_health,
            "Play resolved"
        );

        let ending = resolve_knockout(txn, &session, outcome.knockout).await?;
        let session = if ending.is_some() {
            sessions::require_by_uuid(txn, session.session_uuid).await?
        } else {
            session
        };

        Ok(PlayResult {
            outcome,
            session,
            round,
            score,
            ending,
        })
    }

    /// Mark one pending effect targeting `role` as used.
    pub async fn consume_effect(
        &self,
        txn: &DatabaseTransaction,
        session_uuid: Uuid,
        role: Role,
        kind: EffectKind,
        effect_id: Option<Uuid>,
    ) -> Result<ConsumeResult, AppError> {
        let session = sessions::require_by_uuid(txn, session_uuid).await?;
        if !session.is_active {
            return Err(inactive(&session));
        }
        let mut ledger = session.active_card_effects.clone();
        let consumed = ledger.consume(role, kind, effect_id)?;
        ledger.prune_used();

        let session = sessions::update_session(
            txn,
            SessionUpdate::new(session.id, session.version).with_effects(ledger.to_json()),
        )
        .await?;
        debug!(session_uuid = %session_uuid, %role, %kind, effect_id = %consumed.id, "Effect consumed");
        Ok(ConsumeResult { consumed, session })
    }
}

fn inactive(session: &Session) -> AppError {
    DomainError::invalid_state(
        InvalidStateKind::SessionInactive,
        format!("Session {} has ended", session.session_uuid),
    )
    .into()
}

async fn ensure_playable(txn: &DatabaseTransaction, session: &Session) -> Result<(), AppError> {
    if !session.is_active || endings::find_by_session(txn, session.session_uuid).await?.is_some() {
        return Err(inactive(session));
    }
    if !session.battle_started {
        return Err(DomainError::invalid_state(
            InvalidStateKind::BattleNotStarted,
            "Both players must enter the battle first",
        )
        .into());
    }
    Ok(())
}

/// End the match when a side reached zero health.
pub(crate) async fn resolve_knockout(
    txn: &DatabaseTransaction,
    session: &Session,
    knockout: Knockout,
) -> Result<Option<MatchSummary>, AppError> {
    let (winner, reason) = match knockout {
        Knockout::None => return Ok(None),
        Knockout::One(loser) => (Some(session.seats().id_of(loser.other())), EndReason::Victory),
        Knockout::Both => (None, EndReason::Draw),
    };
    info!(session_uuid = %session.session_uuid, winner_id = ?winner, "Knockout");
    let summary = EndingService::new()
        .finish(txn, session.clone(), winner, reason, None)
        .await?;
    Ok(Some(summary))
}

pub(crate) async fn ensure_round(
    txn: &DatabaseTransaction,
    session_uuid: Uuid,
) -> Result<Round, AppError> {
    match rounds::find_by_session(txn, session_uuid).await? {
        Some(round) => Ok(round),
        None => Ok(rounds::create_round(txn, session_uuid).await?),
    }
}

pub(crate) async fn ensure_score(
    txn: &DatabaseTransaction,
    session_uuid: Uuid,
) -> Result<Score, AppError> {
    match scores::find_by_session(txn, session_uuid).await? {
        Some(score) => Ok(score),
        None => Ok(scores::create_score(txn, session_uuid).await?),
    }
}
