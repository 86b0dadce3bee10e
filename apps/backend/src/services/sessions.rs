//! Battle session lifecycle: initialize, player entry, lookup.

use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::lobbies::LobbyService;
use crate::domain::lobby::{is_terminal, normalize_code, LobbyStatus};
use crate::domain::resolver::SessionKey;
use crate::domain::Role;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, InvalidStateKind};
use crate::errors::ErrorCode;
use crate::repos::invitations::{self, InvitationMirror};
use crate::repos::lobbies;
use crate::repos::sessions::{self, Session, SessionCreate, SessionSettings, SessionUpdate};

/// Version-guarded writes that lose a race are retried this many times
/// against a fresh read.
const ENTER_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct EnterOutcome {
    pub session: Session,
    /// True only for the call that flipped `battle_started`.
    pub started_now: bool,
}

#[derive(Default)]
pub struct SessionService;

impl SessionService {
    pub fn new() -> Self {
        Self
    }

    /// Create the lobby's active session, or update it if one exists.
    ///
    /// A concurrent initializer that wins the insert surfaces as a unique
    /// violation inside a savepoint; the loser re-reads and updates.
    pub async fn initialize(
        &self,
        txn: &DatabaseTransaction,
        lobby_code: &str,
        host_id: i64,
        guest_id: i64,
        settings: Option<SessionSettings>,
    ) -> Result<Session, AppError> {
        if host_id == guest_id {
            return Err(AppError::invalid(
                ErrorCode::ValidationError,
                "host_id and guest_id must differ",
            ));
        }
        let lobby = lobbies::require_by_code(txn, &normalize_code(lobby_code)).await?;
        if is_terminal(lobby.status) {
            return Err(DomainError::invalid_state(
                InvalidStateKind::LobbyStatus,
                format!("Lobby {} is {:?}", lobby.code, lobby.status),
            )
            .into());
        }
        let settings = settings.unwrap_or_else(|| SessionSettings {
            difficulty_mode: lobby.settings.difficulty,
            study_material_id: lobby.settings.study_material_id.clone(),
            question_types: lobby.settings.question_types.clone(),
        });

        if let Some(existing) = sessions::find_active_by_lobby(txn, &lobby.code).await? {
            return self
                .refresh_existing(txn, existing, host_id, guest_id, settings)
                .await;
        }

        let savepoint = txn.begin().await?;
        let created = sessions::create_session(
            &savepoint,
            SessionCreate {
                session_uuid: Uuid::new_v4(),
                lobby_code: lobby.code.clone(),
                host_id,
                guest_id,
                settings: settings.clone(),
            },
        )
        .await;

        match created {
            Ok(session) => {
                savepoint.commit().await?;
                info!(lobby_code = %session.lobby_code, session_uuid = %session.session_uuid, "Battle session created");
                Ok(session)
            }
            Err(DomainError::Conflict(ConflictKind::ActiveSessionExists, _)) => {
                savepoint.rollback().await?;
                debug!(lobby_code = %lobby.code, "Concurrent initialize won; updating its session");
                let existing = sessions::find_active_by_lobby(txn, &lobby.code)
                    .await?
                    .ok_or_else(|| {
                        DomainError::conflict(
                            ConflictKind::ActiveSessionExists,
                            "Active session disappeared during initialize",
                        )
                    })?;
                self.refresh_existing(txn, existing, host_id, guest_id, settings)
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh_existing(
        &self,
        txn: &DatabaseTransaction,
        existing: Session,
        host_id: i64,
        guest_id: i64,
        settings: SessionSettings,
    ) -> Result<Session, AppError> {
        if existing.host_id == host_id
            && existing.guest_id == guest_id
            && existing.settings() == settings
        {
            return Ok(existing);
        }
        let update = SessionUpdate::new(existing.id, existing.version)
            .with_participants(host_id, guest_id)
            .with_settings(settings);
        let session = sessions::update_session(txn, update).await?;
        info!(lobby_code = %session.lobby_code, session_uuid = %session.session_uuid, "Battle session re-initialized");
        Ok(session)
    }

    /// Record that `role` entered (or left) the battle screen.
    ///
    /// The start check runs on the state re-read after the write, so two
    /// near-simultaneous entries start the battle exactly once.
    pub async fn player_enters(
        &self,
        txn: &DatabaseTransaction,
        key: &SessionKey,
        role: Role,
        in_battle: bool,
    ) -> Result<EnterOutcome, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_enter(txn, key, role, in_battle).await {
                Err(AppError::Conflict {
                    code: ErrorCode::OptimisticLock,
                    ..
                }) if attempt < ENTER_ATTEMPTS => {
                    debug!(attempt, %role, "Session changed underneath player entry; retrying");
                }
                other => return other,
            }
        }
    }

    async fn try_enter(
        &self,
        txn: &DatabaseTransaction,
        key: &SessionKey,
        role: Role,
        in_battle: bool,
    ) -> Result<EnterOutcome, AppError> {
        let session = sessions::require_by_key(txn, key).await?;
        if !session.is_active {
            return Err(DomainError::invalid_state(
                InvalidStateKind::SessionInactive,
                format!("Session {} has ended", session.session_uuid),
            )
            .into());
        }

        let session = if session.in_battle(role) == in_battle {
            session
        } else {
            let update = SessionUpdate::new(session.id, session.version);
            let update = match role {
                Role::Host => update.with_host_in_battle(in_battle),
                Role::Guest => update.with_guest_in_battle(in_battle),
            };
            sessions::update_session(txn, update).await?
        };

        if session.battle_started || !(session.host_in_battle && session.guest_in_battle) {
            return Ok(EnterOutcome {
                session,
                started_now: false,
            });
        }

        let update = SessionUpdate::new(session.id, session.version)
            .with_battle_started(true)
            .with_current_turn(Some(session.host_id));
        let session = sessions::update_session(txn, update).await?;

        match lobbies::find_by_code(txn, &session.lobby_code).await? {
            Some(lobby) if matches!(lobby.status, LobbyStatus::Waiting | LobbyStatus::Ready) => {
                LobbyService::new()
                    .transition(txn, lobby, LobbyStatus::InProgress)
                    .await?;
            }
            Some(lobby) => {
                debug!(lobby_code = %lobby.code, status = ?lobby.status, "Lobby not moved to in_progress");
            }
            None => warn!(lobby_code = %session.lobby_code, "Session has no lobby"),
        }
        invitations::mirror_lobby(
            txn,
            &session.lobby_code,
            InvitationMirror {
                battle_started: Some(true),
                ..InvitationMirror::default()
            },
        )
        .await?;

        info!(lobby_code = %session.lobby_code, session_uuid = %session.session_uuid, "Battle started");
        Ok(EnterOutcome {
            session,
            started_now: true,
        })
    }

    /// The lobby's active session, else its most recent one.
    pub async fn get_for_lobby(
        &self,
        txn: &DatabaseTransaction,
        lobby_code: &str,
    ) -> Result<Session, AppError> {
        Ok(sessions::require_by_key(txn, &SessionKey::Lobby(lobby_code.to_string())).await?)
    }

    pub async fn get(
        &self,
        txn: &DatabaseTransaction,
        key: &SessionKey,
    ) -> Result<Session, AppError> {
        Ok(sessions::require_by_key(txn, key).await?)
    }
}
