//! Lobby registry: creation, joining, readiness, settings and leaving.
//!
//! Every method runs inside the caller's transaction. Invitation rows that
//! mirror lobby state are updated in the same transaction.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::bans::BanService;
use crate::domain::invitation::InvitationStatus;
use crate::domain::lobby::{
    self, check_transition, converge, is_terminal, LobbySettings, LobbyStatus, PlayerProfile,
};
use crate::domain::rules::LOBBY_CODE_GENERATION_ATTEMPTS;
use crate::domain::Role;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, InvalidStateKind, NotFoundKind};
use crate::errors::ErrorCode;
use crate::repos::invitations::{self, Invitation, InvitationCreate, InvitationMirror};
use crate::repos::lobbies::{self, Lobby, LobbyUpdate};
use crate::utils::lobby_code::generate_lobby_code;

/// Result of a ready toggle; `status_changed` drives the status broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct ReadyOutcome {
    pub lobby: Lobby,
    pub role: Role,
    pub status_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinOutcome {
    pub lobby: Lobby,
    pub invitation: Invitation,
}

#[derive(Default)]
pub struct LobbyService;

impl LobbyService {
    pub fn new() -> Self {
        Self
    }

    /// Create a lobby. With no `code` the server picks an unused one.
    pub async fn create_lobby(
        &self,
        txn: &DatabaseTransaction,
        code: Option<&str>,
        host: PlayerProfile,
        settings: LobbySettings,
    ) -> Result<Lobby, AppError> {
        BanService::new().ensure_not_banned(txn, host.id).await?;

        let code = match code {
            Some(raw) => {
                let code = lobby::validate_code(raw)
                    .map_err(|e| AppError::invalid(ErrorCode::InvalidLobbyCode, e.to_string()))?;
                if lobbies::find_by_code(txn, &code).await?.is_some() {
                    return Err(DomainError::conflict(
                        ConflictKind::LobbyCodeTaken,
                        format!("Lobby code {code} already exists"),
                    )
                    .into());
                }
                code
            }
            None => self.unused_code(txn).await?,
        };

        let lobby = lobbies::create_lobby(txn, code, host, settings).await?;
        info!(lobby_code = %lobby.code, host_id = lobby.host.id, "Lobby created");
        Ok(lobby)
    }

    async fn unused_code(&self, txn: &DatabaseTransaction) -> Result<String, AppError> {
        for _ in 0..LOBBY_CODE_GENERATION_ATTEMPTS {
            let candidate = generate_lobby_code();
            if lobbies::find_by_code(txn, &candidate).await?.is_none() {
                return Ok(candidate);
            }
            debug!(candidate = %candidate, "Generated lobby code already taken");
        }
        Err(AppError::internal(
            ErrorCode::InternalError,
            "could not generate an unused lobby code",
        ))
    }

    pub async fn get_lobby(
        &self,
        txn: &DatabaseTransaction,
        code: &str,
    ) -> Result<Lobby, AppError> {
        let code = lobby::validate_code(code)
            .map_err(|e| AppError::invalid(ErrorCode::InvalidLobbyCode, e.to_string()))?;
        Ok(lobbies::require_by_code(txn, &code).await?)
    }

    /// Seat `guest` and record the matching accepted invitation, both or
    /// neither. Joining again as the seated guest returns the current state.
    pub async fn join_lobby(
        &self,
        txn: &DatabaseTransaction,
        code: &str,
        guest: PlayerProfile,
    ) -> Result<JoinOutcome, AppError> {
        let lobby = self.get_lobby(txn, code).await?;

        if guest.id == lobby.host.id {
            return Err(AppError::invalid(
                ErrorCode::CannotJoinOwnLobby,
                "The host cannot join their own lobby as guest",
            ));
        }

        if lobby.guest.as_ref().map(|g| g.id) == Some(guest.id) {
            if let Some(invitation) = invitations::find_latest(txn, &lobby.code, lobby.host.id, guest.id).await? {
                debug!(lobby_code = %lobby.code, guest_id = guest.id, "Repeated join");
                return Ok(JoinOutcome { lobby, invitation });
            }
        }

        BanService::new().ensure_not_banned(txn, guest.id).await?;

        if lobby.status != LobbyStatus::Waiting {
            return Err(DomainError::invalid_state(
                InvalidStateKind::LobbyStatus,
                format!("Lobby {} is not waiting for players", lobby.code),
            )
            .into());
        }
        if lobby.has_guest() {
            return Err(lobby_full(&lobby.code));
        }

        if !lobbies::attach_guest(txn, lobby.id, &guest).await? {
            let current = lobbies::require_by_code(txn, &lobby.code).await?;
            warn!(lobby_code = %lobby.code, guest_id = guest.id, "Lost race for guest seat");
            return Err(if current.status != LobbyStatus::Waiting {
                DomainError::invalid_state(
                    InvalidStateKind::LobbyStatus,
                    format!("Lobby {} is not waiting for players", lobby.code),
                )
                .into()
            } else {
                lobby_full(&lobby.code)
            });
        }

        invitations::purge_stale(txn, &lobby.code, lobby.host.id, guest.id).await?;
        let reused =
            invitations::accept_on_join(txn, &lobby.code, lobby.host.id, guest.id, lobby.host_ready)
                .await?;
        let invitation = if reused {
            invitations::find_latest(txn, &lobby.code, lobby.host.id, guest.id)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found(NotFoundKind::Invitation, "Invitation vanished")
                })?
        } else {
            let mut dto = InvitationCreate::pending(
                lobby.code.clone(),
                lobby.host.clone(),
                guest.clone(),
                lobby.settings.clone(),
            )
            .with_status(InvitationStatus::Accepted);
            dto.host_ready = lobby.host_ready;
            invitations::create_invitation(txn, dto).await?
        };

        let lobby = lobbies::require_by_code(txn, &lobby.code).await?;
        info!(lobby_code = %lobby.code, guest_id = guest.id, "Guest joined lobby");
        Ok(JoinOutcome { lobby, invitation })
    }

    /// Toggle a participant's ready flag and converge the status.
    pub async fn set_ready(
        &self,
        txn: &DatabaseTransaction,
        code: &str,
        player_id: i64,
        ready: bool,
    ) -> Result<ReadyOutcome, AppError> {
        let lobby = self.get_lobby(txn, code).await?;
        let role = lobby.role_of(player_id).ok_or_else(|| not_in_lobby(&lobby.code, player_id))?;

        if !matches!(lobby.status, LobbyStatus::Waiting | LobbyStatus::Ready) {
            return Err(DomainError::invalid_state(
                InvalidStateKind::LobbyStatus,
                format!("Ready state cannot change while lobby is {:?}", lobby.status),
            )
            .into());
        }

        // Write only the caller's flag; the status follows the re-read row.
        let update = match role {
            Role::Host => LobbyUpdate::new(lobby.id).with_host_ready(ready),
            Role::Guest => LobbyUpdate::new(lobby.id).with_guest_ready(ready),
        };
        lobbies::update_lobby(txn, update).await?;

        let updated = self.reconverge(txn, &lobby.code).await?;
        let status_changed = updated.status != lobby.status;
        debug!(lobby_code = %updated.code, %role, ready, status = ?updated.status, "Ready state changed");
        Ok(ReadyOutcome {
            lobby: updated,
            role,
            status_changed,
        })
    }

    /// Re-read the lobby, derive its status from the stored ready flags and
    /// mirror both flags onto the live invitation.
    pub async fn reconverge(
        &self,
        txn: &DatabaseTransaction,
        code: &str,
    ) -> Result<Lobby, AppError> {
        let current = self.get_lobby(txn, code).await?;
        let status = converge(
            current.status,
            current.host_ready,
            current.guest_ready,
            current.has_guest(),
        );
        let current = if status != current.status {
            lobbies::update_lobby(txn, LobbyUpdate::new(current.id).with_status(status)).await?
        } else {
            current
        };

        invitations::mirror_lobby(
            txn,
            &current.code,
            InvitationMirror {
                host_ready: Some(current.host_ready),
                guest_ready: Some(current.guest_ready),
                ..InvitationMirror::default()
            },
        )
        .await?;
        Ok(current)
    }

    /// Host-only settings change, mirrored onto the live invitation.
    pub async fn update_settings(
        &self,
        txn: &DatabaseTransaction,
        code: &str,
        player_id: i64,
        settings: LobbySettings,
    ) -> Result<Lobby, AppError> {
        let lobby = self.get_lobby(txn, code).await?;
        match lobby.role_of(player_id) {
            Some(Role::Host) => {}
            Some(Role::Guest) => {
                return Err(AppError::bad_request(
                    ErrorCode::InvalidRole,
                    "Only the host may change lobby settings",
                ))
            }
            None => return Err(not_in_lobby(&lobby.code, player_id)),
        }
        if !matches!(lobby.status, LobbyStatus::Waiting | LobbyStatus::Ready) {
            return Err(DomainError::invalid_state(
                InvalidStateKind::LobbyStatus,
                format!("Settings are locked while lobby is {:?}", lobby.status),
            )
            .into());
        }

        let updated =
            lobbies::update_lobby(txn, LobbyUpdate::new(lobby.id).with_settings(settings.clone()))
                .await?;
        invitations::mirror_lobby(
            txn,
            &updated.code,
            InvitationMirror {
                settings: Some(settings),
                ..InvitationMirror::default()
            },
        )
        .await?;
        info!(lobby_code = %updated.code, "Lobby settings updated");
        Ok(updated)
    }

    /// Explicit status transition. `in_progress` stamps `started_at`,
    /// terminal states stamp `ended_at`.
    pub async fn update_status(
        &self,
        txn: &DatabaseTransaction,
        code: &str,
        status: LobbyStatus,
    ) -> Result<Lobby, AppError> {
        let lobby = self.get_lobby(txn, code).await?;
        self.transition(txn, lobby, status).await
    }

    pub(crate) async fn transition(
        &self,
        txn: &DatabaseTransaction,
        lobby: Lobby,
        status: LobbyStatus,
    ) -> Result<Lobby, AppError> {
        if lobby.status == status {
            return Ok(lobby);
        }
        check_transition(lobby.status, status)?;

        let now = OffsetDateTime::now_utc();
        let mut update = LobbyUpdate::new(lobby.id).with_status(status);
        if status == LobbyStatus::InProgress {
            update = update.with_started_at(now);
        }
        if is_terminal(status) {
            update = update.with_ended_at(now);
        }
        let updated = lobbies::update_lobby(txn, update).await?;
        info!(lobby_code = %updated.code, from = ?lobby.status, to = ?status, "Lobby status changed");
        Ok(updated)
    }

    /// Leave a lobby. The host abandons it; the guest frees the seat and
    /// the invitation goes back to pending.
    pub async fn leave_lobby(
        &self,
        txn: &DatabaseTransaction,
        code: &str,
        player_id: i64,
        role: Role,
    ) -> Result<Lobby, AppError> {
        let lobby = self.get_lobby(txn, code).await?;
        let seat = lobby.role_of(player_id).ok_or_else(|| not_in_lobby(&lobby.code, player_id))?;
        if seat != role {
            return Err(AppError::invalid(
                ErrorCode::InvalidRole,
                format!("Player {player_id} is the {seat}, not the {role}"),
            ));
        }

        match role {
            Role::Host => {
                if lobby.status == LobbyStatus::Abandoned {
                    return Ok(lobby);
                }
                check_transition(lobby.status, LobbyStatus::Abandoned)?;
                let update = LobbyUpdate::new(lobby.id)
                    .with_status(LobbyStatus::Abandoned)
                    .with_host_ready(false)
                    .with_guest_ready(false)
                    .with_ended_at(OffsetDateTime::now_utc());
                let updated = lobbies::update_lobby(txn, update).await?;
                invitations::mirror_lobby(
                    txn,
                    &updated.code,
                    InvitationMirror {
                        status: Some(InvitationStatus::Expired),
                        host_ready: Some(false),
                        guest_ready: Some(false),
                        ..InvitationMirror::default()
                    },
                )
                .await?;
                info!(lobby_code = %updated.code, host_id = player_id, "Host left; lobby abandoned");
                Ok(updated)
            }
            Role::Guest => {
                if !matches!(lobby.status, LobbyStatus::Waiting | LobbyStatus::Ready) {
                    return Err(DomainError::invalid_state(
                        InvalidStateKind::LobbyStatus,
                        format!("Guest cannot leave a lobby that is {:?}", lobby.status),
                    )
                    .into());
                }
                invitations::mirror_lobby(
                    txn,
                    &lobby.code,
                    InvitationMirror {
                        status: Some(InvitationStatus::Pending),
                        host_ready: Some(false),
                        guest_ready: Some(false),
                        clear_receiver: true,
                        ..InvitationMirror::default()
                    },
                )
                .await?;
                let update = LobbyUpdate::new(lobby.id)
                    .with_status(LobbyStatus::Waiting)
                    .with_guest(None)
                    .with_host_ready(false)
                    .with_guest_ready(false);
                let updated = lobbies::update_lobby(txn, update).await?;
                info!(lobby_code = %updated.code, guest_id = player_id, "Guest left lobby");
                Ok(updated)
            }
        }
    }
}

fn lobby_full(code: &str) -> AppError {
    DomainError::conflict(ConflictKind::LobbyFull, format!("Lobby {code} already has a guest"))
        .into()
}

fn not_in_lobby(code: &str, player_id: i64) -> AppError {
    DomainError::not_found(
        NotFoundKind::Player,
        format!("Player {player_id} is not in lobby {code}"),
    )
    .into()
}
