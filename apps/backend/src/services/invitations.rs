//! Invitation handshake: create, respond, fetch.

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use tracing::{info, warn};

use super::bans::BanService;
use crate::domain::invitation::{is_purgeable, InvitationStatus, Response};
use crate::domain::lobby::{converge, normalize_code, LobbySettings, LobbyStatus, PlayerProfile};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, InvalidStateKind, NotFoundKind};
use crate::errors::ErrorCode;
use crate::repos::invitations::{self, Invitation, InvitationCreate};
use crate::repos::lobbies::{self, Lobby, LobbyUpdate};

#[derive(Debug, Clone, Serialize)]
pub struct RespondOutcome {
    pub invitation: Invitation,
    /// The lobby after an accept seated the receiver.
    pub lobby: Option<Lobby>,
}

#[derive(Default)]
pub struct InvitationService;

impl InvitationService {
    pub fn new() -> Self {
        Self
    }

    /// Invite `receiver` into the sender's lobby.
    ///
    /// Declined and expired rows for the same triple are purged first; any
    /// other remaining row blocks the new invitation.
    pub async fn create_invitation(
        &self,
        txn: &DatabaseTransaction,
        lobby_code: &str,
        sender: PlayerProfile,
        receiver: PlayerProfile,
        settings: Option<LobbySettings>,
    ) -> Result<Invitation, AppError> {
        let lobby = lobbies::require_by_code(txn, &normalize_code(lobby_code)).await?;
        if sender.id != lobby.host.id {
            return Err(AppError::invalid(
                ErrorCode::InvalidRole,
                "Only the lobby host can send invitations",
            ));
        }
        if receiver.id == sender.id {
            return Err(AppError::invalid(
                ErrorCode::ValidationError,
                "Cannot invite yourself",
            ));
        }
        BanService::new().ensure_not_banned(txn, sender.id).await?;

        if lobby.status != LobbyStatus::Waiting {
            return Err(DomainError::invalid_state(
                InvalidStateKind::LobbyStatus,
                format!("Lobby {} is not waiting for players", lobby.code),
            )
            .into());
        }
        if lobby.has_guest() {
            return Err(DomainError::conflict(
                ConflictKind::LobbyFull,
                format!("Lobby {} already has a guest", lobby.code),
            )
            .into());
        }

        let purged = invitations::purge_stale(txn, &lobby.code, sender.id, receiver.id).await?;
        if let Some(existing) =
            invitations::find_blocking(txn, &lobby.code, sender.id, receiver.id).await?
        {
            warn!(
                lobby_code = %lobby.code,
                sender_id = sender.id,
                receiver_id = receiver.id,
                status = ?existing.status,
                "Invitation already exists"
            );
            return Err(DomainError::conflict(
                ConflictKind::InvitationExists,
                "An invitation for this lobby and player already exists",
            )
            .into());
        }

        let mut dto = InvitationCreate::pending(
            lobby.code.clone(),
            sender,
            receiver,
            settings.unwrap_or_else(|| lobby.settings.clone()),
        );
        dto.host_ready = lobby.host_ready;
        let invitation = invitations::create_invitation(txn, dto).await?;
        info!(
            lobby_code = %invitation.lobby_code,
            sender_id = invitation.sender_id,
            receiver_id = ?invitation.receiver_id,
            purged,
            "Invitation created"
        );
        Ok(invitation)
    }

    /// Answer a pending invitation in one conditional update.
    ///
    /// Accepting also seats the receiver in the lobby as a ready guest, so
    /// both join paths end in the same state.
    pub async fn respond(
        &self,
        txn: &DatabaseTransaction,
        lobby_code: &str,
        sender_id: i64,
        receiver_id: i64,
        response: Response,
    ) -> Result<RespondOutcome, AppError> {
        let lobby_code = normalize_code(lobby_code);
        let lobby_code = lobby_code.as_str();
        let status = response.status();
        let moved =
            invitations::respond_if_pending(txn, lobby_code, sender_id, receiver_id, status)
                .await?;

        let invitation = invitations::find_latest(txn, lobby_code, sender_id, receiver_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Invitation,
                    format!("No invitation from {sender_id} to {receiver_id} in lobby {lobby_code}"),
                )
            })?;

        if !moved {
            let detail = if is_purgeable(invitation.status) {
                format!("Invitation was already {:?}", invitation.status)
            } else {
                format!("Invitation is {:?}, not pending", invitation.status)
            };
            warn!(lobby_code, sender_id, receiver_id, status = ?invitation.status, "Response to non-pending invitation");
            return Err(
                DomainError::invalid_state(InvalidStateKind::InvitationNotPending, detail).into(),
            );
        }

        let lobby = if status == InvitationStatus::Accepted {
            Some(self.seat_receiver(txn, &invitation).await?)
        } else {
            None
        };

        info!(lobby_code, sender_id, receiver_id, ?status, "Invitation answered");
        Ok(RespondOutcome { invitation, lobby })
    }

    async fn seat_receiver(
        &self,
        txn: &DatabaseTransaction,
        invitation: &Invitation,
    ) -> Result<Lobby, AppError> {
        let receiver_id = invitation.receiver_id.ok_or_else(|| {
            DomainError::invalid_state(
                InvalidStateKind::InvitationNotPending,
                "Invitation has no receiver",
            )
        })?;
        let lobby = lobbies::require_by_code(txn, &invitation.lobby_code).await?;

        if lobby.guest.as_ref().map(|g| g.id) != Some(receiver_id) {
            if lobby.status != LobbyStatus::Waiting {
                return Err(DomainError::invalid_state(
                    InvalidStateKind::LobbyStatus,
                    format!("Lobby {} is not waiting for players", lobby.code),
                )
                .into());
            }
            let guest = PlayerProfile {
                id: receiver_id,
                name: invitation.receiver_name.clone().unwrap_or_default(),
                level: 1,
                picture: invitation.receiver_picture.clone(),
            };
            if !lobbies::attach_guest(txn, lobby.id, &guest).await? {
                return Err(DomainError::conflict(
                    ConflictKind::LobbyFull,
                    format!("Lobby {} already has a guest", lobby.code),
                )
                .into());
            }
        }

        let status = converge(lobby.status, lobby.host_ready, true, true);
        let updated = lobbies::update_lobby(
            txn,
            LobbyUpdate::new(lobby.id)
                .with_guest_ready(true)
                .with_status(status),
        )
        .await?;
        Ok(updated)
    }

    pub async fn get_invitation(
        &self,
        txn: &DatabaseTransaction,
        lobby_code: &str,
        sender_id: i64,
        receiver_id: i64,
    ) -> Result<Invitation, AppError> {
        let lobby_code = normalize_code(lobby_code);
        invitations::find_latest(txn, &lobby_code, sender_id, receiver_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Invitation,
                    format!("No invitation from {sender_id} to {receiver_id} in lobby {lobby_code}"),
                )
                .into()
            })
    }
}
