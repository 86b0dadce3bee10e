//! DTOs for the invitations_sea adapter.

use crate::domain::lobby::{LobbySettings, PlayerProfile};
use crate::entities::invitations::InvitationStatus;

/// Fields for a new invitation row.
#[derive(Debug, Clone)]
pub struct InvitationCreate {
    pub lobby_code: String,
    pub sender: PlayerProfile,
    pub receiver: Option<PlayerProfile>,
    pub status: InvitationStatus,
    pub host_ready: bool,
    pub guest_ready: bool,
    pub settings: LobbySettings,
}

impl InvitationCreate {
    pub fn pending(
        lobby_code: impl Into<String>,
        sender: PlayerProfile,
        receiver: PlayerProfile,
        settings: LobbySettings,
    ) -> Self {
        Self {
            lobby_code: lobby_code.into(),
            sender,
            receiver: Some(receiver),
            status: InvitationStatus::Pending,
            host_ready: false,
            guest_ready: false,
            settings,
        }
    }

    pub fn with_status(mut self, status: InvitationStatus) -> Self {
        self.status = status;
        self
    }
}

/// Mirror of lobby state onto the lobby's live invitation.
#[derive(Debug, Clone, Default)]
pub struct InvitationMirror {
    pub status: Option<InvitationStatus>,
    pub host_ready: Option<bool>,
    pub guest_ready: Option<bool>,
    pub battle_started: Option<bool>,
    /// Clears the receiver fields.
    pub clear_receiver: bool,
    pub settings: Option<LobbySettings>,
}
