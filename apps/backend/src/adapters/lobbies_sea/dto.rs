//! DTOs for the lobbies_sea adapter.

use time::OffsetDateTime;

use crate::domain::lobby::{LobbySettings, LobbyStatus, PlayerProfile};

/// Fields for a new lobby.
#[derive(Debug, Clone)]
pub struct LobbyCreate {
    pub code: String,
    pub host: PlayerProfile,
    pub settings: LobbySettings,
}

/// Partial lobby update; `None` leaves a column alone.
#[derive(Debug, Clone)]
pub struct LobbyUpdate {
    pub id: i64,
    pub status: Option<LobbyStatus>,
    pub host_ready: Option<bool>,
    pub guest_ready: Option<bool>,
    /// Three-state: None = no change, Some(Some(p)) = seat guest, Some(None) = clear seat.
    pub guest: Option<Option<PlayerProfile>>,
    pub settings: Option<LobbySettings>,
    pub started_at: Option<OffsetDateTime>,
    pub ended_at: Option<OffsetDateTime>,
}

impl LobbyUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            status: None,
            host_ready: None,
            guest_ready: None,
            guest: None,
            settings: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn with_status(mut self, status: LobbyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_host_ready(mut self, ready: bool) -> Self {
        self.host_ready = Some(ready);
        self
    }

    pub fn with_guest_ready(mut self, ready: bool) -> Self {
        self.guest_ready = Some(ready);
        self
    }

    pub fn with_guest(mut self, guest: Option<PlayerProfile>) -> Self {
        self.guest = Some(guest);
        self
    }

    pub fn with_settings(mut self, settings: LobbySettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_started_at(mut self, at: OffsetDateTime) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn with_ended_at(mut self, at: OffsetDateTime) -> Self {
        self.ended_at = Some(at);
        self
    }
}
