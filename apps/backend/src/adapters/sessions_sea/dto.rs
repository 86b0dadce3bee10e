//! DTOs for the sessions_sea adapter.

use uuid::Uuid;

use crate::domain::lobby::Difficulty;

/// Fields for a new battle session.
#[derive(Debug, Clone)]
pub struct SessionCreate {
    pub session_uuid: Uuid,
    pub lobby_code: String,
    pub host_id: i64,
    pub guest_id: i64,
    pub settings: SessionSettings,
}

/// Match parameters copied from the lobby at initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub difficulty_mode: Option<Difficulty>,
    pub study_material_id: Option<String>,
    pub question_types: Vec<String>,
}

/// Version-guarded session update; `None` leaves a column alone.
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub id: i64,
    pub expected_version: i32,
    pub participants: Option<(i64, i64)>,
    pub settings: Option<SessionSettings>,
    pub host_in_battle: Option<bool>,
    pub guest_in_battle: Option<bool>,
    pub battle_started: Option<bool>,
    pub current_turn: Option<Option<i64>>,
    pub is_active: Option<bool>,
    pub active_card_effects: Option<serde_json::Value>,
}

impl SessionUpdate {
    pub fn new(id: i64, expected_version: i32) -> Self {
        Self {
            id,
            expected_version,
            participants: None,
            settings: None,
            host_in_battle: None,
            guest_in_battle: None,
            battle_started: None,
            current_turn: None,
            is_active: None,
            active_card_effects: None,
        }
    }

    pub fn with_participants(mut self, host_id: i64, guest_id: i64) -> Self {
        self.participants = Some((host_id, guest_id));
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_host_in_battle(mut self, v: bool) -> Self {
        self.host_in_battle = Some(v);
        self
    }

    pub fn with_guest_in_battle(mut self, v: bool) -> Self {
        self.guest_in_battle = Some(v);
        self
    }

    pub fn with_battle_started(mut self, v: bool) -> Self {
        self.battle_started = Some(v);
        self
    }

    pub fn with_current_turn(mut self, turn: Option<i64>) -> Self {
        self.current_turn = Some(turn);
        self
    }

    pub fn with_is_active(mut self, v: bool) -> Self {
        self.is_active = Some(v);
        self
    }

    pub fn with_effects(mut self, effects: serde_json::Value) -> Self {
        self.active_card_effects = Some(effects);
        self
    }
}
