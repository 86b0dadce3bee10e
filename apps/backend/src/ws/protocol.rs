use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::lobby::LobbyStatus;
use crate::repos::endings::EndReason;

pub const PROTOCOL_VERSION: i32 = 1;

/// A broadcast target. Every socket bound to a user joins that user's room;
/// lobby rooms are joined explicitly with `join_lobby`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Room {
    User { id: i64 },
    Lobby { code: String },
}

impl Room {
    pub fn user(id: i64) -> Self {
        Room::User { id }
    }

    pub fn lobby(code: impl Into<String>) -> Self {
        Room::Lobby {
            code: code.into().to_ascii_uppercase(),
        }
    }

    /// Redis channel name for this room.
    pub fn channel(&self) -> String {
        match self {
            Room::User { id } => format!("user:{id}"),
            Room::Lobby { code } => format!("lobby:{code}"),
        }
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        let (prefix, key) = channel.split_once(':')?;
        match prefix {
            "user" => key.parse().ok().map(Room::user),
            "lobby" if !key.is_empty() => Some(Room::lobby(key)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Setup {
        user_id: i64,
    },
    JoinLobby {
        lobby_code: String,
        #[serde(default)]
        player: Option<Value>,
    },
    LeaveLobby {
        lobby_code: String,
    },
    BattleInvitation {
        lobby_code: String,
        receiver_id: i64,
        #[serde(default)]
        payload: Value,
    },
    AcceptBattleInvitation {
        lobby_code: String,
        sender_id: i64,
    },
    DeclineBattleInvitation {
        lobby_code: String,
        sender_id: i64,
    },
    PlayerReadyStateChanged {
        lobby_code: String,
        is_ready: bool,
    },
    QuestionTypesChanged {
        lobby_code: String,
        question_types: Vec<String>,
    },
    StudyMaterialChanged {
        lobby_code: String,
        #[serde(default)]
        study_material_id: Option<String>,
        #[serde(default)]
        study_material_title: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    Connected {
        connection_id: Uuid,
        protocol: i32,
    },

    SetupAck {
        user_id: i64,
        /// Lobby of a battle the user is still part of, if any.
        in_game: Option<String>,
    },

    PlayerJoinedLobby {
        lobby_code: String,
        user_id: i64,
        #[serde(default)]
        player: Option<Value>,
    },

    PlayerLeftLobby {
        lobby_code: String,
        user_id: i64,
    },

    BattleInvitation {
        lobby_code: String,
        sender_id: i64,
        receiver_id: i64,
        #[serde(default)]
        payload: Value,
    },

    BattleInvitationSent {
        lobby_code: String,
        sender_id: i64,
        receiver_id: i64,
    },

    BattleInvitationAccepted {
        lobby_code: String,
        sender_id: i64,
        receiver_id: i64,
    },

    BattleInvitationDeclined {
        lobby_code: String,
        sender_id: i64,
        receiver_id: i64,
    },

    PlayerReadyStateChanged {
        lobby_code: String,
        user_id: i64,
        is_ready: bool,
    },

    LobbyStatusChanged {
        lobby_code: String,
        status: LobbyStatus,
    },

    QuestionTypesChanged {
        lobby_code: String,
        user_id: i64,
        question_types: Vec<String>,
    },

    StudyMaterialChanged {
        lobby_code: String,
        user_id: i64,
        study_material_id: Option<String>,
        study_material_title: Option<String>,
    },

    /// Refetch hint: persisted state moved to `version`.
    BattleStateChanged {
        lobby_code: String,
        session_uuid: Uuid,
        version: i32,
    },

    BattleEnded {
        lobby_code: String,
        session_uuid: Uuid,
        winner_id: Option<i64>,
        reason: EndReason,
    },

    Error {
        code: ErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    SetupRequired,
    Forbidden,
}
