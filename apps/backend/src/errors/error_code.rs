//! Error codes for the battle backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that
//! appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the battle backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,
    /// Lobby code does not match the allowed alphabet/length
    InvalidLobbyCode,
    /// Role is not `host` or `guest`, or does not match the player's seat
    InvalidRole,
    /// Card id not present in the catalog
    UnknownCard,
    /// None of session uuid, session id or lobby code supplied
    InvalidSessionSelector,
    /// Status value or transition not accepted
    InvalidStatus,
    /// Host tried to join their own lobby
    CannotJoinOwnLobby,

    // Resource Not Found
    /// General not found error
    NotFound,
    /// Lobby not found
    LobbyNotFound,
    /// Invitation not found
    InvitationNotFound,
    /// Battle session not found
    SessionNotFound,
    /// Battle round not found
    RoundNotFound,
    /// Battle score not found
    ScoreNotFound,
    /// User profile not found
    UserNotFound,
    /// Player is neither host nor guest of the lobby
    PlayerNotInLobby,

    // Conflicts
    /// General conflict
    Conflict,
    /// Lobby code already exists
    LobbyCodeTaken,
    /// Lobby already has a guest
    LobbyFull,
    /// A non-declined invitation already exists for the triple
    InvitationExists,
    /// Another active session already exists for the lobby
    ActiveSessionExists,
    /// The session already has an ending
    EndingExists,
    /// Resource was modified concurrently
    OptimisticLock,
    /// The question was already served in this match
    QuestionAlreadyUsed,
    /// Unique constraint violation
    UniqueViolation,

    // Invalid State
    /// General invalid state
    InvalidState,
    /// Lobby status does not allow the action
    LobbyStatusInvalid,
    /// Invitation is no longer pending
    InvitationNotPending,
    /// Session is not active or already ended
    SessionInactive,
    /// Battle has not started yet
    BattleNotStarted,
    /// Player acted out of turn
    OutOfTurn,
    /// Mind-control forbids playing a card this turn
    CardLocked,
    /// User is temporarily banned after repeated early leaves
    UserBanned,

    // System Errors
    /// Internal server error
    InternalError,
    /// Database error
    DbError,
    /// Database unavailable
    DbUnavailable,
    /// Database timeout
    DbTimeout,
    /// Stored data failed to decode
    DataCorruption,
    /// Configuration error
    ConfigError,
    /// Collaborating service failed
    ExternalServiceError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidLobbyCode => "INVALID_LOBBY_CODE",
            Self::InvalidRole => "INVALID_ROLE",
            Self::UnknownCard => "UNKNOWN_CARD",
            Self::InvalidSessionSelector => "INVALID_SESSION_SELECTOR",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::CannotJoinOwnLobby => "CANNOT_JOIN_OWN_LOBBY",

            Self::NotFound => "NOT_FOUND",
            Self::LobbyNotFound => "LOBBY_NOT_FOUND",
            Self::InvitationNotFound => "INVITATION_NOT_FOUND",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::RoundNotFound => "ROUND_NOT_FOUND",
            Self::ScoreNotFound => "SCORE_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::PlayerNotInLobby => "PLAYER_NOT_IN_LOBBY",

            Self::Conflict => "CONFLICT",
            Self::LobbyCodeTaken => "LOBBY_CODE_TAKEN",
            Self::LobbyFull => "LOBBY_FULL",
            Self::InvitationExists => "INVITATION_EXISTS",
            Self::ActiveSessionExists => "ACTIVE_SESSION_EXISTS",
            Self::EndingExists => "ENDING_EXISTS",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::QuestionAlreadyUsed => "QUESTION_ALREADY_USED",
            Self::UniqueViolation => "UNIQUE_VIOLATION",

            Self::InvalidState => "INVALID_STATE",
            Self::LobbyStatusInvalid => "LOBBY_STATUS_INVALID",
            Self::InvitationNotPending => "INVITATION_NOT_PENDING",
            Self::SessionInactive => "SESSION_INACTIVE",
            Self::BattleNotStarted => "BATTLE_NOT_STARTED",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::CardLocked => "CARD_LOCKED",
            Self::UserBanned => "USER_BANNED",

            Self::InternalError => "INTERNAL_ERROR",
            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DbTimeout => "DB_TIMEOUT",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::ConfigError => "CONFIG_ERROR",
            Self::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
