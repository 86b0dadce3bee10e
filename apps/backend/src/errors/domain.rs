//! Domain-level error type used across services and adapters.
//!
//! This error type is HTTP- and DB-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! through `From<DomainError> for AppError` in `crate::error`.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Infra error kinds to distinguish operational failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InfraErrorKind {
    Timeout,
    DbUnavailable,
    DataCorruption,
    Other(String),
}

/// Missing resources in domain terms
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Lobby,
    Invitation,
    Session,
    Round,
    Score,
    User,
    Player,
    Other(String),
}

/// Semantic conflicts
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    LobbyCodeTaken,
    LobbyFull,
    InvitationExists,
    ActiveSessionExists,
    EndingExists,
    OptimisticLock,
    QuestionAlreadyUsed,
    Other(String),
}

/// Actions attempted against an incompatible status
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidStateKind {
    LobbyStatus,
    InvitationNotPending,
    SessionInactive,
    BattleNotStarted,
    OutOfTurn,
    CardLocked,
    UserBanned,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Missing or malformed input, rejected before any write
    Validation(String),
    /// Semantic conflict
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    NotFound(NotFoundKind, String),
    /// Action against an incompatible status
    InvalidState(InvalidStateKind, String),
    /// Infrastructure/operational failures (retryable)
    Infra(InfraErrorKind, String),
    /// A collaborating service (profiles, question content) failed
    External(String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(d) => write!(f, "validation error: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::InvalidState(kind, d) => write!(f, "invalid state {kind:?}: {d}"),
            DomainError::Infra(kind, d) => write!(f, "infra {kind:?}: {d}"),
            DomainError::External(d) => write!(f, "external service error: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn invalid_state(kind: InvalidStateKind, detail: impl Into<String>) -> Self {
        Self::InvalidState(kind, detail.into())
    }
    pub fn infra(kind: InfraErrorKind, detail: impl Into<String>) -> Self {
        Self::Infra(kind, detail.into())
    }
    pub fn external(detail: impl Into<String>) -> Self {
        Self::External(detail.into())
    }

    /// Transient store failures are the only retryable kind.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Infra(InfraErrorKind::Timeout | InfraErrorKind::DbUnavailable, _)
                | DomainError::Conflict(ConflictKind::OptimisticLock, _)
        )
    }
}
