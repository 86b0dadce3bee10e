use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, InvalidStateKind, NotFoundKind,
};
use crate::errors::ErrorCode;
use crate::trace_ctx;

/// RFC 7807 problem details body.
#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {detail}")]
    Validation { code: ErrorCode, detail: String },
    #[error("Bad request: {detail}")]
    BadRequest { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Conflict: {detail}")]
    Conflict { code: ErrorCode, detail: String },
    #[error("Invalid state: {detail}")]
    InvalidState { code: ErrorCode, detail: String },
    #[error("Database unavailable: {detail}")]
    DbUnavailable { detail: String },
    #[error("Timeout: {detail}")]
    Timeout { detail: String },
    #[error("External service error: {detail}")]
    External { detail: String },
    #[error("Internal error: {detail}")]
    Internal { code: ErrorCode, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. }
            | AppError::BadRequest { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::InvalidState { code, .. }
            | AppError::Internal { code, .. } => *code,
            AppError::DbUnavailable { .. } => ErrorCode::DbUnavailable,
            AppError::Timeout { .. } => ErrorCode::DbTimeout,
            AppError::External { .. } => ErrorCode::ExternalServiceError,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Validation { detail, .. }
            | AppError::BadRequest { detail, .. }
            | AppError::NotFound { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::InvalidState { detail, .. }
            | AppError::DbUnavailable { detail }
            | AppError::Timeout { detail }
            | AppError::External { detail }
            | AppError::Internal { detail, .. }
            | AppError::Config { detail } => detail.clone(),
        }
    }

    /// HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::InvalidState { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DbUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::External { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } | AppError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn invalid(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Validation {
            code,
            detail: detail.into(),
        }
    }

    pub fn bad_request(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn invalid_state(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::InvalidState {
            code,
            detail: detail.into(),
        }
    }

    pub fn internal(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Internal {
            code,
            detail: detail.into(),
        }
    }

    pub fn db_unavailable(detail: impl Into<String>) -> Self {
        Self::DbUnavailable {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let lower = word.to_ascii_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(detail) => AppError::invalid(ErrorCode::ValidationError, detail),
            DomainError::NotFound(kind, detail) => {
                let code = match kind {
                    NotFoundKind::Lobby => ErrorCode::LobbyNotFound,
                    NotFoundKind::Invitation => ErrorCode::InvitationNotFound,
                    NotFoundKind::Session => ErrorCode::SessionNotFound,
                    NotFoundKind::Round => ErrorCode::RoundNotFound,
                    NotFoundKind::Score => ErrorCode::ScoreNotFound,
                    NotFoundKind::User => ErrorCode::UserNotFound,
                    NotFoundKind::Player => ErrorCode::PlayerNotInLobby,
                    _ => ErrorCode::NotFound,
                };
                AppError::not_found(code, detail)
            }
            DomainError::Conflict(kind, detail) => {
                let code = match kind {
                    ConflictKind::LobbyCodeTaken => ErrorCode::LobbyCodeTaken,
                    ConflictKind::LobbyFull => ErrorCode::LobbyFull,
                    ConflictKind::InvitationExists => ErrorCode::InvitationExists,
                    ConflictKind::ActiveSessionExists => ErrorCode::ActiveSessionExists,
                    ConflictKind::EndingExists => ErrorCode::EndingExists,
                    ConflictKind::OptimisticLock => ErrorCode::OptimisticLock,
                    ConflictKind::QuestionAlreadyUsed => ErrorCode::QuestionAlreadyUsed,
                    ConflictKind::Other(ref s) if s == "Unique" => ErrorCode::UniqueViolation,
                    _ => ErrorCode::Conflict,
                };
                AppError::conflict(code, detail)
            }
            DomainError::InvalidState(kind, detail) => {
                let code = match kind {
                    InvalidStateKind::LobbyStatus => ErrorCode::LobbyStatusInvalid,
                    InvalidStateKind::InvitationNotPending => ErrorCode::InvitationNotPending,
                    InvalidStateKind::SessionInactive => ErrorCode::SessionInactive,
                    InvalidStateKind::BattleNotStarted => ErrorCode::BattleNotStarted,
                    InvalidStateKind::OutOfTurn => ErrorCode::OutOfTurn,
                    InvalidStateKind::CardLocked => ErrorCode::CardLocked,
                    InvalidStateKind::UserBanned => ErrorCode::UserBanned,
                    _ => ErrorCode::InvalidState,
                };
                AppError::invalid_state(code, detail)
            }
            DomainError::Infra(kind, detail) => match kind {
                InfraErrorKind::DbUnavailable => AppError::db_unavailable(detail),
                InfraErrorKind::Timeout => AppError::Timeout { detail },
                InfraErrorKind::DataCorruption => {
                    AppError::internal(ErrorCode::DataCorruption, detail)
                }
                _ => AppError::internal(ErrorCode::DbError, detail),
            },
            DomainError::External(detail) => AppError::External { detail },
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(e: sea_orm::DbErr) -> Self {
        crate::infra::db_errors::map_db_err(e).into()
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let code = self.code().as_str();
        let trace_id = trace_ctx::trace_id();

        let problem = ProblemDetails {
            type_: format!("https://battle.study/errors/{code}"),
            title: Self::humanize_code(code),
            status: status.as_u16(),
            detail: self.detail(),
            code: code.to_string(),
            trace_id: trace_id.clone(),
        };

        let mut builder = HttpResponse::build(status);
        builder
            .content_type("application/problem+json")
            .insert_header(("x-trace-id", trace_id));
        if matches!(self, AppError::DbUnavailable { .. }) {
            builder.insert_header(("Retry-After", "1"));
        }
        builder.json(problem)
    }
}
