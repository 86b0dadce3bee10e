use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::resolver::SessionKey;
use crate::error::AppError;
use crate::errors::ErrorCode;

/// Session selector from a single `{key}` path segment: a uuid, a numeric
/// id, or a lobby code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPath(pub SessionKey);

impl FromRequest for SessionPath {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("key").unwrap_or_default();
        ready(
            SessionKey::parse_path(raw)
                .map(SessionPath)
                .map_err(|e| AppError::invalid(ErrorCode::InvalidSessionSelector, e.to_string())),
        )
    }
}

/// Session uuid from a `{session_uuid}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUuid(pub Uuid);

impl FromRequest for SessionUuid {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("session_uuid").unwrap_or_default();
        ready(Uuid::parse_str(raw.trim()).map(SessionUuid).map_err(|_| {
            AppError::invalid(
                ErrorCode::InvalidSessionSelector,
                format!("Invalid session uuid: {raw}"),
            )
        }))
    }
}
