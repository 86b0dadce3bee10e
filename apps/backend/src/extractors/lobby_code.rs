use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::domain::lobby::validate_code;
use crate::error::AppError;
use crate::errors::ErrorCode;

/// Lobby code from a `{code}` or `{lobby_code}` path segment, upper-cased
/// and checked against the code format. Existence is not checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyCode(pub String);

impl FromRequest for LobbyCode {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req
            .match_info()
            .get("code")
            .or_else(|| req.match_info().get("lobby_code"));
        ready(match raw {
            None => Err(AppError::bad_request(
                ErrorCode::InvalidLobbyCode,
                "Missing lobby code parameter",
            )),
            Some(raw) => validate_code(raw)
                .map(LobbyCode)
                .map_err(|e| AppError::invalid(ErrorCode::InvalidLobbyCode, e.to_string())),
        })
    }
}
