//! HTTP routes. Handlers run one transaction through a service, then
//! publish realtime hints once it has committed.

use actix_web::web;

use crate::domain::invitation::Response;
use crate::domain::resolver::{SessionKey, SessionSelector};
use crate::domain::{CardKind, Role};
use crate::error::AppError;
use crate::errors::{DomainError, ErrorCode};
use crate::repos::sessions::Session;
use crate::services::endings::MatchSummary;
use crate::state::app_state::AppState;
use crate::ws::protocol::ServerMsg;

pub mod endings;
pub mod health;
pub mod invitations;
pub mod lobby;
pub mod realtime;
pub mod rounds;
pub mod scores;
pub mod sessions;

/// Register every route. `main` and the test app builder share this.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes))
        .service(web::scope("/ws").configure(realtime::configure_routes))
        .service(web::scope("/lobby").configure(lobby::configure_routes))
        .service(
            web::scope("/battle")
                .service(web::scope("/invitation").configure(invitations::configure_routes))
                .service(web::scope("/session").configure(sessions::configure_routes))
                .service(web::scope("/round").configure(rounds::configure_routes))
                .service(web::scope("/effects").configure(rounds::configure_effect_routes))
                .service(web::scope("/score").configure(scores::configure_routes))
                .configure(endings::configure_routes),
        );
}

/// Input-parsing failures keep their message but carry a sharper code.
fn reject(code: ErrorCode, err: DomainError) -> AppError {
    match err {
        DomainError::Validation(detail) => AppError::invalid(code, detail),
        other => other.into(),
    }
}

pub(crate) fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse().map_err(|e| reject(ErrorCode::InvalidRole, e))
}

pub(crate) fn parse_card(raw: Option<&str>) -> Result<Option<CardKind>, AppError> {
    CardKind::parse_optional(raw).map_err(|e| reject(ErrorCode::UnknownCard, e))
}

pub(crate) fn parse_response(raw: &str) -> Result<Response, AppError> {
    raw.parse().map_err(|e| reject(ErrorCode::InvalidStatus, e))
}

pub(crate) fn selector_key(selector: &SessionSelector) -> Result<SessionKey, AppError> {
    selector
        .key()
        .map_err(|e| reject(ErrorCode::InvalidSessionSelector, e))
}

pub(crate) async fn publish_state(app_state: &AppState, session: &Session) {
    app_state
        .realtime
        .to_lobby(
            &session.lobby_code,
            ServerMsg::BattleStateChanged {
                lobby_code: session.lobby_code.clone(),
                session_uuid: session.session_uuid,
                version: session.version,
            },
        )
        .await;
}

/// Clear both players' in-game markers and announce the ending.
pub(crate) async fn publish_ended(app_state: &AppState, summary: &MatchSummary) {
    let ending = &summary.ending;
    let realtime = &app_state.realtime;
    realtime.mark_in_battle(summary.host_id, &ending.lobby_code, false);
    realtime.mark_in_battle(summary.guest_id, &ending.lobby_code, false);
    realtime
        .to_lobby(
            &ending.lobby_code,
            ServerMsg::BattleEnded {
                lobby_code: ending.lobby_code.clone(),
                session_uuid: ending.session_uuid,
                winner_id: ending.winner_id,
                reason: ending.battle_end_reason,
            },
        )
        .await;
}
