//! Battle session routes under `/battle/session`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::txn::with_txn;
use crate::domain::lobby::{Difficulty, LobbyStatus};
use crate::domain::resolver::SessionSelector;
use crate::error::AppError;
use crate::extractors::{LobbyCode, ValidatedJson};
use crate::repos::sessions::SessionSettings;
use crate::routes::{parse_role, publish_state, selector_key};
use crate::services::sessions::SessionService;
use crate::state::app_state::AppState;
use crate::ws::protocol::ServerMsg;

#[derive(Debug, Deserialize)]
pub struct InitSessionRequest {
    pub lobby_code: String,
    pub host_id: i64,
    pub guest_id: i64,
    #[serde(default)]
    pub settings: Option<InitSettings>,
}

#[derive(Debug, Deserialize)]
pub struct InitSettings {
    #[serde(default)]
    pub difficulty_mode: Option<Difficulty>,
    #[serde(default)]
    pub study_material_id: Option<String>,
    #[serde(default)]
    pub question_types: Vec<String>,
}

impl From<InitSettings> for SessionSettings {
    fn from(s: InitSettings) -> Self {
        SessionSettings {
            difficulty_mode: s.difficulty_mode,
            study_material_id: s.study_material_id,
            question_types: s.question_types,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub session_uuid: Option<Uuid>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub lobby_code: Option<String>,
    pub role: String,
    #[serde(default = "entered")]
    pub in_battle: bool,
}

fn entered() -> bool {
    true
}

/// POST /battle/session/init
async fn init_session(
    app_state: web::Data<AppState>,
    body: ValidatedJson<InitSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let session = with_txn(&app_state, |txn| {
        Box::pin(async move {
            SessionService::new()
                .initialize(
                    txn,
                    &req.lobby_code,
                    req.host_id,
                    req.guest_id,
                    req.settings.map(SessionSettings::from),
                )
                .await
        })
    })
    .await?;

    publish_state(&app_state, &session).await;
    Ok(HttpResponse::Ok().json(session))
}

/// PUT /battle/session/update
async fn update_session(
    app_state: web::Data<AppState>,
    body: ValidatedJson<UpdateSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let role = parse_role(&req.role)?;
    let key = selector_key(&SessionSelector {
        session_uuid: req.session_uuid,
        session_id: req.session_id,
        lobby_code: req.lobby_code,
    })?;
    let in_battle = req.in_battle;

    let outcome = with_txn(&app_state, |txn| {
        Box::pin(async move {
            SessionService::new()
                .player_enters(txn, &key, role, in_battle)
                .await
        })
    })
    .await?;

    let session = &outcome.session;
    let realtime = &app_state.realtime;
    realtime.mark_in_battle(session.seats().id_of(role), &session.lobby_code, in_battle);
    publish_state(&app_state, session).await;
    if outcome.started_now {
        realtime
            .to_lobby(
                &session.lobby_code,
                ServerMsg::LobbyStatusChanged {
                    lobby_code: session.lobby_code.clone(),
                    status: LobbyStatus::InProgress,
                },
            )
            .await;
    }
    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /battle/session/{code}
async fn get_session(
    app_state: web::Data<AppState>,
    code: LobbyCode,
) -> Result<HttpResponse, AppError> {
    let session = with_txn(&app_state, |txn| {
        Box::pin(async move { SessionService::new().get_for_lobby(txn, &code.0).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(session))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/init").route(web::post().to(init_session)))
        .service(web::resource("/update").route(web::put().to(update_session)))
        .service(web::resource("/{code}").route(web::get().to(get_session)));
}
