//! Round and card-effect routes under `/battle/round` and `/battle/effects`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::txn::with_txn;
use crate::domain::EffectKind;
use crate::error::AppError;
use crate::extractors::{SessionUuid, ValidatedJson};
use crate::routes::{parse_card, parse_role, publish_ended, publish_state};
use crate::services::rounds::{PlayRequest, RoundService};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct SessionBody {
    pub session_uuid: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PlayBody {
    pub session_uuid: Uuid,
    pub role: String,
    #[serde(default)]
    pub card_id: Option<String>,
    pub is_correct: bool,
    #[serde(default)]
    pub lobby_code: Option<String>,
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeBody {
    pub session_uuid: Uuid,
    pub role: String,
    pub kind: EffectKind,
    #[serde(default)]
    pub effect_id: Option<Uuid>,
}

/// POST /battle/round/init
async fn init_round(
    app_state: web::Data<AppState>,
    body: ValidatedJson<SessionBody>,
) -> Result<HttpResponse, AppError> {
    let session_uuid = body.session_uuid;
    let round = with_txn(&app_state, |txn| {
        Box::pin(async move { RoundService::new().init_round(txn, session_uuid).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(round))
}

/// POST /battle/round/play
async fn play(
    app_state: web::Data<AppState>,
    body: ValidatedJson<PlayBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let req = PlayRequest {
        session_uuid: body.session_uuid,
        role: parse_role(&body.role)?,
        card: parse_card(body.card_id.as_deref())?,
        is_correct: body.is_correct,
        lobby_code: body.lobby_code,
        question_id: body.question_id,
        expected_version: body.expected_version,
    };
    let result = with_txn(&app_state, |txn| {
        Box::pin(async move { RoundService::new().play(txn, req).await })
    })
    .await?;

    publish_state(&app_state, &result.session).await;
    if let Some(summary) = &result.ending {
        publish_ended(&app_state, summary).await;
    }
    Ok(HttpResponse::Ok().json(result))
}

/// GET /battle/round/{session_uuid}
async fn get_round(
    app_state: web::Data<AppState>,
    session_uuid: SessionUuid,
) -> Result<HttpResponse, AppError> {
    let round = with_txn(&app_state, |txn| {
        Box::pin(async move { RoundService::new().get_round(txn, session_uuid.0).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(round))
}

/// POST /battle/effects/consume
async fn consume_effect(
    app_state: web::Data<AppState>,
    body: ValidatedJson<ConsumeBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let role = parse_role(&body.role)?;
    let result = with_txn(&app_state, |txn| {
        Box::pin(async move {
            RoundService::new()
                .consume_effect(txn, body.session_uuid, role, body.kind, body.effect_id)
                .await
        })
    })
    .await?;

    publish_state(&app_state, &result.session).await;
    Ok(HttpResponse::Ok().json(result))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/init").route(web::post().to(init_round)))
        .service(web::resource("/play").route(web::post().to(play)))
        .service(web::resource("/{session_uuid}").route(web::get().to(get_round)));
}

pub fn configure_effect_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/consume").route(web::post().to(consume_effect)));
}
