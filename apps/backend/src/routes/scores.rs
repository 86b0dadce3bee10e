//! Score routes under `/battle/score`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::txn::with_txn;
use crate::error::AppError;
use crate::extractors::{SessionUuid, ValidatedJson};
use crate::routes::{parse_role, publish_ended, publish_state};
use crate::services::scores::ScoreService;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitScoreBody {
    pub session_uuid: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScoreBody {
    pub session_uuid: Uuid,
    pub role: String,
    pub delta: i32,
}

/// POST /battle/score/init
async fn init_score(
    app_state: web::Data<AppState>,
    body: ValidatedJson<InitScoreBody>,
) -> Result<HttpResponse, AppError> {
    let session_uuid = body.session_uuid;
    let score = with_txn(&app_state, |txn| {
        Box::pin(async move { ScoreService::new().init_score(txn, session_uuid).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(score))
}

/// GET /battle/score/{session_uuid}
async fn get_score(
    app_state: web::Data<AppState>,
    session_uuid: SessionUuid,
) -> Result<HttpResponse, AppError> {
    let score = with_txn(&app_state, |txn| {
        Box::pin(async move { ScoreService::new().get_score(txn, session_uuid.0).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(score))
}

/// POST /battle/score/update
async fn update_score(
    app_state: web::Data<AppState>,
    body: ValidatedJson<UpdateScoreBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let role = parse_role(&body.role)?;
    let update = with_txn(&app_state, |txn| {
        Box::pin(async move {
            ScoreService::new()
                .update_score(txn, body.session_uuid, role, body.delta)
                .await
        })
    })
    .await?;

    publish_state(&app_state, &update.session).await;
    if let Some(summary) = &update.ending {
        publish_ended(&app_state, summary).await;
    }
    Ok(HttpResponse::Ok().json(update))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/init").route(web::post().to(init_score)))
        .service(web::resource("/update").route(web::post().to(update_score)))
        .service(web::resource("/{session_uuid}").route(web::get().to(get_score)));
}
