//! Match end, end status and ban status under `/battle`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::db::txn::with_txn;
use crate::domain::resolver::SessionSelector;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::{SessionPath, ValidatedJson};
use crate::repos::endings::EndReason;
use crate::routes::{publish_ended, selector_key};
use crate::services::bans::BanService;
use crate::services::endings::{EndRequest, EndingService, MatchSummary};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct EndBody {
    #[serde(default)]
    pub session_uuid: Option<Uuid>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub lobby_code: Option<String>,
    #[serde(default)]
    pub winner_id: Option<i64>,
    pub reason: EndReason,
    #[serde(default)]
    pub leaver_id: Option<i64>,
}

async fn end_once(app_state: &AppState, req: EndRequest) -> Result<MatchSummary, AppError> {
    with_txn(app_state, |txn| {
        Box::pin(async move { EndingService::new().end(txn, req).await })
    })
    .await
}

/// POST /battle/end
///
/// A concurrent end that commits first makes this insert fail on the
/// unique ending; the retry then reads the stored ending.
async fn end_battle(
    app_state: web::Data<AppState>,
    body: ValidatedJson<EndBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let req = EndRequest {
        key: selector_key(&SessionSelector {
            session_uuid: body.session_uuid,
            session_id: body.session_id,
            lobby_code: body.lobby_code,
        })?,
        winner_id: body.winner_id,
        reason: body.reason,
        leaver_id: body.leaver_id,
    };

    let summary = match end_once(&app_state, req.clone()).await {
        Err(AppError::Conflict {
            code: ErrorCode::EndingExists,
            ..
        }) => {
            debug!(key = ?req.key, "Lost race to end the battle; reading stored ending");
            end_once(&app_state, req).await?
        }
        other => other?,
    };

    if !summary.already_ended {
        publish_ended(&app_state, &summary).await;
    }
    Ok(HttpResponse::Ok().json(summary))
}

/// GET /battle/end-status/{key}
async fn end_status(
    app_state: web::Data<AppState>,
    key: SessionPath,
) -> Result<HttpResponse, AppError> {
    let status = with_txn(&app_state, |txn| {
        Box::pin(async move { EndingService::new().end_status(txn, &key.0).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(status))
}

/// GET /battle/ban-status/{user_id}
async fn ban_status(
    app_state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let status = with_txn(&app_state, |txn| {
        Box::pin(async move { BanService::new().check(txn, user_id).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(status))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/end").route(web::post().to(end_battle)))
        .service(web::resource("/end-status/{key}").route(web::get().to(end_status)))
        .service(web::resource("/ban-status/{user_id}").route(web::get().to(ban_status)));
}
