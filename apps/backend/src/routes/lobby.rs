//! Lobby routes under `/lobby`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::domain::lobby::{LobbySettings, LobbyStatus, PlayerProfile};
use crate::error::AppError;
use crate::extractors::{LobbyCode, ValidatedJson};
use crate::routes::parse_role;
use crate::services::lobbies::LobbyService;
use crate::state::app_state::AppState;
use crate::ws::protocol::ServerMsg;

#[derive(Debug, Deserialize)]
pub struct CreateLobbyRequest {
    #[serde(default)]
    pub lobby_code: Option<String>,
    pub host: PlayerProfile,
    #[serde(default, flatten)]
    pub settings: LobbySettings,
}

#[derive(Debug, Deserialize)]
pub struct JoinLobbyRequest {
    pub lobby_code: String,
    pub guest: PlayerProfile,
}

#[derive(Debug, Deserialize)]
pub struct ReadyRequest {
    pub lobby_code: String,
    pub player_id: i64,
    pub is_ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub lobby_code: String,
    pub player_id: i64,
    #[serde(flatten)]
    pub settings: LobbySettings,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub lobby_code: String,
    pub status: LobbyStatus,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub lobby_code: String,
    pub player_id: i64,
    pub role: String,
}

/// POST /lobby
async fn create_lobby(
    app_state: web::Data<AppState>,
    body: ValidatedJson<CreateLobbyRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let lobby = with_txn(&app_state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .create_lobby(txn, req.lobby_code.as_deref(), req.host, req.settings)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Created().json(lobby))
}

/// GET /lobby/{code}
async fn get_lobby(
    app_state: web::Data<AppState>,
    code: LobbyCode,
) -> Result<HttpResponse, AppError> {
    let lobby = with_txn(&app_state, |txn| {
        Box::pin(async move { LobbyService::new().get_lobby(txn, &code.0).await })
    })
    .await?;
    Ok(HttpResponse::Ok().json(lobby))
}

/// POST /lobby/join
async fn join_lobby(
    app_state: web::Data<AppState>,
    body: ValidatedJson<JoinLobbyRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let player = serde_json::to_value(&req.guest).ok();
    let outcome = with_txn(&app_state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .join_lobby(txn, &req.lobby_code, req.guest)
                .await
        })
    })
    .await?;

    if let Some(guest) = &outcome.lobby.guest {
        app_state
            .realtime
            .to_lobby(
                &outcome.lobby.code,
                ServerMsg::PlayerJoinedLobby {
                    lobby_code: outcome.lobby.code.clone(),
                    user_id: guest.id,
                    player,
                },
            )
            .await;
    }
    Ok(HttpResponse::Ok().json(outcome))
}

/// PUT /lobby/ready
async fn set_ready(
    app_state: web::Data<AppState>,
    body: ValidatedJson<ReadyRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let (player_id, is_ready) = (req.player_id, req.is_ready);
    let outcome = with_txn(&app_state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .set_ready(txn, &req.lobby_code, req.player_id, req.is_ready)
                .await
        })
    })
    .await?;

    let code = outcome.lobby.code.clone();
    app_state
        .realtime
        .to_lobby(
            &code,
            ServerMsg::PlayerReadyStateChanged {
                lobby_code: code.clone(),
                user_id: player_id,
                is_ready,
            },
        )
        .await;
    if outcome.status_changed {
        app_state
            .realtime
            .to_lobby(
                &code,
                ServerMsg::LobbyStatusChanged {
                    lobby_code: code.clone(),
                    status: outcome.lobby.status,
                },
            )
            .await;
    }
    Ok(HttpResponse::Ok().json(outcome))
}

/// PUT /lobby/settings
async fn update_settings(
    app_state: web::Data<AppState>,
    body: ValidatedJson<SettingsRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let player_id = req.player_id;
    let (lobby, before) = with_txn(&app_state, |txn| {
        Box::pin(async move {
            let service = LobbyService::new();
            let before = service.get_lobby(txn, &req.lobby_code).await?.settings;
            let lobby = service
                .update_settings(txn, &req.lobby_code, req.player_id, req.settings)
                .await?;
            Ok((lobby, before))
        })
    })
    .await?;

    let after = &lobby.settings;
    if after.question_types != before.question_types {
        app_state
            .realtime
            .to_lobby(
                &lobby.code,
                ServerMsg::QuestionTypesChanged {
                    lobby_code: lobby.code.clone(),
                    user_id: player_id,
                    question_types: after.question_types.clone(),
                },
            )
            .await;
    }
    if after.study_material_id != before.study_material_id
        || after.study_material_title != before.study_material_title
    {
        app_state
            .realtime
            .to_lobby(
                &lobby.code,
                ServerMsg::StudyMaterialChanged {
                    lobby_code: lobby.code.clone(),
                    user_id: player_id,
                    study_material_id: after.study_material_id.clone(),
                    study_material_title: after.study_material_title.clone(),
                },
            )
            .await;
    }
    Ok(HttpResponse::Ok().json(lobby))
}

/// PUT /lobby/status
async fn update_status(
    app_state: web::Data<AppState>,
    body: ValidatedJson<StatusRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let (lobby, changed) = with_txn(&app_state, |txn| {
        Box::pin(async move {
            let service = LobbyService::new();
            let before = service.get_lobby(txn, &req.lobby_code).await?.status;
            let lobby = service.update_status(txn, &req.lobby_code, req.status).await?;
            Ok((lobby, before != req.status))
        })
    })
    .await?;

    if changed {
        app_state
            .realtime
            .to_lobby(
                &lobby.code,
                ServerMsg::LobbyStatusChanged {
                    lobby_code: lobby.code.clone(),
                    status: lobby.status,
                },
            )
            .await;
    }
    Ok(HttpResponse::Ok().json(lobby))
}

/// POST /lobby/leave
async fn leave_lobby(
    app_state: web::Data<AppState>,
    body: ValidatedJson<LeaveRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let role = parse_role(&req.role)?;
    let player_id = req.player_id;
    let lobby = with_txn(&app_state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .leave_lobby(txn, &req.lobby_code, req.player_id, role)
                .await
        })
    })
    .await?;

    app_state
        .realtime
        .to_lobby(
            &lobby.code,
            ServerMsg::PlayerLeftLobby {
                lobby_code: lobby.code.clone(),
                user_id: player_id,
            },
        )
        .await;
    app_state
        .realtime
        .to_lobby(
            &lobby.code,
            ServerMsg::LobbyStatusChanged {
                lobby_code: lobby.code.clone(),
                status: lobby.status,
            },
        )
        .await;
    Ok(HttpResponse::Ok().json(lobby))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_lobby)))
        .service(web::resource("/join").route(web::post().to(join_lobby)))
        .service(web::resource("/ready").route(web::put().to(set_ready)))
        .service(web::resource("/settings").route(web::put().to(update_settings)))
        .service(web::resource("/status").route(web::put().to(update_status)))
        .service(web::resource("/leave").route(web::post().to(leave_lobby)))
        .service(web::resource("/{code}").route(web::get().to(get_lobby)));
}
