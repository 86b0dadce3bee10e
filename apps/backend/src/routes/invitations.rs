//! Invitation routes under `/battle/invitation`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::db::txn::with_txn;
use crate::domain::invitation::Response;
use crate::domain::lobby::{LobbySettings, PlayerProfile};
use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::routes::parse_response;
use crate::services::invitations::InvitationService;
use crate::state::app_state::AppState;
use crate::ws::protocol::ServerMsg;

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub lobby_code: String,
    pub sender: PlayerProfile,
    pub receiver: PlayerProfile,
    #[serde(default)]
    pub settings: Option<LobbySettings>,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub lobby_code: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: String,
}

/// POST /battle/invitation
async fn create_invitation(
    app_state: web::Data<AppState>,
    body: ValidatedJson<CreateInvitationRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let invitation = with_txn(&app_state, |txn| {
        Box::pin(async move {
            InvitationService::new()
                .create_invitation(txn, &req.lobby_code, req.sender, req.receiver, req.settings)
                .await
        })
    })
    .await?;

    if let Some(receiver_id) = invitation.receiver_id {
        let realtime = &app_state.realtime;
        realtime
            .to_user(
                receiver_id,
                ServerMsg::BattleInvitation {
                    lobby_code: invitation.lobby_code.clone(),
                    sender_id: invitation.sender_id,
                    receiver_id,
                    payload: serde_json::to_value(&invitation).unwrap_or_default(),
                },
            )
            .await;
        realtime
            .to_user(
                invitation.sender_id,
                ServerMsg::BattleInvitationSent {
                    lobby_code: invitation.lobby_code.clone(),
                    sender_id: invitation.sender_id,
                    receiver_id,
                },
            )
            .await;
    }
    Ok(HttpResponse::Created().json(invitation))
}

/// PUT /battle/invitation/status
async fn respond(
    app_state: web::Data<AppState>,
    body: ValidatedJson<RespondRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let response = parse_response(&req.status)?;
    let (sender_id, receiver_id) = (req.sender_id, req.receiver_id);

    let outcome = with_txn(&app_state, |txn| {
        Box::pin(async move {
            InvitationService::new()
                .respond(txn, &req.lobby_code, req.sender_id, req.receiver_id, response)
                .await
        })
    })
    .await?;

    let lobby_code = outcome.invitation.lobby_code.clone();
    let event = match response {
        Response::Accepted => Some(ServerMsg::BattleInvitationAccepted {
            lobby_code: lobby_code.clone(),
            sender_id,
            receiver_id,
        }),
        Response::Declined => Some(ServerMsg::BattleInvitationDeclined {
            lobby_code: lobby_code.clone(),
            sender_id,
            receiver_id,
        }),
        Response::Expired => None,
    };
    if let Some(event) = event {
        app_state.realtime.to_user(sender_id, event).await;
    }
    if let Some(lobby) = &outcome.lobby {
        app_state
            .realtime
            .to_lobby(
                &lobby_code,
                ServerMsg::LobbyStatusChanged {
                    lobby_code: lobby_code.clone(),
                    status: lobby.status,
                },
            )
            .await;
    }
    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /battle/invitation/{lobby_code}/{sender}/{receiver}
async fn get_invitation(
    app_state: web::Data<AppState>,
    path: web::Path<(String, i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (code, sender_id, receiver_id) = path.into_inner();
    let invitation = with_txn(&app_state, |txn| {
        Box::pin(async move {
            InvitationService::new()
                .get_invitation(txn, &code, sender_id, receiver_id)
                .await
        })
    })
    .await?;
    Ok(HttpResponse::Ok().json(invitation))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_invitation)))
        .service(web::resource("/status").route(web::put().to(respond)))
        .service(
            web::resource("/{lobby_code}/{sender}/{receiver}").route(web::get().to(get_invitation)),
        );
}
