use battle_backend::db::txn::with_txn;
use battle_backend::domain::invitation::{InvitationStatus, Response};
use battle_backend::domain::lobby::{LobbySettings, LobbyStatus};
use battle_backend::errors::ErrorCode;
use battle_backend::services::invitations::InvitationService;
use battle_backend::services::lobbies::LobbyService;
use battle_backend::state::app_state::AppState;
use backend_test_support::unique_helpers::{unique_lobby_code, unique_user_id};

use crate::support::factory::player;
use crate::support::test_state::build_test_state;

async fn open_lobby(state: &AppState, host: i64) -> String {
    let code = unique_lobby_code();
    let c = code.clone();
    with_txn(state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .create_lobby(txn, Some(&c), player(host), LobbySettings::default())
                .await
        })
    })
    .await
    .unwrap();
    code
}

async fn invite(
    state: &AppState,
    code: &str,
    sender: i64,
    receiver: i64,
) -> Result<battle_backend::repos::invitations::Invitation, battle_backend::AppError> {
    let code = code.to_string();
    with_txn(state, |txn| {
        Box::pin(async move {
            InvitationService::new()
                .create_invitation(txn, &code, player(sender), player(receiver), None)
                .await
        })
    })
    .await
}

async fn respond(
    state: &AppState,
    code: &str,
    sender: i64,
    receiver: i64,
    response: Response,
) -> Result<battle_backend::services::invitations::RespondOutcome, battle_backend::AppError> {
    let code = code.to_string();
    with_txn(state, |txn| {
        Box::pin(async move {
            InvitationService::new()
                .respond(txn, &code, sender, receiver, response)
                .await
        })
    })
    .await
}

#[actix_web::test]
async fn invitation_is_created_pending() {
    let state = build_test_state().await;
    let (host, friend) = (unique_user_id(), unique_user_id());
    let code = open_lobby(&state, host).await;

    let inv = invite(&state, &code.to_ascii_lowercase(), host, friend).await.unwrap();
    assert_eq!(inv.lobby_code, code);
    assert_eq!(inv.status, InvitationStatus::Pending);
    assert_eq!(inv.receiver_id, Some(friend));

    let dup = invite(&state, &code, host, friend).await.unwrap_err();
    assert_eq!(dup.code(), ErrorCode::InvitationExists);
}

#[actix_web::test]
async fn only_host_may_invite() {
    let state = build_test_state().await;
    let (host, other, friend) = (unique_user_id(), unique_user_id(), unique_user_id());
    let code = open_lobby(&state, host).await;

    let err = invite(&state, &code, other, friend).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidRole);

    let err = invite(&state, &code, host, host).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[actix_web::test]
async fn declined_invitation_can_be_resent() {
    let state = build_test_state().await;
    let (host, friend) = (unique_user_id(), unique_user_id());
    let code = open_lobby(&state, host).await;

    invite(&state, &code, host, friend).await.unwrap();
    let declined = respond(&state, &code, host, friend, Response::Declined).await.unwrap();
    assert_eq!(declined.invitation.status, InvitationStatus::Declined);
    assert!(declined.lobby.is_none());

    // A second answer to the same invitation is refused.
    let again = respond(&state, &code, host, friend, Response::Accepted).await.unwrap_err();
    assert_eq!(again.code(), ErrorCode::InvitationNotPending);

    let fresh = invite(&state, &code, host, friend).await.unwrap();
    assert_eq!(fresh.status, InvitationStatus::Pending);
}

#[actix_web::test]
async fn accepting_seats_the_receiver() {
    let state = build_test_state().await;
    let (host, friend) = (unique_user_id(), unique_user_id());
    let code = open_lobby(&state, host).await;

    let c = code.clone();
    with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().set_ready(txn, &c, host, true).await })
    })
    .await
    .unwrap();

    invite(&state, &code, host, friend).await.unwrap();
    let accepted = respond(&state, &code, host, friend, Response::Accepted).await.unwrap();
    assert_eq!(accepted.invitation.status, InvitationStatus::Accepted);

    let lobby = accepted.lobby.expect("accept returns the lobby");
    assert_eq!(lobby.guest.map(|g| g.id), Some(friend));
    assert!(lobby.guest_ready);
    assert_eq!(lobby.status, LobbyStatus::Ready);

    // Once seated, nobody else can be invited.
    let late = invite(&state, &code, host, unique_user_id()).await.unwrap_err();
    assert_eq!(late.code(), ErrorCode::LobbyStatusInvalid);
}

#[actix_web::test]
async fn missing_invitation_is_not_found() {
    let state = build_test_state().await;
    let host = unique_user_id();
    let code = open_lobby(&state, host).await;

    let err = respond(&state, &code, host, unique_user_id(), Response::Accepted)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvitationNotFound);
}
