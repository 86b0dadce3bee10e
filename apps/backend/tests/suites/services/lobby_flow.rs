use battle_backend::db::txn::with_txn;
use battle_backend::domain::invitation::InvitationStatus;
use battle_backend::domain::lobby::{LobbySettings, LobbyStatus};
use battle_backend::domain::Role;
use battle_backend::errors::ErrorCode;
use battle_backend::repos::invitations;
use battle_backend::repos::lobbies::{self, LobbyUpdate};
use battle_backend::services::lobbies::LobbyService;
use battle_backend::AppError;
use backend_test_support::unique_helpers::{unique_lobby_code, unique_user_id};

use crate::support::factory::{player, seated_pair, seed_profile};
use crate::support::test_state::build_test_state;

#[actix_web::test]
async fn create_lobby_generates_a_valid_code() {
    let state = build_test_state().await;
    let host = unique_user_id();

    let lobby = with_txn(&state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .create_lobby(txn, None, player(host), LobbySettings::default())
                .await
        })
    })
    .await
    .unwrap();

    assert_eq!(lobby.code.len(), 6);
    assert!(lobby.code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(lobby.status, LobbyStatus::Waiting);
    assert!(lobby.guest.is_none());
}

#[actix_web::test]
async fn duplicate_code_is_rejected() {
    let state = build_test_state().await;
    let code = unique_lobby_code();
    let (a, b) = (unique_user_id(), unique_user_id());

    let c = code.clone();
    with_txn(&state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .create_lobby(txn, Some(&c), player(a), LobbySettings::default())
                .await
        })
    })
    .await
    .unwrap();

    let lower = code.to_ascii_lowercase();
    let err = with_txn(&state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .create_lobby(txn, Some(&lower), player(b), LobbySettings::default())
                .await
        })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LobbyCodeTaken);
}

#[actix_web::test]
async fn join_seats_guest_with_accepted_invitation() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let code = pair.lobby_code.clone();
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().get_lobby(txn, &code).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.guest.as_ref().map(|g| g.id), Some(pair.guest_id));
    assert_eq!(lobby.status, LobbyStatus::Waiting);
    assert!(!lobby.guest_ready);

    let (code, host, guest) = (pair.lobby_code.clone(), pair.host_id, pair.guest_id);
    let invitation = with_txn(&state, |txn| {
        Box::pin(async move { Ok(invitations::find_latest(txn, &code, host, guest).await?) })
    })
    .await
    .unwrap()
    .expect("join records an invitation");
    assert_eq!(invitation.status, InvitationStatus::Accepted);
    assert!(!invitation.guest_ready);
    assert!(!invitation.host_ready);

    // Repeating the join returns the same state.
    let (code, guest) = (pair.lobby_code.clone(), pair.guest_id);
    let again = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().join_lobby(txn, &code, player(guest)).await })
    })
    .await
    .unwrap();
    assert_eq!(again.invitation.status, InvitationStatus::Accepted);
    assert_eq!(again.invitation.receiver_id, Some(pair.guest_id));
}

#[actix_web::test]
async fn join_rejects_host_and_third_player() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let (code, host) = (pair.lobby_code.clone(), pair.host_id);
    let err = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().join_lobby(txn, &code, player(host)).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CannotJoinOwnLobby);

    let code = pair.lobby_code.clone();
    let third = unique_user_id();
    let err = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().join_lobby(txn, &code, player(third)).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LobbyFull);
}

#[actix_web::test]
async fn ready_flags_converge_status() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let set = |player_id: i64, ready: bool| {
        let code = pair.lobby_code.clone();
        let state = &state;
        async move {
            with_txn(state, |txn| {
                Box::pin(async move {
                    LobbyService::new().set_ready(txn, &code, player_id, ready).await
                })
            })
            .await
        }
    };

    let first = set(pair.host_id, true).await.unwrap();
    assert_eq!(first.lobby.status, LobbyStatus::Waiting);
    assert!(!first.status_changed);

    let second = set(pair.guest_id, true).await.unwrap();
    assert_eq!(second.role, Role::Guest);
    assert_eq!(second.lobby.status, LobbyStatus::Ready);
    assert!(second.status_changed);

    let third = set(pair.host_id, false).await.unwrap();
    assert_eq!(third.lobby.status, LobbyStatus::Waiting);
    assert!(third.status_changed);

    let outsider = set(unique_user_id(), true).await.unwrap_err();
    assert_eq!(outsider.code(), ErrorCode::PlayerNotInLobby);
}

#[actix_web::test]
async fn ready_status_follows_the_stored_flags() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    // Both flags committed while the status still reads waiting, as left by
    // two players readying at the same moment.
    let code = pair.lobby_code.clone();
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move {
            let lobby = lobbies::require_by_code(txn, &code).await?;
            let update = LobbyUpdate::new(lobby.id)
                .with_host_ready(true)
                .with_guest_ready(true);
            Ok(lobbies::update_lobby(txn, update).await?)
        })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::Waiting);

    let code = pair.lobby_code.clone();
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().reconverge(txn, &code).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::Ready);

    let (code, host, guest) = (pair.lobby_code.clone(), pair.host_id, pair.guest_id);
    let invitation = with_txn(&state, |txn| {
        Box::pin(async move { Ok(invitations::find_latest(txn, &code, host, guest).await?) })
    })
    .await
    .unwrap()
    .expect("invitation");
    assert!(invitation.host_ready);
    assert!(invitation.guest_ready);
}

#[actix_web::test]
async fn ready_toggle_keeps_the_other_players_stored_flag() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    // The host's flag lands without going through the service.
    let code = pair.lobby_code.clone();
    with_txn(&state, |txn| {
        Box::pin(async move {
            let lobby = lobbies::require_by_code(txn, &code).await?;
            lobbies::update_lobby(txn, LobbyUpdate::new(lobby.id).with_host_ready(true)).await?;
            Ok(())
        })
    })
    .await
    .unwrap();

    let (code, guest) = (pair.lobby_code.clone(), pair.guest_id);
    let outcome = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().set_ready(txn, &code, guest, true).await })
    })
    .await
    .unwrap();
    assert!(outcome.lobby.host_ready);
    assert!(outcome.lobby.guest_ready);
    assert_eq!(outcome.lobby.status, LobbyStatus::Ready);
    assert!(outcome.status_changed);

    let (code, host, guest) = (pair.lobby_code.clone(), pair.host_id, pair.guest_id);
    let invitation = with_txn(&state, |txn| {
        Box::pin(async move { Ok(invitations::find_latest(txn, &code, host, guest).await?) })
    })
    .await
    .unwrap()
    .expect("invitation");
    assert!(invitation.host_ready);
    assert!(invitation.guest_ready);
}

#[actix_web::test]
async fn settings_are_host_only() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;
    let settings = LobbySettings {
        question_types: vec!["identification".into(), "true_false".into()],
        study_material_id: Some("mat-1".into()),
        study_material_title: Some("Cells".into()),
        difficulty: None,
    };

    let (code, guest, s) = (pair.lobby_code.clone(), pair.guest_id, settings.clone());
    let err = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().update_settings(txn, &code, guest, s).await })
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { code: ErrorCode::InvalidRole, .. }));

    let (code, host, s) = (pair.lobby_code.clone(), pair.host_id, settings.clone());
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().update_settings(txn, &code, host, s).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.settings, settings);
}

#[actix_web::test]
async fn guest_leave_frees_the_seat() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let (code, guest) = (pair.lobby_code.clone(), pair.guest_id);
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().leave_lobby(txn, &code, guest, Role::Guest).await })
    })
    .await
    .unwrap();
    assert!(lobby.guest.is_none());
    assert_eq!(lobby.status, LobbyStatus::Waiting);

    // The seat can be taken again.
    let newcomer = unique_user_id();
    seed_profile(&state, newcomer).await;
    let code = pair.lobby_code.clone();
    let joined = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().join_lobby(txn, &code, player(newcomer)).await })
    })
    .await
    .unwrap();
    assert_eq!(joined.lobby.guest.map(|g| g.id), Some(newcomer));
}

#[actix_web::test]
async fn host_leave_abandons_lobby() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let (code, host) = (pair.lobby_code.clone(), pair.host_id);
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().leave_lobby(txn, &code, host, Role::Host).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::Abandoned);
    assert!(lobby.ended_at.is_some());

    let (code, host) = (pair.lobby_code.clone(), pair.host_id);
    let err = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().set_ready(txn, &code, host, true).await })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LobbyStatusInvalid);
}

#[actix_web::test]
async fn explicit_status_transitions_are_checked() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let code = pair.lobby_code.clone();
    let err = with_txn(&state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .update_status(txn, &code, LobbyStatus::Completed)
                .await
        })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LobbyStatusInvalid);

    let code = pair.lobby_code.clone();
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .update_status(txn, &code, LobbyStatus::InProgress)
                .await
        })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::InProgress);
    assert!(lobby.started_at.is_some());
}
