use battle_backend::db::txn::with_txn;
use battle_backend::domain::lobby::{LobbySettings, LobbyStatus};
use battle_backend::domain::resolver::SessionKey;
use battle_backend::domain::rules::EARLY_LEAVE_BAN_THRESHOLD;
use battle_backend::domain::Role;
use battle_backend::errors::ErrorCode;
use battle_backend::repos::endings::EndReason;
use battle_backend::services::bans::BanService;
use battle_backend::services::endings::{EndRequest, EndingService, MatchSummary};
use battle_backend::services::lobbies::LobbyService;
use battle_backend::services::sessions::SessionService;
use battle_backend::state::app_state::AppState;
use battle_backend::AppError;
use backend_test_support::unique_helpers::{unique_lobby_code, unique_user_id};
use time::{Duration, OffsetDateTime};

use crate::support::factory::{load_profile, player, seed_profile, set_ban_counters, started_battle};
use crate::support::test_state::build_test_state;

async fn end(state: &AppState, req: EndRequest) -> Result<MatchSummary, AppError> {
    with_txn(state, |txn| {
        Box::pin(async move { EndingService::new().end(txn, req).await })
    })
    .await
}

fn left(key: SessionKey, leaver_id: i64) -> EndRequest {
    EndRequest {
        key,
        winner_id: None,
        reason: EndReason::LeftTheGame,
        leaver_id: Some(leaver_id),
    }
}

#[actix_web::test]
async fn ending_twice_returns_the_stored_ending() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;
    let req = EndRequest {
        key: SessionKey::Uuid(session.session_uuid),
        winner_id: Some(pair.guest_id),
        reason: EndReason::Victory,
        leaver_id: None,
    };

    let first = end(&state, req.clone()).await.unwrap();
    assert!(!first.already_ended);
    assert_eq!(first.ending.winner_id, Some(pair.guest_id));

    // A different request against an ended session changes nothing.
    let second = end(
        &state,
        EndRequest {
            winner_id: Some(pair.host_id),
            ..req
        },
    )
    .await
    .unwrap();
    assert!(second.already_ended);
    assert_eq!(second.ending, first.ending);
    assert_eq!(load_profile(&state, pair.guest_id).await.win_streak, 1);
    assert_eq!(load_profile(&state, pair.host_id).await.win_streak, 0);
}

#[actix_web::test]
async fn leaving_counts_an_early_leave_and_abandons_the_lobby() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;

    let summary = end(&state, left(SessionKey::Lobby(pair.lobby_code.clone()), pair.guest_id))
        .await
        .unwrap();
    assert_eq!(summary.ending.battle_end_reason, EndReason::LeftTheGame);
    assert_eq!(summary.ending.winner_id, None);
    assert_eq!(load_profile(&state, pair.guest_id).await.early_leaves, 1);
    assert_eq!(load_profile(&state, pair.host_id).await.early_leaves, 0);

    let code = pair.lobby_code.clone();
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().get_lobby(txn, &code).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::Abandoned);

    let uuid = session.session_uuid;
    let status = with_txn(&state, |txn| {
        Box::pin(async move {
            EndingService::new()
                .end_status(txn, &SessionKey::Uuid(uuid))
                .await
        })
    })
    .await
    .unwrap();
    assert!(status.ended);
    assert!(!status.is_active);
    assert_eq!(status.ending, Some(summary.ending));
}

#[actix_web::test]
async fn leaver_is_derived_from_the_winner() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;

    end(
        &state,
        EndRequest {
            key: SessionKey::Id(session.id),
            winner_id: Some(pair.host_id),
            reason: EndReason::LeftTheGame,
            leaver_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(load_profile(&state, pair.guest_id).await.early_leaves, 1);
    assert_eq!(load_profile(&state, pair.host_id).await.win_streak, 1);
}

#[actix_web::test]
async fn reaching_the_threshold_bans_the_leaver() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;
    set_ban_counters(&state, pair.guest_id, EARLY_LEAVE_BAN_THRESHOLD - 1, None).await;

    end(&state, left(SessionKey::Uuid(session.session_uuid), pair.guest_id))
        .await
        .unwrap();

    let guest = pair.guest_id;
    let status = with_txn(&state, |txn| {
        Box::pin(async move { BanService::new().check(txn, guest).await })
    })
    .await
    .unwrap();
    assert!(status.banned);
    assert_eq!(status.early_leaves, EARLY_LEAVE_BAN_THRESHOLD);
    assert!(status.ban_until.is_some());

    let err = with_txn(&state, |txn| {
        Box::pin(async move {
            LobbyService::new()
                .create_lobby(txn, None, player(guest), LobbySettings::default())
                .await
        })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserBanned);
}

#[actix_web::test]
async fn below_the_threshold_is_not_banned() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;
    set_ban_counters(&state, pair.host_id, EARLY_LEAVE_BAN_THRESHOLD - 2, None).await;

    end(&state, left(SessionKey::Uuid(session.session_uuid), pair.host_id))
        .await
        .unwrap();

    let profile = load_profile(&state, pair.host_id).await;
    assert_eq!(profile.early_leaves, EARLY_LEAVE_BAN_THRESHOLD - 1);
    assert_eq!(profile.ban_until, None);
}

#[actix_web::test]
async fn lapsed_ban_is_cleared_on_check() {
    let state = build_test_state().await;
    let user = unique_user_id();
    seed_profile(&state, user).await;
    let past = OffsetDateTime::now_utc() - Duration::hours(1);
    set_ban_counters(&state, user, EARLY_LEAVE_BAN_THRESHOLD, Some(past)).await;

    let status = with_txn(&state, |txn| {
        Box::pin(async move { BanService::new().check(txn, user).await })
    })
    .await
    .unwrap();
    assert!(!status.banned);
    assert_eq!(status.early_leaves, 0);

    let profile = load_profile(&state, user).await;
    assert_eq!(profile.ban_until, None);
}

#[actix_web::test]
async fn failed_early_leave_rolls_the_ending_back() {
    let state = build_test_state().await;
    let host_id = unique_user_id();
    let ghost_id = unique_user_id();
    seed_profile(&state, host_id).await;

    let code = unique_lobby_code();
    let c = code.clone();
    let session = with_txn(&state, |txn| {
        Box::pin(async move {
            let lobbies = LobbyService::new();
            lobbies
                .create_lobby(txn, Some(&c), player(host_id), LobbySettings::default())
                .await?;
            lobbies.join_lobby(txn, &c, player(ghost_id)).await?;
            let sessions = SessionService::new();
            let session = sessions.initialize(txn, &c, host_id, ghost_id, None).await?;
            let key = SessionKey::Uuid(session.session_uuid);
            sessions.player_enters(txn, &key, Role::Host, true).await?;
            Ok(sessions.player_enters(txn, &key, Role::Guest, true).await?.session)
        })
    })
    .await
    .unwrap();

    let err = end(&state, left(SessionKey::Uuid(session.session_uuid), ghost_id))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UserNotFound);

    let uuid = session.session_uuid;
    let status = with_txn(&state, |txn| {
        Box::pin(async move {
            EndingService::new()
                .end_status(txn, &SessionKey::Uuid(uuid))
                .await
        })
    })
    .await
    .unwrap();
    assert!(status.is_active);
    assert!(!status.ended);

    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().get_lobby(txn, &code).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::InProgress);
}

#[actix_web::test]
async fn draw_with_a_winner_is_rejected() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;

    let err = end(
        &state,
        EndRequest {
            key: SessionKey::Uuid(session.session_uuid),
            winner_id: Some(pair.host_id),
            reason: EndReason::Draw,
            leaver_id: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let stranger = unique_user_id();
    let err = end(
        &state,
        EndRequest {
            key: SessionKey::Uuid(session.session_uuid),
            winner_id: Some(stranger),
            reason: EndReason::Victory,
            leaver_id: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}
