use battle_backend::db::txn::with_txn;
use battle_backend::domain::Role;
use battle_backend::errors::domain::ConflictKind;
use battle_backend::errors::{DomainError, ErrorCode};
use battle_backend::repos::sessions::{self, SessionUpdate};
use battle_backend::services::rounds::{PlayRequest, RoundService};
use battle_backend::services::scores::ScoreService;
use battle_backend::state::app_state::AppState;
use uuid::Uuid;

use crate::support::factory::started_battle;
use crate::support::test_state::build_test_state;

async fn play_at(
    state: &AppState,
    session_uuid: Uuid,
    expected_version: i32,
) -> Result<i32, battle_backend::AppError> {
    let req = PlayRequest {
        session_uuid,
        role: Role::Host,
        card: None,
        is_correct: false,
        lobby_code: None,
        question_id: None,
        expected_version: Some(expected_version),
    };
    let result = with_txn(state, |txn| {
        Box::pin(async move { RoundService::new().play(txn, req).await })
    })
    .await?;
    Ok(result.session.version)
}

#[actix_web::test]
async fn racing_plays_on_one_version_apply_once() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    let (a, b) = tokio::join!(
        play_at(&state, session.session_uuid, session.version),
        play_at(&state, session.session_uuid, session.version),
    );

    let (won, lost) = match (a, b) {
        (Ok(v), Err(e)) | (Err(e), Ok(v)) => (v, e),
        other => panic!("expected exactly one winner, got {other:?}"),
    };
    assert_eq!(won, session.version + 1);
    assert!(
        matches!(lost.code(), ErrorCode::OptimisticLock | ErrorCode::OutOfTurn),
        "unexpected loser error {:?}",
        lost.code()
    );

    let uuid = session.session_uuid;
    let score = with_txn(&state, |txn| {
        Box::pin(async move { ScoreService::new().get_score(txn, uuid).await })
    })
    .await
    .unwrap();
    // Only one wrong answer was charged.
    assert_eq!(score.host_health, 90);
}

#[actix_web::test]
async fn stale_expected_version_is_rejected() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    let err = play_at(&state, session.session_uuid, session.version - 1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OptimisticLock);
    assert_eq!(err.status(), actix_web::http::StatusCode::CONFLICT);
}

#[actix_web::test]
async fn stale_session_write_matches_no_row() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;
    let (id, version, uuid) = (session.id, session.version, session.session_uuid);

    let bumped = with_txn(&state, |txn| {
        Box::pin(async move { Ok(sessions::update_session(txn, SessionUpdate::new(id, version)).await?) })
    })
    .await
    .unwrap();
    assert_eq!(bumped.version, version + 1);

    // Same expected version again: the guarded UPDATE touches no row.
    let err = with_txn(&state, |txn| {
        Box::pin(async move {
            Ok(sessions::update_session(txn, SessionUpdate::new(id, version).with_is_active(false))
                .await?)
        })
    })
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OptimisticLock);

    let raw = with_txn(&state, |txn| {
        Box::pin(async move {
            Ok(sessions::update_session(txn, SessionUpdate::new(id, version)).await.unwrap_err())
        })
    })
    .await
    .unwrap();
    assert!(matches!(raw, DomainError::Conflict(ConflictKind::OptimisticLock, _)));

    let current = with_txn(&state, |txn| {
        Box::pin(async move { Ok(sessions::require_by_uuid(txn, uuid).await?) })
    })
    .await
    .unwrap();
    assert_eq!(current.version, version + 1);
    assert!(current.is_active);
}

#[actix_web::test]
async fn score_update_invalidates_a_pending_play() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;
    let uuid = session.session_uuid;

    let update = with_txn(&state, |txn| {
        Box::pin(async move { ScoreService::new().update_score(txn, uuid, Role::Guest, -20).await })
    })
    .await
    .unwrap();
    assert_eq!(update.session.version, session.version + 1);

    let err = play_at(&state, uuid, session.version).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OptimisticLock);

    let score = with_txn(&state, |txn| {
        Box::pin(async move { ScoreService::new().get_score(txn, uuid).await })
    })
    .await
    .unwrap();
    assert_eq!(score.guest_health, 80);
    assert_eq!(score.host_health, 100);
}
