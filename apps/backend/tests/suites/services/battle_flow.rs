use battle_backend::db::txn::with_txn;
use battle_backend::domain::lobby::LobbyStatus;
use battle_backend::domain::resolver::SessionKey;
use battle_backend::domain::rules::{INCORRECT_ANSWER_DAMAGE, MAX_HEALTH};
use battle_backend::domain::Role;
use battle_backend::errors::ErrorCode;
use battle_backend::repos::endings::EndReason;
use battle_backend::services::lobbies::LobbyService;
use battle_backend::services::endings::EndingService;
use battle_backend::services::rounds::{PlayRequest, RoundService};
use battle_backend::services::scores::ScoreService;
use battle_backend::services::sessions::SessionService;

use crate::support::factory::{load_profile, play, seated_pair, started_battle};
use crate::support::test_state::build_test_state;

#[actix_web::test]
async fn battle_starts_once_both_players_enter() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let p = pair.clone();
    let (first, second, repeat) = with_txn(&state, |txn| {
        Box::pin(async move {
            let service = SessionService::new();
            let session = service
                .initialize(txn, &p.lobby_code, p.host_id, p.guest_id, None)
                .await?;
            let key = SessionKey::Lobby(p.lobby_code.clone());
            let first = service.player_enters(txn, &key, Role::Guest, true).await?;
            let second = service.player_enters(txn, &key, Role::Host, true).await?;
            let repeat = service.player_enters(txn, &key, Role::Host, true).await?;
            assert_eq!(second.session.session_uuid, session.session_uuid);
            Ok((first, second, repeat))
        })
    })
    .await
    .unwrap();

    assert!(!first.started_now);
    assert!(!first.session.battle_started);
    assert!(second.started_now);
    assert!(second.session.battle_started);
    assert_eq!(second.session.current_turn, Some(pair.host_id));
    assert!(!repeat.started_now);

    let code = pair.lobby_code.clone();
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().get_lobby(txn, &code).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::InProgress);
    assert!(lobby.started_at.is_some());
}

#[actix_web::test]
async fn initialize_is_idempotent_per_lobby() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let p = pair.clone();
    let (a, b) = with_txn(&state, |txn| {
        Box::pin(async move {
            let service = SessionService::new();
            let a = service
                .initialize(txn, &p.lobby_code, p.host_id, p.guest_id, None)
                .await?;
            let b = service
                .initialize(txn, &p.lobby_code.to_ascii_lowercase(), p.host_id, p.guest_id, None)
                .await?;
            Ok((a, b))
        })
    })
    .await
    .unwrap();
    assert_eq!(a.session_uuid, b.session_uuid);
    assert_eq!(a.version, b.version);
}

#[actix_web::test]
async fn play_before_start_is_rejected() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;

    let p = pair.clone();
    let session = with_txn(&state, |txn| {
        Box::pin(async move {
            SessionService::new()
                .initialize(txn, &p.lobby_code, p.host_id, p.guest_id, None)
                .await
        })
    })
    .await
    .unwrap();

    let err = play(&state, &session, Role::Host, None, true).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BattleNotStarted);
}

#[actix_web::test]
async fn turns_alternate_and_wrong_answers_hurt() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;

    let first = play(&state, &session, Role::Host, None, true).await.unwrap();
    assert_eq!(first.outcome.turn_number, 1);
    assert_eq!(first.outcome.next_turn, pair.guest_id);
    assert_eq!(first.session.current_turn, Some(pair.guest_id));
    assert_eq!(first.score.host_health, MAX_HEALTH);
    assert_eq!(first.round.host_answer_correct, Some(true));

    let out_of_turn = play(&state, &session, Role::Host, None, true).await.unwrap_err();
    assert_eq!(out_of_turn.code(), ErrorCode::OutOfTurn);

    let second = play(&state, &session, Role::Guest, None, false).await.unwrap();
    assert_eq!(second.outcome.answer_damage, INCORRECT_ANSWER_DAMAGE);
    assert_eq!(second.score.guest_health, MAX_HEALTH - INCORRECT_ANSWER_DAMAGE);
    assert_eq!(second.round.question_count_total, 2);
    assert!(second.ending.is_none());

    let uuid = session.session_uuid;
    let (round, score) = with_txn(&state, |txn| {
        Box::pin(async move {
            let round = RoundService::new().get_round(txn, uuid).await?;
            let score = ScoreService::new().get_score(txn, uuid).await?;
            Ok((round, score))
        })
    })
    .await
    .unwrap();
    assert_eq!(round.guest_answer_correct, Some(false));
    assert_eq!(score.guest_health, MAX_HEALTH - INCORRECT_ANSWER_DAMAGE);
}

#[actix_web::test]
async fn knockout_ends_the_match() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;

    let mut last = None;
    for _ in 0..(MAX_HEALTH / INCORRECT_ANSWER_DAMAGE) {
        play(&state, &session, Role::Host, None, true).await.unwrap();
        last = Some(play(&state, &session, Role::Guest, None, false).await.unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.score.guest_health, 0);

    let summary = last.ending.expect("knockout ends the battle");
    assert_eq!(summary.ending.winner_id, Some(pair.host_id));
    assert_eq!(summary.ending.battle_end_reason, EndReason::Victory);
    assert!(!summary.already_ended);
    assert_eq!(summary.guest_health, 0);
    assert!(!last.session.is_active);

    let code = pair.lobby_code.clone();
    let lobby = with_txn(&state, |txn| {
        Box::pin(async move { LobbyService::new().get_lobby(txn, &code).await })
    })
    .await
    .unwrap();
    assert_eq!(lobby.status, LobbyStatus::Completed);

    assert_eq!(load_profile(&state, pair.host_id).await.win_streak, 1);
    assert_eq!(load_profile(&state, pair.guest_id).await.win_streak, 0);

    let after = play(&state, &session, Role::Host, None, true).await.unwrap_err();
    assert_eq!(after.code(), ErrorCode::SessionInactive);
}

#[actix_web::test]
async fn score_updates_clamp_to_range() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;
    let uuid = session.session_uuid;

    let (healed, hurt) = with_txn(&state, |txn| {
        Box::pin(async move {
            let service = ScoreService::new();
            service.init_score(txn, uuid).await?;
            let healed = service.update_score(txn, uuid, Role::Host, 50).await?;
            let hurt = service.update_score(txn, uuid, Role::Guest, -500).await?;
            Ok((healed, hurt))
        })
    })
    .await
    .unwrap();
    assert_eq!(healed.score.host_health, MAX_HEALTH);
    assert!(healed.ending.is_none());
    assert_eq!(hurt.score.guest_health, 0);
}

#[actix_web::test]
async fn score_knockout_ends_the_match() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;
    let uuid = session.session_uuid;

    let update = with_txn(&state, |txn| {
        Box::pin(async move { ScoreService::new().update_score(txn, uuid, Role::Guest, -500).await })
    })
    .await
    .unwrap();
    let summary = update.ending.expect("zero health ends the battle");
    assert_eq!(summary.ending.winner_id, Some(pair.host_id));
    assert_eq!(summary.ending.battle_end_reason, EndReason::Victory);
    assert_eq!(summary.guest_health, 0);
    assert!(!update.session.is_active);

    let status = with_txn(&state, |txn| {
        Box::pin(async move { EndingService::new().end_status(txn, &SessionKey::Uuid(uuid)).await })
    })
    .await
    .unwrap();
    assert!(status.ended);
    assert!(!status.is_active);

    let after = with_txn(&state, |txn| {
        Box::pin(async move { ScoreService::new().update_score(txn, uuid, Role::Host, -10).await })
    })
    .await
    .unwrap_err();
    assert_eq!(after.code(), ErrorCode::SessionInactive);
}

#[actix_web::test]
async fn repeated_question_is_rejected() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    let ask = |role: Role, question: &str| {
        let req = PlayRequest {
            session_uuid: session.session_uuid,
            role,
            card: None,
            is_correct: true,
            lobby_code: None,
            question_id: Some(question.to_string()),
            expected_version: None,
        };
        let state = &state;
        async move {
            with_txn(state, |txn| {
                Box::pin(async move { RoundService::new().play(txn, req).await })
            })
            .await
        }
    };

    let first = ask(Role::Host, "q-7").await.unwrap();
    assert_eq!(first.round.question_ids_done, vec!["q-7".to_string()]);

    let err = ask(Role::Guest, "q-7").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::QuestionAlreadyUsed);
    assert_eq!(err.status(), actix_web::http::StatusCode::CONFLICT);

    // Nothing was written: still the guest's turn on the first question.
    let second = ask(Role::Guest, "q-8").await.unwrap();
    assert_eq!(second.round.question_count_total, 2);
    assert_eq!(second.round.question_ids_done, vec!["q-7".to_string(), "q-8".to_string()]);
}
