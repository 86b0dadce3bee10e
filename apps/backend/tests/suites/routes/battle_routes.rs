use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use battle_backend::domain::rules::{INCORRECT_ANSWER_DAMAGE, MAX_HEALTH, POISON_INITIAL_DAMAGE};

use crate::common::{assert_problem, json_ok};
use crate::support::app_builder::create_test_app;
use crate::support::factory::{seated_pair, started_battle};
use crate::support::test_state::build_test_state;

#[actix_web::test]
async fn full_battle_over_http() {
    let state = build_test_state().await;
    let pair = seated_pair(&state).await;
    let app = create_test_app(state).build().await;

    let req = test::TestRequest::post()
        .uri("/battle/session/init")
        .set_json(json!({
            "lobby_code": pair.lobby_code,
            "host_id": pair.host_id,
            "guest_id": pair.guest_id,
            "settings": { "difficulty_mode": "easy", "question_types": ["identification"] }
        }))
        .to_request();
    let session = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    let uuid = session["session_uuid"].as_str().expect("uuid").to_string();
    assert_eq!(session["difficulty_mode"], "easy");
    assert_eq!(session["battle_started"], false);

    let mut started = Vec::new();
    for role in ["host", "guest"] {
        let req = test::TestRequest::put()
            .uri("/battle/session/update")
            .set_json(json!({ "lobby_code": pair.lobby_code, "role": role }))
            .to_request();
        let outcome = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
        started.push(outcome["started_now"].as_bool().unwrap_or_default());
    }
    assert_eq!(started, vec![false, true]);

    let uri = format!("/battle/session/{}", pair.lobby_code);
    let current = json_ok(
        test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(current["current_turn"], pair.host_id);

    // Guest out of turn.
    let req = test::TestRequest::post()
        .uri("/battle/round/play")
        .set_json(json!({ "session_uuid": uuid, "role": "guest", "is_correct": true }))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNPROCESSABLE_ENTITY,
        "OUT_OF_TURN",
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/battle/round/play")
        .set_json(json!({
            "session_uuid": uuid,
            "role": "host",
            "card_id": "poison",
            "is_correct": true,
            "question_id": "q-1",
            "expected_version": current["version"]
        }))
        .to_request();
    let played = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(played["outcome"]["card_applied"], "poison");
    assert_eq!(played["outcome"]["next_turn"], pair.guest_id);
    assert_eq!(played["score"]["guest_health"], MAX_HEALTH - POISON_INITIAL_DAMAGE);
    assert_eq!(played["round"]["question_count_total"], 1);
    assert_eq!(played["round"]["question_ids_done"], json!(["q-1"]));

    let uri = format!("/battle/score/{uuid}");
    let score = json_ok(
        test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(score["host_health"], MAX_HEALTH);

    let req = test::TestRequest::post()
        .uri("/battle/effects/consume")
        .set_json(json!({ "session_uuid": uuid, "role": "guest", "kind": "poison" }))
        .to_request();
    let consumed = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(consumed["consumed"]["used"], true);
    assert_eq!(consumed["session"]["active_card_effects"], json!([]));

    let req = test::TestRequest::post()
        .uri("/battle/end")
        .set_json(json!({
            "lobby_code": pair.lobby_code,
            "reason": "Left The Game",
            "leaver_id": pair.guest_id
        }))
        .to_request();
    let summary = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(summary["already_ended"], false);
    assert_eq!(summary["ending"]["battle_end_reason"], "Left The Game");
    assert_eq!(summary["guest_health"], MAX_HEALTH - POISON_INITIAL_DAMAGE);

    let uri = format!("/battle/end-status/{uuid}");
    let status = json_ok(
        test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(status["ended"], true);
    assert_eq!(status["is_active"], false);

    let uri = format!("/battle/ban-status/{}", pair.guest_id);
    let ban = json_ok(
        test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(ban["early_leaves"], 1);
    assert_eq!(ban["banned"], false);

    let req = test::TestRequest::post()
        .uri("/battle/round/play")
        .set_json(json!({ "session_uuid": uuid, "role": "guest", "is_correct": true }))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::UNPROCESSABLE_ENTITY,
        "SESSION_INACTIVE",
    )
    .await;
}

#[actix_web::test]
async fn end_requires_a_selector() {
    let app = create_test_app(build_test_state().await).build().await;

    let req = test::TestRequest::post()
        .uri("/battle/end")
        .set_json(json!({ "reason": "Victory", "winner_id": 1 }))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_SESSION_SELECTOR",
    )
    .await;
}

#[actix_web::test]
async fn ban_status_for_unknown_user_is_not_found() {
    let app = create_test_app(build_test_state().await).build().await;

    let req = test::TestRequest::get()
        .uri("/battle/ban-status/987654321")
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::NOT_FOUND,
        "USER_NOT_FOUND",
    )
    .await;
}

#[actix_web::test]
async fn play_knockout_clears_presence() {
    let state = build_test_state().await;
    let realtime = state.realtime.clone();
    let pair = seated_pair(&state).await;
    let app = create_test_app(state).build().await;

    let req = test::TestRequest::post()
        .uri("/battle/session/init")
        .set_json(json!({
            "lobby_code": pair.lobby_code,
            "host_id": pair.host_id,
            "guest_id": pair.guest_id
        }))
        .to_request();
    let session = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    let uuid = session["session_uuid"].as_str().expect("uuid").to_string();
    for role in ["host", "guest"] {
        let req = test::TestRequest::put()
            .uri("/battle/session/update")
            .set_json(json!({ "session_uuid": uuid, "role": role }))
            .to_request();
        json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    }
    let presence = realtime.presence();
    assert_eq!(presence.in_game(pair.guest_id).as_deref(), Some(pair.lobby_code.as_str()));

    // A direct score update bumps the session version without ending it.
    let req = test::TestRequest::post()
        .uri("/battle/score/update")
        .set_json(json!({
            "session_uuid": uuid,
            "role": "guest",
            "delta": -(MAX_HEALTH - INCORRECT_ANSWER_DAMAGE)
        }))
        .to_request();
    let updated = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(updated["score"]["guest_health"], INCORRECT_ANSWER_DAMAGE);
    assert!(updated["ending"].is_null());
    assert_eq!(updated["session"]["is_active"], true);
    assert!(updated["session"]["version"].as_i64() > session["version"].as_i64());

    for (role, correct) in [("host", true), ("guest", false)] {
        let req = test::TestRequest::post()
            .uri("/battle/round/play")
            .set_json(json!({ "session_uuid": uuid, "role": role, "is_correct": correct }))
            .to_request();
        let played = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
        if role == "guest" {
            assert_eq!(played["score"]["guest_health"], 0);
            assert_eq!(played["ending"]["ending"]["winner_id"], pair.host_id);
            assert_eq!(played["session"]["is_active"], false);
        }
    }

    assert_eq!(presence.in_game(pair.host_id), None);
    assert_eq!(presence.in_game(pair.guest_id), None);
}

#[actix_web::test]
async fn score_update_knockout_ends_the_battle() {
    let state = build_test_state().await;
    let realtime = state.realtime.clone();
    let (pair, session) = started_battle(&state).await;
    realtime.mark_in_battle(pair.host_id, &pair.lobby_code, true);
    realtime.mark_in_battle(pair.guest_id, &pair.lobby_code, true);
    let app = create_test_app(state).build().await;

    let req = test::TestRequest::post()
        .uri("/battle/score/update")
        .set_json(json!({
            "session_uuid": session.session_uuid,
            "role": "guest",
            "delta": -500
        }))
        .to_request();
    let updated = json_ok(test::call_service(&app, req).await, StatusCode::OK).await;
    assert_eq!(updated["score"]["guest_health"], 0);
    assert_eq!(updated["ending"]["ending"]["winner_id"], pair.host_id);
    assert_eq!(updated["ending"]["ending"]["battle_end_reason"], "Victory");

    let uri = format!("/battle/end-status/{}", session.session_uuid);
    let status = json_ok(
        test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(status["ended"], true);
    assert_eq!(status["is_active"], false);
    assert_eq!(realtime.presence().in_game(pair.host_id), None);
    assert_eq!(realtime.presence().in_game(pair.guest_id), None);
}

#[actix_web::test]
async fn numeric_path_key_is_a_session_id() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;
    let app = create_test_app(state).build().await;

    let req = test::TestRequest::post()
        .uri("/lobby")
        .set_json(json!({
            "lobby_code": "0001",
            "host": { "id": pair.host_id, "name": "host", "level": 1 }
        }))
        .to_request();
    assert_problem(
        test::call_service(&app, req).await,
        StatusCode::BAD_REQUEST,
        "INVALID_LOBBY_CODE",
    )
    .await;

    for key in [session.id.to_string(), pair.lobby_code.to_lowercase()] {
        let uri = format!("/battle/end-status/{key}");
        let status = json_ok(
            test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await,
            StatusCode::OK,
        )
        .await;
        assert_eq!(status["session_uuid"], session.session_uuid.to_string());
    }
}
