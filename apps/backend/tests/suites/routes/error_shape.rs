use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use crate::common::assert_problem;
use crate::support::app_builder::create_test_app;
use crate::support::test_state::build_test_state;

#[actix_web::test]
async fn malformed_json_is_bad_request() {
    let app = create_test_app(build_test_state().await).build().await;

    let req = test::TestRequest::post()
        .uri("/lobby")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"host\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let problem = assert_problem(resp, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
    assert!(problem.detail.contains("Invalid JSON"));
}

#[actix_web::test]
async fn missing_field_names_the_field() {
    let app = create_test_app(build_test_state().await).build().await;

    let req = test::TestRequest::post()
        .uri("/lobby/join")
        .set_json(json!({ "lobby_code": "ABCDEF" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let problem = assert_problem(resp, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
    assert!(problem.detail.contains("missing field `guest`"));
}

#[actix_web::test]
async fn unknown_lobby_is_not_found() {
    let app = create_test_app(build_test_state().await).build().await;

    let req = test::TestRequest::get().uri("/lobby/NOPE42").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::NOT_FOUND, "LOBBY_NOT_FOUND").await;
}

#[actix_web::test]
async fn malformed_lobby_code_is_rejected_before_lookup() {
    let app = create_test_app(build_test_state().await).build().await;

    let req = test::TestRequest::get().uri("/lobby/a!b").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_LOBBY_CODE").await;
}

#[actix_web::test]
async fn unknown_role_and_card_get_their_own_codes() {
    let app = create_test_app(build_test_state().await).build().await;

    let req = test::TestRequest::post()
        .uri("/lobby/leave")
        .set_json(json!({ "lobby_code": "ABCDEF", "player_id": 1, "role": "referee" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_ROLE").await;

    let req = test::TestRequest::post()
        .uri("/battle/round/play")
        .set_json(json!({
            "session_uuid": uuid::Uuid::new_v4(),
            "role": "host",
            "card_id": "fireball",
            "is_correct": true
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "UNKNOWN_CARD").await;
}

#[actix_web::test]
async fn unknown_round_is_not_found() {
    let app = create_test_app(build_test_state().await).build().await;

    let uri = format!("/battle/round/{}", uuid::Uuid::new_v4());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_problem(resp, StatusCode::NOT_FOUND, "ROUND_NOT_FOUND").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/battle/round/not-a-uuid")
            .to_request(),
    )
    .await;
    assert_problem(resp, StatusCode::BAD_REQUEST, "INVALID_SESSION_SELECTOR").await;
}
