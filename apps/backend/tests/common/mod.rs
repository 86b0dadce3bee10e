#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Assert a successful status and return the JSON body.
pub async fn json_ok(resp: ServiceResponse<BoxBody>, expected: StatusCode) -> Value {
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert_eq!(
        status,
        expected,
        "unexpected status; body: {}",
        String::from_utf8_lossy(&body)
    );
    serde_json::from_slice(&body).expect("response body should be JSON")
}

/// Assert the problem-details contract for an error response.
pub async fn assert_problem(
    resp: ServiceResponse<BoxBody>,
    status: StatusCode,
    code: &str,
) -> backend_test_support::problem_details::ProblemDetailsLike {
    backend_test_support::problem_details::assert_problem_details_from_service_response(
        resp, code, status, None,
    )
    .await
}
