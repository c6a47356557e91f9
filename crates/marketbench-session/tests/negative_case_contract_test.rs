//! Contract tests for the negative cases against a mocked marketplace.
//!
//! wiremock plays the system under test. Each test checks both sides of a
//! case: the exact request the case sends, and the verdict it reaches for a
//! given response.

use marketbench_session::oracle::{
    FORBIDDEN_DIAGNOSTIC, FORBIDDEN_ERR_MSG, ITEM_PRICE_DIAGNOSTIC, ITEM_PRICE_ERR_MSG,
};
use marketbench_session::{CaseError, NegativeCaseVerifier, Session, TargetConfig};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_TOKEN: &str = "5f1e0c7a9b2d4e6f8a0b1c2d3e4f5a6b7c8d9e0f";

/// Session pointed at the mock server, already holding a valid token.
fn test_session(mock_server: &MockServer) -> Session {
    let mut config = TargetConfig::local(0).unwrap();
    config.app_url = mock_server.uri().parse().unwrap();
    let mut session = Session::new(&config).unwrap();
    session.set_csrf_token(SESSION_TOKEN);
    session
}

fn rejection(status: u16, msg: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "error": msg }))
}

async fn only_request_body(mock_server: &MockServer) -> Value {
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "case must send exactly one request");
    serde_json::from_slice(&requests[0].body).unwrap()
}

// ── POST /login ──────────────────────────────────────────────────────

#[tokio::test]
async fn login_with_wrong_password_passes_on_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "account_name": "alice",
            "password": "wrong-pw"
        })))
        .respond_with(rejection(401, "アカウント名かパスワードが間違えています"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    NegativeCaseVerifier::new(&session)
        .login_with_wrong_password("alice", "wrong-pw")
        .await
        .unwrap();
}

#[tokio::test]
async fn login_with_wrong_password_fails_when_login_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "account_name": "alice"})),
        )
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    let err = NegativeCaseVerifier::new(&session)
        .login_with_wrong_password("alice", "wrong-pw")
        .await
        .unwrap_err();
    match err {
        CaseError::StatusMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, 401);
            assert_eq!(actual, 200);
        }
        other => panic!("expected StatusMismatch, got: {other:?}"),
    }
}

#[tokio::test]
async fn login_rejection_with_html_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("<h1>Unauthorized</h1>"))
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    let err = NegativeCaseVerifier::new(&session)
        .login_with_wrong_password("alice", "wrong-pw")
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::Decode { .. }), "got: {err:?}");
    assert_eq!(err.report(), "POST /login: JSONデコードに失敗しました");
}

// ── POST /sell ───────────────────────────────────────────────────────

#[tokio::test]
async fn sell_with_wrong_csrf_token_sends_forged_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sell"))
        .respond_with(rejection(422, "csrf token error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    NegativeCaseVerifier::new(&session)
        .sell_with_wrong_csrf_token("widget", 500, "desc", 1)
        .await
        .unwrap();

    let body = only_request_body(&mock_server).await;
    let token = body["csrf_token"].as_str().unwrap();
    assert_ne!(token, SESSION_TOKEN);
    assert_eq!(token.len(), 40);
    assert_eq!(body["name"], "widget");
    assert_eq!(body["price"], 500);
    assert_eq!(body["description"], "desc");
    assert_eq!(body["category_id"], 1);
    assert_eq!(body.as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn sell_with_wrong_price_passes_on_exact_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sell"))
        .and(body_json(json!({
            "csrf_token": SESSION_TOKEN,
            "name": "widget",
            "price": 50,
            "description": "desc",
            "category_id": 1
        })))
        .respond_with(rejection(400, ITEM_PRICE_ERR_MSG))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    NegativeCaseVerifier::new(&session)
        .sell_with_wrong_price("widget", 50, "desc", 1)
        .await
        .unwrap();
}

#[tokio::test]
async fn sell_with_wrong_price_rejects_other_400_messages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sell"))
        .respond_with(rejection(400, "all parameters are required"))
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    let err = NegativeCaseVerifier::new(&session)
        .sell_with_wrong_price("widget", 50, "desc", 1)
        .await
        .unwrap_err();
    match &err {
        CaseError::MessageMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, ITEM_PRICE_ERR_MSG);
            assert_eq!(actual, "all parameters are required");
        }
        other => panic!("expected MessageMismatch, got: {other:?}"),
    }
    assert_eq!(err.report(), format!("POST /sell: {ITEM_PRICE_DIAGNOSTIC}"));
}

#[tokio::test]
async fn sell_with_wrong_price_fails_when_listing_is_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sell"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    let err = NegativeCaseVerifier::new(&session)
        .sell_with_wrong_price("widget", 500, "desc", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::StatusMismatch { actual: 200, .. }));
}

#[tokio::test]
async fn sell_with_wrong_price_needs_a_logged_in_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(rejection(400, ITEM_PRICE_ERR_MSG))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut session = test_session(&mock_server);
    session.clear_csrf_token();
    let err = NegativeCaseVerifier::new(&session)
        .sell_with_wrong_price("widget", 50, "desc", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::MissingCsrfToken { .. }));
}

// ── POST /buy ────────────────────────────────────────────────────────

#[tokio::test]
async fn buy_with_wrong_csrf_token_sends_forged_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/buy"))
        .respond_with(rejection(422, "csrf token error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    NegativeCaseVerifier::new(&session)
        .buy_with_wrong_csrf_token(7, "card-token")
        .await
        .unwrap();

    let body = only_request_body(&mock_server).await;
    assert_ne!(body["csrf_token"], SESSION_TOKEN);
    assert_eq!(body["item_id"], 7);
    assert_eq!(body["token"], "card-token");
    assert_eq!(body.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn buy_with_failed_checks_caller_status_and_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/buy"))
        .and(body_json(json!({
            "csrf_token": SESSION_TOKEN,
            "item_id": 7,
            "token": "card-token"
        })))
        .respond_with(rejection(403, "item is not for sale"))
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    let verifier = NegativeCaseVerifier::new(&session);

    verifier
        .buy_with_failed(7, "card-token", StatusCode::FORBIDDEN, "item is not for sale")
        .await
        .unwrap();

    let err = verifier
        .buy_with_failed(7, "card-token", StatusCode::FORBIDDEN, "自分の商品は買えません")
        .await
        .unwrap_err();
    assert_eq!(
        err.report(),
        "POST /buy: 自分の商品は買えませんというエラーではありません"
    );

    let err = verifier
        .buy_with_failed(7, "card-token", StatusCode::BAD_REQUEST, "item is not for sale")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CaseError::StatusMismatch {
            expected: 400,
            actual: 403,
            ..
        }
    ));
}

// ── POST /ship ───────────────────────────────────────────────────────

#[tokio::test]
async fn ship_with_wrong_csrf_token_sends_forged_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ship"))
        .respond_with(rejection(422, "csrf token error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    NegativeCaseVerifier::new(&session)
        .ship_with_wrong_csrf_token(9)
        .await
        .unwrap();

    let body = only_request_body(&mock_server).await;
    assert_ne!(body["csrf_token"], SESSION_TOKEN);
    assert_eq!(body["item_id"], 9);
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn ship_with_wrong_seller_uses_session_token_and_exact_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ship"))
        .and(body_json(json!({
            "csrf_token": SESSION_TOKEN,
            "item_id": 9
        })))
        .respond_with(rejection(403, FORBIDDEN_ERR_MSG))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    NegativeCaseVerifier::new(&session)
        .ship_with_wrong_seller(9)
        .await
        .unwrap();
}

#[tokio::test]
async fn ship_with_wrong_seller_rejects_403_for_another_reason() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ship"))
        .respond_with(rejection(403, "商品が取引中ではありません"))
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    let err = NegativeCaseVerifier::new(&session)
        .ship_with_wrong_seller(9)
        .await
        .unwrap_err();
    assert_eq!(err.report(), format!("POST /ship: {FORBIDDEN_DIAGNOSTIC}"));
}

// ── Transport & idempotence ──────────────────────────────────────────

#[tokio::test]
async fn unreachable_target_is_transport_failure() {
    let mut config = TargetConfig::local(1).unwrap();
    config.timeout_secs = 2;
    let session = Session::new(&config).unwrap();

    let err = NegativeCaseVerifier::new(&session)
        .login_with_wrong_password("alice", "wrong-pw")
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::Transport { .. }), "got: {err:?}");
    assert_eq!(err.report(), "POST /login: リクエストに失敗しました");
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn repeated_case_reaches_the_same_verdict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ship"))
        .respond_with(rejection(403, FORBIDDEN_ERR_MSG))
        .expect(3)
        .mount(&mock_server)
        .await;

    let session = test_session(&mock_server);
    let verifier = NegativeCaseVerifier::new(&session);
    for _ in 0..3 {
        verifier.ship_with_wrong_seller(9).await.unwrap();
    }
}
