// SPDX-License-Identifier: BUSL-1.1
//! Route definitions for the reference marketplace.
//!
//! Each state-changing handler checks, in order: anti-forgery token,
//! request fields, login session, then business rules. Failures answer with
//! `{"error": "<message>"}` in the marketplace's display locale.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::store::{AppState, ItemStatus, LoginSession};

/// Name of the login session cookie.
pub const SESSION_COOKIE: &str = "session_isucari";

pub const ITEM_MIN_PRICE: i64 = 100;
pub const ITEM_MAX_PRICE: i64 = 1_000_000;
pub const ITEM_PRICE_ERR_MSG: &str = "商品価格は100円以上、1,000,000円以下にしてください";
pub const CATEGORY_ID_MAX: i64 = 66;

const MSG_CSRF: &str = "csrf token error";
const MSG_NO_SESSION: &str = "no session";
const MSG_REQUIRED: &str = "all parameters are required";
const MSG_BAD_LOGIN: &str = "アカウント名かパスワードが間違えています";
const MSG_CATEGORY: &str = "Incorrect category ID";
const MSG_ITEM_NOT_FOUND: &str = "item not found";
const MSG_NOT_FOR_SALE: &str = "item is not for sale";
const MSG_SELF_PURCHASE: &str = "自分の商品は買えません";
const MSG_BAD_CARD: &str = "カード情報に誤りがあります";
const MSG_FORBIDDEN: &str = "権限がありません";
const MSG_NOT_TRADING: &str = "商品が取引中ではありません";

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/settings", get(settings))
        .route("/sell", post(sell))
        .route("/buy", post(buy))
        .route("/ship", post(ship))
        .route("/items/:id", get(item_get))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn login_session(state: &AppState, headers: &HeaderMap) -> Option<LoginSession> {
    state.session(&session_id(headers)?)
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn int_field(body: &Value, key: &str) -> Option<i64> {
    body.get(key).and_then(|v| v.as_i64())
}

/// Reject unless the body's `csrf_token` matches the caller's session.
fn check_csrf(session: Option<&LoginSession>, body: &Value) -> Result<(), Response> {
    let presented = str_field(body, "csrf_token");
    match session {
        Some(s) if s.csrf_matches(presented) => Ok(()),
        _ => {
            tracing::debug!("rejecting request with mismatched csrf token");
            Err(error(StatusCode::UNPROCESSABLE_ENTITY, MSG_CSRF))
        }
    }
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> StatusCode {
    StatusCode::OK
}

// ── Login ───────────────────────────────────────────────────────────

async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let account_name = str_field(&body, "account_name");
    let password = str_field(&body, "password");
    if account_name.is_empty() || password.is_empty() {
        return error(StatusCode::BAD_REQUEST, MSG_REQUIRED);
    }

    let user = match state.user_by_account(account_name) {
        Some(u) if u.password == password => u,
        _ => return error(StatusCode::UNAUTHORIZED, MSG_BAD_LOGIN),
    };

    let session_id = state.open_session(user.id);
    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly");
    let mut resp = Json(json!({
        "id": user.id,
        "account_name": user.account_name,
    }))
    .into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        resp.headers_mut().insert(header::SET_COOKIE, value);
    }
    resp
}

async fn settings(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    match login_session(&state, &headers) {
        Some(session) => {
            let user = state.user(session.user_id).map(|u| {
                json!({
                    "id": u.id,
                    "account_name": u.account_name,
                })
            });
            Json(json!({
                "csrf_token": session.csrf_token,
                "user": user,
            }))
        }
        None => Json(json!({ "csrf_token": "" })),
    }
}

// ── Sell ────────────────────────────────────────────────────────────

async fn sell(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let session = login_session(&state, &headers);
    if let Err(resp) = check_csrf(session.as_ref(), &body) {
        return resp;
    }

    let name = str_field(&body, "name");
    let description = str_field(&body, "description");
    let price = int_field(&body, "price");
    let category_id = int_field(&body, "category_id");
    let (Some(price), Some(category_id)) = (price, category_id) else {
        return error(StatusCode::BAD_REQUEST, MSG_REQUIRED);
    };
    if name.is_empty() || description.is_empty() {
        return error(StatusCode::BAD_REQUEST, MSG_REQUIRED);
    }
    if !(ITEM_MIN_PRICE..=ITEM_MAX_PRICE).contains(&price) {
        return error(StatusCode::BAD_REQUEST, ITEM_PRICE_ERR_MSG);
    }
    if !(1..=CATEGORY_ID_MAX).contains(&category_id) {
        return error(StatusCode::BAD_REQUEST, MSG_CATEGORY);
    }

    let Some(session) = session else {
        return error(StatusCode::NOT_FOUND, MSG_NO_SESSION);
    };
    let item = state.insert_item(session.user_id, name, price, description, category_id);
    tracing::info!(item_id = item.id, seller_id = item.seller_id, "item listed");
    Json(json!({ "id": item.id })).into_response()
}

// ── Buy ─────────────────────────────────────────────────────────────

async fn buy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let session = login_session(&state, &headers);
    if let Err(resp) = check_csrf(session.as_ref(), &body) {
        return resp;
    }
    let Some(session) = session else {
        return error(StatusCode::NOT_FOUND, MSG_NO_SESSION);
    };
    let Some(item_id) = int_field(&body, "item_id") else {
        return error(StatusCode::BAD_REQUEST, MSG_REQUIRED);
    };

    // Hold the entry for the whole check-then-mark sequence.
    let Some(mut item) = state.items().get_mut(&item_id) else {
        return error(StatusCode::NOT_FOUND, MSG_ITEM_NOT_FOUND);
    };
    if item.status != ItemStatus::OnSale {
        return error(StatusCode::FORBIDDEN, MSG_NOT_FOR_SALE);
    }
    if item.seller_id == session.user_id {
        return error(StatusCode::FORBIDDEN, MSG_SELF_PURCHASE);
    }
    if str_field(&body, "token").is_empty() {
        return error(StatusCode::BAD_REQUEST, MSG_BAD_CARD);
    }

    item.status = ItemStatus::Trading;
    item.buyer_id = session.user_id;
    tracing::info!(item_id, buyer_id = session.user_id, "item bought");
    Json(json!({ "transaction_evidence_id": item_id })).into_response()
}

// ── Ship ────────────────────────────────────────────────────────────

async fn ship(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let session = login_session(&state, &headers);
    if let Err(resp) = check_csrf(session.as_ref(), &body) {
        return resp;
    }
    let Some(session) = session else {
        return error(StatusCode::NOT_FOUND, MSG_NO_SESSION);
    };
    let Some(item_id) = int_field(&body, "item_id") else {
        return error(StatusCode::BAD_REQUEST, MSG_REQUIRED);
    };

    let Some(item) = state.item(item_id) else {
        return error(StatusCode::NOT_FOUND, MSG_ITEM_NOT_FOUND);
    };
    if item.seller_id != session.user_id {
        return error(StatusCode::FORBIDDEN, MSG_FORBIDDEN);
    }
    if item.status != ItemStatus::Trading {
        return error(StatusCode::FORBIDDEN, MSG_NOT_TRADING);
    }

    Json(json!({ "reserve_id": format!("R{item_id:08}") })).into_response()
}

// ── Items ───────────────────────────────────────────────────────────

async fn item_get(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.item(id) {
        Some(item) => Json(item).into_response(),
        None => error(StatusCode::NOT_FOUND, MSG_ITEM_NOT_FOUND),
    }
}

async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "not found")
}
