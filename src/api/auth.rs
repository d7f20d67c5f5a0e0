use crate::api::error::ApiError;
use crate::api::session;
use crate::api::state::AppState;
use crate::error::AppError;
use crate::models::User;
use crate::services::accounts::{self, SignupRequest};
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth", post(token_login))
        .route("/login", post(username_login))
        .route("/logout", post(logout))
        .route("/signup", post(signup))
}

#[derive(Debug, Deserialize)]
struct TokenLoginRequest {
    credential: String,
    username: Option<String>,
    display_name: Option<String>,
}

// POST /api/auth
async fn token_login(
    State(state): State<AppState>,
    Json(req): Json<TokenLoginRequest>,
) -> Result<Response, ApiError> {
    let verifier = state
        .verifier
        .as_deref()
        .ok_or_else(|| AppError::Auth("identity provider not configured".to_string()))
        .map_err(ApiError::from)?;

    let user = accounts::login_with_token(
        &state.storage,
        verifier,
        &req.credential,
        req.username.as_deref(),
        req.display_name.as_deref(),
    )
    .await?;

    Ok(session_response(&user, state.secure_cookies))
}

#[derive(Debug, Deserialize)]
struct UsernameLoginRequest {
    username: String,
}

// POST /api/login
async fn username_login(
    State(state): State<AppState>,
    Json(req): Json<UsernameLoginRequest>,
) -> Result<Response, ApiError> {
    let user = accounts::login_with_username(&state.storage, &req.username).await?;
    Ok(session_response(&user, state.secure_cookies))
}

// POST /api/logout
async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session::clear_cookie())],
        Json(json!({ "success": true })),
    )
}

// POST /api/signup (no session issued)
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let user = accounts::signup(&state.storage, req).await?;
    Ok((StatusCode::CREATED, Json(public_user(&user))))
}

fn session_response(user: &User, secure: bool) -> Response {
    (
        [(header::SET_COOKIE, session::issue_cookie(&user.id, secure))],
        Json(json!({ "user": public_user(user) })),
    )
        .into_response()
}

fn public_user(user: &User) -> serde_json::Value {
    json!({
        "id": user.id,
        "username": user.username,
        "display_name": user.display_name,
    })
}
