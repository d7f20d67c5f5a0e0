use crate::api::error::ApiError;
use crate::api::session::SessionUser;
use crate::api::state::AppState;
use crate::services::accounts::{self, Dashboard, ProfilePage};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{username}", get(profile))
        .route("/{username}/follow", post(follow).delete(unfollow))
}

// GET /api/users/{username}
async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfilePage>, ApiError> {
    let page = accounts::profile(&state.storage, &username).await?;
    Ok(Json(page))
}

// POST /api/users/{username}/follow
async fn follow(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    accounts::follow(&state.storage, &user.id, &username).await?;
    Ok(Json(json!({ "following": true })))
}

// DELETE /api/users/{username}/follow
async fn unfollow(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    accounts::unfollow(&state.storage, &user.id, &username).await?;
    Ok(Json(json!({ "following": false })))
}

// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = accounts::dashboard(&state.storage, &user.id).await?;
    Ok(Json(dashboard))
}
