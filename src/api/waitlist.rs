use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::services::accounts;
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    email: String,
}

// POST /api/waitlist
pub async fn join(
    State(state): State<AppState>,
    Json(req): Json<WaitlistRequest>,
) -> Result<Json<Value>, ApiError> {
    accounts::join_waitlist(&state.storage, &req.email).await?;
    Ok(Json(json!({ "success": true })))
}
