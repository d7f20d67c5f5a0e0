use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::services::catalog;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    category: Option<String>,
}

// GET /api/browse
pub async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<Value>, ApiError> {
    let category = query.category.as_deref();
    let skills = catalog::browse_skills(&state.storage, category).await?;
    let plugins = catalog::browse_plugins(&state.storage, category).await?;

    Ok(Json(json!({
        "skills": skills,
        "plugins": plugins,
        "category": category,
    })))
}
