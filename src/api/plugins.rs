use crate::api::error::ApiError;
use crate::api::session::SessionUser;
use crate::api::state::AppState;
use crate::models::Plugin;
use crate::services::bundler::{self, PluginSubmission};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_plugin))
        .route("/{id}/skills", put(replace_skills))
        .route("/{author}/{plugin}", get(resolve_plugin))
}

// GET /api/plugins/{author}/{plugin}
async fn resolve_plugin(
    State(state): State<AppState>,
    Path((author, plugin)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let resolved = bundler::resolve_plugin(&state.storage, &author, &plugin).await?;

    let skills: Vec<Value> = resolved
        .skills
        .iter()
        .enumerate()
        .map(|(position, skill)| {
            json!({
                "position": position,
                "id": skill.id,
                "name": skill.name,
                "title": skill.title,
                "description": skill.description,
                "category": skill.category,
                "installs": skill.installs,
            })
        })
        .collect();

    Ok(Json(json!({
        "plugin": {
            "name": resolved.plugin.name,
            "title": resolved.plugin.title,
            "description": resolved.plugin.description,
            "category": resolved.plugin.category,
        },
        "author": resolved.author.profile(),
        "skills": skills,
    })))
}

// POST /api/plugins
async fn create_plugin(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(submission): Json<PluginSubmission>,
) -> Result<(StatusCode, Json<Plugin>), ApiError> {
    let plugin = bundler::create_plugin(&state.storage, &user.id, submission).await?;
    Ok((StatusCode::CREATED, Json(plugin)))
}

#[derive(Debug, Deserialize)]
struct ReplaceSkillsRequest {
    skill_ids: Vec<String>,
}

// PUT /api/plugins/{id}/skills replaces the ordered skill links.
async fn replace_skills(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
    Json(req): Json<ReplaceSkillsRequest>,
) -> Result<Json<Value>, ApiError> {
    bundler::replace_links(&state.storage, &user.id, &id, req.skill_ids).await?;
    Ok(Json(json!({ "success": true })))
}
