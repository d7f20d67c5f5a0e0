use crate::api::error::ApiError;
use crate::api::session::SessionUser;
use crate::api::state::AppState;
use crate::models::Skill;
use crate::services::registry::{self, ResolvedSkill, SkillSubmission};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_skill))
        .route("/{id}", put(edit_skill))
        .route("/{author}/{skill}", get(resolve_skill))
        .route("/{author}/{skill}/raw", get(raw_content))
        .route("/{author}/{skill}/install", post(install_skill))
}

#[derive(Debug, Deserialize)]
struct ResolveQuery {
    format: Option<String>,
}

// GET /api/skills/{author}/{skill}
async fn resolve_skill(
    State(state): State<AppState>,
    Path((author, skill)): Path<(String, String)>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<Value>, ApiError> {
    let resolved = registry::resolve_skill(&state.storage, &author, &skill).await?;

    let mut body = json!({ "skill": skill_document(&resolved) });
    if query.format.as_deref() == Some("plugin") {
        body["plugin"] = plugin_manifest(&resolved);
    }
    Ok(Json(body))
}

fn skill_document(resolved: &ResolvedSkill) -> Value {
    json!({
        "name": resolved.skill.name,
        "title": resolved.skill.title,
        "description": resolved.skill.description,
        "category": resolved.skill.category,
        "version": resolved.version,
        "content_hash": resolved.content_hash,
        "installs": resolved.skill.installs,
        "author": resolved.author.profile(),
        "files": resolved.files,
    })
}

/// Plugin-compatible manifest shape for CLI tooling.
fn plugin_manifest(resolved: &ResolvedSkill) -> Value {
    let file_names: Vec<&str> = resolved.files.iter().map(|f| f.name.as_str()).collect();
    let mut skills = serde_json::Map::new();
    skills.insert(
        resolved.skill.name.clone(),
        json!({ "files": file_names }),
    );
    json!({
        "name": format!("{}-{}", resolved.author.username, resolved.skill.name),
        "description": resolved.skill.description,
        "version": resolved.version,
        "author": { "name": resolved.author.display_name },
        "skills": skills,
    })
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    download: Option<String>,
}

// GET /api/skills/{author}/{skill}/raw
async fn raw_content(
    State(state): State<AppState>,
    Path((author, skill)): Path<(String, String)>,
    Query(query): Query<RawQuery>,
) -> Result<Response, ApiError> {
    let resolved = registry::resolve_skill(&state.storage, &author, &skill).await?;
    let file = registry::primary_file(&resolved.files)?;

    let mut response = (
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        file.content.clone(),
    )
        .into_response();

    if query.download.as_deref() == Some("true") {
        let disposition = format!("attachment; filename=\"{}\"", file.name);
        if let Ok(value) = disposition.parse() {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}

// POST /api/skills/{author}/{skill}/install
async fn install_skill(
    State(state): State<AppState>,
    Path((author, skill)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let installs = registry::record_install(&state.storage, &author, &skill).await?;
    Ok(Json(json!({ "installs": installs })))
}

// POST /api/skills
async fn create_skill(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(submission): Json<SkillSubmission>,
) -> Result<(StatusCode, Json<Skill>), ApiError> {
    let skill = registry::create_skill(&state.storage, &user.id, submission).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

// PUT /api/skills/{id}
async fn edit_skill(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<String>,
    Json(submission): Json<SkillSubmission>,
) -> Result<Json<Skill>, ApiError> {
    let skill = registry::edit_skill(&state.storage, &user.id, &id, submission).await?;
    Ok(Json(skill))
}
