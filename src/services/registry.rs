//! Skill registry: publishing, versioning and resolution of
//! content-addressed skill packages.

use crate::error::AppError;
use crate::models::{Skill, SkillFile, SkillVersion, User};
use crate::storage::Storage;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;

pub const PRIMARY_FILE: &str = "SKILL.md";
const INITIAL_VERSION: &str = "1.0.0";

/// Fields accepted by both the create and edit write paths.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillSubmission {
    pub title: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Body of `SKILL.md`
    #[serde(default)]
    pub skill_content: String,
    /// Extra named files; entries with a blank name or body are dropped
    #[serde(default)]
    pub additional_files: Vec<SkillFile>,
}

/// A skill joined with its author and the resolved current version.
#[derive(Debug, Clone)]
pub struct ResolvedSkill {
    pub skill: Skill,
    pub author: User,
    pub version: String,
    pub content_hash: String,
    pub files: Vec<SkillFile>,
}

/// `"sha256:" + hex(sha256(...))` over the file contents in list order.
/// File names deliberately do not participate in the digest.
pub fn content_hash(files: &[SkillFile]) -> String {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.content.as_bytes());
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Increment the patch component, leaving MAJOR and MINOR exactly as
/// they appear in the current string. A missing or non-numeric patch
/// counts as 0, so `"1.0"` bumps to `"1.0.1"`.
pub fn bump_patch(current: &str) -> String {
    let mut parts = current.split('.');
    let major = parts.next().filter(|p| !p.is_empty()).unwrap_or("1");
    let minor = parts.next().unwrap_or("0");
    let patch: u64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    format!("{major}.{minor}.{}", patch + 1)
}

/// `SKILL.md` always leads the file list, even when empty; additional
/// files are kept only when both trimmed name and content are non-empty.
fn assemble_files(submission: &SkillSubmission) -> Vec<SkillFile> {
    let mut files = vec![SkillFile {
        name: PRIMARY_FILE.to_string(),
        content: submission.skill_content.clone(),
    }];
    for file in &submission.additional_files {
        let name = file.name.trim();
        if !name.is_empty() && !file.content.trim().is_empty() {
            files.push(SkillFile {
                name: name.to_string(),
                content: file.content.clone(),
            });
        }
    }
    files
}

fn validate(submission: &SkillSubmission) -> Result<(String, String), AppError> {
    let title = submission.title.trim();
    let name = submission.name.trim();
    if title.is_empty() || name.is_empty() {
        return Err(AppError::Validation(
            "title and name are required".to_string(),
        ));
    }
    Ok((title.to_string(), name.to_string()))
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Publish a new skill at version 1.0.0.
pub async fn create_skill(
    storage: &Storage,
    author_id: &str,
    submission: SkillSubmission,
) -> Result<Skill, AppError> {
    let (title, name) = validate(&submission)?;
    let files = assemble_files(&submission);
    let hash = content_hash(&files);

    let skill = Skill::new(
        author_id.to_string(),
        name,
        title,
        optional(&submission.description),
        optional(&submission.category),
    );
    let version = SkillVersion::new(
        skill.id.clone(),
        INITIAL_VERSION.to_string(),
        hash,
        files,
    );

    storage.skills.create(&skill, &version)?;
    Ok(skill)
}

/// Publish a new version of an existing skill. Always a patch bump;
/// prior versions are retained untouched.
pub async fn edit_skill(
    storage: &Storage,
    actor_id: &str,
    skill_id: &str,
    submission: SkillSubmission,
) -> Result<Skill, AppError> {
    let mut skill = storage
        .skills
        .get(skill_id)?
        .ok_or(AppError::NotFound("Skill"))?;
    if skill.author_id != actor_id {
        return Err(AppError::Forbidden(
            "you can only edit your own skills".to_string(),
        ));
    }

    let (title, name) = validate(&submission)?;
    let files = assemble_files(&submission);
    let hash = content_hash(&files);
    let next_version = bump_patch(&skill.current_version);

    skill.title = title;
    skill.name = name;
    skill.description = optional(&submission.description);
    skill.category = optional(&submission.category);
    skill.current_version = next_version.clone();
    skill.updated_at = chrono::Utc::now().timestamp_millis();

    let version = SkillVersion::new(skill.id.clone(), next_version, hash, files);
    storage.skills.update_with_version(&skill, &version)?;
    Ok(skill)
}

/// Look up a skill by author handle and slug and resolve its current
/// content.
pub async fn resolve_skill(
    storage: &Storage,
    author_username: &str,
    skill_name: &str,
) -> Result<ResolvedSkill, AppError> {
    let author = storage
        .users
        .get_by_username(author_username)?
        .ok_or(AppError::NotFound("Author"))?;
    let skill = storage
        .skills
        .get_by_author_name(&author.id, skill_name)?
        .ok_or(AppError::NotFound("Skill"))?;

    let version = current_version(storage, &skill)?;
    Ok(ResolvedSkill {
        version: version.version.clone(),
        content_hash: version.content_hash,
        files: version.files,
        skill,
        author,
    })
}

/// Select the version row the skill's pointer designates. A stale
/// pointer falls back to the most recent version by creation time
/// rather than an arbitrary row; a skill with no versions at all is an
/// invalid state and resolves to NotFound.
pub fn current_version(storage: &Storage, skill: &Skill) -> Result<SkillVersion, AppError> {
    if let Some(version) = storage.skills.get_version(&skill.id, &skill.current_version)? {
        return Ok(version);
    }

    let versions = storage.skills.list_versions(&skill.id)?;
    let fallback = versions
        .into_iter()
        .max_by_key(|v| v.created_at)
        .ok_or(AppError::NotFound("Skill content"))?;
    warn!(
        skill_id = %skill.id,
        pointer = %skill.current_version,
        served = %fallback.version,
        "current version pointer is stale; serving most recent version"
    );
    Ok(fallback)
}

/// The file served by the raw endpoint: `SKILL.md` when present,
/// otherwise the first file in list order.
pub fn primary_file(files: &[SkillFile]) -> Result<&SkillFile, AppError> {
    files
        .iter()
        .find(|f| f.name == PRIMARY_FILE)
        .or_else(|| files.first())
        .ok_or(AppError::NotFound("Skill content"))
}

/// Bump the install counter for a skill addressed by handle + slug.
pub async fn record_install(
    storage: &Storage,
    author_username: &str,
    skill_name: &str,
) -> Result<u64, AppError> {
    let author = storage
        .users
        .get_by_username(author_username)?
        .ok_or(AppError::NotFound("Author"))?;
    let skill = storage
        .skills
        .get_by_author_name(&author.id, skill_name)?
        .ok_or(AppError::NotFound("Skill"))?;

    storage
        .skills
        .increment_installs(&skill.id)?
        .ok_or(AppError::NotFound("Skill"))
}
