//! Skill and skill version models.
//! A skill is a markdown-based capability package; its content lives in
//! immutable, content-addressed versions.

use serde::{Deserialize, Serialize};

/// A published skill owned by one author. `(author_id, name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// Unique identifier for the skill
    pub id: String,
    /// Owning user's id
    pub author_id: String,
    /// URL slug, unique per author
    pub name: String,
    /// Display title
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Version string the skill currently designates as authoritative.
    /// Must reference an existing version row; the write path upholds
    /// this, not a foreign key.
    pub current_version: String,
    /// Install counter
    #[serde(default)]
    pub installs: u64,
    #[serde(default)]
    pub is_published: bool,
    /// Timestamp when the skill was created (milliseconds since epoch)
    pub created_at: i64,
    /// Timestamp when the skill was last updated (milliseconds since epoch)
    pub updated_at: i64,
}

impl Skill {
    pub fn new(
        author_id: String,
        name: String,
        title: String,
        description: Option<String>,
        category: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author_id,
            name,
            title,
            description,
            category,
            current_version: "1.0.0".to_string(),
            installs: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A named file inside a skill version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillFile {
    pub name: String,
    pub content: String,
}

/// An immutable snapshot of a skill's files. Corrections are new
/// versions, never mutations of an existing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillVersion {
    pub skill_id: String,
    /// Semantic version string, e.g. "1.0.0"
    pub version: String,
    /// `"sha256:" + hex(sha256(...))` over the file contents in order
    pub content_hash: String,
    /// Ordered file list; `SKILL.md` always comes first
    pub files: Vec<SkillFile>,
    /// Timestamp when the version was created (milliseconds since epoch)
    pub created_at: i64,
}

impl SkillVersion {
    pub fn new(skill_id: String, version: String, content_hash: String, files: Vec<SkillFile>) -> Self {
        Self {
            skill_id,
            version,
            content_hash,
            files,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
