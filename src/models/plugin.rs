//! Plugin model. A plugin is a named, ordered bundle of skills; the
//! ordering itself lives in the plugin-skill link table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
    pub author_id: String,
    /// URL slug, unique per author
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Plugin {
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
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }
}
