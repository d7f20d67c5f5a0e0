//! Browse read model. Re-scans the published set on every call; there
//! is no pagination or ranking, which is acceptable at the expected
//! data volume.

use crate::error::AppError;
use crate::models::UserProfile;
use crate::storage::Storage;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSkill {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub installs: u64,
    pub author: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPlugin {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub author: Option<UserProfile>,
}

fn category_matches(category: Option<&str>, row: &Option<String>) -> bool {
    match category {
        Some(filter) => row.as_deref() == Some(filter),
        None => true,
    }
}

/// All published skills with their author's public profile, optionally
/// filtered by category.
pub async fn browse_skills(
    storage: &Storage,
    category: Option<&str>,
) -> Result<Vec<CatalogSkill>, AppError> {
    let mut rows = Vec::new();
    for skill in storage.skills.list_published()? {
        if !category_matches(category, &skill.category) {
            continue;
        }
        let author = storage.users.get(&skill.author_id)?.map(|u| u.profile());
        rows.push(CatalogSkill {
            name: skill.name,
            title: skill.title,
            description: skill.description,
            category: skill.category,
            installs: skill.installs,
            author,
        });
    }
    Ok(rows)
}

/// All published plugins, same join and filter as skills.
pub async fn browse_plugins(
    storage: &Storage,
    category: Option<&str>,
) -> Result<Vec<CatalogPlugin>, AppError> {
    let mut rows = Vec::new();
    for plugin in storage.plugins.list_published()? {
        if !category_matches(category, &plugin.category) {
            continue;
        }
        let author = storage.users.get(&plugin.author_id)?.map(|u| u.profile());
        rows.push(CatalogPlugin {
            name: plugin.name,
            title: plugin.title,
            description: plugin.description,
            category: plugin.category,
            author,
        });
    }
    Ok(rows)
}
