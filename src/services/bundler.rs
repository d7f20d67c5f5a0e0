//! Plugin bundler: named, ordered collections of skills.

use crate::error::AppError;
use crate::models::{Plugin, Skill, User};
use crate::storage::Storage;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PluginSubmission {
    pub title: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// A plugin joined with its author and linked skills in position order.
#[derive(Debug, Clone)]
pub struct ResolvedPlugin {
    pub plugin: Plugin,
    pub author: User,
    pub skills: Vec<Skill>,
}

pub async fn create_plugin(
    storage: &Storage,
    author_id: &str,
    submission: PluginSubmission,
) -> Result<Plugin, AppError> {
    let title = submission.title.trim();
    let name = submission.name.trim();
    if title.is_empty() || name.is_empty() {
        return Err(AppError::Validation(
            "title and name are required".to_string(),
        ));
    }

    let plugin = Plugin::new(
        author_id.to_string(),
        name.to_string(),
        title.to_string(),
        submission.description.filter(|d| !d.trim().is_empty()),
        submission.category.filter(|c| !c.trim().is_empty()),
    );
    storage.plugins.create(&plugin)?;
    Ok(plugin)
}

/// Replace all of a plugin's skill links with the supplied order.
/// Positions become the indexes of the list, so replaying the same
/// order yields the same rows.
pub async fn replace_links(
    storage: &Storage,
    actor_id: &str,
    plugin_id: &str,
    skill_ids: Vec<String>,
) -> Result<(), AppError> {
    let plugin = storage
        .plugins
        .get(plugin_id)?
        .ok_or(AppError::NotFound("Plugin"))?;
    if plugin.author_id != actor_id {
        return Err(AppError::Forbidden(
            "you can only edit your own plugins".to_string(),
        ));
    }

    for skill_id in &skill_ids {
        if storage.skills.get(skill_id)?.is_none() {
            return Err(AppError::Validation(format!(
                "unknown skill id {skill_id}"
            )));
        }
    }

    storage.plugins.replace_links(plugin_id, &skill_ids)?;
    Ok(())
}

pub async fn resolve_plugin(
    storage: &Storage,
    author_username: &str,
    plugin_name: &str,
) -> Result<ResolvedPlugin, AppError> {
    let author = storage
        .users
        .get_by_username(author_username)?
        .ok_or(AppError::NotFound("Author"))?;
    let plugin = storage
        .plugins
        .get_by_author_name(&author.id, plugin_name)?
        .ok_or(AppError::NotFound("Plugin"))?;

    let mut skills = Vec::new();
    for skill_id in storage.plugins.links(&plugin.id)? {
        if let Some(skill) = storage.skills.get(&skill_id)? {
            skills.push(skill);
        }
    }

    Ok(ResolvedPlugin {
        plugin,
        author,
        skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::registry::{self, SkillSubmission};
    use crate::storage::test_util::open_temp;

    fn seed_user(storage: &Storage, username: &str) -> User {
        let user = User::new(username.to_string(), username.to_string(), None);
        storage.users.create(&user).unwrap();
        user
    }

    async fn seed_skill(storage: &Storage, author_id: &str, name: &str) -> Skill {
        registry::create_skill(
            storage,
            author_id,
            SkillSubmission {
                title: name.to_string(),
                name: name.to_string(),
                description: None,
                category: None,
                skill_content: format!("# {name}"),
                additional_files: Vec::new(),
            },
        )
        .await
        .unwrap()
    }

    fn plugin_submission(name: &str) -> PluginSubmission {
        PluginSubmission {
            title: "Bundle".to_string(),
            name: name.to_string(),
            description: None,
            category: None,
        }
    }

    #[tokio::test]
    async fn resolve_returns_skills_in_link_order() {
        let (storage, _tmp) = open_temp();
        let author = seed_user(&storage, "mager");
        let first = seed_skill(&storage, &author.id, "kana").await;
        let second = seed_skill(&storage, &author.id, "phrases").await;
        let plugin = create_plugin(&storage, &author.id, plugin_submission("japanese"))
            .await
            .unwrap();

        replace_links(
            &storage,
            &author.id,
            &plugin.id,
            vec![second.id.clone(), first.id.clone()],
        )
        .await
        .unwrap();

        let resolved = resolve_plugin(&storage, "mager", "japanese").await.unwrap();
        let names: Vec<&str> = resolved.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["phrases", "kana"]);
    }

    #[tokio::test]
    async fn replace_links_twice_yields_identical_rows() {
        let (storage, _tmp) = open_temp();
        let author = seed_user(&storage, "mager");
        let skill = seed_skill(&storage, &author.id, "kana").await;
        let plugin = create_plugin(&storage, &author.id, plugin_submission("japanese"))
            .await
            .unwrap();

        let order = vec![skill.id.clone()];
        replace_links(&storage, &author.id, &plugin.id, order.clone())
            .await
            .unwrap();
        replace_links(&storage, &author.id, &plugin.id, order.clone())
            .await
            .unwrap();

        assert_eq!(storage.plugins.links(&plugin.id).unwrap(), order);
    }

    #[tokio::test]
    async fn only_the_owner_may_relink() {
        let (storage, _tmp) = open_temp();
        let author = seed_user(&storage, "mager");
        let other = seed_user(&storage, "intruder");
        let plugin = create_plugin(&storage, &author.id, plugin_submission("japanese"))
            .await
            .unwrap();

        let err = replace_links(&storage, &other.id, &plugin.id, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unknown_skill_id_is_rejected() {
        let (storage, _tmp) = open_temp();
        let author = seed_user(&storage, "mager");
        let plugin = create_plugin(&storage, &author.id, plugin_submission("japanese"))
            .await
            .unwrap();

        let err = replace_links(
            &storage,
            &author.id,
            &plugin.id,
            vec!["no-such-skill".to_string()],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_plugin_name_conflicts() {
        let (storage, _tmp) = open_temp();
        let author = seed_user(&storage, "mager");
        create_plugin(&storage, &author.id, plugin_submission("japanese"))
            .await
            .unwrap();
        let err = create_plugin(&storage, &author.id, plugin_submission("japanese"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { field: "name" }));
    }
}
