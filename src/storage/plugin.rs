//! Plugin storage: plugin rows, a per-author name index, and ordered
//! skill links keyed by `(plugin_id, position)`.

use crate::models::Plugin;
use crate::storage::StoreError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const PLUGINS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("plugins");
const NAME_INDEX: TableDefinition<(&str, &str), &str> =
    TableDefinition::new("plugins_by_author_name");
const LINKS_TABLE: TableDefinition<(&str, u32), &str> = TableDefinition::new("plugin_skills");

#[derive(Debug, Clone)]
pub struct PluginStorage {
    db: Arc<Database>,
}

impl PluginStorage {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(PLUGINS_TABLE)?;
        write_txn.open_table(NAME_INDEX)?;
        write_txn.open_table(LINKS_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn create(&self, plugin: &Plugin) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut names = write_txn.open_table(NAME_INDEX)?;
            let key = (plugin.author_id.as_str(), plugin.name.as_str());
            if names.get(key)?.is_some() {
                return Err(StoreError::Constraint { field: "name" });
            }
            names.insert(key, plugin.id.as_str())?;

            let mut plugins = write_txn.open_table(PLUGINS_TABLE)?;
            let json_bytes = serde_json::to_vec(plugin)?;
            plugins.insert(plugin.id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Plugin>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PLUGINS_TABLE)?;

        if let Some(value) = table.get(id)? {
            let plugin: Plugin = serde_json::from_slice(value.value())?;
            Ok(Some(plugin))
        } else {
            Ok(None)
        }
    }

    pub fn get_by_author_name(
        &self,
        author_id: &str,
        name: &str,
    ) -> Result<Option<Plugin>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn.open_table(NAME_INDEX)?;

        let Some(id) = names.get((author_id, name))?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };

        let plugins = read_txn.open_table(PLUGINS_TABLE)?;
        if let Some(value) = plugins.get(id.as_str())? {
            let plugin: Plugin = serde_json::from_slice(value.value())?;
            Ok(Some(plugin))
        } else {
            Ok(None)
        }
    }

    pub fn list_published(&self) -> Result<Vec<Plugin>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PLUGINS_TABLE)?;

        let mut plugins = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let plugin: Plugin = serde_json::from_slice(value.value())?;
            if plugin.is_published {
                plugins.push(plugin);
            }
        }

        Ok(plugins)
    }

    /// Replace every link row for a plugin with the supplied order, in
    /// one transaction. Positions are the indexes of the new list, so
    /// they are always contiguous from 0. Replaying the same list is a
    /// no-op in effect.
    pub fn replace_links(&self, plugin_id: &str, skill_ids: &[String]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut links = write_txn.open_table(LINKS_TABLE)?;

            let existing: Vec<u32> = {
                let mut positions = Vec::new();
                for item in links.range((plugin_id, 0)..)? {
                    let (key, _) = item?;
                    let (id, position) = key.value();
                    if id != plugin_id {
                        break;
                    }
                    positions.push(position);
                }
                positions
            };
            for position in existing {
                links.remove((plugin_id, position))?;
            }

            for (position, skill_id) in skill_ids.iter().enumerate() {
                links.insert((plugin_id, position as u32), skill_id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Linked skill ids in ascending position order.
    pub fn links(&self, plugin_id: &str) -> Result<Vec<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LINKS_TABLE)?;

        let mut skill_ids = Vec::new();
        for item in table.range((plugin_id, 0)..)? {
            let (key, value) = item?;
            if key.value().0 != plugin_id {
                break;
            }
            skill_ids.push(value.value().to_string());
        }

        Ok(skill_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open() -> (PluginStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        (PluginStorage::new(db).unwrap(), temp_dir)
    }

    fn sample(author: &str, name: &str) -> Plugin {
        Plugin::new(
            author.to_string(),
            name.to_string(),
            "A Plugin".to_string(),
            None,
            None,
        )
    }

    #[test]
    fn create_enforces_per_author_name() {
        let (storage, _tmp) = open();
        storage.create(&sample("author-1", "bundle")).unwrap();

        let err = storage.create(&sample("author-1", "bundle")).unwrap_err();
        assert!(matches!(err, StoreError::Constraint { field: "name" }));

        storage.create(&sample("author-2", "bundle")).unwrap();
    }

    #[test]
    fn replace_links_is_idempotent_and_ordered() {
        let (storage, _tmp) = open();
        let plugin = sample("author-1", "bundle");
        storage.create(&plugin).unwrap();

        let order = vec!["s-b".to_string(), "s-a".to_string(), "s-c".to_string()];
        storage.replace_links(&plugin.id, &order).unwrap();
        assert_eq!(storage.links(&plugin.id).unwrap(), order);

        storage.replace_links(&plugin.id, &order).unwrap();
        assert_eq!(storage.links(&plugin.id).unwrap(), order);
    }

    #[test]
    fn replace_links_drops_stale_positions() {
        let (storage, _tmp) = open();
        let plugin = sample("author-1", "bundle");
        storage.create(&plugin).unwrap();

        storage
            .replace_links(
                &plugin.id,
                &["a".to_string(), "b".to_string(), "c".to_string()],
            )
            .unwrap();
        storage.replace_links(&plugin.id, &["c".to_string()]).unwrap();

        assert_eq!(storage.links(&plugin.id).unwrap(), vec!["c".to_string()]);
    }

    #[test]
    fn links_are_scoped_per_plugin() {
        let (storage, _tmp) = open();
        let first = sample("author-1", "bundle-a");
        let second = sample("author-1", "bundle-b");
        storage.create(&first).unwrap();
        storage.create(&second).unwrap();

        storage.replace_links(&first.id, &["x".to_string()]).unwrap();
        storage.replace_links(&second.id, &["y".to_string()]).unwrap();

        assert_eq!(storage.links(&first.id).unwrap(), vec!["x".to_string()]);
        assert_eq!(storage.links(&second.id).unwrap(), vec!["y".to_string()]);
    }
}
