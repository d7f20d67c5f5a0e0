//! Skill storage: skill rows, a per-author name index, and the
//! append-only version table keyed by `(skill_id, version)`.

use crate::models::{Skill, SkillVersion};
use crate::storage::StoreError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const SKILLS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("skills");
const NAME_INDEX: TableDefinition<(&str, &str), &str> = TableDefinition::new("skills_by_author_name");
const VERSIONS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("skill_versions");

#[derive(Debug, Clone)]
pub struct SkillStorage {
    db: Arc<Database>,
}

impl SkillStorage {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(SKILLS_TABLE)?;
        write_txn.open_table(NAME_INDEX)?;
        write_txn.open_table(VERSIONS_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a skill together with its initial version in one
    /// transaction. A skill row never exists without a version row.
    pub fn create(&self, skill: &Skill, version: &SkillVersion) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut names = write_txn.open_table(NAME_INDEX)?;
            let key = (skill.author_id.as_str(), skill.name.as_str());
            if names.get(key)?.is_some() {
                return Err(StoreError::Constraint { field: "name" });
            }
            names.insert(key, skill.id.as_str())?;

            let mut skills = write_txn.open_table(SKILLS_TABLE)?;
            let json_bytes = serde_json::to_vec(skill)?;
            skills.insert(skill.id.as_str(), json_bytes.as_slice())?;

            let mut versions = write_txn.open_table(VERSIONS_TABLE)?;
            let version_bytes = serde_json::to_vec(version)?;
            versions.insert(
                (skill.id.as_str(), version.version.as_str()),
                version_bytes.as_slice(),
            )?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Overwrite the skill row and append a new version, atomically.
    /// Renames re-key the per-author name index with the same conflict
    /// semantics as `create`; existing version rows are never touched.
    pub fn update_with_version(
        &self,
        skill: &Skill,
        version: &SkillVersion,
    ) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut skills = write_txn.open_table(SKILLS_TABLE)?;
            let previous: Skill = match skills.get(skill.id.as_str())? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::Constraint { field: "skill" }),
            };

            if previous.name != skill.name {
                let mut names = write_txn.open_table(NAME_INDEX)?;
                let new_key = (skill.author_id.as_str(), skill.name.as_str());
                if names.get(new_key)?.is_some() {
                    return Err(StoreError::Constraint { field: "name" });
                }
                names.remove((previous.author_id.as_str(), previous.name.as_str()))?;
                names.insert(new_key, skill.id.as_str())?;
            }

            let mut versions = write_txn.open_table(VERSIONS_TABLE)?;
            let version_key = (skill.id.as_str(), version.version.as_str());
            if versions.get(version_key)?.is_some() {
                return Err(StoreError::Constraint { field: "version" });
            }
            let version_bytes = serde_json::to_vec(version)?;
            versions.insert(version_key, version_bytes.as_slice())?;

            let json_bytes = serde_json::to_vec(skill)?;
            skills.insert(skill.id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Overwrite the skill row alone (install counter, publish flag).
    pub fn update(&self, skill: &Skill) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut skills = write_txn.open_table(SKILLS_TABLE)?;
            let json_bytes = serde_json::to_vec(skill)?;
            skills.insert(skill.id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Skill>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SKILLS_TABLE)?;

        if let Some(value) = table.get(id)? {
            let skill: Skill = serde_json::from_slice(value.value())?;
            Ok(Some(skill))
        } else {
            Ok(None)
        }
    }

    pub fn get_by_author_name(
        &self,
        author_id: &str,
        name: &str,
    ) -> Result<Option<Skill>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn.open_table(NAME_INDEX)?;

        let Some(id) = names.get((author_id, name))?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };

        let skills = read_txn.open_table(SKILLS_TABLE)?;
        if let Some(value) = skills.get(id.as_str())? {
            let skill: Skill = serde_json::from_slice(value.value())?;
            Ok(Some(skill))
        } else {
            Ok(None)
        }
    }

    pub fn list_by_author(&self, author_id: &str) -> Result<Vec<Skill>, StoreError> {
        self.scan(|skill| skill.author_id == author_id)
    }

    pub fn list_published(&self) -> Result<Vec<Skill>, StoreError> {
        self.scan(|skill| skill.is_published)
    }

    fn scan(&self, keep: impl Fn(&Skill) -> bool) -> Result<Vec<Skill>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SKILLS_TABLE)?;

        let mut skills = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            let skill: Skill = serde_json::from_slice(value.value())?;
            if keep(&skill) {
                skills.push(skill);
            }
        }

        Ok(skills)
    }

    /// All versions of a skill, in version-string key order.
    pub fn list_versions(&self, skill_id: &str) -> Result<Vec<SkillVersion>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VERSIONS_TABLE)?;

        let mut versions = Vec::new();
        for item in table.range((skill_id, "")..)? {
            let (key, value) = item?;
            if key.value().0 != skill_id {
                break;
            }
            let version: SkillVersion = serde_json::from_slice(value.value())?;
            versions.push(version);
        }

        Ok(versions)
    }

    pub fn get_version(
        &self,
        skill_id: &str,
        version: &str,
    ) -> Result<Option<SkillVersion>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VERSIONS_TABLE)?;

        if let Some(value) = table.get((skill_id, version))? {
            let row: SkillVersion = serde_json::from_slice(value.value())?;
            Ok(Some(row))
        } else {
            Ok(None)
        }
    }

    /// Bump the install counter, returning the new total, or `None` if
    /// the skill does not exist.
    pub fn increment_installs(&self, id: &str) -> Result<Option<u64>, StoreError> {
        let write_txn = self.db.begin_write()?;
        let installs = {
            let mut skills = write_txn.open_table(SKILLS_TABLE)?;
            let mut skill: Skill = match skills.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Ok(None),
            };
            skill.installs += 1;
            let json_bytes = serde_json::to_vec(&skill)?;
            skills.insert(id, json_bytes.as_slice())?;
            skill.installs
        };
        write_txn.commit()?;
        Ok(Some(installs))
    }
}
