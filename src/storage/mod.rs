//! Persistence layer over an embedded redb database.
//!
//! Each aggregate gets its own storage struct holding the shared
//! `Arc<Database>` and opening its tables up front. Rows are serialized
//! as JSON bytes. Unique constraints are enforced through secondary
//! index tables and surface as the typed [`StoreError::Constraint`]
//! variant, so callers never inspect driver message text.
//!
//! Multi-row writes (skill create, version publish, plugin link
//! replacement) each run inside a single write transaction; redb
//! serializes writers, so those sequences cannot interleave.

pub mod follow;
pub mod plugin;
pub mod skill;
pub mod user;
pub mod waitlist;

use redb::Database;
use std::sync::Arc;
use thiserror::Error;

pub use follow::FollowStorage;
pub use plugin::PluginStorage;
pub use skill::SkillStorage;
pub use user::UserStorage;
pub use waitlist::WaitlistStorage;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index already holds the value being inserted
    #[error("unique constraint violated on {field}")]
    Constraint { field: &'static str },
    #[error(transparent)]
    Database(#[from] redb::DatabaseError),
    #[error(transparent)]
    Transaction(#[from] redb::TransactionError),
    #[error(transparent)]
    Table(#[from] redb::TableError),
    #[error(transparent)]
    Storage(#[from] redb::StorageError),
    #[error(transparent)]
    Commit(#[from] redb::CommitError),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Central storage manager that initializes all stores over one database.
pub struct Storage {
    pub users: UserStorage,
    pub skills: SkillStorage,
    pub plugins: PluginStorage,
    pub follows: FollowStorage,
    pub waitlist: WaitlistStorage,
}

impl Storage {
    /// Create a new storage instance at the given path, creating the
    /// database file and all tables if they don't exist.
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db = Arc::new(Database::create(path)?);

        let users = UserStorage::new(db.clone())?;
        let skills = SkillStorage::new(db.clone())?;
        let plugins = PluginStorage::new(db.clone())?;
        let follows = FollowStorage::new(db.clone())?;
        let waitlist = WaitlistStorage::new(db)?;

        Ok(Self {
            users,
            skills,
            plugins,
            follows,
            waitlist,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::Storage;
    use tempfile::TempDir;

    pub fn open_temp() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Storage::new(db_path.to_str().unwrap()).unwrap();
        (storage, temp_dir)
    }
}
