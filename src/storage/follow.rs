//! Follow edges. The primary table is keyed `(follower, following)`;
//! a mirror table keyed `(following, follower)` makes follower counts a
//! range scan instead of a full table walk.

use crate::models::Follow;
use crate::storage::StoreError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const FOLLOWS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("follows");
const FOLLOWERS_INDEX: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("follows_by_following");

#[derive(Debug, Clone)]
pub struct FollowStorage {
    db: Arc<Database>,
}

impl FollowStorage {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(FOLLOWS_TABLE)?;
        write_txn.open_table(FOLLOWERS_INDEX)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn create(&self, follow: &Follow) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let key = (follow.follower_id.as_str(), follow.following_id.as_str());
            let mut follows = write_txn.open_table(FOLLOWS_TABLE)?;
            if follows.get(key)?.is_some() {
                return Err(StoreError::Constraint { field: "follow" });
            }
            let json_bytes = serde_json::to_vec(follow)?;
            follows.insert(key, json_bytes.as_slice())?;

            let mut followers = write_txn.open_table(FOLLOWERS_INDEX)?;
            followers.insert(
                (follow.following_id.as_str(), follow.follower_id.as_str()),
                (),
            )?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove the edge; returns whether it existed.
    pub fn delete(&self, follower_id: &str, following_id: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut follows = write_txn.open_table(FOLLOWS_TABLE)?;
            let existed = follows.remove((follower_id, following_id))?.is_some();

            let mut followers = write_txn.open_table(FOLLOWERS_INDEX)?;
            followers.remove((following_id, follower_id))?;
            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    pub fn exists(&self, follower_id: &str, following_id: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FOLLOWS_TABLE)?;
        Ok(table.get((follower_id, following_id))?.is_some())
    }

    /// How many users this user follows.
    pub fn count_following(&self, user_id: &str) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FOLLOWS_TABLE)?;
        let mut count = 0;
        for item in table.range((user_id, "")..)? {
            let (key, _) = item?;
            if key.value().0 != user_id {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    /// How many users follow this user.
    pub fn count_followers(&self, user_id: &str) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FOLLOWERS_INDEX)?;
        let mut count = 0;
        for item in table.range((user_id, "")..)? {
            let (key, _) = item?;
            if key.value().0 != user_id {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}
