//! User storage with unique indexes on username, email and the
//! identity-provider subject id.

use crate::models::User;
use crate::storage::StoreError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const USERNAME_INDEX: TableDefinition<&str, &str> = TableDefinition::new("users_by_username");
const EMAIL_INDEX: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");
const SUBJECT_INDEX: TableDefinition<&str, &str> = TableDefinition::new("users_by_subject");

#[derive(Debug, Clone)]
pub struct UserStorage {
    db: Arc<Database>,
}

impl UserStorage {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USERS_TABLE)?;
        write_txn.open_table(USERNAME_INDEX)?;
        write_txn.open_table(EMAIL_INDEX)?;
        write_txn.open_table(SUBJECT_INDEX)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Insert a new user, claiming its username/email/subject index slots.
    pub fn create(&self, user: &User) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut usernames = write_txn.open_table(USERNAME_INDEX)?;
            if usernames.get(user.username.as_str())?.is_some() {
                return Err(StoreError::Constraint { field: "username" });
            }
            usernames.insert(user.username.as_str(), user.id.as_str())?;

            let mut emails = write_txn.open_table(EMAIL_INDEX)?;
            if let Some(email) = user.email.as_deref() {
                if emails.get(email)?.is_some() {
                    return Err(StoreError::Constraint { field: "email" });
                }
                emails.insert(email, user.id.as_str())?;
            }

            let mut subjects = write_txn.open_table(SUBJECT_INDEX)?;
            if let Some(subject) = user.subject_id.as_deref() {
                if subjects.get(subject)?.is_some() {
                    return Err(StoreError::Constraint { field: "subject" });
                }
                subjects.insert(subject, user.id.as_str())?;
            }

            let mut users = write_txn.open_table(USERS_TABLE)?;
            let json_bytes = serde_json::to_vec(user)?;
            users.insert(user.id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;

        if let Some(value) = table.get(id)? {
            let user: User = serde_json::from_slice(value.value())?;
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub fn get_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.get_indexed(USERNAME_INDEX, username)
    }

    pub fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.get_indexed(EMAIL_INDEX, email)
    }

    pub fn get_by_subject(&self, subject: &str) -> Result<Option<User>, StoreError> {
        self.get_indexed(SUBJECT_INDEX, subject)
    }

    fn get_indexed(
        &self,
        index: TableDefinition<&str, &str>,
        key: &str,
    ) -> Result<Option<User>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let index_table = read_txn.open_table(index)?;

        let Some(id) = index_table.get(key)?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS_TABLE)?;
        if let Some(value) = users.get(id.as_str())? {
            let user: User = serde_json::from_slice(value.value())?;
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Overwrite an existing user row, re-keying the email and subject
    /// indexes when those fields changed. The username is immutable in
    /// scope, so its index entry is left alone.
    pub fn update(&self, user: &User) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS_TABLE)?;
            let previous: User = match users.get(user.id.as_str())? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::Constraint { field: "user" }),
            };

            let mut emails = write_txn.open_table(EMAIL_INDEX)?;
            if previous.email != user.email {
                if let Some(old) = previous.email.as_deref() {
                    emails.remove(old)?;
                }
                if let Some(new) = user.email.as_deref() {
                    if emails.get(new)?.is_some() {
                        return Err(StoreError::Constraint { field: "email" });
                    }
                    emails.insert(new, user.id.as_str())?;
                }
            }

            let mut subjects = write_txn.open_table(SUBJECT_INDEX)?;
            if previous.subject_id != user.subject_id {
                if let Some(old) = previous.subject_id.as_deref() {
                    subjects.remove(old)?;
                }
                if let Some(new) = user.subject_id.as_deref() {
                    if subjects.get(new)?.is_some() {
                        return Err(StoreError::Constraint { field: "subject" });
                    }
                    subjects.insert(new, user.id.as_str())?;
                }
            }

            let json_bytes = serde_json::to_vec(user)?;
            users.insert(user.id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
