//! User accounts and the public profile projection.

use serde::{Deserialize, Serialize};

/// A registered user. Accounts are created by the self-serve signup form
/// or on first identity-provider login, and are never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: String,
    /// Unique handle, lowercased
    pub username: String,
    /// Display name shown on profiles
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Stable subject identifier from the identity provider, set once
    /// the account is linked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    /// Whether the account has been verified by the marketplace
    #[serde(default)]
    pub verified: bool,
    /// Free-form topics the user is interested in
    #[serde(default)]
    pub topics: Vec<String>,
    /// Timestamp when the user was created (milliseconds since epoch)
    pub created_at: i64,
    /// Timestamp when the user was last updated (milliseconds since epoch)
    pub updated_at: i64,
}

impl User {
    pub fn new(username: String, display_name: String, email: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            display_name,
            bio: None,
            avatar_url: None,
            email,
            subject_id: None,
            verified: false,
            topics: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Public fields safe to embed in catalog and skill responses.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            verified: self.verified,
        }
    }
}

/// Public author projection attached to skills, plugins and catalog rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub verified: bool,
}
