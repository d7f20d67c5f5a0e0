//! Directed follow edge between two users, unique per ordered pair.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: i64,
}

impl Follow {
    pub fn new(follower_id: String, following_id: String) -> Self {
        Self {
            follower_id,
            following_id,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
