//! Waitlist signup record. Capture-only; never referenced elsewhere.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub email: String,
    pub created_at: i64,
}

impl WaitlistEntry {
    pub fn new(email: String) -> Self {
        Self {
            email,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
