use crate::auth::TokenVerifier;
use crate::storage::Storage;
use std::sync::Arc;

/// Application state shared across all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    /// Identity provider client; `None` until configured, in which case
    /// token login fails with a clear auth error.
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    /// Mark session cookies `Secure` (production deployments)
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        storage: Arc<Storage>,
        verifier: Option<Arc<dyn TokenVerifier>>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            storage,
            verifier,
            secure_cookies,
        }
    }
}
