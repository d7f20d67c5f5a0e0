pub mod auth;
pub mod browse;
pub mod error;
pub mod plugins;
pub mod session;
pub mod skills;
pub mod state;
pub mod users;
pub mod waitlist;

use crate::config::ServerConfig;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub use error::ApiError;
pub use state::AppState;

/// Build the full application router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router())
        .layer(build_cors_layer(config))
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/skills", skills::router())
        .nest("/plugins", plugins::router())
        .nest("/users", users::router())
        .route("/browse", get(browse::browse))
        .route("/dashboard", get(users::dashboard))
        .route("/waitlist", post(waitlist::join))
}

async fn health_check() -> &'static str {
    "OK"
}

fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
        return layer;
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
