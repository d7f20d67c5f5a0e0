use std::env;

/// Server configuration, resolved from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: Option<String>,
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var("SKILLWEAVE_HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("SKILLWEAVE_HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8720),
            db_path: env::var("SKILLWEAVE_DB_PATH")
                .unwrap_or_else(|_| "skillweave.redb".to_string()),
            cors_origins: env::var("SKILLWEAVE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            jwt_secret: env::var("SKILLWEAVE_JWT_SECRET").ok(),
            secure_cookies: env::var("SKILLWEAVE_SECURE_COOKIES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
