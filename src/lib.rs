pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use error::AppError;
pub use storage::Storage;
