//! Middleware del sistema

pub mod auth;
pub mod cors;

pub use auth::require_api_key;
pub use cors::cors_middleware;
