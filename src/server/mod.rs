//! HTTP server: entry page, webhook receiver, log stream

pub mod auth;
pub mod config;
pub mod cookie;
pub mod handler;
pub mod listener;
pub mod routes;

pub use auth::BearerAuth;
pub use config::ServerConfig;
pub use listener::WebhookServer;
pub use routes::{build_router, AppState};
