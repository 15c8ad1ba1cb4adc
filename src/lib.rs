//! Webhook logger
//!
//! Receives arbitrary HTTP payloads on `/webhook` and relays each one to every
//! browser currently watching `/logs` over a WebSocket.
//!
//! ```text
//!  POST /webhook ──► Relay (inbound queue) ──► broadcast loop
//!                                                  │
//!                              ListenerRegistry ◄──┘ fan_out()
//!                        ┌────────┼────────┐
//!                        ▼        ▼        ▼
//!                     queue    queue    queue      (one per session cookie)
//!                        │        │        │
//!                   GET /logs  GET /logs  GET /logs ──► WebSocket text frames
//! ```
//!
//! # Example
//!
//! ```no_run
//! use webhook_logger::{ServerConfig, WebhookServer};
//!
//! #[tokio::main]
//! async fn main() -> webhook_logger::Result<()> {
//!     let config = ServerConfig::default().bearer("secret");
//!     let server = WebhookServer::new(config);
//!     server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! }
//! ```

pub mod error;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use registry::{ListenerId, ListenerRegistry, RegistryConfig, SlowListenerPolicy, WebhookMessage};
pub use relay::Relay;
pub use server::{ServerConfig, WebhookServer};
