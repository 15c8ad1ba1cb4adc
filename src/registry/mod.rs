//! Listener registry for webhook fan-out
//!
//! The registry owns one bounded queue per browser session and replicates
//! every webhook message onto all of them.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ListenerRegistry>
//!                  ┌──────────────────────────────┐
//!                  │ listeners: Mutex<HashMap<Id, │
//!                  │   Listener {                 │
//!                  │     tx: mpsc::Sender,        │
//!                  │     rx: Option<Receiver>,    │
//!                  │   }                          │
//!                  │ >>                           │
//!                  └──────────────┬───────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [Broadcast loop]       [ListenerStream]        [ListenerStream]
//!    fan_out(msg)           stream.recv()           stream.recv()
//!         │                       │                       │
//!         └──► try_send ──► queue ─┴──► WebSocket text frame
//! ```
//!
//! # Zero-Copy Design
//!
//! `bytes::Bytes` uses reference counting, so every listener queue shares the
//! same body allocation. Cloning a `WebhookMessage` never copies the payload.

pub mod config;
pub mod entry;
pub mod error;
pub mod message;
pub mod store;

pub use config::{RegistryConfig, SlowListenerPolicy};
pub use entry::{Delivery, Listener, ListenerId, ListenerStream};
pub use error::{ParseListenerIdError, RegistryError};
pub use message::WebhookMessage;
pub use store::{FanOutReport, ListenerRegistry};
