//! Endpoint handlers

pub mod index;
pub mod logs;
pub mod webhook;

pub use index::serve_index;
pub use logs::stream_logs;
pub use webhook::receive_webhook;
