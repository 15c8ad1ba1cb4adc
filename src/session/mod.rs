//! Stream sessions
//!
//! A session is one `/logs` connection draining one listener queue.

pub mod push;
pub mod stream;

pub use push::{PushChannel, PushError};
pub use stream::{run_stream, StreamEnd};
