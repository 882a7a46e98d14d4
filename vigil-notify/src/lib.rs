//! Vigil Notify - subscribers and notification dispatch
//!
//! - Persisted subscriber registry (JSON set, serialized mutations)
//! - The `Messenger` port and its Telegram Bot API adapter
//! - Fan-out dispatch with per-recipient failure isolation

pub mod dispatch;
pub mod messenger;
pub mod registry;
pub mod telegram;

pub use dispatch::*;
pub use messenger::*;
pub use registry::*;
pub use telegram::*;
