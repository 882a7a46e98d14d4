//! The messenger port

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use vigil_core::SubscriberId;

/// Errors from delivering one message
#[derive(Debug, Error)]
pub enum SendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by messaging API: {0}")]
    Rejected(String),

    #[error("could not read attachment: {0}")]
    Attachment(String),
}

/// Capability to deliver messages to one recipient
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver a text message.
    async fn send_text(&self, recipient: SubscriberId, text: &str) -> Result<(), SendError>;

    /// Deliver a photo from a local file.
    async fn send_photo(&self, recipient: SubscriberId, photo: &Path) -> Result<(), SendError>;
}

/// Shared handle to a messenger
pub type SharedMessenger = Arc<dyn Messenger>;
