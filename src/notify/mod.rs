pub mod board;

use async_trait::async_trait;

use crate::{
    common::{
        errors::RenderError,
        types::{ChannelId, MessageId},
    },
    protocol::content::Content,
};

pub use board::MessageBoard;

/// Renders content into chat messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_new(&self, channel_id: ChannelId, content: Content) -> Result<MessageId, RenderError>;

    /// Replaces a message in place. `RenderError::NotFound` once it was deleted.
    async fn update_existing(&self, message_id: MessageId, content: Content) -> Result<(), RenderError>;
}
