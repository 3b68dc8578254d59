use serde::Serialize;

use crate::{
    common::types::{ChannelId, MessageId},
    protocol::content::Content,
};

/// Messages pushed to event feed subscribers over WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum OutgoingMessage {
    Ready {
        version: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    MessageCreated {
        message_id: MessageId,
        channel_id: ChannelId,
        content: Content,
    },
    #[serde(rename_all = "camelCase")]
    MessageUpdated {
        message_id: MessageId,
        channel_id: ChannelId,
        content: Content,
    },
    #[serde(rename_all = "camelCase")]
    MessageDeleted {
        message_id: MessageId,
        channel_id: ChannelId,
    },
}
