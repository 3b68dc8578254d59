use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::Notifier;
use crate::{
    common::{
        errors::RenderError,
        types::{ChannelId, MessageId},
    },
    protocol::{OutgoingMessage, content::Content},
};

#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub channel_id: ChannelId,
    pub content: Content,
}

/// In-memory message store that fans every change out to event subscribers.
pub struct MessageBoard {
    messages: DashMap<MessageId, StoredMessage>,
    subscribers: DashMap<Uuid, flume::Sender<OutgoingMessage>>,
    next_id: AtomicU64,
}

impl MessageBoard {
    pub fn new() -> Self {
        Self {
            messages: DashMap::new(),
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> (Uuid, flume::Receiver<OutgoingMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = flume::unbounded();
        self.subscribers.insert(id, tx);
        (id, rx)
    }

    pub fn unsubscribe(&self, id: &Uuid) {
        self.subscribers.remove(id);
    }

    pub fn get(&self, message_id: MessageId) -> Option<StoredMessage> {
        self.messages.get(&message_id).map(|m| m.value().clone())
    }

    pub fn delete(&self, message_id: MessageId) -> bool {
        match self.messages.remove(&message_id) {
            Some((_, message)) => {
                self.publish(OutgoingMessage::MessageDeleted {
                    message_id,
                    channel_id: message.channel_id,
                });
                true
            }
            None => false,
        }
    }

    fn publish(&self, event: OutgoingMessage) {
        // Drop subscribers whose socket went away.
        self.subscribers
            .retain(|_, tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for MessageBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MessageBoard {
    async fn send_new(&self, channel_id: ChannelId, content: Content) -> Result<MessageId, RenderError> {
        let message_id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.messages.insert(
            message_id,
            StoredMessage {
                channel_id,
                content: content.clone(),
            },
        );
        debug!("message {} posted to channel {}", message_id, channel_id);
        self.publish(OutgoingMessage::MessageCreated {
            message_id,
            channel_id,
            content,
        });
        Ok(message_id)
    }

    async fn update_existing(&self, message_id: MessageId, content: Content) -> Result<(), RenderError> {
        let channel_id = {
            let mut message = self
                .messages
                .get_mut(&message_id)
                .ok_or(RenderError::NotFound)?;
            message.content = content.clone();
            message.channel_id
        };
        self.publish(OutgoingMessage::MessageUpdated {
            message_id,
            channel_id,
            content,
        });
        Ok(())
    }
}
