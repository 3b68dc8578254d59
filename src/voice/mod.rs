pub mod null;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    common::{
        errors::TransportError,
        types::{ChannelId, GuildId},
    },
    protocol::tracks::StreamHandle,
};

pub use null::{NullVoice, NullVoiceGateway};

/// Why a stream stopped producing audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Reached the end of the stream.
    Finished,
    /// `stop()` was called on the transport.
    Stopped,
    /// The stream broke after it had started.
    Failed(String),
}

/// Sent by the transport when a started stream ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Playback generation the stream was started under.
    pub generation: u64,
    pub reason: EndReason,
}

/// One-shot completion signal handed to [`VoiceTransport::start`].
///
/// `fire` consumes the handle, so a started stream can report its end at
/// most once. Dropping the handle without firing reports nothing.
#[derive(Debug)]
pub struct CompletionHandle {
    generation: u64,
    tx: flume::Sender<Completion>,
}

impl CompletionHandle {
    pub fn new(generation: u64, tx: flume::Sender<Completion>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fire(self, reason: EndReason) {
        // The session listener only goes away with the process.
        let _ = self.tx.send(Completion {
            generation: self.generation,
            reason,
        });
    }
}

/// Opens voice connections. One connection is held per guild.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceTransport>, TransportError>;
}

/// A live voice connection for one guild.
///
/// Stream control is synchronous: it only flips state and signals the
/// sending task. Only `disconnect` waits on the network.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    fn channel_id(&self) -> ChannelId;

    /// Starts `stream`, replacing anything currently playing. On success
    /// `done` fires exactly once when the stream ends or is stopped.
    fn start(&self, stream: &StreamHandle, done: CompletionHandle) -> Result<(), TransportError>;

    fn stop(&self);

    fn pause(&self) -> Result<(), TransportError>;

    fn resume(&self) -> Result<(), TransportError>;

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    async fn disconnect(&self);
}
