use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{CompletionHandle, EndReason, VoiceGateway, VoiceTransport};
use crate::{
    common::{
        errors::TransportError,
        types::{ChannelId, GuildId},
    },
    protocol::tracks::{StreamHandle, StreamSource},
};

/// Hands out [`NullVoice`] connections.
pub struct NullVoiceGateway;

#[async_trait]
impl VoiceGateway for NullVoiceGateway {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceTransport>, TransportError> {
        info!("[{}] voice connected to channel {}", guild_id, channel_id);
        Ok(Arc::new(NullVoice::new(guild_id, channel_id)))
    }
}

#[derive(Debug)]
enum StreamControl {
    Pause,
    Resume,
    Stop,
}

struct ActiveStream {
    id: u64,
    paused: bool,
    control: flume::Sender<StreamControl>,
}

/// Voice transport that keeps time instead of sending audio.
///
/// A stream "plays" for its duration hint (forever when unknown) and then
/// reports `Finished`. Pausing freezes the remaining time.
pub struct NullVoice {
    guild_id: GuildId,
    channel_id: ChannelId,
    active: Arc<Mutex<Option<ActiveStream>>>,
    next_stream_id: AtomicU64,
    closed: AtomicBool,
}

impl NullVoice {
    pub fn new(guild_id: GuildId, channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            channel_id,
            active: Arc::new(Mutex::new(None)),
            next_stream_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    fn send(&self, control: StreamControl, paused: bool) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let mut active = self.active.lock();
        if let Some(stream) = active.as_mut() {
            stream.paused = paused;
            let _ = stream.control.send(control);
        }
        Ok(())
    }
}

#[async_trait]
impl VoiceTransport for NullVoice {
    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    fn start(&self, stream: &StreamHandle, done: CompletionHandle) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        if let StreamSource::File(path) = stream.source() {
            if !path.is_file() {
                return Err(TransportError::Start(format!(
                    "{} is not readable",
                    path.display()
                )));
            }
        }

        self.stop();

        let id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = flume::unbounded();
        *self.active.lock() = Some(ActiveStream {
            id,
            paused: false,
            control: tx,
        });

        debug!("[{}] stream {} started", self.guild_id, id);
        tokio::spawn(run_stream(
            id,
            stream.duration_hint(),
            rx,
            self.active.clone(),
            done,
        ));
        Ok(())
    }

    fn stop(&self) {
        if let Some(stream) = self.active.lock().take() {
            let _ = stream.control.send(StreamControl::Stop);
        }
    }

    fn pause(&self) -> Result<(), TransportError> {
        self.send(StreamControl::Pause, true)
    }

    fn resume(&self) -> Result<(), TransportError> {
        self.send(StreamControl::Resume, false)
    }

    fn is_playing(&self) -> bool {
        self.active.lock().as_ref().is_some_and(|s| !s.paused)
    }

    fn is_paused(&self) -> bool {
        self.active.lock().as_ref().is_some_and(|s| s.paused)
    }

    async fn disconnect(&self) {
        self.closed.store(true, Ordering::Release);
        self.stop();
        info!("[{}] voice disconnected", self.guild_id);
    }
}

async fn run_stream(
    id: u64,
    length: Option<Duration>,
    control: flume::Receiver<StreamControl>,
    active: Arc<Mutex<Option<ActiveStream>>>,
    done: CompletionHandle,
) {
    let mut remaining = length;
    let mut paused = false;

    let reason = loop {
        let resumed_at = Instant::now();
        let command = match remaining {
            Some(left) if !paused => {
                tokio::select! {
                    cmd = control.recv_async() => cmd.ok(),
                    _ = tokio::time::sleep(left) => break EndReason::Finished,
                }
            }
            _ => control.recv_async().await.ok(),
        };

        if !paused {
            remaining = remaining.map(|left| left.saturating_sub(resumed_at.elapsed()));
        }

        match command {
            Some(StreamControl::Pause) => paused = true,
            Some(StreamControl::Resume) => paused = false,
            Some(StreamControl::Stop) | None => break EndReason::Stopped,
        }
    };

    {
        let mut slot = active.lock();
        if slot.as_ref().is_some_and(|s| s.id == id) {
            *slot = None;
        }
    }
    done.fire(reason);
}
