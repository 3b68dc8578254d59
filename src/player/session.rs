use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};

use super::{clock::PlaybackClock, progress::ReporterHandle};
use crate::{
    common::types::{ChannelId, GuildId, MessageId},
    protocol::{
        content::{NowPlayingCard, QueueEntry, QueueView, progress_bar},
        tracks::QueuedTrack,
    },
    voice::{Completion, CompletionHandle, VoiceTransport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Idle,
    Playing,
    Paused,
}

/// The track the transport is holding right now.
#[derive(Debug)]
pub struct CurrentTrack {
    pub entry: QueuedTrack,
    pub clock: PlaybackClock,
    /// Completions carrying any other generation are stale.
    pub generation: u64,
}

/// The now-playing message of one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedCard {
    pub message_id: MessageId,
    /// Generation of the track the card was posted for.
    pub generation: u64,
}

/// Mutable playback state of one guild. Only reachable through
/// [`SessionSlot::lock`].
pub struct Session {
    pub(crate) guild_id: GuildId,
    pub(crate) queue: VecDeque<QueuedTrack>,
    pub(crate) current: Option<CurrentTrack>,
    pub(crate) transport: Option<Arc<dyn VoiceTransport>>,
    /// Where now-playing cards go.
    pub(crate) text_channel: Option<ChannelId>,
    pub(crate) card: Option<PostedCard>,
    pub(crate) reporter: Option<ReporterHandle>,
    generation: u64,
    completions: flume::Sender<Completion>,
}

impl Session {
    fn new(guild_id: GuildId, completions: flume::Sender<Completion>) -> Self {
        Self {
            guild_id,
            queue: VecDeque::new(),
            current: None,
            transport: None,
            text_channel: None,
            card: None,
            reporter: None,
            generation: 0,
            completions,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn status(&self) -> SessionStatus {
        match &self.current {
            None => SessionStatus::Idle,
            Some(c) if c.clock.is_paused() => SessionStatus::Paused,
            Some(_) => SessionStatus::Playing,
        }
    }

    pub fn current(&self) -> Option<&CurrentTrack> {
        self.current.as_ref()
    }

    pub fn queued(&self) -> impl Iterator<Item = &QueuedTrack> {
        self.queue.iter()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn last_message(&self) -> Option<MessageId> {
        self.card.map(|c| c.message_id)
    }

    /// The card to update for `generation`, if one was posted for it.
    pub(crate) fn card_for(&self, generation: u64) -> Option<MessageId> {
        self.card
            .filter(|c| c.generation == generation)
            .map(|c| c.message_id)
    }

    /// Whether the current track still lacks its own now-playing card.
    pub(crate) fn needs_card(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| self.card_for(c.generation).is_none())
    }

    pub fn reporter_running(&self) -> bool {
        self.reporter.as_ref().is_some_and(|r| !r.is_cancelled())
    }

    /// Whether a completion from `generation` belongs to the current track.
    pub fn accepts(&self, generation: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| c.generation == generation)
    }

    /// Opens a new playback generation and returns its completion handle.
    pub(crate) fn next_completion(&mut self) -> CompletionHandle {
        self.generation += 1;
        CompletionHandle::new(self.generation, self.completions.clone())
    }

    pub(crate) fn cancel_reporter(&mut self) {
        if let Some(reporter) = &self.reporter {
            reporter.cancel();
        }
    }

    /// Stop semantics: empties the queue, drops the current track and
    /// invalidates its pending completion before the transport is told to stop.
    pub(crate) fn clear_playback(&mut self) {
        self.queue.clear();
        self.current = None;
        self.generation += 1;
        self.cancel_reporter();
        if let Some(transport) = &self.transport {
            transport.stop();
        }
    }

    /// Back to the freshly created state. Returns the voice connection so the
    /// caller can close it outside the lock.
    pub(crate) fn reset(&mut self) -> Option<Arc<dyn VoiceTransport>> {
        self.clear_playback();
        self.card = None;
        self.text_channel = None;
        self.transport.take()
    }

    pub fn now_playing_card(&self, bar_width: usize) -> Option<NowPlayingCard> {
        let current = self.current.as_ref()?;
        let info = &current.entry.track.info;
        let elapsed_secs = current.clock.elapsed().as_secs();
        let elapsed_secs = info
            .duration_secs
            .map_or(elapsed_secs, |total| elapsed_secs.min(total));

        Some(NowPlayingCard {
            guild_id: self.guild_id,
            title: info.title.clone(),
            requester: current.entry.requester.mention(),
            progress: progress_bar(elapsed_secs, info.duration_secs, bar_width),
            elapsed_secs,
            duration_secs: info.duration_secs,
            paused: current.clock.is_paused(),
        })
    }

    pub fn queue_view(&self) -> QueueView {
        let entry = |q: &QueuedTrack| QueueEntry {
            title: q.track.info.title.clone(),
            requester: q.requester.mention(),
            duration_secs: q.track.info.duration_secs,
        };

        QueueView {
            guild_id: self.guild_id,
            now_playing: self.current.as_ref().map(|c| entry(&c.entry)),
            upcoming: self.queue.iter().map(entry).collect(),
        }
    }
}

/// Registry entry for one guild: the exclusive-access wrapper around its
/// [`Session`].
pub struct SessionSlot {
    guild_id: GuildId,
    state: Mutex<Session>,
    /// Serializes voice connects without holding the session lock.
    connecting: Mutex<()>,
    live_reporters: Arc<AtomicUsize>,
}

impl SessionSlot {
    pub(crate) fn new(guild_id: GuildId, completions: flume::Sender<Completion>) -> Self {
        Self {
            guild_id,
            state: Mutex::new(Session::new(guild_id, completions)),
            connecting: Mutex::new(()),
            live_reporters: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.state.lock().await
    }

    pub(crate) async fn lock_connecting(&self) -> MutexGuard<'_, ()> {
        self.connecting.lock().await
    }

    /// Progress reporters currently past their start-up handoff.
    pub fn live_reporters(&self) -> usize {
        self.live_reporters.load(Ordering::Acquire)
    }

    pub(crate) fn reporter_counter(&self) -> Arc<AtomicUsize> {
        self.live_reporters.clone()
    }
}
