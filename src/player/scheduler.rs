use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use super::{
    clock::PlaybackClock,
    progress::{self, ReporterCtx},
    session::{CurrentTrack, Session, SessionSlot},
};
use crate::{
    configs::PlayerConfig,
    notify::Notifier,
    protocol::{content::Content, tracks::QueuedTrack},
    voice::{Completion, EndReason},
};

/// Moves sessions from one track to the next. Every method expects the
/// caller to hold the session lock, so transitions never interleave.
pub struct Scheduler {
    notifier: Arc<dyn Notifier>,
    config: PlayerConfig,
}

impl Scheduler {
    pub fn new(notifier: Arc<dyn Notifier>, config: PlayerConfig) -> Self {
        Self { notifier, config }
    }

    /// Appends `tracks` in order and starts playback if the session was idle.
    pub fn enqueue(&self, slot: &Arc<SessionSlot>, session: &mut Session, tracks: Vec<QueuedTrack>) {
        let was_idle = session.current.is_none();
        session.queue.extend(tracks);

        if was_idle {
            self.advance(slot, session);
        }
    }

    /// Replaces the current track with the next one that starts. Tracks the
    /// transport refuses are dropped; an exhausted queue leaves the session
    /// idle.
    pub fn advance(&self, slot: &Arc<SessionSlot>, session: &mut Session) {
        let guild_id = session.guild_id;
        session.current = None;
        session.card = None;

        loop {
            let Some(next) = session.queue.pop_front() else {
                session.cancel_reporter();
                debug!("[{}] queue exhausted, session idle", guild_id);
                self.post_queue(session);
                return;
            };

            let Some(transport) = session.transport.clone() else {
                warn!("[{}] no voice connection, dropping {} queued tracks", guild_id, session.queue.len() + 1);
                session.queue.clear();
                session.cancel_reporter();
                return;
            };

            let done = session.next_completion();
            let generation = done.generation();

            match transport.start(&next.track.stream, done) {
                Ok(()) => {
                    info!(
                        "[{}] now playing: {} (source: {}, requested by {})",
                        guild_id, next.track.info.title, next.track.info.source_name, next.requester.display_name
                    );
                    session.current = Some(CurrentTrack {
                        entry: next,
                        clock: PlaybackClock::new(),
                        generation,
                    });
                    self.restart_reporter(slot, session);
                    return;
                }
                Err(e) => {
                    warn!("[{}] skipping {}: {}", guild_id, next.track.info.title, e);
                }
            }
        }
    }

    /// Replaces the session's reporter with one bound to the current track.
    /// A track without its own card gets one posted first, so a pause that
    /// cancelled the first reporter early cannot leave it cardless.
    pub fn restart_reporter(&self, slot: &Arc<SessionSlot>, session: &mut Session) {
        let Some(generation) = session.current.as_ref().map(|c| c.generation) else {
            session.cancel_reporter();
            return;
        };
        let announce = session.needs_card();

        let ctx = ReporterCtx {
            guild_id: session.guild_id,
            slot: Arc::downgrade(slot),
            notifier: self.notifier.clone(),
            generation,
            announce,
            interval: self.config.progress_interval(),
            bar_width: self.config.progress_bar_width,
        };

        let previous = session.reporter.take();
        session.reporter = Some(progress::spawn(ctx, slot.reporter_counter(), previous));
    }

    /// Posts the session's queue card to its text channel without waiting
    /// for the notifier.
    pub fn post_queue(&self, session: &Session) {
        let Some(channel_id) = session.text_channel else {
            return;
        };
        let guild_id = session.guild_id;
        let view = session.queue_view();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            if let Err(e) = notifier.send_new(channel_id, Content::Queue(view)).await {
                warn!("[{}] could not post queue card: {}", guild_id, e);
            }
        });
    }

    /// Drains transport completions for one session until it is dropped.
    pub async fn listen(self: Arc<Self>, slot: Weak<SessionSlot>, completions: flume::Receiver<Completion>) {
        while let Ok(completion) = completions.recv_async().await {
            let Some(slot) = slot.upgrade() else {
                break;
            };
            let mut session = slot.lock().await;

            if !session.accepts(completion.generation) {
                debug!(
                    "[{}] ignoring stale completion for generation {} ({:?})",
                    session.guild_id, completion.generation, completion.reason
                );
                continue;
            }

            match &completion.reason {
                EndReason::Failed(e) => warn!("[{}] stream failed mid-playback: {}", session.guild_id, e),
                reason => debug!("[{}] track ended: {:?}", session.guild_id, reason),
            }
            self.advance(&slot, &mut session);
        }
    }
}
