use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::session::{PostedCard, SessionSlot};
use crate::{
    common::types::{GuildId, MessageId},
    notify::Notifier,
    protocol::content::{Content, NowPlayingCard},
};

/// Owner side of a running progress reporter.
#[derive(Debug)]
pub struct ReporterHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ReporterHandle {
    /// Requests termination. Takes effect before the next render.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

pub struct ReporterCtx {
    pub guild_id: GuildId,
    pub slot: Weak<SessionSlot>,
    pub notifier: Arc<dyn Notifier>,
    /// Playback generation the reporter renders for.
    pub generation: u64,
    /// Post a now-playing card before the first tick. Set whenever the track
    /// has none yet.
    pub announce: bool,
    pub interval: Duration,
    pub bar_width: usize,
}

/// Starts a reporter. `previous` is cancelled and fully drained before the
/// new one renders anything, so a session never has two renderers.
pub fn spawn(ctx: ReporterCtx, live: Arc<AtomicUsize>, previous: Option<ReporterHandle>) -> ReporterHandle {
    let cancel = CancellationToken::new();
    let previous = previous.map(|p| {
        p.cancel();
        p.task
    });

    let task = tokio::spawn(report_loop(ctx, cancel.clone(), live, previous));
    ReporterHandle { cancel, task }
}

/// Counts reporters that made it past the handoff.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn report_loop(
    ctx: ReporterCtx,
    cancel: CancellationToken,
    live: Arc<AtomicUsize>,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }
    if cancel.is_cancelled() {
        return;
    }
    let _live = LiveGuard::enter(live);

    if ctx.announce && !announce(&ctx, &cancel).await {
        return;
    }

    let mut interval = tokio::time::interval_at(Instant::now() + ctx.interval, ctx.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let Some((message_id, card)) = snapshot(&ctx, &cancel).await else {
            break;
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = ctx.notifier.update_existing(message_id, Content::NowPlaying(card)) => result,
        };

        if let Err(e) = result {
            debug!("[{}] progress updates end: {}", ctx.guild_id, e);
            break;
        }
    }
}

/// Card to render right now, or `None` once there is nothing left to report.
async fn snapshot(ctx: &ReporterCtx, cancel: &CancellationToken) -> Option<(MessageId, NowPlayingCard)> {
    let slot = ctx.slot.upgrade()?;
    let session = slot.lock().await;

    if cancel.is_cancelled() || !session.accepts(ctx.generation) {
        return None;
    }
    let transport = session.transport.as_ref()?;
    if !transport.is_playing() && !transport.is_paused() {
        return None;
    }

    let message_id = session.card_for(ctx.generation)?;
    let card = session.now_playing_card(ctx.bar_width)?;
    Some((message_id, card))
}

/// Posts the first card of a track and records it as the message to update.
/// Returns whether the loop should go on.
async fn announce(ctx: &ReporterCtx, cancel: &CancellationToken) -> bool {
    let (channel_id, card) = {
        let Some(slot) = ctx.slot.upgrade() else {
            return false;
        };
        let session = slot.lock().await;
        if cancel.is_cancelled() || !session.accepts(ctx.generation) {
            return false;
        }
        if session.card_for(ctx.generation).is_some() {
            return true;
        }
        let (Some(channel_id), Some(card)) =
            (session.text_channel, session.now_playing_card(ctx.bar_width))
        else {
            return false;
        };
        (channel_id, card)
    };

    let sent = tokio::select! {
        biased;
        _ = cancel.cancelled() => return false,
        sent = ctx.notifier.send_new(channel_id, Content::NowPlaying(card)) => sent,
    };

    match sent {
        Ok(message_id) => {
            let Some(slot) = ctx.slot.upgrade() else {
                return false;
            };
            let mut session = slot.lock().await;
            // A card that made it out still belongs to the track, even if a
            // pause cancelled this reporter in the meantime.
            if !session.accepts(ctx.generation) {
                return false;
            }
            session.card = Some(PostedCard {
                message_id,
                generation: ctx.generation,
            });
            !cancel.is_cancelled()
        }
        Err(e) => {
            warn!("[{}] could not post now-playing card: {}", ctx.guild_id, e);
            false
        }
    }
}
