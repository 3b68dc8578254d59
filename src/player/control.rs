use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    registry::SessionRegistry,
    scheduler::Scheduler,
    selection::{SelectionBook, SelectionPrompt},
    session::{Session, SessionSlot, SessionStatus},
};
use crate::{
    common::{
        errors::{CommandError, ResolutionError, TransportError, ValidationError},
        types::{Actor, ChannelId, GuildId, PromptId},
    },
    configs::PlayerConfig,
    notify::Notifier,
    protocol::{
        content::QueueView,
        tracks::{QueuedTrack, TrackInfo},
    },
    sources::{Resolver, is_locator},
    voice::VoiceGateway,
};

/// What a successful enqueue did to the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueReport {
    pub added: usize,
    /// Playlist entries that failed to resolve and were left out.
    pub dropped: usize,
    pub queue: QueueView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PlayOutcome {
    Enqueued(EnqueueReport),
    /// Search text was given; nothing is enqueued until a candidate is picked.
    Selection(SelectionPrompt),
}

/// Which way a play/pause toggle went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "track", rename_all = "camelCase")]
pub enum Toggled {
    Paused(TrackInfo),
    Resumed(TrackInfo),
}

/// Entry point for every user command. Each command touches exactly one
/// guild's session.
pub struct ControlSurface {
    registry: SessionRegistry,
    scheduler: Arc<Scheduler>,
    resolver: Arc<dyn Resolver>,
    gateway: Arc<dyn VoiceGateway>,
    selections: SelectionBook,
    config: PlayerConfig,
}

impl ControlSurface {
    pub fn new(
        config: PlayerConfig,
        resolver: Arc<dyn Resolver>,
        gateway: Arc<dyn VoiceGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let scheduler = Arc::new(Scheduler::new(notifier, config.clone()));
        Self {
            registry: SessionRegistry::new(scheduler.clone()),
            scheduler,
            resolver,
            gateway,
            selections: SelectionBook::new(),
            config,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub async fn play(&self, actor: &Actor, query: &str) -> Result<PlayOutcome, CommandError> {
        let voice_channel = voice_channel_of(actor)?;
        let query = query.trim();

        if is_locator(query) {
            let report = self.play_locator(actor, voice_channel, query).await?;
            return Ok(PlayOutcome::Enqueued(report));
        }
        if query.is_empty() {
            return Err(ResolutionError::NoMatches(String::new()).into());
        }

        let mut candidates = self.resolver.search(query, self.config.search_limit).await?;
        candidates.truncate(self.config.search_limit);
        if candidates.is_empty() {
            return Err(ResolutionError::NoMatches(query.to_string()).into());
        }

        let prompt = self.selections.issue(
            actor.guild_id,
            actor.user_id,
            query,
            candidates,
            self.config.selection_timeout(),
        );
        info!(
            "[{}] offering {} results for \"{}\" to {}",
            actor.guild_id,
            prompt.candidates.len(),
            query,
            actor.display_name
        );
        Ok(PlayOutcome::Selection(prompt))
    }

    /// Picks one candidate of the actor's pending search and plays it.
    pub async fn select(
        &self,
        actor: &Actor,
        prompt_id: PromptId,
        locator: &str,
    ) -> Result<EnqueueReport, CommandError> {
        let voice_channel = voice_channel_of(actor)?;
        let choice = self
            .selections
            .take(actor.guild_id, actor.user_id, prompt_id, locator.trim())?;

        self.play_locator(actor, voice_channel, &choice.locator).await
    }

    async fn play_locator(
        &self,
        actor: &Actor,
        voice_channel: ChannelId,
        locator: &str,
    ) -> Result<EnqueueReport, CommandError> {
        // -- 1. Resolve without holding the session ------------------------
        let (tracks, failed) = self.resolver.resolve(locator).await?.into_parts();
        for e in &failed {
            warn!("[{}] dropping playlist entry: {}", actor.guild_id, e);
        }
        if tracks.is_empty() {
            let err = failed
                .into_iter()
                .next()
                .unwrap_or_else(|| ResolutionError::Empty(locator.to_string()));
            return Err(err.into());
        }

        // -- 2. Join voice -------------------------------------------------
        let slot = self.registry.get_or_create(actor.guild_id);
        self.ensure_connected(&slot, voice_channel).await?;

        // -- 3. Enqueue ----------------------------------------------------
        let mut session = slot.lock().await;
        if !session.is_connected() {
            return Err(TransportError::Closed.into());
        }
        session.text_channel = Some(actor.text_channel_id);

        let requester = actor.requester();
        let added = tracks.len();
        let entries = tracks
            .into_iter()
            .map(|track| QueuedTrack {
                track,
                requester: requester.clone(),
            })
            .collect();
        self.scheduler.enqueue(&slot, &mut session, entries);
        self.scheduler.post_queue(&session);

        info!(
            "[{}] {} queued {} track(s) from {}",
            actor.guild_id, actor.display_name, added, locator
        );
        Ok(EnqueueReport {
            added,
            dropped: failed.len(),
            queue: session.queue_view(),
        })
    }

    /// Connects the session to voice unless it already is. The session lock
    /// is not held while the gateway connects.
    async fn ensure_connected(&self, slot: &Arc<SessionSlot>, channel_id: ChannelId) -> Result<(), TransportError> {
        let _connecting = slot.lock_connecting().await;
        if let Some(transport) = slot.lock().await.transport.clone() {
            if transport.channel_id() != channel_id {
                debug!(
                    "[{}] already playing in channel {}, ignoring request for {}",
                    slot.guild_id(),
                    transport.channel_id(),
                    channel_id
                );
            }
            return Ok(());
        }

        let transport = self.gateway.connect(slot.guild_id(), channel_id).await?;
        slot.lock().await.transport = Some(transport);
        info!("[{}] joined voice channel {}", slot.guild_id(), channel_id);
        Ok(())
    }

    fn session_of(&self, actor: &Actor) -> Result<Arc<SessionSlot>, ValidationError> {
        voice_channel_of(actor)?;
        self.registry
            .get(actor.guild_id)
            .ok_or(ValidationError::NothingPlaying)
    }

    /// Stops the current stream; the completion it fires advances the queue.
    pub async fn skip(&self, actor: &Actor) -> Result<TrackInfo, CommandError> {
        let slot = self.session_of(actor)?;
        let mut session = slot.lock().await;

        let Some(current) = session.current.as_ref() else {
            return Err(ValidationError::NothingPlaying.into());
        };
        let skipped = current.entry.track.info.clone();
        let Some(transport) = session.transport.clone() else {
            return Err(ValidationError::NotConnected.into());
        };

        session.cancel_reporter();
        transport.stop();
        info!("[{}] {} skipped {}", actor.guild_id, actor.display_name, skipped.title);
        Ok(skipped)
    }

    pub async fn pause(&self, actor: &Actor) -> Result<TrackInfo, CommandError> {
        let slot = self.session_of(actor)?;
        let mut session = slot.lock().await;
        let info = self.pause_locked(&mut session)?;

        info!("[{}] paused {}", actor.guild_id, info.title);
        Ok(info)
    }

    pub async fn resume(&self, actor: &Actor) -> Result<TrackInfo, CommandError> {
        let slot = self.session_of(actor)?;
        let mut session = slot.lock().await;
        let info = self.resume_locked(&slot, &mut session)?;

        info!("[{}] resumed {}", actor.guild_id, info.title);
        Ok(info)
    }

    /// Pauses a playing track or resumes a paused one, decided under the
    /// same lock that applies the change.
    pub async fn toggle(&self, actor: &Actor) -> Result<Toggled, CommandError> {
        let slot = self.session_of(actor)?;
        let mut session = slot.lock().await;

        let toggled = match session.status() {
            SessionStatus::Idle => return Err(ValidationError::NothingPlaying.into()),
            SessionStatus::Playing => Toggled::Paused(self.pause_locked(&mut session)?),
            SessionStatus::Paused => Toggled::Resumed(self.resume_locked(&slot, &mut session)?),
        };

        info!("[{}] {} toggled playback: {:?}", actor.guild_id, actor.display_name, toggled);
        Ok(toggled)
    }

    fn pause_locked(&self, session: &mut Session) -> Result<TrackInfo, CommandError> {
        let Some(transport) = session.transport.clone() else {
            return Err(ValidationError::NotConnected.into());
        };
        let Some(current) = session.current.as_mut() else {
            return Err(ValidationError::NothingPlaying.into());
        };
        if current.clock.is_paused() {
            return Err(ValidationError::AlreadyPaused.into());
        }
        if !transport.is_playing() {
            return Err(ValidationError::NothingPlaying.into());
        }

        transport.pause()?;
        current.clock.pause();
        let info = current.entry.track.info.clone();
        session.cancel_reporter();
        Ok(info)
    }

    fn resume_locked(&self, slot: &Arc<SessionSlot>, session: &mut Session) -> Result<TrackInfo, CommandError> {
        let Some(transport) = session.transport.clone() else {
            return Err(ValidationError::NotConnected.into());
        };
        let Some(current) = session.current.as_mut() else {
            return Err(ValidationError::NothingPlaying.into());
        };
        if !current.clock.is_paused() || !transport.is_paused() {
            return Err(ValidationError::NotPaused.into());
        }

        transport.resume()?;
        current.clock.resume();
        let info = current.entry.track.info.clone();
        self.scheduler.restart_reporter(slot, session);
        Ok(info)
    }

    /// Clears the queue and the current track. The stopped track's completion
    /// is ignored.
    pub async fn stop(&self, actor: &Actor) -> Result<(), CommandError> {
        let slot = self.session_of(actor)?;
        let mut session = slot.lock().await;

        if session.current.is_none() && session.queued().next().is_none() {
            return Err(ValidationError::NothingPlaying.into());
        }
        session.clear_playback();
        self.scheduler.post_queue(&session);

        info!("[{}] {} stopped playback", actor.guild_id, actor.display_name);
        Ok(())
    }

    /// Stop, then leave the voice channel.
    pub async fn disconnect(&self, actor: &Actor) -> Result<(), CommandError> {
        voice_channel_of(actor)?;
        let Some(slot) = self.registry.get(actor.guild_id) else {
            return Err(ValidationError::NotConnected.into());
        };

        let _connecting = slot.lock_connecting().await;
        let transport = {
            let mut session = slot.lock().await;
            if !session.is_connected() {
                return Err(ValidationError::NotConnected.into());
            }
            session.reset()
        };

        if let Some(transport) = transport {
            transport.disconnect().await;
        }
        info!("[{}] {} disconnected the player", actor.guild_id, actor.display_name);
        Ok(())
    }

    pub async fn queue(&self, guild_id: GuildId) -> QueueView {
        match self.registry.get(guild_id) {
            Some(slot) => slot.lock().await.queue_view(),
            None => QueueView {
                guild_id,
                now_playing: None,
                upcoming: Vec::new(),
            },
        }
    }

    /// The voice connection went away without a `disconnect` command.
    /// Returns whether there was a connected session to tear down.
    pub async fn voice_closed(&self, guild_id: GuildId) -> bool {
        let Some(slot) = self.registry.get(guild_id) else {
            return false;
        };
        let mut session = slot.lock().await;
        let was_connected = session.is_connected();
        drop(session.reset());

        if was_connected {
            info!("[{}] voice connection closed externally, session cleared", guild_id);
        }
        was_connected
    }

    pub fn prune_selections(&self) -> usize {
        self.selections.prune_expired()
    }
}

fn voice_channel_of(actor: &Actor) -> Result<ChannelId, ValidationError> {
    actor.voice_channel_id.ok_or(ValidationError::NotInVoice)
}
