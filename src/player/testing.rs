//! Scripted stand-ins for the resolver, voice and notifier.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{control::ControlSurface, session::SessionSlot};
use crate::{
    common::{
        errors::{RenderError, ResolutionError, TransportError},
        types::{Actor, ChannelId, GuildId, MessageId, UserId},
    },
    configs::PlayerConfig,
    notify::Notifier,
    protocol::{
        content::{Content, NowPlayingCard, QueueView},
        tracks::{LoadResult, SearchCandidate, StreamHandle, StreamSource, Track, TrackInfo},
    },
    sources::Resolver,
    voice::{CompletionHandle, EndReason, VoiceGateway, VoiceTransport},
};

pub const GUILD: GuildId = GuildId(1);

pub fn url(name: &str) -> String {
    format!("https://cdn.example.com/{name}.mp3")
}

pub fn track(name: &str, secs: u64) -> Track {
    Track::new(
        TrackInfo {
            identifier: url(name),
            title: name.to_string(),
            author: None,
            duration_secs: Some(secs),
            source_name: "http".to_string(),
        },
        StreamSource::Http(url(name)),
    )
}

pub fn actor() -> Actor {
    Actor {
        user_id: UserId(10),
        display_name: "ferris".to_string(),
        guild_id: GUILD,
        text_channel_id: ChannelId(20),
        voice_channel_id: Some(ChannelId(30)),
    }
}

/// Lets every ready task run. Only meaningful on a paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[derive(Default)]
pub struct ScriptedResolver {
    loads: Mutex<HashMap<String, Result<LoadResult, ResolutionError>>>,
    hits: Mutex<Vec<SearchCandidate>>,
}

impl ScriptedResolver {
    pub fn add(&self, track: Track) {
        let locator = track.info.identifier.clone();
        self.loads.lock().insert(locator, Ok(LoadResult::Track(track)));
    }

    pub fn add_playlist(&self, locator: &str, entries: Vec<Result<Track, ResolutionError>>) {
        self.loads.lock().insert(
            locator.to_string(),
            Ok(LoadResult::Playlist {
                name: locator.to_string(),
                entries,
            }),
        );
    }

    /// Search hits, returned regardless of the requested limit.
    pub fn set_hits(&self, hits: Vec<SearchCandidate>) {
        *self.hits.lock() = hits;
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, locator: &str) -> Result<LoadResult, ResolutionError> {
        self.loads
            .lock()
            .get(locator)
            .cloned()
            .unwrap_or_else(|| {
                Err(ResolutionError::Unreachable {
                    locator: locator.to_string(),
                    reason: "not scripted".to_string(),
                })
            })
    }

    async fn search(&self, text: &str, _limit: usize) -> Result<Vec<SearchCandidate>, ResolutionError> {
        let hits = self.hits.lock().clone();
        if hits.is_empty() {
            return Err(ResolutionError::NoMatches(text.to_string()));
        }
        Ok(hits)
    }
}

#[derive(Default)]
struct ManualState {
    started: Vec<String>,
    active: Option<CompletionHandle>,
    held: Vec<CompletionHandle>,
    paused: bool,
    failing: HashSet<String>,
    disconnected: bool,
}

/// A transport whose streams only end when the test says so.
pub struct ManualTransport {
    state: Mutex<ManualState>,
    complete_on_stop: AtomicBool,
}

impl ManualTransport {
    fn new() -> Self {
        Self {
            state: Mutex::new(ManualState::default()),
            complete_on_stop: AtomicBool::new(true),
        }
    }

    /// With `false`, `stop()` holds the completion back until
    /// [`release_held`](Self::release_held) delivers it late.
    pub fn set_complete_on_stop(&self, value: bool) {
        self.complete_on_stop.store(value, Ordering::SeqCst);
    }

    pub fn fail_on(&self, locator: &str) {
        self.state.lock().failing.insert(locator.to_string());
    }

    /// The active stream reaches its end.
    pub fn finish(&self) {
        let active = self.state.lock().active.take();
        if let Some(done) = active {
            done.fire(EndReason::Finished);
        }
    }

    /// Delivers held-back completions as if the streams ended naturally.
    pub fn release_held(&self) {
        let held = std::mem::take(&mut self.state.lock().held);
        for done in held {
            done.fire(EndReason::Finished);
        }
    }

    /// Titles of started streams, oldest first.
    pub fn started(&self) -> Vec<String> {
        self.state
            .lock()
            .started
            .iter()
            .map(|u| {
                u.trim_start_matches("https://cdn.example.com/")
                    .trim_end_matches(".mp3")
                    .to_string()
            })
            .collect()
    }

    pub fn is_disconnected(&self) -> bool {
        self.state.lock().disconnected
    }
}

#[async_trait]
impl VoiceTransport for ManualTransport {
    fn channel_id(&self) -> ChannelId {
        ChannelId(30)
    }

    fn start(&self, stream: &StreamHandle, done: CompletionHandle) -> Result<(), TransportError> {
        let locator = match stream.source() {
            StreamSource::Http(url) => url.clone(),
            StreamSource::File(path) => path.display().to_string(),
        };

        let replaced = {
            let mut state = self.state.lock();
            if state.failing.contains(&locator) {
                return Err(TransportError::Start(format!("{locator} refused")));
            }
            state.started.push(locator);
            state.paused = false;
            state.active.replace(done)
        };
        if let Some(replaced) = replaced {
            replaced.fire(EndReason::Stopped);
        }
        Ok(())
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        let Some(done) = state.active.take() else {
            return;
        };
        if self.complete_on_stop.load(Ordering::SeqCst) {
            drop(state);
            done.fire(EndReason::Stopped);
        } else {
            state.held.push(done);
        }
    }

    fn pause(&self) -> Result<(), TransportError> {
        self.state.lock().paused = true;
        Ok(())
    }

    fn resume(&self) -> Result<(), TransportError> {
        self.state.lock().paused = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        let state = self.state.lock();
        state.active.is_some() && !state.paused
    }

    fn is_paused(&self) -> bool {
        let state = self.state.lock();
        state.active.is_some() && state.paused
    }

    async fn disconnect(&self) {
        self.stop();
        self.state.lock().disconnected = true;
    }
}

pub struct ManualGateway {
    transport: Arc<ManualTransport>,
    connects: AtomicUsize,
}

impl ManualGateway {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceGateway for ManualGateway {
    async fn connect(
        &self,
        _guild_id: GuildId,
        _channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceTransport>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.transport.state.lock().disconnected = false;
        Ok(self.transport.clone() as Arc<dyn VoiceTransport>)
    }
}

#[derive(Debug, Clone)]
pub enum Rendered {
    Sent { id: MessageId, card: NowPlayingCard },
    Updated { id: MessageId, card: NowPlayingCard },
    QueuePosted { channel_id: ChannelId, view: QueueView },
}

/// Records every render and counts overlapping updates.
#[derive(Default)]
pub struct RecordingNotifier {
    next_id: AtomicU64,
    log: Mutex<Vec<Rendered>>,
    deleted: Mutex<HashSet<MessageId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(MessageId, String)> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Rendered::Sent { id, card } => Some((*id, card.title.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(MessageId, NowPlayingCard)> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Rendered::Updated { id, card } => Some((*id, card.clone())),
                _ => None,
            })
            .collect()
    }

    /// Queue cards posted so far, oldest first.
    pub fn queues(&self) -> Vec<(ChannelId, QueueView)> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Rendered::QueuePosted { channel_id, view } => Some((*channel_id, view.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn delete(&self, id: MessageId) {
        self.deleted.lock().insert(id);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn card_of(content: Content) -> NowPlayingCard {
    match content {
        Content::NowPlaying(card) => card,
        Content::Queue(view) => panic!("queue cards are never edited: {view:?}"),
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_new(&self, channel_id: ChannelId, content: Content) -> Result<MessageId, RenderError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let rendered = match content {
            Content::NowPlaying(card) => Rendered::Sent { id, card },
            Content::Queue(view) => Rendered::QueuePosted { channel_id, view },
        };
        self.log.lock().push(rendered);
        Ok(id)
    }

    async fn update_existing(&self, message_id: MessageId, content: Content) -> Result<(), RenderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.deleted.lock().contains(&message_id) {
            return Err(RenderError::NotFound);
        }
        self.log.lock().push(Rendered::Updated {
            id: message_id,
            card: card_of(content),
        });
        Ok(())
    }
}

pub struct Harness {
    pub control: ControlSurface,
    pub resolver: Arc<ScriptedResolver>,
    pub transport: Arc<ManualTransport>,
    pub gateway: Arc<ManualGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let resolver = Arc::new(ScriptedResolver::default());
        let transport = Arc::new(ManualTransport::new());
        let gateway = Arc::new(ManualGateway {
            transport: transport.clone(),
            connects: AtomicUsize::new(0),
        });
        let notifier = Arc::new(RecordingNotifier::default());

        let control = ControlSurface::new(
            PlayerConfig::default(),
            resolver.clone(),
            gateway.clone(),
            notifier.clone(),
        );

        Self {
            control,
            resolver,
            transport,
            gateway,
            notifier,
        }
    }

    pub fn slot(&self) -> Arc<SessionSlot> {
        self.control.registry().get(GUILD).expect("session exists")
    }

    pub async fn current_title(&self) -> Option<String> {
        let slot = self.slot();
        let session = slot.lock().await;
        session.current().map(|c| c.entry.track.info.title.clone())
    }
}
