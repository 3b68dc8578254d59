use std::sync::Arc;

use dashmap::DashMap;

use super::{scheduler::Scheduler, session::SessionSlot};
use crate::common::types::GuildId;

/// One session per guild, created on first use.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<SessionSlot>>,
    scheduler: Arc<Scheduler>,
}

impl SessionRegistry {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self {
            sessions: DashMap::new(),
            scheduler,
        }
    }

    /// Returns the guild's session, creating it (and its completion
    /// listener) if this is the first command for the guild.
    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<SessionSlot> {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                let (tx, rx) = flume::unbounded();
                let slot = Arc::new(SessionSlot::new(guild_id, tx));
                tokio::spawn(self.scheduler.clone().listen(Arc::downgrade(&slot), rx));
                tracing::debug!("[{}] session created", guild_id);
                slot
            })
            .clone()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<SessionSlot>> {
        self.sessions.get(&guild_id).map(|s| s.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
