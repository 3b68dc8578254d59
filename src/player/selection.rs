use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::{
    common::{
        errors::ValidationError,
        types::{GuildId, PromptId, UserId},
    },
    protocol::tracks::SearchCandidate,
};

/// Search results offered to one user, waiting for a pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPrompt {
    pub prompt_id: PromptId,
    pub query: String,
    pub candidates: Vec<SearchCandidate>,
    pub expires_in_secs: u64,
}

struct Pending {
    prompt: SelectionPrompt,
    expires_at: Instant,
}

impl Pending {
    fn choice(&self, locator: &str) -> Option<SearchCandidate> {
        self.prompt
            .candidates
            .iter()
            .find(|c| c.locator == locator)
            .cloned()
    }
}

/// Outstanding prompts, one per user and guild. A newer search replaces
/// the older prompt.
#[derive(Default)]
pub struct SelectionBook {
    pending: DashMap<(GuildId, UserId), Pending>,
}

impl SelectionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        query: &str,
        candidates: Vec<SearchCandidate>,
        ttl: Duration,
    ) -> SelectionPrompt {
        let prompt = SelectionPrompt {
            prompt_id: PromptId::generate(),
            query: query.to_string(),
            candidates,
            expires_in_secs: ttl.as_secs(),
        };

        self.pending.insert(
            (guild_id, user_id),
            Pending {
                prompt: prompt.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        prompt
    }

    /// Consumes the prompt and returns the chosen candidate. A choice that is
    /// not among the candidates leaves the prompt open. Of two concurrent
    /// picks on the same prompt, only one gets the candidate.
    pub fn take(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        prompt_id: PromptId,
        locator: &str,
    ) -> Result<SearchCandidate, ValidationError> {
        let key = (guild_id, user_id);
        let now = Instant::now();

        let claimed = self.pending.remove_if(&key, |_, p| {
            p.prompt.prompt_id == prompt_id && p.expires_at > now && p.choice(locator).is_some()
        });
        if let Some((_, pending)) = claimed {
            return pending.choice(locator).ok_or(ValidationError::UnknownChoice);
        }

        // Not claimable; work out why.
        let expired = match self.pending.get(&key) {
            Some(p) if p.prompt.prompt_id == prompt_id => p.expires_at <= now,
            _ => return Err(ValidationError::NoPendingSelection),
        };
        if !expired {
            return Err(ValidationError::UnknownChoice);
        }
        self.pending
            .remove_if(&key, |_, p| p.prompt.prompt_id == prompt_id);
        Err(ValidationError::SelectionExpired)
    }

    /// Drops expired prompts. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.pending.retain(|_, p| {
            let keep = p.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
