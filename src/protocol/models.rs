use serde::Deserialize;

use crate::common::types::{Actor, PromptId};

/// Body of `POST /v1/guilds/{guild_id}/play`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub actor: Actor,
    /// A media locator or free search text.
    pub query: String,
}

/// Body of `POST /v1/guilds/{guild_id}/select`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub actor: Actor,
    pub prompt_id: PromptId,
    pub locator: String,
}

/// Body of the bare transport commands (skip, pause, resume, stop, disconnect).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest {
    pub actor: Actor,
}
