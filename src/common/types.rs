/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(u: u64) -> Self {
                Self(u)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake_id!(
    /// Server (guild) a playback session belongs to. Sessions are keyed by this.
    GuildId
);
snowflake_id!(
    /// Voice or text channel.
    ChannelId
);
snowflake_id!(UserId);
snowflake_id!(
    /// Handle of a message previously rendered through the notifier.
    MessageId
);

/// Identifier of a search prompt awaiting the user's selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PromptId(pub uuid::Uuid);

impl PromptId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for PromptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user who issued a command, as seen by the control surface.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: UserId,
    pub display_name: String,
    pub guild_id: GuildId,
    /// Text channel the command came from. Now-playing cards are posted here.
    pub text_channel_id: ChannelId,
    /// Voice channel the user currently sits in, if any.
    #[serde(default)]
    pub voice_channel_id: Option<ChannelId>,
}

impl Actor {
    pub fn requester(&self) -> Requester {
        Requester {
            user_id: self.user_id,
            display_name: self.display_name.clone(),
        }
    }
}

/// Who asked for a queued track.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub user_id: UserId,
    pub display_name: String,
}

impl Requester {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.user_id)
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
