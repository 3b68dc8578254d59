pub mod content;
pub mod events;
pub mod models;
pub mod tracks;

pub use events::OutgoingMessage;
