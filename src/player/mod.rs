pub mod clock;
pub mod control;
pub mod progress;
pub mod registry;
pub mod scheduler;
pub mod selection;
pub mod session;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use clock::PlaybackClock;
pub use control::{ControlSurface, EnqueueReport, PlayOutcome, Toggled};
pub use registry::SessionRegistry;
pub use scheduler::Scheduler;
pub use selection::{SelectionBook, SelectionPrompt};
pub use session::{CurrentTrack, PostedCard, Session, SessionSlot, SessionStatus};
