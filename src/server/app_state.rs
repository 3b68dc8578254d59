use std::sync::Arc;

use crate::{configs::Config, notify::MessageBoard, player::ControlSurface};

/// Top-level application state.
pub struct AppState {
    pub control: Arc<ControlSurface>,
    /// Rendered messages and the event feed behind `/v1/events`.
    pub board: Arc<MessageBoard>,
    pub config: Config,
}
