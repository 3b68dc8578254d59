pub mod http;
pub mod local;
pub mod locator;
pub mod manager;
pub mod plugin;

pub use locator::is_locator;
pub use manager::SourceManager;
pub use plugin::{BoxedSource, Resolver, SourcePlugin};
