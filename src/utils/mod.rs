//! Utility functions: configuration, logging and progress reporting

mod config;
mod logging;
mod progress;

pub use config::{Config, GeneratorConfig, GraphConfig, MapsConfig};
pub use logging::setup_logging;
pub use progress::window_progress;
