//! Input/output operations, configuration and error handling

/// Command-line surface
pub mod cli;
/// Constants and runtime configuration
pub mod configuration;
/// Error taxonomy
pub mod error;
/// Source photo loading and canvas export
pub mod image;
/// Tracing subscriber setup
pub mod logging;
/// Terminal progress bars
pub mod progress;
/// Worker pool construction
pub mod workers;
