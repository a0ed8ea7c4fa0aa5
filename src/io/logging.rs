//! Tracing subscriber setup for the command-line entry point

use crate::io::progress::ProgressManager;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive used when `RUST_LOG` is not set
pub const fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "cardmosaic=warn";
    }
    match verbosity {
        0 => "cardmosaic=info",
        1 => "cardmosaic=debug",
        _ => "cardmosaic=trace",
    }
}

/// Install a stderr formatter filtered by `RUST_LOG` or the verbosity flags
///
/// Lines are written through `progress` so they never tear its bars.
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(verbosity: u8, quiet: bool, progress: &ProgressManager) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));
    let writer = progress.log_writer();
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(move || writer.clone()),
        )
        .try_init()
        .is_ok()
}
