//! Per-stage progress bars for long-running pipeline steps

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::LazyLock;

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{msg:<24}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} ({{elapsed}})"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Hands out one progress bar per pipeline stage
///
/// A hidden manager produces bars that draw nothing, so library code can
/// report progress unconditionally. Clones share the same set of bars.
#[derive(Clone)]
pub struct ProgressManager {
    multi_progress: Option<MultiProgress>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::hidden()
    }
}

impl ProgressManager {
    /// Manager drawing to the terminal
    pub fn new() -> Self {
        Self {
            multi_progress: Some(MultiProgress::new()),
        }
    }

    /// Manager whose bars are never drawn
    pub const fn hidden() -> Self {
        Self {
            multi_progress: None,
        }
    }

    /// Whether bars are drawn
    pub const fn is_visible(&self) -> bool {
        self.multi_progress.is_some()
    }

    /// Start a bar for a stage processing `len` units of work
    pub fn stage(&self, label: &str, len: usize) -> ProgressBar {
        match &self.multi_progress {
            Some(multi_progress) => {
                let bar = ProgressBar::new(len as u64)
                    .with_style(STAGE_STYLE.clone())
                    .with_message(label.to_string());
                multi_progress.add(bar)
            }
            None => ProgressBar::hidden(),
        }
    }

    /// Stderr writer that clears the bars while each write lands
    pub fn log_writer(&self) -> ProgressLogWriter {
        ProgressLogWriter {
            multi_progress: self.multi_progress.clone(),
        }
    }

    /// Remove all bars from the terminal
    pub fn finish(&self) {
        if let Some(multi_progress) = &self.multi_progress {
            let _ = multi_progress.clear();
        }
    }
}

/// Writes to stderr without interleaving with drawn progress bars
#[derive(Clone)]
pub struct ProgressLogWriter {
    multi_progress: Option<MultiProgress>,
}

impl Write for ProgressLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.multi_progress {
            Some(multi_progress) => multi_progress.suspend(|| io::stderr().write(buf)),
            None => io::stderr().write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match &self.multi_progress {
            Some(multi_progress) => multi_progress.suspend(|| io::stderr().write_all(buf)),
            None => io::stderr().write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
