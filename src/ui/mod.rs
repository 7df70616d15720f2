//! Terminal progress for batch runs.

use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::{PaperOutcome, PaperStatus};

/// Check if stderr is a terminal.
pub fn is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Short label for a paper outcome
pub fn status_label(status: &PaperStatus) -> String {
    match status {
        PaperStatus::Cited { count } => format!("✓ {} citations", count),
        PaperStatus::NoSources => "○ no sources".to_string(),
        PaperStatus::Forbidden => "✗ forbidden".to_string(),
        PaperStatus::RetriesExhausted { attempts } => {
            format!("✗ unavailable after {} attempts", attempts)
        }
        PaperStatus::Unsupported => "○ no sources (document only)".to_string(),
        PaperStatus::Failed { message } => format!("✗ {}", message),
    }
}

/// Progress bar over the papers of a batch
///
/// Hidden when stderr is not a terminal.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        let bar = if is_terminal() {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                .progress_chars("█▉ "),
        );
        Self { bar }
    }

    /// Advance by one paper
    pub fn complete(&self, outcome: &PaperOutcome) {
        self.bar.inc(1);
        self.bar
            .set_message(format!("{} {}", outcome.paper, status_label(&outcome.status)));
    }

    pub fn finish(&self, cited: usize, total: usize) {
        self.bar
            .finish_with_message(format!("✓ Recorded citations for {}/{} papers", cited, total));
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
