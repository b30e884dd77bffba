//! Progress display for a running batch.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use reviewacquire::scrape::BatchEvent;

/// One bar over all targets, with a line per finished identifier.
pub struct ScrapeProgress {
    bar: ProgressBar,
}

impl ScrapeProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message("Scraping...");
        Self { bar }
    }

    pub fn handle(&self, event: BatchEvent) {
        match event {
            BatchEvent::TargetStarted { id, .. } => {
                self.bar.set_message(id);
            }
            BatchEvent::TargetCompleted {
                id,
                records,
                attempts,
                path,
                ..
            } => {
                let retried = if attempts > 1 {
                    format!(" after {} attempts", attempts)
                } else {
                    String::new()
                };
                self.bar.println(format!(
                    "{} {}: {} reviews{} → {}",
                    style("✓").green(),
                    id,
                    records,
                    retried,
                    path.display()
                ));
                self.bar.inc(1);
            }
            BatchEvent::TargetFailed {
                id,
                kind,
                attempts,
                error,
                ..
            } => {
                self.bar.println(format!(
                    "{} {}: {} after {} attempts: {}",
                    style("✗").red(),
                    id,
                    kind,
                    attempts,
                    style(error).dim()
                ));
                self.bar.inc(1);
            }
            BatchEvent::WriteFailed { id, error, .. } => {
                self.bar
                    .println(format!("{} {}: {}", style("✗").red(), id, error));
                self.bar.inc(1);
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
