//! Progress display for catalogue ingestion.

use indicatif::{ProgressBar, ProgressStyle};

/// Tracks reports and chunks processed during a catalogue run
pub struct IngestProgress {
    bar: ProgressBar,
    reports_done: usize,
    chunks_done: usize,
}

impl IngestProgress {
    /// Progress bar on stderr
    pub fn new(total_reports: usize) -> Self {
        let bar = ProgressBar::new(total_reports as u64);
        let style = ProgressStyle::default_bar()
            .template("  {spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        Self::with_bar(bar)
    }

    /// No output (tests, JSON mode)
    pub fn quiet(total_reports: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_reports as u64);
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            reports_done: 0,
            chunks_done: 0,
        }
    }

    /// Show which report is being processed
    pub fn start_report(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    /// A report was chunked and indexed
    pub fn finish_report(&mut self, chunks: usize) {
        self.reports_done += 1;
        self.chunks_done += chunks;
        self.bar.inc(1);
    }

    /// A report was skipped (missing, duplicate, failed)
    pub fn skip_report(&mut self) {
        self.bar.inc(1);
    }

    pub fn reports_done(&self) -> usize {
        self.reports_done
    }

    pub fn chunks_done(&self) -> usize {
        self.chunks_done
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn complete(&self) {
        self.bar.finish_with_message(format!(
            "{} reports, {} chunks",
            self.reports_done, self.chunks_done
        ));
    }
}
