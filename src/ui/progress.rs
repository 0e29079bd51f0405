//! Progress reporting

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;

/// Progress reporter for sync runs
///
/// The transfer bar counts bytes rather than files: media files vary by
/// orders of magnitude, and only completed files advance the position.
pub struct ProgressReporter {
    scan_bar: ProgressBar,
    transfer_bar: ProgressBar,
    transfer_started_at: Option<Instant>,
    transferred_bytes: u64,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let scan_bar = ProgressBar::new_spinner();
        scan_bar.enable_steady_tick(std::time::Duration::from_millis(120));
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            scan_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }

        let transfer_bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:30.cyan/blue} {bytes}/{total_bytes} | {msg}")
        {
            transfer_bar.set_style(style.progress_chars("=>-"));
        }

        Self {
            scan_bar,
            transfer_bar,
            transfer_started_at: None,
            transferred_bytes: 0,
        }
    }

    /// Mark start of the scanning phase.
    pub fn start_scan(&self) {
        self.scan_bar.set_message("Scanning source...".to_string());
    }

    /// Update scanning progress counters.
    pub fn update_scan(&self, files: u64, bytes: u64) {
        self.scan_bar.set_message(format!(
            "Scanning source... {} files | {}",
            files,
            HumanBytes(bytes)
        ));
    }

    /// Mark completion of the scanning phase.
    pub fn finish_scan(&self, files: usize, bytes: u64) {
        self.scan_bar.finish_with_message(format!(
            "Scanned source: {} files | {}",
            files,
            HumanBytes(bytes)
        ));
    }

    /// Initialize transfer phase progress.
    pub fn start_transfer(&mut self, total_bytes: u64) {
        self.transfer_started_at = Some(Instant::now());
        self.transferred_bytes = 0;
        self.transfer_bar.set_length(total_bytes);
        self.transfer_bar.set_position(0);
        self.transfer_bar
            .set_message("Starting transfer...".to_string());
    }

    /// Update current file indicator.
    pub fn set_current_file(&self, path: &Path) {
        self.transfer_bar
            .set_message(format!("Pushing {}", path.display()));
    }

    /// Surface a retry without advancing progress.
    pub fn file_retrying(&self, path: &Path, attempt: u32) {
        self.transfer_bar
            .set_message(format!("Retrying {} (attempt {})", path.display(), attempt));
    }

    /// Mark one file complete and refresh throughput display.
    ///
    /// Only completed files advance the position, so the bar never claims
    /// more than the sum of finished file sizes.
    pub fn complete_file(&mut self, bytes: u64) {
        self.transferred_bytes = self.transferred_bytes.saturating_add(bytes);
        self.transfer_bar.inc(bytes);

        let throughput = self.current_throughput_bps();
        self.transfer_bar.set_message(format!(
            "{} transferred | {}/s",
            HumanBytes(self.transferred_bytes),
            HumanBytes(throughput)
        ));
    }

    /// Surface a per-file failure in the transfer phase.
    pub fn file_error(&self, path: &Path, reason: &str) {
        self.transfer_bar
            .println(format!("ERROR {}: {}", path.display(), reason));
    }

    /// Finalize transfer phase.
    pub fn finish_transfer(&self, succeeded: usize, failed: usize, bytes: u64) {
        let throughput = self.current_throughput_bps();
        self.transfer_bar.finish_with_message(format!(
            "Transfer complete: {} succeeded, {} failed | {} total | {}/s",
            succeeded,
            failed,
            HumanBytes(bytes),
            HumanBytes(throughput)
        ));
    }

    fn current_throughput_bps(&self) -> u64 {
        match self.transfer_started_at {
            Some(started) => {
                let elapsed = started.elapsed();
                let secs = elapsed.as_secs_f64();
                if secs > 0.0 {
                    (self.transferred_bytes as f64 / secs) as u64
                } else {
                    0
                }
            }
            None => 0,
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
