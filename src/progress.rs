use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use media_reaper::{CleanupType, LibraryItem, LibraryType, PassReporter, PassSummary};
use std::sync::Mutex;

/// CLI progress reporter using an indicatif spinner per pass.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.bar.lock().ok().and_then(|mut guard| guard.take()) {
            pb.finish_and_clear();
        }
    }

    fn message(&self, msg: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(msg);
            }
        }
    }

    fn tick(&self, msg: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.inc(1);
                pb.set_message(msg);
            }
        }
    }
}

impl PassReporter for CliReporter {
    fn on_pass_start(&self, cleanup_type: CleanupType, library_type: LibraryType) {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        pb.set_prefix(format!("{} {}", cleanup_type, library_type));
        pb.set_message("Loading catalog...");
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_partition(&self, kept: usize, preview: usize, delete: usize) {
        self.message(format!(
            "{} kept, {} leaving soon, {} to delete",
            kept, preview, delete
        ));
    }

    fn on_item_linked(&self, item: &LibraryItem) {
        self.tick(format!("Linked {}", item));
    }

    fn on_item_deleted(&self, item: &LibraryItem) {
        self.tick(format!("Deleted {}", item));
    }

    fn on_pass_complete(&self, summary: &PassSummary) {
        self.finish_bar();
        if let Some(reason) = &summary.not_run_reason {
            let mark = if reason.starts_with("failed") { "✗".red() } else { "-".dimmed() };
            eprintln!(
                "  {} {} {}: {}",
                mark,
                summary.cleanup_type,
                summary.library_type,
                reason
            );
            return;
        }
        let failed = summary.preview.failed + summary.deletion.failed;
        let mark = if failed == 0 { "✓".green() } else { "!".yellow() };
        eprintln!(
            "  {} {} {} in {:.2}s: {} leaving soon, {} deleted, {} failed",
            mark,
            summary.cleanup_type,
            summary.library_type,
            summary.duration.as_secs_f64(),
            summary.preview.done,
            summary.deletion.done,
            failed
        );
    }
}
