use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{DeletionWaitState, WaitObserver};
use std::time::Duration;

// Status lines go to stderr; stdout carries printed objects.

/// Print a warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

// ============================================================================
// Deletion Wait Spinner
// ============================================================================

/// Spinner shown while force replace waits for objects to disappear
pub struct SpinnerObserver {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl SpinnerObserver {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }

    fn spinner(reference: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("waiting for {reference} to be deleted"));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl WaitObserver for SpinnerObserver {
    fn on_wait_start(&mut self, reference: &str) {
        if !self.quiet {
            self.bar = Some(Self::spinner(reference));
        }
    }

    fn on_poll(&mut self, reference: &str, attempt: u32) {
        log::trace!("poll {attempt} for {reference}");
        if let Some(pb) = &self.bar
            && attempt > 0
        {
            pb.set_message(format!(
                "waiting for {reference} to be deleted (check {})",
                attempt + 1
            ));
        }
    }

    fn on_wait_complete(&mut self, reference: &str, state: DeletionWaitState) {
        let Some(pb) = self.bar.take() else { return };
        match state {
            DeletionWaitState::ConfirmedDeleted => pb.finish_and_clear(),
            DeletionWaitState::TimedOut => {
                pb.abandon_with_message(format!("{} {reference} still present", "✗".red()));
            }
            _ => pb.abandon_with_message(format!("{} could not confirm {reference}", "✗".red())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
