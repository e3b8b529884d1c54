//! Core types for replace reconciliation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A decoded manifest. Opaque to the orchestrator beyond annotation helpers.
pub type Object = serde_json::Value;

/// Where a manifest is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A file or directory
    Path(PathBuf),
    /// Standard input (`-f -`)
    Stdin,
}

impl InputSource {
    /// Parse a `--filename` value
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Self::Stdin
        } else {
            Self::Path(PathBuf::from(value))
        }
    }

    /// Label used to attribute errors to this input
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Stdin => "stdin".to_string(),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Raw flag values, before validation
#[derive(Debug, Clone)]
pub struct ReplaceFlags {
    /// `--filename` values; `-` means stdin
    pub filenames: Vec<String>,
    /// Delete and re-create instead of updating in place
    pub force: bool,
    /// Cascade the deletion to dependents (force only)
    pub cascade: bool,
    /// Grace period in seconds; negative means unset (force only)
    pub grace_period: i64,
    /// Deletion timeout; zero means unset (force only)
    pub timeout: Duration,
}

impl Default for ReplaceFlags {
    fn default() -> Self {
        Self {
            filenames: Vec::new(),
            force: false,
            cascade: false,
            grace_period: -1,
            timeout: Duration::ZERO,
        }
    }
}

/// Options that only exist in force mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceOptions {
    /// Delete dependents together with the object
    pub cascade: bool,
    /// Grace period in seconds; negative leaves it to the server
    pub grace_period: i64,
    /// Client-side wait inside the deletion engine
    pub wait_for_deletion: bool,
    /// Upper bound for each confirmation poll
    pub timeout: Duration,
}

/// Validated invocation mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceMode {
    /// Single whole-object update per manifest
    Standard,
    /// Delete, confirm absence, recreate
    Force(ForceOptions),
}

impl ReplaceMode {
    /// Check if this is a force replace
    pub fn is_force(&self) -> bool {
        matches!(self, Self::Force(_))
    }
}

/// A validated replace invocation.
///
/// Built only through [`ReplacePlan::from_flags`], which validates the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacePlan {
    pub(crate) inputs: Vec<InputSource>,
    pub(crate) mode: ReplaceMode,
}

impl ReplacePlan {
    /// Inputs in the order they were given
    pub fn inputs(&self) -> &[InputSource] {
        &self.inputs
    }

    /// The selected mode
    pub fn mode(&self) -> &ReplaceMode {
        &self.mode
    }
}

/// Polling configuration for deletion confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    /// Delay between the first polls
    pub interval: Duration,
    /// Timeout used when none was requested
    pub default_timeout: Duration,
    /// Multiplier applied per attempt; 1.0 keeps the interval fixed
    pub backoff_factor: f64,
    /// Upper bound for a single delay
    pub max_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            default_timeout: Duration::from_secs(5 * 60),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(30),
        }
    }
}

impl WaitConfig {
    /// Map an unset (zero) timeout to the configured default
    pub fn effective_timeout(&self, requested: Duration) -> Duration {
        if requested.is_zero() {
            self.default_timeout
        } else {
            requested
        }
    }

    /// Calculate the delay after a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.interval.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_interval.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Confirmation state of one deleted object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionWaitState {
    /// Delete issued, object still visible
    Pending,
    /// A get reported not-found
    ConfirmedDeleted,
    /// The timeout elapsed first
    TimedOut,
    /// A get failed for another reason
    Errored,
}

impl DeletionWaitState {
    /// Whether the wait is over
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How dependents are treated when an object is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Propagation {
    /// Leave dependents in place
    Orphan,
    /// Delete dependents before the owner disappears
    Foreground,
}

impl Propagation {
    /// Wire name of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orphan => "Orphan",
            Self::Foreground => "Foreground",
        }
    }
}

/// Options sent with a delete call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Seconds the object is given to terminate; `None` is the server default
    pub grace_period_seconds: Option<i64>,
    /// Dependent handling; `None` is the server default
    pub propagation: Option<Propagation>,
}

impl DeleteOptions {
    /// Options with a grace period, ignoring negative values
    pub fn with_grace_period(grace_period: i64) -> Self {
        Self {
            grace_period_seconds: (grace_period >= 0).then_some(grace_period),
            propagation: None,
        }
    }
}

/// Aggregate result of one invocation
#[derive(Debug, Default)]
pub struct ReplaceOutcome {
    /// Descriptors that completed their full cycle
    pub processed: usize,
    /// Descriptors that failed (including decode failures)
    pub failed: usize,
    first_error: Option<Error>,
    require_any: bool,
}

impl ReplaceOutcome {
    /// Outcome for a mode; force mode treats zero replacements as failure
    pub fn for_mode(mode: &ReplaceMode) -> Self {
        Self {
            require_any: mode.is_force(),
            ..Default::default()
        }
    }

    /// Count a completed descriptor
    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    /// Count a failure, keeping only the first error
    pub fn record_error(&mut self, error: Error) {
        self.failed += 1;
        self.keep_first(error);
    }

    /// Keep an output error for a descriptor that was still processed.
    ///
    /// Neither count changes.
    pub fn record_output_error(&mut self, error: Error) {
        self.keep_first(error);
    }

    fn keep_first(&mut self, error: Error) {
        if self.first_error.is_none() {
            self.first_error = Some(error);
        } else {
            log::debug!("additional error: {error}");
        }
    }

    /// The first error seen, if any
    pub fn first_error(&self) -> Option<&Error> {
        self.first_error.as_ref()
    }

    /// Some descriptors succeeded and some failed
    pub fn is_partial(&self) -> bool {
        self.processed > 0 && self.first_error.is_some()
    }

    /// Collapse into the operation result: first error wins, then the
    /// nothing-replaced check, else the processed count.
    pub fn into_result(self) -> Result<usize> {
        if let Some(err) = self.first_error {
            return Err(err);
        }
        if self.require_any && self.processed == 0 {
            return Err(Error::NoObjectsReplaced);
        }
        Ok(self.processed)
    }
}
