//! Flag validation and mode selection
//!
//! Runs once per invocation, before any remote call. Pure: no I/O.

use crate::error::{Error, Result};
use crate::types::{ForceOptions, InputSource, ReplaceFlags, ReplaceMode, ReplacePlan, WaitConfig};

impl ReplacePlan {
    /// Validate flags and select the replace mode.
    ///
    /// Grace period and timeout only make sense when an object is actually
    /// deleted, so both require `--force`. At least one filename is required.
    pub fn from_flags(flags: &ReplaceFlags, wait: &WaitConfig) -> Result<Self> {
        if flags.grace_period >= 0 && !flags.force {
            return Err(Error::configuration(
                "--grace-period must have --force specified",
            ));
        }

        if !flags.timeout.is_zero() && !flags.force {
            return Err(Error::configuration("--timeout must have --force specified"));
        }

        let inputs: Vec<InputSource> = flags
            .filenames
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(InputSource::parse)
            .collect();

        if inputs.is_empty() {
            return Err(Error::configuration("must specify --filename to replace"));
        }

        if !flags.force {
            if flags.cascade {
                log::warn!("--cascade has no effect without --force");
            }
            return Ok(Self {
                inputs,
                mode: ReplaceMode::Standard,
            });
        }

        // --grace-period=0 would kill immediately; use 1 and wait for the
        // object to be gone instead.
        let (grace_period, wait_for_deletion) = if flags.grace_period == 0 {
            (1, true)
        } else {
            (flags.grace_period, false)
        };

        Ok(Self {
            inputs,
            mode: ReplaceMode::Force(ForceOptions {
                cascade: flags.cascade,
                grace_period,
                wait_for_deletion,
                timeout: wait.effective_timeout(flags.timeout),
            }),
        })
    }
}
