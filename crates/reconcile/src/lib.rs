//! # Reconcile
//!
//! Replace reconciliation: bring named remote objects in line with locally
//! supplied manifests.
//!
//! ## Modes
//!
//! - **Replace**: one idempotent whole-object update per manifest. Never
//!   deletes remote state.
//! - **Force replace**: delete every object, poll until each one is confirmed
//!   absent, then recreate them all from a fresh read of the same manifests.
//!
//! ## Core Concepts
//!
//! - **ResourceDescriptor**: one resolved manifest plus the handle that
//!   reads and writes its remote representation
//! - **DescriptorStream**: resolves inputs (files, stdin) into descriptors
//! - **ReplacePlan**: validated flags and selected mode
//! - **Replacer**: the orchestrator; returns a [`ReplaceOutcome`] with a
//!   processed count and the first error seen
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{HandleDeletion, ReplaceFlags, ReplaceMode, ReplacePlan, Replacer, WaitConfig};
//!
//! let wait = WaitConfig::default();
//! let plan = ReplacePlan::from_flags(&flags, &wait)?;
//! let deletion = match plan.mode() {
//!     ReplaceMode::Force(opts) => HandleDeletion::from_options(opts, &wait),
//!     ReplaceMode::Standard => HandleDeletion::default(),
//! };
//!
//! let replaced = Replacer::new(&stream, &deletion, &mut printer)
//!     .with_wait(wait)
//!     .replace_all(&plan)?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`DescriptorStream`] and [`RemoteHandle`]: manifest resolution and
//!   remote access
//! - [`Annotator`] and [`RecordPolicy`]: provenance stamping
//! - [`DeletionEngine`]: how force replace deletes
//! - [`Printer`] and [`WaitObserver`]: output and progress
//!
//! The crate has no transport, decoding or terminal dependencies; callers
//! inject them through these traits.

pub mod annotate;
pub mod context;
pub mod deletion;
pub mod error;
pub mod object;
pub mod replacer;
pub mod resource;
pub mod spool;
pub mod types;
pub mod validate;
pub mod wait;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use annotate::{CHANGE_CAUSE, LAST_APPLIED, LastAppliedAnnotator};
pub use context::{
    AlwaysRecord, Annotator, DeletionEngine, NoObserver, NoPrint, NoRecord, Printer, RecordFlag,
    RecordPolicy, WaitObserver,
};
pub use deletion::HandleDeletion;
pub use error::{Error, ErrorCategory, Result};
pub use replacer::Replacer;
pub use resource::{
    DescriptorKey, DescriptorStream, RemoteHandle, ResolveOptions, ResourceDescriptor,
};
pub use spool::StdinSpool;
pub use types::{
    DeleteOptions, DeletionWaitState, ForceOptions, InputSource, Object, Propagation,
    ReplaceFlags, ReplaceMode, ReplaceOutcome, ReplacePlan, WaitConfig,
};
pub use wait::{DeletionWatch, poll_until_absent};
