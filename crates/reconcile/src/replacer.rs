//! Replace orchestrator
//!
//! Standard replace issues one whole-object update per descriptor. Force
//! replace runs three phases over the same inputs:
//!
//! 1. resolve and delete every descriptor;
//! 2. poll each deleted descriptor until it is confirmed absent;
//! 3. resolve again and recreate the confirmed descriptors.
//!
//! Recreation never starts before every descriptor in the batch has been
//! confirmed absent. Per-descriptor failures are recorded in the
//! [`ReplaceOutcome`] (first error wins) and do not stop the others.

use crate::annotate::LastAppliedAnnotator;
use crate::context::{
    Annotator, DeletionEngine, NoObserver, NoRecord, Printer, RecordPolicy, WaitObserver,
};
use crate::error::{ErrorCategory, Result};
use crate::resource::{DescriptorKey, DescriptorStream, ResolveOptions, ResourceDescriptor};
use crate::spool::StdinSpool;
use crate::types::{ForceOptions, ReplaceMode, ReplaceOutcome, ReplacePlan, WaitConfig};
use crate::wait::poll_until_absent;
use std::collections::BTreeSet;
use std::io::{self, Read};

/// Sequences descriptor resolution, stamping, deletion and writes.
///
/// # Example
///
/// ```ignore
/// let plan = ReplacePlan::from_flags(&flags, &wait)?;
/// let deletion = HandleDeletion::from_options(&force_opts, &wait);
/// let mut printer = NoPrint;
/// let replaced = Replacer::new(&stream, &deletion, &mut printer)
///     .with_wait(wait)
///     .replace_all(&plan)?;
/// ```
pub struct Replacer<'a> {
    stream: &'a dyn DescriptorStream,
    deletion: &'a dyn DeletionEngine,
    printer: &'a mut dyn Printer,
    annotator: &'a dyn Annotator,
    record: &'a dyn RecordPolicy,
    observer: Box<dyn WaitObserver + 'a>,
    stdin: Box<dyn Read + 'a>,
    change_cause: String,
    wait: WaitConfig,
}

static DEFAULT_ANNOTATOR: LastAppliedAnnotator = LastAppliedAnnotator { create: false };

impl<'a> Replacer<'a> {
    /// Create a replacer with default annotation, no recording, no wait
    /// observer and the process's standard input.
    pub fn new(
        stream: &'a dyn DescriptorStream,
        deletion: &'a dyn DeletionEngine,
        printer: &'a mut dyn Printer,
    ) -> Self {
        Self {
            stream,
            deletion,
            printer,
            annotator: &DEFAULT_ANNOTATOR,
            record: &NoRecord,
            observer: Box::new(NoObserver),
            stdin: Box::new(io::stdin()),
            change_cause: String::new(),
            wait: WaitConfig::default(),
        }
    }

    pub fn with_annotator(mut self, annotator: &'a dyn Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    /// Set the record policy and the change cause it records
    pub fn with_record(mut self, policy: &'a dyn RecordPolicy, change_cause: impl Into<String>) -> Self {
        self.record = policy;
        self.change_cause = change_cause.into();
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn WaitObserver + 'a>) -> Self {
        self.observer = observer;
        self
    }

    /// Read `-f -` from this reader instead of the process's stdin
    pub fn with_stdin(mut self, stdin: Box<dyn Read + 'a>) -> Self {
        self.stdin = stdin;
        self
    }

    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Run the plan and collapse the outcome into a processed count.
    pub fn replace_all(&mut self, plan: &ReplacePlan) -> Result<usize> {
        self.run(plan)?.into_result()
    }

    /// Run the plan.
    ///
    /// `Err` means the batch was aborted (stream failure, stdin spooling,
    /// a failed or timed out confirmation poll). Per-descriptor errors are
    /// reported through the returned outcome.
    pub fn run(&mut self, plan: &ReplacePlan) -> Result<ReplaceOutcome> {
        match plan.mode() {
            ReplaceMode::Standard => self.replace(plan),
            ReplaceMode::Force(options) => self.force_replace(plan, options),
        }
    }

    fn replace(&mut self, plan: &ReplacePlan) -> Result<ReplaceOutcome> {
        let mut outcome = ReplaceOutcome::for_mode(plan.mode());
        let items = self
            .stream
            .resolve(plan.inputs(), &ResolveOptions { require_object: true })?;

        for item in items {
            let mut descriptor = match item {
                Ok(d) => d,
                Err(e) => {
                    outcome.record_error(e);
                    continue;
                }
            };
            match self.replace_one(&mut descriptor) {
                Ok(()) => {
                    outcome.record_success();
                    if let Err(e) = self.printer.print_replaced(&descriptor) {
                        outcome.record_output_error(e);
                    }
                }
                Err(e) => outcome.record_error(e.with_source("replacing", &descriptor.source)),
            }
        }

        Ok(outcome)
    }

    fn replace_one(&mut self, descriptor: &mut ResourceDescriptor) -> Result<()> {
        self.stamp(descriptor)?;
        let updated = descriptor.handle.replace(
            &descriptor.namespace,
            &descriptor.name,
            true,
            &descriptor.object,
        )?;
        descriptor.refresh(updated);
        log::info!("replaced {}", descriptor.reference());
        Ok(())
    }

    fn force_replace(&mut self, plan: &ReplacePlan, options: &ForceOptions) -> Result<ReplaceOutcome> {
        let mut outcome = ReplaceOutcome::for_mode(plan.mode());

        // Held until the end of this function; dropping it removes the
        // spooled copy on every exit path.
        let spool = StdinSpool::materialize(plan.inputs(), &mut self.stdin)?;
        let inputs = spool.inputs();

        let lenient = ResolveOptions {
            require_object: false,
        };

        // Phase 1: delete.
        let items = self.stream.resolve(inputs, &lenient)?;
        if options.cascade {
            log::warn!(
                "\"cascade\" is set, every resource managed by the replaced resources \
                 (e.g. Pods created by a ReplicationController) will be deleted and re-created"
            );
        }

        let mut deleted = Vec::new();
        for item in items.into_iter().map(|item| spool.relabel(item)) {
            let descriptor = match item {
                Ok(d) => d,
                Err(e) => {
                    // Recreation resolves the same inputs and records it.
                    log::debug!("skipping undecodable manifest during deletion: {e}");
                    continue;
                }
            };
            let result = if options.cascade {
                self.deletion.delete_cascading(&descriptor)
            } else {
                self.deletion.delete_direct(&descriptor, options.grace_period)
            };
            match result {
                Ok(()) => {
                    if let Err(e) = self.printer.print_deleted(&descriptor) {
                        outcome.record_output_error(e);
                    }
                    deleted.push(descriptor);
                }
                // The engine's own wait ran out: same as a phase 2 timeout.
                Err(e) if e.category() == ErrorCategory::Timeout => return Err(e),
                Err(e) => outcome.record_error(e.with_source("deleting", &descriptor.source)),
            }
        }

        // Phase 2: confirm. A timeout or poll error aborts the batch before
        // anything is recreated.
        let mut confirmed: BTreeSet<DescriptorKey> = BTreeSet::new();
        for descriptor in &deleted {
            poll_until_absent(descriptor, &self.wait, options.timeout, self.observer.as_mut())?;
            confirmed.insert(descriptor.key());
        }
        drop(deleted);

        // Phase 3: recreate from a fresh pass.
        let items = self.stream.resolve(inputs, &lenient)?;
        for item in items.into_iter().map(|item| spool.relabel(item)) {
            let mut descriptor = match item {
                Ok(d) => d,
                Err(e) => {
                    outcome.record_error(e);
                    continue;
                }
            };
            if !confirmed.contains(&descriptor.key()) {
                log::warn!(
                    "not recreating {}: its deletion was not confirmed",
                    descriptor.reference()
                );
                continue;
            }
            match self.recreate_one(&mut descriptor) {
                Ok(()) => {
                    outcome.record_success();
                    if let Err(e) = self.printer.print_replaced(&descriptor) {
                        outcome.record_output_error(e);
                    }
                }
                Err(e) => outcome.record_error(e.with_source("replacing", &descriptor.source)),
            }
        }

        drop(spool);
        Ok(outcome)
    }

    fn recreate_one(&mut self, descriptor: &mut ResourceDescriptor) -> Result<()> {
        self.stamp(descriptor)?;
        let created = descriptor.handle.create(
            &descriptor.namespace,
            &descriptor.name,
            true,
            &descriptor.object,
        )?;
        descriptor.refresh(created);
        log::info!("recreated {}", descriptor.reference());
        Ok(())
    }

    fn stamp(&self, descriptor: &mut ResourceDescriptor) -> Result<()> {
        self.annotator.stamp(descriptor)?;
        if self.record.should_record(descriptor) {
            self.annotator
                .record_change_cause(&mut descriptor.object, &self.change_cause)?;
        }
        Ok(())
    }
}
