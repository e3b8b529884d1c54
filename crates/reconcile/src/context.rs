//! Injected policies and providers
//!
//! These traits keep the orchestrator free of concrete printing, annotation
//! and deletion implementations, so it can be driven by a CLI or by tests.

use crate::error::Result;
use crate::resource::ResourceDescriptor;
use crate::types::{DeletionWaitState, Object};

/// Stamps provenance annotations onto a descriptor's object
pub trait Annotator {
    /// Create or update the last-applied-configuration annotation
    fn stamp(&self, descriptor: &mut ResourceDescriptor) -> Result<()>;

    /// Record the command that produced this object state
    fn record_change_cause(&self, object: &mut Object, cause: &str) -> Result<()>;
}

/// Decides per descriptor whether the change cause is recorded
pub trait RecordPolicy {
    fn should_record(&self, descriptor: &ResourceDescriptor) -> bool;
}

/// Deletes remote objects during a force replace
pub trait DeletionEngine {
    /// Delete the object and the dependents it manages
    fn delete_cascading(&self, descriptor: &ResourceDescriptor) -> Result<()>;

    /// Delete only the object, with the given grace period in seconds
    fn delete_direct(&self, descriptor: &ResourceDescriptor, grace_period: i64) -> Result<()>;
}

/// Output sink for processed descriptors
pub trait Printer {
    /// Called once per successfully replaced (or recreated) descriptor
    fn print_replaced(&mut self, descriptor: &ResourceDescriptor) -> Result<()>;

    /// Called once per deleted descriptor in a force replace
    fn print_deleted(&mut self, _descriptor: &ResourceDescriptor) -> Result<()> {
        Ok(())
    }
}

/// Receives progress of deletion confirmation polls
pub trait WaitObserver {
    /// Polling starts for a descriptor
    fn on_wait_start(&mut self, reference: &str);

    /// A poll is about to be issued (0-indexed)
    fn on_poll(&mut self, reference: &str, attempt: u32);

    /// The wait reached a terminal state
    fn on_wait_complete(&mut self, reference: &str, state: DeletionWaitState);
}

/// No-op printer
pub struct NoPrint;

impl Printer for NoPrint {
    fn print_replaced(&mut self, _descriptor: &ResourceDescriptor) -> Result<()> {
        Ok(())
    }
}

/// No-op wait observer
pub struct NoObserver;

impl WaitObserver for NoObserver {
    fn on_wait_start(&mut self, _reference: &str) {}
    fn on_poll(&mut self, _reference: &str, _attempt: u32) {}
    fn on_wait_complete(&mut self, _reference: &str, _state: DeletionWaitState) {}
}

/// Never record a change cause
pub struct NoRecord;

impl RecordPolicy for NoRecord {
    fn should_record(&self, _descriptor: &ResourceDescriptor) -> bool {
        false
    }
}

/// Always record a change cause
pub struct AlwaysRecord;

impl RecordPolicy for AlwaysRecord {
    fn should_record(&self, _descriptor: &ResourceDescriptor) -> bool {
        true
    }
}

/// `--record` flag policy.
///
/// An explicit value wins. When the flag was not given, the change cause is
/// kept up to date only on objects that already carry one.
pub struct RecordFlag {
    pub record: Option<bool>,
}

impl RecordPolicy for RecordFlag {
    fn should_record(&self, descriptor: &ResourceDescriptor) -> bool {
        match self.record {
            Some(record) => record,
            None => {
                crate::object::annotation(&descriptor.object, crate::annotate::CHANGE_CAUSE)
                    .is_some()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::CHANGE_CAUSE;
    use crate::testing::{MockCluster, descriptor};

    #[test]
    fn test_record_flag_explicit() {
        let cluster = MockCluster::new();
        let desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");

        assert!(RecordFlag { record: Some(true) }.should_record(&desc));
        assert!(!RecordFlag { record: Some(false) }.should_record(&desc));
    }

    #[test]
    fn test_record_flag_unset_follows_existing_annotation() {
        let cluster = MockCluster::new();
        let mut desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");
        let policy = RecordFlag { record: None };

        assert!(!policy.should_record(&desc));
        crate::object::set_annotation(&mut desc.object, CHANGE_CAUSE, "kctl create");
        assert!(policy.should_record(&desc));
    }

    #[test]
    fn test_fixed_policies() {
        let cluster = MockCluster::new();
        let desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");
        assert!(AlwaysRecord.should_record(&desc));
        assert!(!NoRecord.should_record(&desc));
    }
}
