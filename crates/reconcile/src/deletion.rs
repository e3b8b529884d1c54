//! Default deletion engine
//!
//! Deletes through the descriptor's own handle. Dependent discovery and
//! cascade execution are left to the server: a cascading delete asks for
//! foreground propagation, a direct delete orphans dependents.

use crate::context::{DeletionEngine, NoObserver};
use crate::error::Result;
use crate::resource::ResourceDescriptor;
use crate::types::{DeleteOptions, ForceOptions, Propagation, WaitConfig};
use crate::wait::poll_until_absent;
use std::time::Duration;

/// Deletion engine over [`RemoteHandle::delete`](crate::RemoteHandle::delete)
#[derive(Debug, Clone)]
pub struct HandleDeletion {
    /// Grace period for cascading deletes; negative leaves it to the server
    pub grace_period: i64,
    /// Poll for absence right after each delete call
    pub wait_for_deletion: bool,
    /// Poll settings used when `wait_for_deletion` is set
    pub wait: WaitConfig,
    /// Upper bound for that poll
    pub timeout: Duration,
}

impl Default for HandleDeletion {
    fn default() -> Self {
        let wait = WaitConfig::default();
        Self {
            grace_period: -1,
            wait_for_deletion: false,
            timeout: wait.default_timeout,
            wait,
        }
    }
}

impl HandleDeletion {
    /// Engine configured from validated force options
    pub fn from_options(options: &ForceOptions, wait: &WaitConfig) -> Self {
        Self {
            grace_period: options.grace_period,
            wait_for_deletion: options.wait_for_deletion,
            wait: wait.clone(),
            timeout: options.timeout,
        }
    }

    fn delete(&self, descriptor: &ResourceDescriptor, options: DeleteOptions) -> Result<()> {
        log::debug!(
            "deleting {} (grace {:?}, propagation {:?})",
            descriptor.reference(),
            options.grace_period_seconds,
            options.propagation
        );
        match descriptor
            .handle
            .delete(&descriptor.namespace, &descriptor.name, &options)
        {
            Ok(()) => {}
            // replace creates missing objects, so nothing to delete is fine
            Err(e) if e.is_not_found() => {
                log::debug!("{} already absent", descriptor.reference());
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        if self.wait_for_deletion {
            poll_until_absent(descriptor, &self.wait, self.timeout, &mut NoObserver)?;
        }
        Ok(())
    }
}

impl DeletionEngine for HandleDeletion {
    fn delete_cascading(&self, descriptor: &ResourceDescriptor) -> Result<()> {
        let options = DeleteOptions {
            propagation: Some(Propagation::Foreground),
            ..DeleteOptions::with_grace_period(self.grace_period)
        };
        self.delete(descriptor, options)
    }

    fn delete_direct(&self, descriptor: &ResourceDescriptor, grace_period: i64) -> Result<()> {
        let options = DeleteOptions {
            propagation: Some(Propagation::Orphan),
            ..DeleteOptions::with_grace_period(grace_period)
        };
        self.delete(descriptor, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockCluster, descriptor, manifest};

    fn engine(grace_period: i64, wait_for_deletion: bool) -> HandleDeletion {
        HandleDeletion {
            grace_period,
            wait_for_deletion,
            wait: WaitConfig {
                interval: Duration::from_millis(2),
                ..WaitConfig::default()
            },
            timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_cascading_uses_foreground() {
        let cluster = MockCluster::new();
        cluster.insert("default", "myrc", manifest("ReplicationController", "default", "myrc"));
        let desc = descriptor(&cluster, "ReplicationController", "default", "myrc", "rc.yaml");

        engine(30, false).delete_cascading(&desc).unwrap();

        assert_eq!(
            cluster.calls(),
            vec![Call::Delete(
                "myrc".into(),
                DeleteOptions {
                    grace_period_seconds: Some(30),
                    propagation: Some(Propagation::Foreground),
                }
            )]
        );
    }

    #[test]
    fn test_direct_orphans_and_ignores_negative_grace() {
        let cluster = MockCluster::new();
        cluster.insert("default", "mypod", manifest("Pod", "default", "mypod"));
        let desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");

        engine(-1, false).delete_direct(&desc, -1).unwrap();

        assert_eq!(
            cluster.calls(),
            vec![Call::Delete(
                "mypod".into(),
                DeleteOptions {
                    grace_period_seconds: None,
                    propagation: Some(Propagation::Orphan),
                }
            )]
        );
    }

    #[test]
    fn test_missing_object_is_not_an_error() {
        let cluster = MockCluster::new();
        let desc = descriptor(&cluster, "Pod", "default", "new", "pod.json");
        assert!(engine(-1, false).delete_direct(&desc, -1).is_ok());
    }

    #[test]
    fn test_wait_for_deletion_polls() {
        let cluster = MockCluster::new();
        cluster.insert("default", "mypod", manifest("Pod", "default", "mypod"));
        cluster.linger("mypod", 2);
        let desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");

        engine(1, true).delete_direct(&desc, 1).unwrap();

        assert_eq!(cluster.count(|c| matches!(c, Call::Get(_))), 3);
        assert!(cluster.object("default", "mypod").is_none());
    }

    #[test]
    fn test_delete_failure_propagates() {
        let cluster = MockCluster::new();
        cluster.insert("default", "mypod", manifest("Pod", "default", "mypod"));
        cluster.fail_delete("mypod");
        let desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");

        assert!(engine(-1, false).delete_cascading(&desc).is_err());
    }
}
