//! Remote handles, descriptors and descriptor streams
//!
//! A descriptor is the resolved, addressable view of one manifest: where it
//! lives remotely, what it should look like, and a handle that can read and
//! write its remote representation.

use crate::error::Result;
use crate::types::{DeleteOptions, InputSource, Object};
use std::fmt;

/// Capability to read and write one remote collection.
///
/// Implementations report absence from [`get`](RemoteHandle::get) as
/// [`Error::NotFound`](crate::Error::NotFound); the deletion barrier relies
/// on that.
pub trait RemoteHandle: fmt::Debug {
    /// Fetch the current remote object
    fn get(&self, namespace: &str, name: &str) -> Result<Object>;

    /// Create the object.
    ///
    /// With `overwrite`, an object recreated concurrently by someone else is
    /// overwritten instead of reported as a conflict.
    fn create(&self, namespace: &str, name: &str, overwrite: bool, object: &Object)
    -> Result<Object>;

    /// Replace the whole object.
    ///
    /// With `overwrite`, the write is allowed even if the remote version
    /// differs from the one the manifest was read from.
    fn replace(&self, namespace: &str, name: &str, overwrite: bool, object: &Object)
    -> Result<Object>;

    /// Delete the object
    fn delete(&self, namespace: &str, name: &str, options: &DeleteOptions) -> Result<()>;
}

/// Identity of a descriptor, stable across resolve passes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorKey {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}/{}", self.kind.to_lowercase(), self.name)
        } else {
            write!(
                f,
                "{}/{} (namespace {})",
                self.kind.to_lowercase(),
                self.name,
                self.namespace
            )
        }
    }
}

/// One manifest resolved against the remote system.
///
/// Owned and consumed by the orchestrator; the handle is never shared with
/// another descriptor.
#[derive(Debug)]
pub struct ResourceDescriptor {
    /// Namespace (empty for cluster-scoped objects)
    pub namespace: String,
    /// Object name
    pub name: String,
    /// Object kind, e.g. `Pod`
    pub kind: String,
    /// Decoded manifest, refreshed with the server's answer after writes
    pub object: Object,
    /// Remote access for this object
    pub handle: Box<dyn RemoteHandle>,
    /// Filename or "stdin", for error attribution
    pub source: String,
}

impl ResourceDescriptor {
    /// `kind/name` as printed to users, e.g. `pod/mypod`
    pub fn reference(&self) -> String {
        format!("{}/{}", self.kind.to_lowercase(), self.name)
    }

    /// Identity used to match descriptors between passes
    pub fn key(&self) -> DescriptorKey {
        DescriptorKey {
            kind: self.kind.clone(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// Fetch the current remote object through the handle
    pub fn get(&self) -> Result<Object> {
        self.handle.get(&self.namespace, &self.name)
    }

    /// Replace the in-memory object with the server's representation
    pub fn refresh(&mut self, object: Object) {
        self.object = object;
    }
}

/// Options for a resolve pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Whether the remote object must already exist
    pub require_object: bool,
}

/// Produces descriptors from manifest inputs.
///
/// Must tolerate being called twice over the same inputs (force replace
/// resolves once for deletion and once for recreation).
pub trait DescriptorStream {
    /// Resolve inputs into descriptors, in input order.
    ///
    /// An outer error aborts the operation. Inner errors are per item and
    /// do not stop the remaining items.
    fn resolve(
        &self,
        inputs: &[InputSource],
        options: &ResolveOptions,
    ) -> Result<Vec<Result<ResourceDescriptor>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCluster, descriptor};
    use serde_json::json;

    #[test]
    fn test_reference_and_key() {
        let cluster = MockCluster::new();
        let desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");

        assert_eq!(desc.reference(), "pod/mypod");
        assert_eq!(desc.key().to_string(), "pod/mypod (namespace default)");

        let key = DescriptorKey {
            kind: "Namespace".into(),
            namespace: String::new(),
            name: "prod".into(),
        };
        assert_eq!(key.to_string(), "namespace/prod");
    }

    #[test]
    fn test_get_goes_through_handle() {
        let cluster = MockCluster::new();
        cluster.insert("default", "mypod", json!({"kind": "Pod"}));
        let desc = descriptor(&cluster, "Pod", "default", "mypod", "pod.json");

        assert!(desc.get().is_ok());
        cluster.remove("default", "mypod");
        assert!(desc.get().unwrap_err().is_not_found());
    }
}
