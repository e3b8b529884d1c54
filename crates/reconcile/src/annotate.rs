//! Provenance annotations
//!
//! The last-applied annotation stores the manifest as it was applied, minus
//! the annotation itself, so stamping the same manifest twice produces the
//! same value.

use crate::context::Annotator;
use crate::error::{Error, Result};
use crate::object;
use crate::resource::ResourceDescriptor;
use crate::types::Object;

/// Annotation holding the last applied manifest
pub const LAST_APPLIED: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// Annotation holding the command that produced the object state
pub const CHANGE_CAUSE: &str = "kubernetes.io/change-cause";

/// Default annotator.
///
/// With `create` (`--save-config`) the last-applied annotation is always
/// written; otherwise it is only refreshed on objects that already have it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastAppliedAnnotator {
    pub create: bool,
}

impl LastAppliedAnnotator {
    pub fn new(create: bool) -> Self {
        Self { create }
    }
}

/// Serialize an object for the last-applied annotation
pub fn last_applied_value(object: &Object) -> Result<String> {
    let mut original = object.clone();
    object::remove_annotation(&mut original, LAST_APPLIED);
    serde_json::to_string(&original).map_err(|e| Error::Decode {
        origin: object::name(object).unwrap_or("<unnamed>").to_string(),
        message: format!("cannot encode last-applied configuration: {e}"),
    })
}

impl Annotator for LastAppliedAnnotator {
    fn stamp(&self, descriptor: &mut ResourceDescriptor) -> Result<()> {
        let present = object::annotation(&descriptor.object, LAST_APPLIED).is_some();
        if !self.create && !present {
            return Ok(());
        }
        let value = last_applied_value(&descriptor.object)?;
        object::set_annotation(&mut descriptor.object, LAST_APPLIED, &value);
        Ok(())
    }

    fn record_change_cause(&self, object: &mut Object, cause: &str) -> Result<()> {
        object::set_annotation(object, CHANGE_CAUSE, cause);
        Ok(())
    }
}
