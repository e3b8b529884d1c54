//! Metadata accessors for decoded objects
//!
//! Objects are plain JSON values; these helpers read and write the handful
//! of `metadata` fields the replace flow cares about.

use crate::types::Object;
use serde_json::{Map, Value};

/// Object kind, e.g. `Pod`
pub fn kind(object: &Object) -> Option<&str> {
    object.get("kind").and_then(Value::as_str)
}

/// `apiVersion`, e.g. `v1` or `apps/v1`
pub fn api_version(object: &Object) -> Option<&str> {
    object.get("apiVersion").and_then(Value::as_str)
}

/// `metadata.name`
pub fn name(object: &Object) -> Option<&str> {
    metadata_str(object, "name")
}

/// `metadata.namespace`
pub fn namespace(object: &Object) -> Option<&str> {
    metadata_str(object, "namespace")
}

/// `metadata.resourceVersion`
pub fn resource_version(object: &Object) -> Option<&str> {
    metadata_str(object, "resourceVersion")
}

/// Set `metadata.namespace`
pub fn set_namespace(object: &mut Object, namespace: &str) {
    if let Some(meta) = metadata_mut(object) {
        meta.insert("namespace".into(), Value::String(namespace.to_string()));
    }
}

/// Set `metadata.resourceVersion`
pub fn set_resource_version(object: &mut Object, version: &str) {
    if let Some(meta) = metadata_mut(object) {
        meta.insert("resourceVersion".into(), Value::String(version.to_string()));
    }
}

/// Remove `metadata.resourceVersion`
pub fn clear_resource_version(object: &mut Object) {
    if let Some(meta) = object.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.remove("resourceVersion");
    }
}

/// Read one annotation
pub fn annotation<'a>(object: &'a Object, key: &str) -> Option<&'a str> {
    object
        .get("metadata")?
        .get("annotations")?
        .get(key)?
        .as_str()
}

/// Write one annotation, creating `metadata.annotations` if needed
pub fn set_annotation(object: &mut Object, key: &str, value: &str) {
    let Some(meta) = metadata_mut(object) else {
        return;
    };
    let annotations = meta
        .entry("annotations")
        .or_insert_with(|| Value::Object(Map::new()));
    if !annotations.is_object() {
        *annotations = Value::Object(Map::new());
    }
    if let Some(map) = annotations.as_object_mut() {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Remove one annotation, dropping an emptied annotations map
pub fn remove_annotation(object: &mut Object, key: &str) {
    let Some(meta) = object.get_mut("metadata").and_then(Value::as_object_mut) else {
        return;
    };
    let now_empty = match meta.get_mut("annotations").and_then(Value::as_object_mut) {
        Some(map) => {
            map.remove(key);
            map.is_empty()
        }
        None => false,
    };
    if now_empty {
        meta.remove("annotations");
    }
}

fn metadata_str<'a>(object: &'a Object, field: &str) -> Option<&'a str> {
    object.get("metadata")?.get(field)?.as_str()
}

/// `metadata` as a mutable map, created if missing. `None` if the object
/// itself is not a JSON object.
fn metadata_mut(object: &mut Object) -> Option<&mut Map<String, Value>> {
    let root = object.as_object_mut()?;
    let meta = root
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if !meta.is_object() {
        *meta = Value::Object(Map::new());
    }
    meta.as_object_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let pod = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "mypod", "namespace": "default", "resourceVersion": "42"}
        });
        assert_eq!(kind(&pod), Some("Pod"));
        assert_eq!(api_version(&pod), Some("v1"));
        assert_eq!(name(&pod), Some("mypod"));
        assert_eq!(namespace(&pod), Some("default"));
        assert_eq!(resource_version(&pod), Some("42"));
    }

    #[test]
    fn test_annotations_roundtrip() {
        let mut pod = json!({"kind": "Pod", "metadata": {"name": "mypod"}});
        assert_eq!(annotation(&pod, "a"), None);

        set_annotation(&mut pod, "a", "1");
        assert_eq!(annotation(&pod, "a"), Some("1"));

        remove_annotation(&mut pod, "a");
        assert!(pod["metadata"].get("annotations").is_none());
    }

    #[test]
    fn test_resource_version_edit() {
        let mut pod = json!({"kind": "Pod"});
        set_resource_version(&mut pod, "7");
        assert_eq!(resource_version(&pod), Some("7"));
        clear_resource_version(&mut pod);
        assert_eq!(resource_version(&pod), None);
    }

    #[test]
    fn test_non_object_is_ignored() {
        let mut value = json!(["not", "an", "object"]);
        set_annotation(&mut value, "a", "1");
        set_namespace(&mut value, "default");
        assert_eq!(value, json!(["not", "an", "object"]));
    }
}
