//! Manifest decoding and descriptor resolution.
//!
//! Reads files, directories and stdin, decodes JSON or multi-document YAML,
//! flattens `List` objects and turns each object into a descriptor with its
//! own REST handle. Decode problems are per-item errors so the remaining
//! manifests still get processed.

use crate::mapping::ResourcePath;
use crate::remote::{RestClient, RestHandle};
use reconcile::{
    DescriptorStream, Error, InputSource, Object, ResolveOptions, ResourceDescriptor, Result,
    object,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

const MANIFEST_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// DNS-1123 subdomain, the shape object names must have
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .unwrap_or_else(|_| unreachable!("name pattern is a valid regex"))
});

/// Descriptor stream over local manifest files.
///
/// Resolution never contacts the server. `ResolveOptions::require_object`
/// is enforced by the handle instead: a standard replace issues a PUT, and
/// a missing object comes back from it as `Error::NotFound`. The lenient
/// force passes need no check, since a missing object is simply created.
#[derive(Debug)]
pub struct FileDescriptorStream {
    client: RestClient,
    namespace: String,
    enforce_namespace: bool,
    recursive: bool,
    validate: bool,
}

impl FileDescriptorStream {
    /// Stream resolving into `namespace` when a manifest has none.
    ///
    /// With `enforce_namespace` (an explicit `--namespace`), a manifest
    /// naming a different namespace is an error.
    pub fn new(client: RestClient, namespace: impl Into<String>, enforce_namespace: bool) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            enforce_namespace,
            recursive: false,
            validate: true,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Expand a path into manifest files, sorted by name
    fn expand(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        if !path.is_dir() {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "the path does not exist"),
            });
        }

        let depth = if self.recursive { usize::MAX } else { 1 };
        let files = WalkDir::new(path)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext))
            })
            .collect();
        Ok(files)
    }

    fn resolve_content(
        &self,
        source: &str,
        content: &str,
        items: &mut Vec<Result<ResourceDescriptor>>,
    ) {
        match decode(content) {
            Ok(objects) => {
                for object in objects {
                    items.push(self.to_descriptor(source, object));
                }
            }
            Err(message) => items.push(Err(Error::Decode {
                origin: source.to_string(),
                message,
            })),
        }
    }

    fn to_descriptor(&self, source: &str, mut object: Object) -> Result<ResourceDescriptor> {
        let decode_err = |message: String| Error::Decode {
            origin: source.to_string(),
            message,
        };

        if self.validate {
            validate_object(&object).map_err(decode_err)?;
        }

        let kind = object::kind(&object)
            .ok_or_else(|| decode_err("Object 'Kind' is missing".into()))?
            .to_string();
        let api_version = object::api_version(&object)
            .ok_or_else(|| decode_err(format!("apiVersion not set for {kind}")))?
            .to_string();
        let name = object::name(&object)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| decode_err(format!("resource name may not be empty for {kind}")))?
            .to_string();

        let path = ResourcePath::for_kind(&api_version, &kind);
        let namespace = if path.namespaced {
            let namespace = match object::namespace(&object) {
                Some(ns) if self.enforce_namespace && ns != self.namespace => {
                    return Err(decode_err(format!(
                        "the namespace from the provided object \"{ns}\" does not match the namespace \"{}\". \
                         You must pass '--namespace={ns}' to perform this operation.",
                        self.namespace
                    )));
                }
                Some(ns) if !ns.is_empty() => ns.to_string(),
                _ => self.namespace.clone(),
            };
            object::set_namespace(&mut object, &namespace);
            namespace
        } else {
            String::new()
        };

        Ok(ResourceDescriptor {
            namespace,
            name,
            handle: Box::new(RestHandle::new(self.client.clone(), path, kind.clone())),
            kind,
            object,
            source: source.to_string(),
        })
    }
}

impl DescriptorStream for FileDescriptorStream {
    fn resolve(
        &self,
        inputs: &[InputSource],
        options: &ResolveOptions,
    ) -> Result<Vec<Result<ResourceDescriptor>>> {
        log::debug!(
            "resolving {} input(s) against {} (require existing: {})",
            inputs.len(),
            self.client.server(),
            options.require_object
        );

        let mut items = Vec::new();
        for input in inputs {
            match input {
                InputSource::Stdin => {
                    let mut content = String::new();
                    match io::stdin().read_to_string(&mut content) {
                        Ok(_) => self.resolve_content("stdin", &content, &mut items),
                        Err(e) => items.push(Err(Error::Decode {
                            origin: "stdin".into(),
                            message: e.to_string(),
                        })),
                    }
                }
                InputSource::Path(path) => {
                    for file in self.expand(path)? {
                        let source = file.display().to_string();
                        match fs::read_to_string(&file) {
                            Ok(content) => self.resolve_content(&source, &content, &mut items),
                            Err(e) => items.push(Err(Error::Decode {
                                origin: source,
                                message: e.to_string(),
                            })),
                        }
                    }
                }
            }
        }
        Ok(items)
    }
}

/// Decode JSON or multi-document YAML, flattening lists
pub fn decode(content: &str) -> std::result::Result<Vec<Object>, String> {
    let trimmed = content.trim_start();
    let documents: Vec<Value> = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        vec![serde_json::from_str(trimmed).map_err(|e| e.to_string())?]
    } else {
        serde_yaml::Deserializer::from_str(content)
            .map(Value::deserialize)
            .collect::<std::result::Result<Vec<Value>, _>>()
            .map_err(|e| e.to_string())?
    };

    let mut objects = Vec::new();
    for document in documents {
        flatten(document, &mut objects);
    }
    Ok(objects)
}

fn flatten(value: Value, out: &mut Vec<Object>) {
    match value {
        Value::Null => {}
        Value::Array(values) => values.into_iter().for_each(|v| flatten(v, out)),
        Value::Object(mut map) => {
            let is_list = map
                .get("kind")
                .and_then(Value::as_str)
                .is_some_and(|k| k.ends_with("List"));
            match map.remove("items") {
                Some(Value::Array(items)) if is_list => {
                    items.into_iter().for_each(|v| flatten(v, out));
                }
                Some(items) => {
                    map.insert("items".into(), items);
                    out.push(Value::Object(map));
                }
                None => out.push(Value::Object(map)),
            }
        }
        other => out.push(other),
    }
}

/// Structural checks applied with `--validate`
fn validate_object(object: &Object) -> std::result::Result<(), String> {
    let mut problems = Vec::new();
    if !object.is_object() {
        return Err("error validating data: object is not a mapping".into());
    }
    if object::api_version(object).is_none() {
        problems.push("apiVersion not set".to_string());
    }
    if object::kind(object).is_none() {
        problems.push("kind not set".to_string());
    }
    match object::name(object) {
        None => problems.push("metadata.name not set".to_string()),
        Some(name) if name.len() > 253 || !NAME_PATTERN.is_match(name) => {
            problems.push(format!("metadata.name \"{name}\" is not a valid name"));
        }
        Some(_) => {}
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(format!("error validating data: [{}]", problems.join(", ")))
    }
}
