//! In-memory collaborators shared by the unit tests.

use crate::context::Printer;
use crate::error::{Error, Result};
use crate::resource::{DescriptorStream, RemoteHandle, ResolveOptions, ResourceDescriptor};
use crate::types::{DeleteOptions, InputSource, Object};
use serde_json::json;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::rc::Rc;

/// A remote call observed by the mock cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Create(String),
    Replace(String),
    Delete(String, DeleteOptions),
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<(String, String), Object>,
    /// Gets that still see an object after its delete was issued
    lingering: HashMap<(String, String), u32>,
    linger_after_delete: HashMap<String, u32>,
    failing_gets: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_replaces: HashSet<String>,
    failing_deletes: HashSet<String>,
    calls: Vec<Call>,
    version: u64,
}

/// Shared in-memory "cluster" with a call log
#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    state: Rc<RefCell<State>>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, namespace: &str, name: &str, object: Object) {
        self.state
            .borrow_mut()
            .objects
            .insert(key(namespace, name), object);
    }

    pub fn remove(&self, namespace: &str, name: &str) {
        self.state.borrow_mut().objects.remove(&key(namespace, name));
    }

    pub fn object(&self, namespace: &str, name: &str) -> Option<Object> {
        self.state
            .borrow()
            .objects
            .get(&key(namespace, name))
            .cloned()
    }

    /// After a delete, `gets` more gets still return the object
    pub fn linger(&self, name: &str, gets: u32) {
        self.state
            .borrow_mut()
            .linger_after_delete
            .insert(name.to_string(), gets);
    }

    pub fn fail_get(&self, name: &str) {
        self.state.borrow_mut().failing_gets.insert(name.to_string());
    }

    pub fn fail_create(&self, name: &str) {
        self.state
            .borrow_mut()
            .failing_creates
            .insert(name.to_string());
    }

    pub fn fail_replace(&self, name: &str) {
        self.state
            .borrow_mut()
            .failing_replaces
            .insert(name.to_string());
    }

    pub fn fail_delete(&self, name: &str) {
        self.state
            .borrow_mut()
            .failing_deletes
            .insert(name.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn handle(&self, kind: &str) -> MockHandle {
        MockHandle {
            kind: kind.to_string(),
            cluster: self.clone(),
        }
    }
}

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

fn remote_failure(name: &str) -> Error {
    Error::Remote {
        status: Some(500),
        message: format!("injected failure for {name}"),
    }
}

#[derive(Debug)]
pub struct MockHandle {
    kind: String,
    cluster: MockCluster,
}

impl MockHandle {
    fn not_found(&self, namespace: &str, name: &str) -> Error {
        Error::NotFound {
            kind: self.kind.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    fn store(&self, namespace: &str, name: &str, object: &Object) -> Object {
        let mut state = self.cluster.state.borrow_mut();
        state.version += 1;
        let mut stored = object.clone();
        crate::object::set_resource_version(&mut stored, &state.version.to_string());
        state.objects.insert(key(namespace, name), stored.clone());
        stored
    }
}

impl RemoteHandle for MockHandle {
    fn get(&self, namespace: &str, name: &str) -> Result<Object> {
        let mut state = self.cluster.state.borrow_mut();
        state.calls.push(Call::Get(name.to_string()));
        if state.failing_gets.contains(name) {
            return Err(remote_failure(name));
        }
        let k = key(namespace, name);
        if let Some(remaining) = state.lingering.get_mut(&k) {
            if *remaining == 0 {
                state.lingering.remove(&k);
                state.objects.remove(&k);
            } else {
                *remaining -= 1;
            }
        }
        state
            .objects
            .get(&k)
            .cloned()
            .ok_or_else(|| self.not_found(namespace, name))
    }

    fn create(
        &self,
        namespace: &str,
        name: &str,
        overwrite: bool,
        object: &Object,
    ) -> Result<Object> {
        {
            let mut state = self.cluster.state.borrow_mut();
            state.calls.push(Call::Create(name.to_string()));
            if state.failing_creates.contains(name) {
                return Err(remote_failure(name));
            }
            if !overwrite && state.objects.contains_key(&key(namespace, name)) {
                return Err(Error::Conflict {
                    message: format!("{name} already exists"),
                });
            }
        }
        Ok(self.store(namespace, name, object))
    }

    fn replace(
        &self,
        namespace: &str,
        name: &str,
        _overwrite: bool,
        object: &Object,
    ) -> Result<Object> {
        {
            let mut state = self.cluster.state.borrow_mut();
            state.calls.push(Call::Replace(name.to_string()));
            if state.failing_replaces.contains(name) {
                return Err(remote_failure(name));
            }
            if !state.objects.contains_key(&key(namespace, name)) {
                return Err(self.not_found(namespace, name));
            }
        }
        Ok(self.store(namespace, name, object))
    }

    fn delete(&self, namespace: &str, name: &str, options: &DeleteOptions) -> Result<()> {
        let mut state = self.cluster.state.borrow_mut();
        state
            .calls
            .push(Call::Delete(name.to_string(), options.clone()));
        if state.failing_deletes.contains(name) {
            return Err(remote_failure(name));
        }
        let k = key(namespace, name);
        if !state.objects.contains_key(&k) {
            return Err(self.not_found(namespace, name));
        }
        match state.linger_after_delete.get(name).copied() {
            Some(gets) => {
                state.lingering.insert(k, gets);
            }
            None => {
                state.objects.remove(&k);
            }
        }
        Ok(())
    }
}

pub fn manifest(kind: &str, namespace: &str, name: &str) -> Object {
    json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": {"name": name, "namespace": namespace},
    })
}

pub fn descriptor(
    cluster: &MockCluster,
    kind: &str,
    namespace: &str,
    name: &str,
    source: &str,
) -> ResourceDescriptor {
    ResourceDescriptor {
        namespace: namespace.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        object: manifest(kind, namespace, name),
        handle: Box::new(cluster.handle(kind)),
        source: source.to_string(),
    }
}

/// Stream reading `Kind namespace name [image]` lines from files.
///
/// Lines starting with `!` decode as errors. Stdin is refused: it must be
/// spooled to a file before it reaches a stream that reads it twice.
#[derive(Debug)]
pub struct LineStream {
    cluster: MockCluster,
    passes: RefCell<Vec<(Vec<InputSource>, ResolveOptions)>>,
}

impl LineStream {
    pub fn new(cluster: &MockCluster) -> Self {
        Self {
            cluster: cluster.clone(),
            passes: RefCell::new(Vec::new()),
        }
    }

    pub fn passes(&self) -> Vec<(Vec<InputSource>, ResolveOptions)> {
        self.passes.borrow().clone()
    }
}

impl DescriptorStream for LineStream {
    fn resolve(
        &self,
        inputs: &[InputSource],
        options: &ResolveOptions,
    ) -> Result<Vec<Result<ResourceDescriptor>>> {
        self.passes.borrow_mut().push((inputs.to_vec(), *options));

        let mut items = Vec::new();
        for input in inputs {
            let path = match input {
                InputSource::Path(path) => path,
                InputSource::Stdin => {
                    items.push(Err(Error::Decode {
                        origin: "stdin".into(),
                        message: "stdin was not spooled".into(),
                    }));
                    continue;
                }
            };
            let source = path.display().to_string();
            let content = fs::read_to_string(path).map_err(|e| Error::Io {
                path: path.clone(),
                source: e,
            })?;
            for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if let Some(message) = line.strip_prefix('!') {
                    items.push(Err(Error::Decode {
                        origin: source.clone(),
                        message: message.trim().to_string(),
                    }));
                    continue;
                }
                let fields: Vec<&str> = line.split_whitespace().collect();
                let [kind, namespace, name, rest @ ..] = fields.as_slice() else {
                    items.push(Err(Error::Decode {
                        origin: source.clone(),
                        message: format!("bad line: {line}"),
                    }));
                    continue;
                };
                let mut desc = descriptor(&self.cluster, kind, namespace, name, &source);
                if let Some(image) = rest.first() {
                    desc.object["spec"] = json!({"containers": [{"name": name, "image": image}]});
                }
                items.push(Ok(desc));
            }
        }
        Ok(items)
    }
}

/// Printer collecting printed lines
#[derive(Debug, Default)]
pub struct RecordingPrinter {
    pub lines: Vec<String>,
}

impl Printer for RecordingPrinter {
    fn print_replaced(&mut self, descriptor: &ResourceDescriptor) -> Result<()> {
        self.lines.push(format!("{} replaced", descriptor.reference()));
        Ok(())
    }

    fn print_deleted(&mut self, descriptor: &ResourceDescriptor) -> Result<()> {
        self.lines.push(format!("{} deleted", descriptor.reference()));
        Ok(())
    }
}
