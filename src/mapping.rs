//! Map a manifest's apiVersion and kind to its REST collection

/// Kinds that live outside any namespace
const CLUSTER_SCOPED: &[&str] = &[
    "APIService",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PriorityClass",
    "StorageClass",
    "ValidatingWebhookConfiguration",
];

/// Where objects of one kind are served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    /// `/api/v1` or `/apis/<group>/<version>`
    pub prefix: String,
    /// Lowercase plural resource name, e.g. `pods`
    pub plural: String,
    pub namespaced: bool,
}

impl ResourcePath {
    /// Path for an apiVersion/kind pair
    pub fn for_kind(api_version: &str, kind: &str) -> Self {
        let prefix = if api_version.contains('/') {
            format!("/apis/{api_version}")
        } else {
            format!("/api/{api_version}")
        };
        Self {
            prefix,
            plural: pluralize(kind),
            namespaced: !CLUSTER_SCOPED.contains(&kind),
        }
    }

    /// Collection path, e.g. `/api/v1/namespaces/default/pods`
    pub fn collection(&self, namespace: &str) -> String {
        if self.namespaced {
            format!("{}/namespaces/{}/{}", self.prefix, namespace, self.plural)
        } else {
            format!("{}/{}", self.prefix, self.plural)
        }
    }

    /// Item path, e.g. `/api/v1/namespaces/default/pods/mypod`
    pub fn item(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}", self.collection(namespace), name)
    }
}

fn pluralize(kind: &str) -> String {
    let lower = kind.to_lowercase();
    if lower == "endpoints" {
        return lower;
    }
    if lower.ends_with('s') || lower.ends_with('x') || lower.ends_with("ch") {
        return format!("{lower}es");
    }
    if let Some(stem) = lower.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    {
        return format!("{stem}ies");
    }
    format!("{lower}s")
}
