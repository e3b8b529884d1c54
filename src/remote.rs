//! REST handle over the cluster API.
//!
//! Each descriptor gets its own [`RestHandle`]; handles clone the client,
//! which shares the underlying connection pool.

use crate::mapping::ResourcePath;
use reconcile::{DeleteOptions, Error, Object, RemoteHandle, Result, object};
use std::fmt;

/// Connection to the API server
#[derive(Clone)]
pub struct RestClient {
    agent: ureq::Agent,
    server: String,
    token: Option<String>,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("server", &self.server)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RestClient {
    pub fn new(server: &str, token: Option<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            server: server.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }
}

/// Remote handle for one object's collection
#[derive(Debug)]
pub struct RestHandle {
    client: RestClient,
    path: ResourcePath,
    kind: String,
}

impl RestHandle {
    pub fn new(client: RestClient, path: ResourcePath, kind: impl Into<String>) -> Self {
        Self {
            client,
            path,
            kind: kind.into(),
        }
    }

    fn classify(&self, err: ureq::Error, namespace: &str, name: &str, url: &str) -> Error {
        match err {
            ureq::Error::StatusCode(404) => Error::NotFound {
                kind: self.kind.clone(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            ureq::Error::StatusCode(409) => Error::Conflict {
                message: format!("{} \"{}\" changed or already exists", self.kind, name),
            },
            ureq::Error::StatusCode(code) => Error::Remote {
                status: Some(code),
                message: format!("HTTP {code} from {url}"),
            },
            other => Error::Remote {
                status: None,
                message: other.to_string(),
            },
        }
    }

    fn post(&self, namespace: &str, name: &str, body: &Object) -> Result<Object> {
        let url = self.client.url(&self.path.collection(namespace));
        log::debug!("POST {url}");
        self.client
            .authorize(self.client.agent.post(&url))
            .header("Accept", "application/json")
            .send_json(body)
            .and_then(|mut response| response.body_mut().read_json::<Object>())
            .map_err(|e| self.classify(e, namespace, name, &url))
    }

    fn put(&self, namespace: &str, name: &str, body: &Object) -> Result<Object> {
        let url = self.client.url(&self.path.item(namespace, name));
        log::debug!("PUT {url}");
        self.client
            .authorize(self.client.agent.put(&url))
            .header("Accept", "application/json")
            .send_json(body)
            .and_then(|mut response| response.body_mut().read_json::<Object>())
            .map_err(|e| self.classify(e, namespace, name, &url))
    }
}

impl RemoteHandle for RestHandle {
    fn get(&self, namespace: &str, name: &str) -> Result<Object> {
        let url = self.client.url(&self.path.item(namespace, name));
        log::trace!("GET {url}");
        self.client
            .authorize(self.client.agent.get(&url))
            .header("Accept", "application/json")
            .call()
            .and_then(|mut response| response.body_mut().read_json::<Object>())
            .map_err(|e| self.classify(e, namespace, name, &url))
    }

    fn create(
        &self,
        namespace: &str,
        name: &str,
        overwrite: bool,
        object: &Object,
    ) -> Result<Object> {
        let mut body = object.clone();
        if overwrite {
            object::clear_resource_version(&mut body);
        }
        match self.post(namespace, name, &body) {
            Err(e) if overwrite && e.is_conflict() => {
                log::debug!("{} {name} was recreated concurrently, overwriting", self.kind);
                self.replace(namespace, name, true, &body)
            }
            other => other,
        }
    }

    fn replace(
        &self,
        namespace: &str,
        name: &str,
        overwrite: bool,
        object: &Object,
    ) -> Result<Object> {
        let mut body = object.clone();
        if overwrite && object::resource_version(&body).is_none() {
            let live = self.get(namespace, name)?;
            if let Some(version) = object::resource_version(&live) {
                object::set_resource_version(&mut body, version);
            }
        }
        self.put(namespace, name, &body)
    }

    fn delete(&self, namespace: &str, name: &str, options: &DeleteOptions) -> Result<()> {
        let url = self.client.url(&self.path.item(namespace, name));
        log::debug!("DELETE {url}");
        let mut request = self.client.authorize(self.client.agent.delete(&url));
        if let Some(grace) = options.grace_period_seconds {
            request = request.query("gracePeriodSeconds", grace.to_string());
        }
        if let Some(propagation) = options.propagation {
            request = request.query("propagationPolicy", propagation.as_str());
        }
        request
            .call()
            .map(|_| ())
            .map_err(|e| self.classify(e, namespace, name, &url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> RestHandle {
        RestHandle::new(
            RestClient::new("http://127.0.0.1:8080/", Some("secret".into())),
            ResourcePath::for_kind("v1", "Pod"),
            "Pod",
        )
    }

    #[test]
    fn test_server_trailing_slash_trimmed() {
        let client = RestClient::new("http://127.0.0.1:8080/", None);
        assert_eq!(client.server(), "http://127.0.0.1:8080");
        assert_eq!(
            client.url("/api/v1/pods"),
            "http://127.0.0.1:8080/api/v1/pods"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", handle());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_classify_status_codes() {
        let h = handle();
        let url = "http://127.0.0.1:8080/api/v1/namespaces/default/pods/mypod";

        let err = h.classify(ureq::Error::StatusCode(404), "default", "mypod", url);
        assert!(err.is_not_found());

        let err = h.classify(ureq::Error::StatusCode(409), "default", "mypod", url);
        assert!(err.is_conflict());

        match h.classify(ureq::Error::StatusCode(503), "default", "mypod", url) {
            Error::Remote { status, .. } => assert_eq!(status, Some(503)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
