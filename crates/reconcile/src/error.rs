//! Error types for replace operations.
//!
//! Errors are categorized so the orchestrator can tell a confirmed absence
//! (`NotFound`) apart from a real failure, and so callers can map failures to
//! user feedback. Per-descriptor errors carry the source label of the
//! manifest they came from.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Categories of replace errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid flag combination, detected before any remote call
    Configuration,
    /// A manifest could not be resolved into a descriptor
    Decode,
    /// The remote object does not exist
    NotFound,
    /// The remote object changed underneath us
    Conflict,
    /// Any other failed remote call
    Remote,
    /// Deletion was not confirmed in time
    Timeout,
    /// Nothing was recreated by a force replace
    NoObjects,
    /// Local filesystem error
    Io,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Invalid flags",
            Self::Decode => "Unreadable manifest",
            Self::NotFound => "Object not found",
            Self::Conflict => "Object conflict",
            Self::Remote => "Remote call failed",
            Self::Timeout => "Deletion not confirmed",
            Self::NoObjects => "Nothing replaced",
            Self::Io => "Local I/O error",
        }
    }
}

/// Errors that can occur while replacing objects.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid flag combination
    #[error("{message}")]
    Configuration {
        /// What is wrong with the flags
        message: String,
    },

    /// A manifest could not be decoded into a descriptor
    #[error("error decoding \"{origin}\": {message}")]
    Decode {
        /// Filename or "stdin"
        origin: String,
        /// Decoder message
        message: String,
    },

    /// The remote object does not exist
    #[error("{kind} \"{name}\" not found")]
    NotFound {
        /// Object kind
        kind: String,
        /// Object namespace (empty for cluster-scoped objects)
        namespace: String,
        /// Object name
        name: String,
    },

    /// The server rejected a write because the object changed or exists
    #[error("conflict: {message}")]
    Conflict {
        /// Server message
        message: String,
    },

    /// A remote call failed for a reason other than not-found or conflict
    #[error("remote call failed: {message}")]
    Remote {
        /// HTTP status, if the server answered
        status: Option<u16>,
        /// Server or transport message
        message: String,
    },

    /// An error attributed to the manifest source it came from
    #[error("error when {action} \"{origin}\": {inner}")]
    WithSource {
        /// Verb describing what was being done ("replacing", "deleting")
        action: &'static str,
        /// Filename or "stdin"
        origin: String,
        /// The underlying error
        #[source]
        inner: Box<Error>,
    },

    /// Deletion was issued but absence was not observed in time
    #[error("timed out waiting for {reference} from \"{origin}\" to be deleted after {timeout:?}")]
    DeletionTimeout {
        /// `kind/name` of the unconfirmed object
        reference: String,
        /// Filename or "stdin"
        origin: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// A force replace finished without recreating anything
    #[error("no objects passed to replace")]
    NoObjectsReplaced,

    /// Local I/O error
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl Error {
    /// Build a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Attach the manifest source and the action being performed.
    pub fn with_source(self, action: &'static str, origin: impl Into<String>) -> Self {
        Self::WithSource {
            action,
            origin: origin.into(),
            inner: Box::new(self),
        }
    }

    /// Get the error category, looking through source wrappers.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration { .. } => ErrorCategory::Configuration,
            Error::Decode { .. } => ErrorCategory::Decode,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Remote { .. } => ErrorCategory::Remote,
            Error::WithSource { inner, .. } => inner.category(),
            Error::DeletionTimeout { .. } => ErrorCategory::Timeout,
            Error::NoObjectsReplaced => ErrorCategory::NoObjects,
            Error::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Whether this error reports that the remote object is absent.
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Whether this error is a write conflict.
    pub fn is_conflict(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }
}

/// Result type for replace operations.
pub type Result<T> = std::result::Result<T, Error>;
