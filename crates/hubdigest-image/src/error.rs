//! Error types for hubdigest-image

use crate::types::Architecture;
use thiserror::Error;

/// Result type alias using hubdigest-image's error type
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Failures while resolving an image digest
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Reference is not `repository:tag`
    #[error("Malformed image reference '{reference}': expected <repository>:<tag>")]
    MalformedReference { reference: String },

    /// Pull token could not be obtained
    #[error("Failed to obtain pull token for {repository}: {message}")]
    Auth { repository: String, message: String },

    /// Manifests endpoint answered with a failure status
    #[error("Registry returned {status} for {url}: {body}")]
    Registry {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },

    /// Manifest list has no entry for the requested architecture
    #[error("No manifest found for architecture {architecture} in {image}")]
    ArchitectureNotFound {
        image: String,
        architecture: Architecture,
    },

    /// Single-platform manifest without a Docker-Content-Digest header
    #[error("Registry response for {image} has no Docker-Content-Digest header")]
    MissingDigest { image: String },

    /// Manifest body is not valid JSON
    #[error("Failed to parse manifest for {image}: {source}")]
    InvalidResponse {
        image: String,
        #[source]
        source: serde_json::Error,
    },

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ResolveError {
    /// Create an auth error
    pub fn auth(repository: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            repository: repository.into(),
            message: message.into(),
        }
    }

    /// Create a registry status error, substituting a marker for an empty body
    pub fn registry(status: reqwest::StatusCode, url: impl Into<String>, body: String) -> Self {
        Self::Registry {
            status,
            url: url.into(),
            body: if body.is_empty() {
                "(no response body)".to_string()
            } else {
                body
            },
        }
    }
}
