//! The `DigestResolver` seam between digest verification and the registry.

use crate::error::Result;
use crate::registry::RegistryClient;
use crate::types::{Architecture, ImageReference};
use std::future::Future;
use std::pin::Pin;

/// Resolves the content digest of an image for one architecture.
///
/// Implemented by [`RegistryClient`] for live Docker Hub lookups; tests can
/// substitute canned answers.
pub trait DigestResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        image: &'a ImageReference,
        architecture: Architecture,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

impl DigestResolver for RegistryClient {
    fn resolve<'a>(
        &'a self,
        image: &'a ImageReference,
        architecture: Architecture,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move { self.get_digest(image, architecture).await })
    }
}
