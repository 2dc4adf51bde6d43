//! Docker Hub digest resolution for hubdigest
//!
//! This crate provides functionality for:
//! - Parsing `repository:tag` image references
//! - Obtaining anonymous pull tokens from the Docker Hub token service
//! - Fetching manifests and manifest lists, and picking the digest for one architecture
//!
//! # Example
//!
//! ```no_run
//! use hubdigest_image::{Architecture, ImageReference, RegistryClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hubdigest_image::ResolveError> {
//!     let client = RegistryClient::docker_hub()?;
//!     let image = ImageReference::parse("library/nginx:1.27")?;
//!
//!     let digest = client.get_digest(&image, Architecture::Arm64).await?;
//!     println!("{} (arm64): {}", image, digest);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod registry;
pub mod resolver;
pub mod types;

// Re-export main types for convenience
pub use error::ResolveError;
pub use registry::{RegistryClient, RegistryConfig};
pub use resolver::DigestResolver;
pub use types::{
    Architecture, ImageReference, ManifestDescriptor, ManifestResponse, Platform, DIGEST_PREFIX,
};
