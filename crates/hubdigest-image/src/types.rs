use crate::error::ResolveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Media type requested from the manifests endpoint
pub const MANIFEST_LIST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";

/// Prefix every registry content digest carries
pub const DIGEST_PREFIX: &str = "sha256:";

/// Docker Hub image reference in `repository:tag` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository path (e.g., "library/nginx")
    pub repository: String,
    /// Tag (e.g., "1.27")
    pub tag: String,
}

impl ImageReference {
    /// Parse an image reference string like "percona/percona-server:8.0.36"
    ///
    /// Exactly one `:` must separate a non-empty repository from a non-empty tag.
    pub fn parse(s: &str) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::MalformedReference {
            reference: s.to_string(),
        };

        let (repository, tag) = s.split_once(':').ok_or_else(malformed)?;
        if repository.is_empty() || tag.is_empty() || tag.contains(':') {
            return Err(malformed());
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }
}

impl FromStr for ImageReference {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// CPU architecture a digest is checked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Amd64,
    Arm64,
}

impl Architecture {
    /// Architecture name as it appears in a manifest list platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform information for multi-arch images
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Platform {
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub variant: Option<String>,
}

/// Manifests endpoint body. Only manifest lists carry `manifests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResponse {
    #[serde(default)]
    pub schema_version: Option<i32>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub manifests: Option<Vec<ManifestDescriptor>>,
}

/// One per-platform entry of a manifest list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDescriptor {
    #[serde(default)]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Digest of the first manifest list entry built for `architecture`.
///
/// Later entries with the same architecture are ignored.
pub fn select_platform_digest(
    manifests: &[ManifestDescriptor],
    architecture: Architecture,
) -> Option<&str> {
    manifests
        .iter()
        .find(|m| {
            m.platform
                .as_ref()
                .is_some_and(|p| p.architecture == architecture.as_str())
        })
        .map(|m| m.digest.as_str())
}
