use crate::error::{ResolveError, Result};
use crate::types::{
    select_platform_digest, Architecture, ImageReference, ManifestResponse,
    MANIFEST_LIST_MEDIA_TYPE,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

/// Docker Hub manifests endpoint
pub const DOCKER_HUB_REGISTRY_URL: &str = "https://registry-1.docker.io";

/// Docker Hub token service
pub const DOCKER_HUB_AUTH_URL: &str = "https://auth.docker.io";

/// `service` parameter expected by the Docker Hub token service
pub const DOCKER_HUB_SERVICE: &str = "registry.docker.io";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DOCKER_CONTENT_DIGEST: &str = "docker-content-digest";

/// Endpoints and limits used by [`RegistryClient`]
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base URL of the manifests API, without trailing slash
    pub registry_url: String,
    /// Base URL of the token service, without trailing slash
    pub auth_url: String,
    /// `service` parameter sent to the token service
    pub service: String,
    /// Timeout applied to every request
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_url: DOCKER_HUB_REGISTRY_URL.to_string(),
            auth_url: DOCKER_HUB_AUTH_URL.to_string(),
            service: DOCKER_HUB_SERVICE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for resolving image digests on Docker Hub with anonymous pull tokens.
///
/// Every lookup requests a fresh token; nothing is cached between calls.
pub struct RegistryClient {
    client: reqwest::Client,
    registry_url: String,
    auth_url: String,
    service: String,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hubdigest/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            service: config.service,
        })
    }

    /// Create a client for the public Docker Hub endpoints
    pub fn docker_hub() -> Result<Self> {
        Self::new(RegistryConfig::default())
    }

    /// Request an anonymous pull token scoped to `repository`
    pub async fn get_pull_token(&self, repository: &str) -> Result<String> {
        let token_url = format!(
            "{}/token?service={}&scope=repository:{}:pull",
            self.auth_url, self.service, repository
        );

        debug!("Requesting pull token from: {}", token_url);

        let response = self.client.get(&token_url).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ResolveError::auth(
                repository,
                format!("token service returned {}: {}", status, body),
            ));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ResolveError::auth(repository, format!("invalid token response: {}", e))
        })?;

        token_response
            .token
            .ok_or_else(|| ResolveError::auth(repository, "token response has no token field"))
    }

    /// Resolve the content digest of `image` for `architecture`.
    ///
    /// Manifest lists are searched for the first entry whose platform matches;
    /// single-platform manifests report the `Docker-Content-Digest` header.
    pub async fn get_digest(
        &self,
        image: &ImageReference,
        architecture: Architecture,
    ) -> Result<String> {
        let token = self.get_pull_token(&image.repository).await?;

        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, image.repository, image.tag
        );

        debug!("Fetching manifest from: {}", url);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MANIFEST_LIST_MEDIA_TYPE));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ResolveError::auth(&image.repository, "token is not a valid header value")
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let response = self.client.get(&url).headers(headers).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::registry(status, url, body));
        }

        let header_digest = response
            .headers()
            .get(DOCKER_CONTENT_DIGEST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let body = response.text().await?;
        trace!("Manifest body for {}: {}", image, body);

        let manifest: ManifestResponse =
            serde_json::from_str(&body).map_err(|source| ResolveError::InvalidResponse {
                image: image.to_string(),
                source,
            })?;

        match manifest.manifests {
            Some(manifests) => {
                debug!(
                    "Manifest list for {} has {} entries",
                    image,
                    manifests.len()
                );
                select_platform_digest(&manifests, architecture)
                    .map(str::to_string)
                    .ok_or_else(|| ResolveError::ArchitectureNotFound {
                        image: image.to_string(),
                        architecture,
                    })
            }
            None => header_digest.ok_or_else(|| ResolveError::MissingDigest {
                image: image.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}
