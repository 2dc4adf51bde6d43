//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser};
use hubdigest_image::registry::{DOCKER_HUB_AUTH_URL, DOCKER_HUB_REGISTRY_URL, DOCKER_HUB_SERVICE};
use hubdigest_image::RegistryConfig;
use std::time::Duration;
use url::Url;

/// hubdigest - Validate image hashes against Docker Hub manifest digests
#[derive(Parser, Debug)]
#[command(name = "hubdigest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to the JSON file
    #[arg(short, long)]
    pub file: Utf8PathBuf,

    /// Print the summary as JSON (status lines go to the log)
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

#[derive(Args, Debug)]
pub struct RegistryArgs {
    /// Registry serving the manifests API
    #[arg(long, env = "HUBDIGEST_REGISTRY_URL", default_value = DOCKER_HUB_REGISTRY_URL)]
    pub registry_url: Url,

    /// Token service issuing anonymous pull tokens
    #[arg(long, env = "HUBDIGEST_AUTH_URL", default_value = DOCKER_HUB_AUTH_URL)]
    pub auth_url: Url,

    /// Service name sent to the token service
    #[arg(long, default_value = DOCKER_HUB_SERVICE)]
    pub auth_service: String,

    /// Timeout for each registry request
    #[arg(
        long,
        env = "HUBDIGEST_TIMEOUT",
        value_name = "SECONDS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,
}

impl RegistryArgs {
    pub fn to_config(&self) -> RegistryConfig {
        RegistryConfig {
            registry_url: self.registry_url.as_str().to_string(),
            auth_url: self.auth_url.as_str().to_string(),
            service: self.auth_service.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}
