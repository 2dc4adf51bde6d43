//! Digest check command

use crate::cli::Cli;
use crate::document::ManifestDocument;
use crate::observer::{CheckObserver, TracingObserver};
use crate::output::{self, ConsoleObserver};
use crate::verify::verify;
use anyhow::{Context, Result};
use hubdigest_image::RegistryClient;
use std::process::ExitCode;
use tracing::{debug, info};

/// Check every declared digest and report the result
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    let document = ManifestDocument::load(&cli.file).context("Failed to load image document")?;

    let config = cli.registry.to_config();
    debug!(
        "Using registry {} and token service {}",
        config.registry_url, config.auth_url
    );
    let client = RegistryClient::new(config).context("Failed to build HTTP client")?;

    let mut console = ConsoleObserver;
    let mut tracing_observer = TracingObserver;
    let observer: &mut dyn CheckObserver = if cli.json {
        &mut tracing_observer
    } else {
        &mut console
    };

    let report = verify(&document, &client, observer).await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        output::summary(&report);
    }

    info!("{} of {} checks passed", report.passed, report.checked);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
