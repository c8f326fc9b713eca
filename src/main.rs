use std::{io, process::ExitCode};

use anyhow::Result;
use api_smoke::{config::AppConfig, o11y, suites};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let config = AppConfig::load()?;

    let _telemetry = o11y::TelemetryGuard::init(&config)?;
    tracing::debug!(?config, "configuration loaded");

    let summary = suites::run(&config, io::stdout()).await?;
    Ok(ExitCode::from(summary.exit_code()))
}
