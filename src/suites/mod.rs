use std::io::Write;

use anyhow::Result;
use tracing::info;

use crate::{
    client::ApiClient,
    config::{AppConfig, Suite},
    runner::{Runner, Summary},
};

pub mod integration;
pub mod video_search;

/// Build the client, execute the configured suite and print its summary.
///
/// Only setup failures surface as `Err`; failing checks are part of the
/// returned [`Summary`].
pub async fn run<W: Write>(config: &AppConfig, out: W) -> Result<Summary> {
    let client = ApiClient::new(&config.target)?;
    let mut runner = Runner::new(out);

    match &config.suite {
        Suite::Integration(settings) => {
            info!(base_url = %client.base_url(), "running integration suite");
            integration::run(&client, settings, &mut runner).await;
        }
        Suite::VideoSearch(settings) => {
            info!(api_url = %settings.api_url, "running video search suite");
            video_search::run(&client, settings, &mut runner).await;
        }
    }

    Ok(runner.summarize())
}
