use std::io::Write;

use reqwest::StatusCode;
use serde_json::Value;

use crate::{
    client::ApiClient,
    config::VideoSearchConfig,
    error::CheckError,
    runner::{Runner, Verdict},
};

pub const TITLE: &str = "VIDEO SEARCH API TEST";

const ERROR_SNIPPET_CHARS: usize = 200;

pub fn check_name(query: &str) -> String {
    format!("Video Search ({query})")
}

/// Single query against the third-party video search API, confirming the
/// configured key is accepted and results come back in the expected shape.
pub async fn run<W: Write>(client: &ApiClient, config: &VideoSearchConfig, runner: &mut Runner<W>) {
    runner.banner(TITLE);
    let name = check_name(&config.query);
    runner.run_check(&name, search(client, config)).await;
}

async fn search(client: &ApiClient, config: &VideoSearchConfig) -> Result<Verdict, CheckError> {
    let query = [
        ("part", "snippet"),
        ("q", config.query.as_str()),
        ("type", "video"),
        ("maxResults", "1"),
        ("key", config.api_key.as_str()),
    ];
    let response = client.get_external(&config.api_url, &query).await?;

    let status = response.status();
    if status != StatusCode::OK {
        let text = response.text();
        let snippet: String = text.chars().take(ERROR_SNIPPET_CHARS).collect();
        return Ok(Verdict::new(false, format!("HTTP {status}: {snippet}")));
    }

    let body = response.json()?;
    let first = body
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first());
    let Some(item) = first else {
        return Ok(Verdict::new(false, "No items found"));
    };

    let video_id = item
        .pointer("/id/videoId")
        .and_then(Value::as_str)
        .ok_or_else(|| CheckError::unexpected("first item has no id.videoId"))?;
    Ok(Verdict::new(true, format!("Video ID: {video_id}")))
}
