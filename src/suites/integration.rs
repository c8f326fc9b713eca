use std::{io::Write, path::Path};

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    client::{ApiClient, ApiResponse, str_field},
    config::{Credentials, IntegrationConfig},
    error::CheckError,
    fixture::StagedFile,
    runner::{Runner, Verdict},
};

pub const TITLE: &str = "COMPREHENSIVE INTEGRATION TEST";

pub const LIVENESS: &str = "Backend Server Running";
pub const LOGIN: &str = "Authentication System";
pub const AUTHENTICATED_UPLOAD: &str = "Resume Upload (Authenticated)";
pub const PROFILE: &str = "User Profile Access";
pub const LISTING: &str = "Mentor List Endpoint";
pub const UNAUTHENTICATED_UPLOAD: &str = "Upload Security (Blocks Unauthenticated)";

const HEALTH_PATH: &str = "hello/";
const LOGIN_PATH: &str = "auth/login/";
const UPLOAD_PATH: &str = "upload-resume/";
const PROFILE_PATH: &str = "auth/user/";
const LISTING_PATH: &str = "mentors/";
const UPLOAD_FIELD: &str = "resume";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Run liveness, login, authenticated upload and profile, public listing,
/// and anonymous-upload rejection in order. The token captured by the login check is
/// the only state carried between them.
pub async fn run<W: Write>(client: &ApiClient, config: &IntegrationConfig, runner: &mut Runner<W>) {
    runner.banner(TITLE);

    runner.run_check(LIVENESS, liveness(client)).await;

    let mut token = None;
    runner
        .run_check(LOGIN, login(client, &config.credentials, &mut token))
        .await;

    runner
        .run_check(
            AUTHENTICATED_UPLOAD,
            authenticated_upload(client, &config.fixture_dir, token.as_deref()),
        )
        .await;
    runner
        .run_check(PROFILE, profile(client, token.as_deref()))
        .await;

    runner.run_check(LISTING, listing(client)).await;
    runner
        .run_check(
            UNAUTHENTICATED_UPLOAD,
            unauthenticated_upload(client, &config.fixture_dir),
        )
        .await;
}

async fn liveness(client: &ApiClient) -> Result<Verdict, CheckError> {
    let response = client.get(HEALTH_PATH, None).await?;
    let body = response.json()?;
    Ok(Verdict::new(
        response.status() == StatusCode::OK,
        str_field(&body, "message").unwrap_or_default(),
    ))
}

async fn login(
    client: &ApiClient,
    credentials: &Credentials,
    token: &mut Option<String>,
) -> Result<Verdict, CheckError> {
    let request = LoginRequest {
        username: &credentials.username,
        password: &credentials.password,
    };
    let response = client.post_json(LOGIN_PATH, &request).await?;
    let body = response.json()?;

    let access = str_field(&body, "access");
    let has_token = access.is_some();
    let passed = response.status() == StatusCode::OK && has_token;
    if passed {
        *token = access.map(str::to_owned);
    } else {
        debug!(status = %response.status(), body = %response.text(), "login rejected");
    }

    Ok(Verdict::new(passed, format!("Token received: {has_token}")))
}

async fn authenticated_upload(
    client: &ApiClient,
    fixture_dir: &Path,
    token: Option<&str>,
) -> Result<Verdict, CheckError> {
    let token = token.ok_or(CheckError::MissingToken)?;
    let resume = StagedFile::pdf(fixture_dir, "test_resume", "test content")?;

    let response = client
        .upload(UPLOAD_PATH, UPLOAD_FIELD, &resume, Some(token))
        .await?;
    let body = response.json()?;
    Ok(Verdict::new(
        response.status() == StatusCode::CREATED,
        describe(&response, &body),
    ))
}

async fn profile(client: &ApiClient, token: Option<&str>) -> Result<Verdict, CheckError> {
    let token = token.ok_or(CheckError::MissingToken)?;
    let response = client.get(PROFILE_PATH, Some(token)).await?;
    let body = response.json()?;
    let username = str_field(&body, "username").unwrap_or("N/A");
    Ok(Verdict::new(
        response.status() == StatusCode::OK,
        format!("User: {username}"),
    ))
}

async fn listing(client: &ApiClient) -> Result<Verdict, CheckError> {
    let response = client.get(LISTING_PATH, None).await?;
    if response.status() != StatusCode::OK {
        return Ok(Verdict::new(false, "Count: 0"));
    }

    let body = response.json()?;
    let items = body.as_array().ok_or_else(|| {
        CheckError::unexpected(format!("expected a JSON array, got {}", json_kind(&body)))
    })?;
    Ok(Verdict::new(true, format!("Count: {}", items.len())))
}

async fn unauthenticated_upload(
    client: &ApiClient,
    fixture_dir: &Path,
) -> Result<Verdict, CheckError> {
    let payload = StagedFile::pdf(fixture_dir, "unauth_test", "unauth")?;
    let response = client
        .upload(UPLOAD_PATH, UPLOAD_FIELD, &payload, None)
        .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        Ok(Verdict::new(true, "Correctly rejected unauthorized request"))
    } else {
        Ok(Verdict::new(
            false,
            format!("expected HTTP 401 for anonymous upload, got {status}"),
        ))
    }
}

/// `message`, else `detail`, else the bare status line.
fn describe(response: &ApiResponse, body: &Value) -> String {
    str_field(body, "message")
        .or_else(|| str_field(body, "detail"))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("HTTP {}", response.status()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
