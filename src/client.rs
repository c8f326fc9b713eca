use std::{borrow::Cow, time::Duration};

use anyhow::{Context, Result};
use reqwest::{
    RequestBuilder, StatusCode, Url,
    header::AUTHORIZATION,
    multipart::{Form, Part},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{config::TargetConfig, error::CheckError, fixture::StagedFile};

/// Thin wrapper around `reqwest` that turns every outcome into a value:
/// a received response of any status is `Ok`, anything else is a
/// [`CheckError`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    upload_timeout: Duration,
}

/// Status and raw body of a completed request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiClient {
    pub fn new(target: &TargetConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("api-smoke/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(target.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: target.base_url.clone(),
            timeout: target.timeout,
            upload_timeout: target.upload_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an API path relative to the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    #[instrument(skip(self, token), fields(authorized = token.is_some()))]
    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<ApiResponse, CheckError> {
        let url = self.endpoint(path);
        let request = with_bearer(self.http.get(&url), token).timeout(self.timeout);
        self.execute(url, request).await
    }

    /// GET against a URL outside the backend, e.g. a third-party API.
    #[instrument(skip(self, url, query), fields(url = %url))]
    pub async fn get_external(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse, CheckError> {
        let request = self.http.get(url.clone()).query(query).timeout(self.timeout);
        self.execute(url.to_string(), request).await
    }

    #[instrument(skip(self, body))]
    pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<ApiResponse, CheckError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        let request = self.http.post(&url).json(body).timeout(self.timeout);
        self.execute(url, request).await
    }

    /// Multipart POST carrying `file` under `field`.
    #[instrument(
        skip(self, file, token),
        fields(file = %file.file_name(), authorized = token.is_some())
    )]
    pub async fn upload(
        &self,
        path: &str,
        field: &str,
        file: &StagedFile,
        token: Option<&str>,
    ) -> Result<ApiResponse, CheckError> {
        let url = self.endpoint(path);
        let contents = file.read()?;
        let part = Part::bytes(contents)
            .file_name(file.file_name().to_string())
            .mime_str(file.mime_type())
            .map_err(|err| CheckError::transport(&url, err))?;
        let form = Form::new().part(field.to_string(), part);

        let request = with_bearer(self.http.post(&url), token)
            .multipart(form)
            .timeout(self.upload_timeout);
        self.execute(url, request).await
    }

    async fn execute(
        &self,
        url: String,
        request: RequestBuilder,
    ) -> Result<ApiResponse, CheckError> {
        let response = request
            .send()
            .await
            .map_err(|err| CheckError::transport(&url, err.without_url()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| CheckError::transport(&url, err.without_url()))?;

        debug!(%url, %status, bytes = body.len(), "response received");
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
        None => request,
    }
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, CheckError> {
        serde_json::from_slice(&self.body).map_err(|source| CheckError::MalformedBody {
            status: self.status,
            source,
        })
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// String value of a top-level JSON field, if present.
pub fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
