use std::{
    env, fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use reqwest::Url;

/// CLI / env configuration parsed at process startup.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "api-smoke",
    about = "Smoke checks for the backend HTTP API",
    version,
    disable_help_subcommand = true
)]
struct CliConfig {
    /// Suite to run; defaults to the backend integration checks
    #[command(subcommand)]
    suite: Option<SuiteCommand>,

    /// Base URL of the backend API (e.g., http://127.0.0.1:8001/api)
    #[arg(long, env = "SMOKE_BASE_URL", default_value = "http://127.0.0.1:8001/api")]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "SMOKE_TIMEOUT_SECS", default_value_t = 5)]
    timeout_secs: u64,

    /// Timeout in seconds for multipart upload requests
    #[arg(long, env = "SMOKE_UPLOAD_TIMEOUT_SECS", default_value_t = 10)]
    upload_timeout_secs: u64,

    /// Username of the pre-seeded test account
    #[arg(long, env = "SMOKE_USERNAME", default_value = "testuser")]
    username: String,

    /// Password of the pre-seeded test account
    #[arg(long, env = "SMOKE_PASSWORD", default_value = "password123", hide_env_values = true)]
    password: String,

    /// Directory where temporary upload payloads are staged
    #[arg(long, env = "SMOKE_FIXTURE_DIR")]
    fixture_dir: Option<PathBuf>,

    /// Endpoint of the third-party video search API
    #[arg(
        long,
        env = "YOUTUBE_API_URL",
        default_value = "https://www.googleapis.com/youtube/v3/search"
    )]
    video_api_url: String,

    /// API key for the third-party video search API
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Optional OTLP endpoint (grpc) for OpenTelemetry export
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,

    /// Logical service name for telemetry (resource attribute)
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "api-smoke")]
    otel_service_name: String,

    /// Disable OTLP trace export even if an endpoint is set
    #[arg(long, env = "SMOKE_OTEL_DISABLE_TRACES", default_value_t = false)]
    otel_disable_traces: bool,

    /// Disable OTLP log export even if an endpoint is set
    #[arg(long, env = "SMOKE_OTEL_DISABLE_LOGS", default_value_t = false)]
    otel_disable_logs: bool,

    /// Deployment environment tag for telemetry (e.g., development, staging)
    #[arg(long, env = "SMOKE_ENV", default_value = "development")]
    environment: String,

    /// Default log filter when RUST_LOG is not provided
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Subcommand)]
enum SuiteCommand {
    /// Health, login, upload, profile, listing and upload-security checks
    Integration,
    /// Single search request against the third-party video API
    VideoSearch {
        /// Search phrase sent to the video API
        #[arg(long, env = "SMOKE_VIDEO_QUERY", default_value = "React Tutorial")]
        query: String,
    },
}

/// Fully validated configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub suite: Suite,
    pub otel: OtelConfig,
    pub log: LogConfig,
    pub environment: String,
}

/// Where requests go and how long each may take.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub upload_timeout: Duration,
}

/// Suite selected on the command line, with the settings only it needs.
#[derive(Debug, Clone)]
pub enum Suite {
    Integration(IntegrationConfig),
    VideoSearch(VideoSearchConfig),
}

#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub credentials: Credentials,
    pub fixture_dir: PathBuf,
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct VideoSearchConfig {
    pub api_url: Url,
    pub api_key: String,
    pub query: String,
}

impl fmt::Debug for VideoSearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSearchConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &"<redacted>")
            .field("query", &self.query)
            .finish()
    }
}

/// OpenTelemetry exporter configuration.
#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub endpoint: Option<String>,
    pub service_name: String,
    pub disable_traces: bool,
    pub disable_logs: bool,
}

/// Structured logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

impl AppConfig {
    /// Load `.env`, parse CLI/env arguments and return a validated configuration.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let cli = CliConfig::parse();
        Self::try_from(cli)
    }
}

impl TryFrom<CliConfig> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(value: CliConfig) -> Result<Self> {
        let base_url = parse_base_url(&value.base_url)
            .with_context(|| format!("invalid base url '{}'", value.base_url))?;
        let timeout = positive_secs(value.timeout_secs).context("invalid --timeout-secs")?;
        let upload_timeout =
            positive_secs(value.upload_timeout_secs).context("invalid --upload-timeout-secs")?;

        let suite = match value.suite.unwrap_or(SuiteCommand::Integration) {
            SuiteCommand::Integration => {
                let fixture_dir = value.fixture_dir.unwrap_or_else(env::temp_dir);
                ensure_directory_exists(&fixture_dir).with_context(|| {
                    format!("fixture dir '{}' missing", fixture_dir.display())
                })?;
                Suite::Integration(IntegrationConfig {
                    credentials: Credentials {
                        username: value.username,
                        password: value.password,
                    },
                    fixture_dir,
                })
            }
            SuiteCommand::VideoSearch { query } => {
                let api_key = value
                    .api_key
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| {
                        anyhow!("YOUTUBE_API_KEY is required for the video-search suite")
                    })?;
                let api_url = Url::parse(&value.video_api_url).with_context(|| {
                    format!("invalid video api url '{}'", value.video_api_url)
                })?;
                Suite::VideoSearch(VideoSearchConfig {
                    api_url,
                    api_key,
                    query,
                })
            }
        };

        Ok(Self {
            target: TargetConfig {
                base_url,
                timeout,
                upload_timeout,
            },
            suite,
            environment: value.environment,
            otel: OtelConfig {
                endpoint: value.otel_endpoint,
                service_name: value.otel_service_name,
                disable_traces: value.otel_disable_traces,
                disable_logs: value.otel_disable_logs,
            },
            log: LogConfig {
                level: value.log_level,
            },
        })
    }
}

/// Parse the API root, forcing a trailing slash so relative endpoint paths
/// join underneath it instead of replacing the last segment.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported scheme '{}'", url.scheme());
    }
    if url.query().is_some() || url.fragment().is_some() {
        bail!("base url must not carry a query string or fragment");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn positive_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        bail!("timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}

fn ensure_directory_exists(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    Err(anyhow!(
        "path '{}' does not exist or is not a directory",
        path.display()
    ))
}
