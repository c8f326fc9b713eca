use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised while a check is executing. The runner downgrades every
/// variant into a recorded FAIL; none of them end the run.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Connect failures, timeouts, TLS and body read errors.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Body was not valid JSON.
    #[error("malformed JSON body (HTTP {status})")]
    MalformedBody {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    /// JSON was valid but not shaped the way the contract says.
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),

    /// Local I/O while staging an upload payload.
    #[error("failed to stage fixture '{name}'")]
    Fixture {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A previous login check did not yield a bearer token.
    #[error("no access token available (login check did not succeed)")]
    MissingToken,
}

impl CheckError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedPayload(message.into())
    }

    pub fn fixture(name: impl Into<String>, source: io::Error) -> Self {
        Self::Fixture {
            name: name.into(),
            source,
        }
    }

    /// Message plus every source in the chain, e.g.
    /// `request to http://.. failed: error sending request: connection refused`.
    pub fn render(self) -> String {
        format!("{:#}", anyhow::Error::new(self))
    }
}
