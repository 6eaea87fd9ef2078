//! Configuration for the unbroken server
//!
//! Every option can be given as a flag or through the environment, which is
//! how the service is normally configured when deployed.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use unbroken_gotest::DeriveOptions;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default upload size limit (32 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

/// Unbroken - forward Go test results and coverage to Grafana
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "unbroken")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Address to bind the HTTP server to
    ///
    /// Defaults to 0.0.0.0.
    #[arg(long, env = "UNBROKEN_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    ///
    /// Defaults to 8080.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Push derived metrics to Grafana
    ///
    /// When disabled, uploads are still parsed and validated but nothing is
    /// sent.
    #[arg(long, env = "UNBROKEN_PUSH_METRICS", value_parser = BoolishValueParser::new())]
    pub push_metrics: bool,

    /// Grafana push endpoint
    #[arg(long, env = "UNBROKEN_GRAFANA_URL")]
    pub grafana_url: Option<String>,

    /// Grafana API key, sent as a bearer token
    #[arg(long, env = "UNBROKEN_GRAFANA_KEY", hide_env_values = true)]
    pub grafana_key: Option<String>,

    /// Timeout for the push request in seconds
    ///
    /// No timeout is applied unless set.
    #[arg(long, env = "UNBROKEN_PUSH_TIMEOUT_SECS")]
    pub push_timeout_secs: Option<u64>,

    /// Drop coverage values that are not numbers
    #[arg(long, env = "UNBROKEN_VALIDATE_COVERAGE", value_parser = BoolishValueParser::new())]
    pub validate_coverage: bool,

    /// Maximum accepted request body size in bytes
    ///
    /// Defaults to 32 MiB.
    #[arg(long, env = "UNBROKEN_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Derive metrics from a `go test -json` file and print them
    ///
    /// Reads from stdin when no file is given.
    ///
    /// Example:
    ///   go test -json -cover ./... | unbroken derive
    Derive {
        /// File containing `go test -json` output
        file: Option<PathBuf>,

        /// Also push the metrics to the configured Grafana endpoint
        #[arg(long)]
        push: bool,
    },
}

/// Where and how to push metrics
#[derive(Clone, PartialEq, Eq)]
pub struct PushTarget {
    /// Push endpoint URL
    pub url: String,
    /// Bearer credential
    pub key: String,
    /// Optional request timeout
    pub timeout: Option<Duration>,
}

impl PushTarget {
    /// Create a target without a timeout
    #[must_use]
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            timeout: None,
        }
    }
}

impl fmt::Debug for PushTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushTarget")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Get the socket address to listen on
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!(
            "{}:{}",
            self.host.as_deref().unwrap_or(DEFAULT_HOST),
            self.port.unwrap_or(DEFAULT_PORT)
        )
    }

    /// Get the request body limit
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Options passed to the metric deriver
    #[must_use]
    pub fn derive_options(&self) -> DeriveOptions {
        DeriveOptions {
            validate_coverage: self.validate_coverage,
        }
    }

    /// Get the push target if pushing is enabled
    ///
    /// # Errors
    ///
    /// Returns an error if pushing is enabled but the URL or key is missing
    /// or the URL is not a valid HTTP(S) URL.
    pub fn push_target(&self) -> Result<Option<PushTarget>, ConfigError> {
        if !self.push_metrics {
            return Ok(None);
        }
        self.require_push_target().map(Some)
    }

    /// Get the push target regardless of the `push_metrics` switch
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or key is missing or the URL is invalid.
    pub fn require_push_target(&self) -> Result<PushTarget, ConfigError> {
        let url = self
            .grafana_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingGrafanaUrl)?;
        let key = self
            .grafana_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingGrafanaKey)?;

        let parsed = reqwest::Url::parse(&url).map_err(|e| ConfigError::InvalidGrafanaUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidGrafanaUrl {
                url,
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }

        Ok(PushTarget {
            url,
            key,
            timeout: self.push_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Pushing is enabled without a usable URL and key
    /// - The upload limit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.push_target()?;

        if self.max_upload_bytes == Some(0) {
            return Err(ConfigError::InvalidUploadLimit);
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Push enabled without an endpoint
    #[error("UNBROKEN_GRAFANA_URL must be set when pushing metrics")]
    MissingGrafanaUrl,

    /// Push enabled without a credential
    #[error("UNBROKEN_GRAFANA_KEY must be set when pushing metrics")]
    MissingGrafanaKey,

    /// Endpoint is not a usable URL
    #[error("Invalid Grafana URL {url}: {reason}")]
    InvalidGrafanaUrl {
        /// The configured URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Upload limit of zero bytes
    #[error("max upload size must be greater than zero")]
    InvalidUploadLimit,
}
