//! Configuration types shared across the orchestrator and connectors.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CasaError;

/// Bounded retry policy for the catalog detail fetch.
///
/// Only transient failures are retried. Between attempts the pipeline waits a
/// random duration drawn uniformly from `[min_delay, max_delay]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one (>= 1).
    pub max_attempts: u32,
    /// Lower bound of the jittered wait.
    pub min_delay: Duration,
    /// Upper bound of the jittered wait.
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Build a policy, clamping `max_attempts` to at least 1 and ordering the delay bounds.
    #[must_use]
    pub fn new(max_attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };
        Self {
            max_attempts: max_attempts.max(1),
            min_delay,
            max_delay,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
        }
    }
}

/// Global configuration for the `Casa` orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasaConfig {
    /// Retry policy for the catalog detail fetch.
    pub retry: RetryConfig,
    /// Optional deadline applied to every individual adapter and sink call.
    /// `None` leaves timeouts to the adapters themselves.
    pub provider_timeout: Option<Duration>,
    /// Optional cap on concurrently running pipelines. `None` means one task per
    /// listing with no cap.
    pub max_concurrency: Option<usize>,
}

/// TLS negotiation mode for PostgreSQL connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    /// Require TLS without certificate verification.
    #[default]
    Require,
    /// Require TLS and verify the CA.
    VerifyCa,
    /// Require TLS and verify CA and host name.
    VerifyFull,
    /// Prefer TLS.
    Prefer,
    /// Allow TLS.
    Allow,
    /// Never use TLS.
    Disable,
}

impl SslMode {
    /// libpq spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
            Self::Prefer => "prefer",
            Self::Allow => "allow",
            Self::Disable => "disable",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = CasaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            "prefer" => Ok(Self::Prefer),
            "allow" => Ok(Self::Allow),
            "disable" => Ok(Self::Disable),
            other => Err(CasaError::Config(format!("unknown sslmode: {other}"))),
        }
    }
}

/// Connection settings for the PostgreSQL sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Role name.
    pub user: String,
    /// Role password.
    pub password: String,
    /// Host name.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// TLS mode.
    pub sslmode: SslMode,
    /// Schema holding the listing tables.
    pub schema: String,
}

impl PostgresConfig {
    /// Render a `postgresql://` connection string.
    #[must_use]
    pub fn dsn(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.database, self.sslmode
        )
    }
}
