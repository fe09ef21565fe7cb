use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the casa workspace.
///
/// Source adapters classify their failures into transient (retryable), fatal
/// (`Connector`) and expected absence (`NotFound`). The orchestrator adds
/// validation, persistence and retry-exhaustion outcomes on top.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CasaError {
    /// The requested capability is not implemented by the target connector.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "catalog").
        capability: String,
    },

    /// Issues with the returned or expected data (missing fields, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Invalid or incomplete process configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A source failed in a way that is expected to resolve on retry
    /// (rate limiting, server-side errors, dropped connections).
    #[error("{connector} transient failure: {msg}")]
    Transient {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// An individual connector returned a non-retryable error.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A listing, address match or page could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "listing https://...".
        what: String,
    },

    /// An individual provider call exceeded the configured timeout.
    #[error("provider timed out: {capability} via {connector}")]
    ProviderTimeout {
        /// Connector name that timed out.
        connector: String,
        /// Capability label (e.g. "detail", "estimate", "history").
        capability: String,
    },

    /// A retried call failed on every allowed attempt.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        last: Box<CasaError>,
    },

    /// An assembled record violates a domain invariant.
    #[error("invalid {field}: {value}")]
    Validation {
        /// Name of the offending field.
        field: String,
        /// Rendered offending value.
        value: String,
    },

    /// The persistence sink rejected a write.
    #[error("{sink} rejected write: {msg}")]
    Persistence {
        /// Sink name.
        sink: String,
        /// Human-readable error message.
        msg: String,
    },

    /// Unknown/opaque error (for example a panicking pipeline task).
    #[error("unknown error: {0}")]
    Other(String),
}

impl CasaError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Transient` error with the connector name and message.
    pub fn transient(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transient {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Connector` error with the connector name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(connector: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            connector: connector.into(),
            capability: capability.into(),
        }
    }

    /// Helper: build a `Validation` error naming the field and its value.
    pub fn validation(field: impl Into<String>, value: impl ToString) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Helper: build a `Persistence` error.
    pub fn persistence(sink: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Persistence {
            sink: sink.into(),
            msg: msg.into(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Per-call timeouts count as transient: the deadline is enforced locally and
    /// says nothing about the listing itself.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::ProviderTimeout { .. })
    }

    /// Returns true for expected absence (listing removed, no address match).
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
