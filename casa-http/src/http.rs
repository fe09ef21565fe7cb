//! Shared HTTP plumbing: client construction and error classification.

use std::time::Duration;

use casa_core::CasaError;
use reqwest::{RequestBuilder, Response, StatusCode};
use url::Url;

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the default client used by every connector in this crate.
///
/// Cookies are kept so session-based sources work; redirects are followed.
///
/// # Errors
/// Returns `Config` when the TLS backend cannot be initialized.
pub fn default_client() -> Result<reqwest::Client, CasaError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| CasaError::Config(format!("http client: {e}")))
}

/// Map a non-success status to the error taxonomy.
///
/// 404 and 410 mean the resource is gone. 408, 429 and any 5xx are worth
/// retrying. Everything else is fatal for the call.
#[must_use]
pub fn classify_status(connector: &'static str, what: &str, status: StatusCode) -> CasaError {
    match status.as_u16() {
        404 | 410 => CasaError::not_found(what.to_string()),
        408 | 429 | 500..=599 => CasaError::transient(connector, format!("{what}: HTTP {status}")),
        _ => CasaError::connector(connector, format!("{what}: HTTP {status}")),
    }
}

/// Map a transport failure to the error taxonomy.
#[must_use]
pub fn classify_transport(connector: &'static str, what: &str, e: &reqwest::Error) -> CasaError {
    if let Some(status) = e.status() {
        return classify_status(connector, what, status);
    }
    if e.is_timeout() || e.is_connect() || e.is_request() {
        CasaError::transient(connector, format!("{what}: {e}"))
    } else {
        CasaError::connector(connector, format!("{what}: {e}"))
    }
}

/// Send a request and reject non-success responses.
pub(crate) async fn send(
    connector: &'static str,
    what: &str,
    req: RequestBuilder,
) -> Result<Response, CasaError> {
    let resp = req
        .send()
        .await
        .map_err(|e| classify_transport(connector, what, &e))?;
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(classify_status(connector, what, status))
    }
}

pub(crate) async fn text(
    connector: &'static str,
    what: &str,
    resp: Response,
) -> Result<String, CasaError> {
    resp.text()
        .await
        .map_err(|e| classify_transport(connector, what, &e))
}

pub(crate) async fn json<T: serde::de::DeserializeOwned>(
    connector: &'static str,
    what: &str,
    resp: Response,
) -> Result<T, CasaError> {
    let body = text(connector, what, resp).await?;
    serde_json::from_str(&body)
        .map_err(|e| CasaError::connector(connector, format!("{what}: malformed JSON: {e}")))
}

/// Parse a base URL, making sure it ends with a slash so `join` appends.
pub(crate) fn parse_base(raw: &str) -> Result<Url, CasaError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash).map_err(|e| CasaError::InvalidArg(format!("base url {raw}: {e}")))
}

pub(crate) fn join(base: &Url, path: &str) -> Result<Url, CasaError> {
    base.join(path)
        .map_err(|e| CasaError::InvalidArg(format!("{base} + {path}: {e}")))
}
