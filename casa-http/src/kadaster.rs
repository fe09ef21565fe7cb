use std::sync::LazyLock;

use async_trait::async_trait;
use casa_core::connector::{CasaConnector, ConnectorKey, EstimateProvider};
use casa_core::{Address, CasaError, Decimal, NaiveDate, ValuationEstimate};
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::http;

const NAME: &str = "casa-kadaster";
const DEFAULT_BASE: &str = "https://www.kadasterdata.nl/";
const AMOUNT_MARKER: &str = "page-summary__amount";
const DATE_MARKER: &str = "page-summary__date";

static EURO_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"€\s+([\d\.]+)").expect("static regex"));
static CALCULATED_ON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Berekend op (\d{2}-\d{2}-\d{4})").expect("static regex"));

/// Market value estimate connector for kadasterdata.nl.
pub struct KadasterConnector {
    http: reqwest::Client,
    base: Url,
}

impl KadasterConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new(NAME);

    /// Connector against the public site.
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CasaError> {
        Ok(Self {
            http: http::default_client()?,
            base: http::parse_base(DEFAULT_BASE)?,
        })
    }

    /// Point the autocomplete endpoint at another host.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unparseable URL.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, CasaError> {
        self.base = http::parse_base(base)?;
        Ok(self)
    }

    /// Reuse an existing client.
    #[must_use]
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    async fn page_url(&self, address: &Address) -> Result<Option<String>, CasaError> {
        let endpoint = http::join(&self.base, "api-hd/autocomplete")?;
        let q = address.to_string();
        let req = self.http.post(endpoint).query(&[("q", q.as_str())]);
        let resp = http::send(NAME, "autocomplete", req).await?;
        let found: Autocomplete = http::json(NAME, "autocomplete", resp).await?;
        let url = found
            .properties
            .into_iter()
            .next()
            .and_then(|p| p.url)
            .filter(|u| !u.is_empty());
        if url.is_none() {
            tracing::info!(address = %address, "no estimate page; property is probably too new");
        }
        Ok(url)
    }
}

#[derive(Deserialize)]
struct Autocomplete {
    #[serde(default)]
    properties: Vec<Suggestion>,
}

#[derive(Deserialize)]
struct Suggestion {
    url: Option<String>,
}

fn euros(raw: &str) -> Option<Decimal> {
    raw.replace('.', "").parse().ok()
}

/// Extract the estimate from a valuation page.
///
/// Needs exactly two euro amounts in the summary block and a calculation
/// date after it; anything less yields `None`.
#[must_use]
pub fn parse_estimate_page(url: &str, body: &str) -> Option<ValuationEstimate> {
    let amount_at = body.find(AMOUNT_MARKER)?;
    let date_at = body[amount_at..].find(DATE_MARKER)? + amount_at;
    let amounts: Vec<Decimal> = EURO_AMOUNT
        .captures_iter(&body[amount_at..date_at])
        .filter_map(|c| euros(&c[1]))
        .collect();
    let &[value_min, value_max] = amounts.as_slice() else {
        return None;
    };
    let date = CALCULATED_ON.captures(&body[date_at..])?;
    let calculated_on = NaiveDate::parse_from_str(&date[1], "%d-%m-%Y").ok()?;
    Some(ValuationEstimate {
        url: url.to_string(),
        value_min,
        value_max,
        calculated_on,
    })
}

impl CasaConnector for KadasterConnector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn vendor(&self) -> &'static str {
        "kadasterdata"
    }

    fn as_estimate_provider(&self) -> Option<&dyn EstimateProvider> {
        Some(self as &dyn EstimateProvider)
    }
}

#[async_trait]
impl EstimateProvider for KadasterConnector {
    async fn lookup_estimate(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationEstimate>, CasaError> {
        let Some(url) = self.page_url(address).await? else {
            return Ok(None);
        };
        let resp = http::send(NAME, "estimate page", self.http.get(&url)).await?;
        let body = http::text(NAME, "estimate page", resp).await?;
        let estimate = parse_estimate_page(&url, &body);
        if estimate.is_none() {
            tracing::warn!(url = %url, "estimate page incomplete");
        }
        Ok(estimate)
    }
}
