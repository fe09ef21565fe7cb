use async_trait::async_trait;
use casa_core::connector::{CasaConnector, ConnectorKey, HistoryProvider};
use casa_core::{Address, CasaError, Decimal, HistoryEntry, NaiveDate, ValuationHistory};
use chrono::Datelike;
use serde::Deserialize;
use url::Url;

use crate::http;

const NAME: &str = "casa-woz";
const DEFAULT_LOCATION_BASE: &str = "https://api.pdok.nl/bzk/locatieserver/search/v3_1/";
const DEFAULT_VALUATION_BASE: &str = "https://www.wozwaardeloket.nl/wozwaardeloket-api/v1/";

/// Assessed-value history connector.
///
/// Resolves the address through the national location server, then reads the
/// assessment list from the valuation desk, which requires a session cookie.
pub struct WozConnector {
    http: reqwest::Client,
    location: Url,
    valuation: Url,
}

impl WozConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new(NAME);

    /// Connector against the public services.
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CasaError> {
        Ok(Self {
            http: http::default_client()?,
            location: http::parse_base(DEFAULT_LOCATION_BASE)?,
            valuation: http::parse_base(DEFAULT_VALUATION_BASE)?,
        })
    }

    /// Override the location server base (the directory holding `suggest` and `lookup`).
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unparseable URL.
    pub fn with_location_url(mut self, base: &str) -> Result<Self, CasaError> {
        self.location = http::parse_base(base)?;
        Ok(self)
    }

    /// Override the valuation API base (the directory holding `session/start`).
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unparseable URL.
    pub fn with_valuation_url(mut self, base: &str) -> Result<Self, CasaError> {
        self.valuation = http::parse_base(base)?;
        Ok(self)
    }

    /// Reuse an existing client. It must keep cookies between requests.
    #[must_use]
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    async fn lookup_id(&self, address: &Address) -> Result<Option<String>, CasaError> {
        let q = address.to_string();
        let url = http::join(&self.location, "suggest")?;
        let req = self.http.get(url).query(&[("q", q.as_str()), ("rows", "10")]);
        let resp = http::send(NAME, "suggest", req).await?;
        let found: Envelope<SuggestDoc> = http::json(NAME, "suggest", resp).await?;
        let r = found.response;
        let Some(first) = r.docs.into_iter().next() else {
            tracing::info!(address = %address, "no location match");
            return Ok(None);
        };
        if r.num_found > 1 || !r.num_found_exact {
            tracing::warn!(
                address = %address,
                matches = r.num_found,
                "ambiguous location match; using the first"
            );
        }
        if first.kind != "adres" {
            tracing::warn!(address = %address, kind = %first.kind, "location match is not an address");
        }
        Ok(Some(first.id))
    }

    async fn designation_id(&self, lookup_id: &str) -> Result<Option<String>, CasaError> {
        let url = http::join(&self.location, "lookup")?;
        let req = self.http.get(url).query(&[("fl", "*"), ("id", lookup_id)]);
        let resp = http::send(NAME, "lookup", req).await?;
        let found: Envelope<LookupDoc> = http::json(NAME, "lookup", resp).await?;
        Ok(found
            .response
            .docs
            .into_iter()
            .next()
            .and_then(|d| d.nummeraanduiding_id))
    }

    async fn assessments(&self, designation: &str) -> Result<ValuationHistory, CasaError> {
        let session = http::join(&self.valuation, "session/start")?;
        http::send(NAME, "session", self.http.post(session)).await?;

        let data = http::join(&self.valuation, &format!("wozwaarde/nummeraanduiding/{designation}"))?;
        let resp = http::send(NAME, "assessments", self.http.get(data.clone())).await?;
        let list: Assessments = http::json(NAME, "assessments", resp).await?;
        let entries = list
            .woz_waarden
            .into_iter()
            .map(|w| w.into_entry())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ValuationHistory {
            url: Some(data.to_string()),
            entries,
        })
    }
}

#[derive(Deserialize)]
struct Envelope<D> {
    #[serde(default = "Page::empty")]
    response: Page<D>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<D> {
    #[serde(default)]
    num_found: u64,
    #[serde(default)]
    num_found_exact: bool,
    #[serde(default = "Vec::new")]
    docs: Vec<D>,
}

impl<D> Page<D> {
    const fn empty() -> Self {
        Self {
            num_found: 0,
            num_found_exact: false,
            docs: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct SuggestDoc {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize)]
struct LookupDoc {
    nummeraanduiding_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Assessments {
    #[serde(default)]
    woz_waarden: Vec<Assessment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Assessment {
    peildatum: String,
    vastgestelde_waarde: serde_json::Number,
}

impl Assessment {
    fn into_entry(self) -> Result<HistoryEntry, CasaError> {
        let reference_date = NaiveDate::parse_from_str(&self.peildatum, "%Y-%m-%d")
            .map_err(|e| CasaError::connector(NAME, format!("peildatum {}: {e}", self.peildatum)))?;
        let raw = self.vastgestelde_waarde.to_string();
        let value: Decimal = raw
            .parse()
            .map_err(|e| CasaError::connector(NAME, format!("vastgesteldeWaarde {raw}: {e}")))?;
        Ok(HistoryEntry {
            year: reference_date.year(),
            reference_date,
            value,
        })
    }
}

impl CasaConnector for WozConnector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn vendor(&self) -> &'static str {
        "wozwaardeloket"
    }

    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        Some(self as &dyn HistoryProvider)
    }
}

#[async_trait]
impl HistoryProvider for WozConnector {
    async fn lookup_history(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationHistory>, CasaError> {
        let Some(lookup) = self.lookup_id(address).await? else {
            return Ok(None);
        };
        let Some(designation) = self.designation_id(&lookup).await? else {
            tracing::info!(address = %address, lookup = %lookup, "no designation for location");
            return Ok(None);
        };
        self.assessments(&designation).await.map(Some)
    }
}
