use std::sync::Arc;

use async_trait::async_trait;
use casa_core::connector::{CasaConnector, CatalogProvider, ConnectorKey};
use casa_core::{CasaError, Decimal, ListingId, RawListingDetail, SearchFilter};
use serde::Deserialize;
use url::Url;

use crate::http;

const NAME: &str = "casa-funda";
const DEFAULT_BASE: &str = "https://www.funda.nl/";
const LD_JSON_OPEN: &str = r#"<script type="application/ld+json">"#;
const SCRIPT_CLOSE: &str = "</script>";

/// Turns a downloaded listing page into a typed detail.
///
/// Page layouts change often and are kept out of the connector; callers plug in
/// the parser that matches the current markup.
pub trait DetailParser: Send + Sync {
    /// Parse `body`, served from `url` after redirects.
    ///
    /// # Errors
    /// Return `Data` when a required field is missing or malformed.
    fn parse(&self, url: &str, body: &str) -> Result<RawListingDetail, CasaError>;
}

/// Catalog connector for funda.nl search and listing pages.
pub struct FundaConnector {
    http: reqwest::Client,
    base: Url,
    parser: Arc<dyn DetailParser>,
}

impl FundaConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new(NAME);

    /// Connector against the public site.
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new(parser: Arc<dyn DetailParser>) -> Result<Self, CasaError> {
        Ok(Self {
            http: http::default_client()?,
            base: http::parse_base(DEFAULT_BASE)?,
            parser,
        })
    }

    /// Point the search endpoint at another host (mirrors, tests).
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unparseable URL.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, CasaError> {
        self.base = http::parse_base(base)?;
        Ok(self)
    }

    /// Reuse an existing client (shared connection pool, custom proxy).
    #[must_use]
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn search_url(&self, filter: &SearchFilter) -> Result<Url, CasaError> {
        let mut url = http::join(&self.base, "zoeken/koop")?;
        url.query_pairs_mut()
            .append_pair("selected_area", &quoted_list(filter.area()))
            .append_pair(
                "price",
                &format!(
                    "\"{}-{}\"",
                    whole(filter.price_min()),
                    whole(filter.price_max())
                ),
            )
            .append_pair("publication_date", &format!("\"{}\"", filter.days_old()))
            .append_pair("object_type", &quoted_list(filter.object_type()));
        Ok(url)
    }
}

fn quoted_list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let inner: Vec<String> = items.into_iter().map(|s| format!("\"{s}\"")).collect();
    format!("[{}]", inner.join(","))
}

fn whole(d: Decimal) -> Decimal {
    d.trunc().normalize()
}

#[derive(Deserialize)]
struct ItemList {
    #[serde(default, rename = "itemListElement")]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct Item {
    url: String,
}

/// Extract listing urls from a search results page.
///
/// Reads the first inline `application/ld+json` block; a page without one
/// has no results.
///
/// # Errors
/// Returns `Connector` when the block is not a valid item list.
pub fn parse_search_page(body: &str) -> Result<Vec<ListingId>, CasaError> {
    let Some(start) = body.find(LD_JSON_OPEN) else {
        return Ok(vec![]);
    };
    let rest = &body[start + LD_JSON_OPEN.len()..];
    let Some(end) = rest.find(SCRIPT_CLOSE) else {
        return Ok(vec![]);
    };
    let list: ItemList = serde_json::from_str(rest[..end].trim())
        .map_err(|e| CasaError::connector(NAME, format!("search results: {e}")))?;
    Ok(list
        .items
        .into_iter()
        .map(|i| ListingId::new(i.url))
        .collect())
}

impl CasaConnector for FundaConnector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn vendor(&self) -> &'static str {
        "funda"
    }

    fn as_catalog_provider(&self) -> Option<&dyn CatalogProvider> {
        Some(self as &dyn CatalogProvider)
    }
}

#[async_trait]
impl CatalogProvider for FundaConnector {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<ListingId>, CasaError> {
        let url = self.search_url(filter)?;
        let resp = http::send(NAME, "search", self.http.get(url)).await?;
        let body = http::text(NAME, "search", resp).await?;
        let ids = parse_search_page(&body)?;
        tracing::debug!(found = ids.len(), "catalog search");
        Ok(ids)
    }

    async fn fetch_detail(&self, id: &ListingId) -> Result<RawListingDetail, CasaError> {
        let what = format!("listing {id}");
        let resp = http::send(NAME, &what, self.http.get(id.as_str())).await?;
        let final_url = resp.url().to_string();
        let body = http::text(NAME, &what, resp).await?;
        self.parser.parse(&final_url, &body)
    }
}
