use async_trait::async_trait;
use casa_core::connector::{SettingsRow, SettingsSource};
use casa_core::{CasaError, SheetSource};
use url::Url;

use crate::http;

const NAME: &str = "casa-sheets";
const DEFAULT_BASE: &str = "https://docs.google.com/";

/// Reads settings rows from published spreadsheet tabs via their CSV export.
pub struct GoogleSheetsSource {
    http: reqwest::Client,
    base: Url,
}

impl GoogleSheetsSource {
    /// Source against the public spreadsheet host.
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CasaError> {
        Ok(Self {
            http: http::default_client()?,
            base: http::parse_base(DEFAULT_BASE)?,
        })
    }

    /// Point at another host.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unparseable URL.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, CasaError> {
        self.base = http::parse_base(base)?;
        Ok(self)
    }

    fn export_url(&self, source: &SheetSource) -> Result<Url, CasaError> {
        let mut url = http::join(
            &self.base,
            &format!("spreadsheets/d/{}/gviz/tq", source.sheet_id),
        )?;
        url.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("gid", &source.gid);
        Ok(url)
    }
}

#[async_trait]
impl SettingsSource for GoogleSheetsSource {
    async fn fetch_rows(&self, source: &SheetSource) -> Result<Vec<SettingsRow>, CasaError> {
        let what = format!("sheet {}#{}", source.sheet_id, source.gid);
        let resp = http::send(NAME, &what, self.http.get(self.export_url(source)?)).await?;
        let body = http::text(NAME, &what, resp).await?;
        let rows = rows_from_csv(&body)?;
        tracing::debug!(sheet = %source.sheet_id, gid = %source.gid, rows = rows.len(), "fetched settings");
        Ok(rows)
    }
}

fn csv_err(e: csv::Error) -> CasaError {
    CasaError::Data(format!("settings csv: {e}"))
}

/// Key every data row of a CSV export by the header row. Blank rows are dropped.
///
/// # Errors
/// Returns `Data` for malformed CSV.
pub fn rows_from_csv(text: &str) -> Result<Vec<SettingsRow>, CasaError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let header = reader.headers().map_err(csv_err)?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(
            header
                .iter()
                .map(str::to_string)
                .zip(record.iter().map(str::to_string))
                .collect(),
        );
    }
    Ok(rows)
}
