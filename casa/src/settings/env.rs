use std::str::FromStr;
use std::time::Duration;

use casa_core::{CasaConfig, CasaError, PostgresConfig, SettingsKind, SheetSource, SslMode};

/// Highest spreadsheet index scanned (`CASA_SHEETS_1_*` .. `CASA_SHEETS_9_*`).
pub const MAX_SHEETS: usize = 9;

/// Process configuration loaded from `CASA_*` environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Database connection; `None` when `CASA_PG_HOST` is unset.
    pub postgres: Option<PostgresConfig>,
    /// Settings spreadsheets, in index order.
    pub sheets: Vec<SheetSource>,
    /// Orchestrator configuration.
    pub casa: CasaConfig,
}

impl EnvConfig {
    /// Load from the process environment, reading a `.env` file first if present.
    ///
    /// # Errors
    /// Returns `Config` for malformed values, a zero concurrency cap, an
    /// incomplete database section, or an unknown settings kind.
    pub fn from_env() -> Result<Self, CasaError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|k| std::env::var(k).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Load from an arbitrary key lookup.
    ///
    /// # Errors
    /// See [`EnvConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CasaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |k: &str| {
            get(k).ok_or_else(|| CasaError::Config(format!("{k} is required when CASA_PG_HOST is set")))
        };

        let postgres = match get("CASA_PG_HOST") {
            None => None,
            Some(host) => Some(PostgresConfig {
                user: require("CASA_PG_USER")?,
                password: require("CASA_PG_PASSWORD")?,
                database: require("CASA_PG_DATABASE")?,
                port: parse_or(get("CASA_PG_PORT"), "CASA_PG_PORT", 5432)?,
                sslmode: parse_or(get("CASA_PG_SSLMODE"), "CASA_PG_SSLMODE", SslMode::Require)?,
                schema: get("CASA_PG_SCHEMA").unwrap_or_else(|| "casa".to_string()),
                host,
            }),
        };

        let mut sheets = Vec::new();
        for n in 1..=MAX_SHEETS {
            let sheet_id = get(&format!("CASA_SHEETS_{n}_SHEET_ID"));
            let gid = get(&format!("CASA_SHEETS_{n}_GID"));
            let kind = get(&format!("CASA_SHEETS_{n}_KIND"));
            let (Some(sheet_id), Some(gid), Some(kind)) = (sheet_id, gid, kind) else {
                break;
            };
            sheets.push(SheetSource {
                sheet_id,
                gid,
                kind: SettingsKind::from_key(&kind)?,
            });
        }

        let mut casa = CasaConfig::default();
        if let Some(raw) = get("CASA_PROVIDER_TIMEOUT_SECS") {
            let secs: u64 = parse_or(Some(raw), "CASA_PROVIDER_TIMEOUT_SECS", 0)?;
            casa.provider_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(raw) = get("CASA_MAX_CONCURRENCY") {
            let n: usize = parse_or(Some(raw), "CASA_MAX_CONCURRENCY", 0)?;
            if n == 0 {
                return Err(CasaError::Config(
                    "CASA_MAX_CONCURRENCY must be at least 1; unset it for no cap".into(),
                ));
            }
            casa.max_concurrency = Some(n);
        }

        Ok(Self {
            postgres,
            sheets,
            casa,
        })
    }

    fn log_keys(&self) {
        match &self.postgres {
            Some(pg) => tracing::info!(
                host = %pg.host,
                port = pg.port,
                database = %pg.database,
                sslmode = %pg.sslmode,
                schema = %pg.schema,
                "postgres configured"
            ),
            None => tracing::info!("postgres not configured"),
        }
        tracing::info!(
            sheets = self.sheets.len(),
            provider_timeout = ?self.casa.provider_timeout,
            max_concurrency = ?self.casa.max_concurrency,
            "config loaded"
        );
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, CasaError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|e| CasaError::Config(format!("{key}={v}: {e}"))),
    }
}
