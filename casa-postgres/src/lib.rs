//! casa-postgres
//!
//! PostgreSQL implementation of [`ListingSink`]. Records live in a single
//! `listings` table keyed by listing url; the record body is stored as JSONB
//! without timestamps, so re-writing identical content is a no-op and the
//! first `created_at` survives updates.
#![warn(missing_docs)]

use async_trait::async_trait;
use casa_core::connector::ListingSink;
use casa_core::{CanonicalRecord, CasaError, PostgresConfig, UpsertAck};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

const NAME: &str = "casa-postgres";
const MIGRATION: &str = include_str!("../migrations/0001_listings.sql");
const MAX_CONNECTIONS: u32 = 5;

/// Sink writing canonical records to PostgreSQL.
#[derive(Clone)]
pub struct PgSink {
    pool: PgPool,
    schema: String,
}

fn db_err(what: &str, e: &sqlx::Error) -> CasaError {
    CasaError::persistence(NAME, format!("{what}: {e}"))
}

/// Check that `schema` is a plain identifier; it is interpolated into SQL.
///
/// # Errors
/// Returns `Config` for anything but ASCII letters, digits and underscores
/// not starting with a digit.
pub fn check_schema(schema: &str) -> Result<(), CasaError> {
    let mut chars = schema.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(CasaError::Config(format!("invalid schema name: {schema:?}")))
    }
}

/// JSON body stored for a record: everything except the timestamps.
///
/// # Errors
/// Returns `Persistence` if the record cannot be serialized.
pub fn payload(record: &CanonicalRecord) -> Result<serde_json::Value, CasaError> {
    let mut value = serde_json::to_value(record)
        .map_err(|e| CasaError::persistence(NAME, format!("serialize {}: {e}", record.id)))?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("created_at");
        obj.remove("updated_at");
    }
    Ok(value)
}

impl PgSink {
    /// Connect using process configuration.
    ///
    /// # Errors
    /// Returns `Config` for an invalid schema name and `Persistence` when the
    /// database is unreachable.
    pub async fn connect(cfg: &PostgresConfig) -> Result<Self, CasaError> {
        check_schema(&cfg.schema)?;
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&cfg.dsn())
            .await
            .map_err(|e| db_err("connect", &e))?;
        tracing::info!(host = %cfg.host, database = %cfg.database, schema = %cfg.schema, "postgres connected");
        Ok(Self {
            pool,
            schema: cfg.schema.clone(),
        })
    }

    /// Wrap an existing pool.
    ///
    /// # Errors
    /// Returns `Config` for an invalid schema name.
    pub fn from_pool(pool: PgPool, schema: impl Into<String>) -> Result<Self, CasaError> {
        let schema = schema.into();
        check_schema(&schema)?;
        Ok(Self { pool, schema })
    }

    /// Create the schema, table and index when missing.
    ///
    /// # Errors
    /// Returns `Persistence` if any statement fails.
    pub async fn ensure_schema(&self) -> Result<(), CasaError> {
        let sql = MIGRATION.replace("{schema}", &self.schema);
        sqlx::raw_sql(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("ensure schema", &e))?;
        Ok(())
    }

    fn upsert_sql(&self) -> String {
        format!(
            r#"
            INSERT INTO {s}.listings (url, city, postal_code, asking_price, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (url) DO UPDATE SET
                city = EXCLUDED.city,
                postal_code = EXCLUDED.postal_code,
                asking_price = EXCLUDED.asking_price,
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            WHERE {s}.listings.payload IS DISTINCT FROM EXCLUDED.payload
            RETURNING (xmax = 0) AS inserted
            "#,
            s = self.schema
        )
    }
}

#[async_trait]
impl ListingSink for PgSink {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn upsert(&self, record: &CanonicalRecord) -> Result<UpsertAck, CasaError> {
        let body = payload(record)?;
        let sql = self.upsert_sql();
        let row = sqlx::query(&sql)
            .bind(record.id.as_str())
            .bind(&record.address.city)
            .bind(&record.address.postal_code)
            .bind(record.detail.asking_price)
            .bind(Json(body))
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("upsert", &e))?;
        let Some(row) = row else {
            return Ok(UpsertAck::Unchanged);
        };
        let inserted: bool = row
            .try_get("inserted")
            .map_err(|e| db_err("upsert result", &e))?;
        Ok(if inserted {
            UpsertAck::Inserted
        } else {
            UpsertAck::Updated
        })
    }
}
