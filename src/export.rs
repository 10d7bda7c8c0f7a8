//! Database table export to CSV.
//!
//! Produces the loader's input file from a SQLite or PostgreSQL table: a
//! header with the column names followed by every row. SQL `NULL` becomes
//! an empty field, which the loader reads back as a missing value.
//!
//! The backend is chosen from the URL scheme (`sqlite:`, `postgres:`,
//! `postgresql:`) and reached through sqlx's `Any` driver.

use std::path::Path;

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::{ReportError, Result};

/// Database family behind a connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// Picks the backend from the URL scheme.
    pub fn from_url(url: &str) -> Result<Self> {
        match url.split_once(':').map(|(scheme, _)| scheme) {
            Some("sqlite") => Ok(Self::Sqlite),
            Some("postgres" | "postgresql") => Ok(Self::Postgres),
            Some(scheme) => Err(ReportError::Database(format!(
                "unsupported database scheme '{scheme}'"
            ))),
            None => Err(ReportError::Database(
                "database URL has no scheme".to_string(),
            )),
        }
    }

    /// Catalog query returning the column names of the table bound as the
    /// only parameter, in declaration order.
    fn columns_query(self) -> &'static str {
        match self {
            Self::Sqlite => "SELECT name FROM pragma_table_info(?) ORDER BY cid",
            Self::Postgres => {
                "SELECT column_name::text FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position"
            }
        }
    }

    /// `SELECT` over every column. PostgreSQL values are cast to text so
    /// dates, numerics and other non-portable types survive the `Any` driver.
    fn select_query(self, table: &str, columns: &[String]) -> String {
        match self {
            Self::Sqlite => format!("SELECT * FROM {}", quote_ident(table)),
            Self::Postgres => {
                let list: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{0}::text AS {0}", quote_ident(c)))
                    .collect();
                format!("SELECT {} FROM {}", list.join(", "), quote_ident(table))
            }
        }
    }

    /// Adjusts the URL so the export never writes to the source.
    fn read_only_url(self, url: &str) -> String {
        match self {
            Self::Sqlite if !url.contains("mode=") => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{url}{sep}mode=ro")
            }
            _ => url.to_string(),
        }
    }
}

/// Exports every row of `table` to `output` and returns the row count.
///
/// `table` must be a plain identifier; it is checked before any
/// connection is opened. SQLite databases are opened read-only and must
/// exist. A table without columns in the catalog is reported as missing.
pub async fn export_table(database_url: &str, table: &str, output: &Path) -> Result<usize> {
    validate_identifier(table)?;
    let backend = Backend::from_url(database_url)?;

    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect(&backend.read_only_url(database_url))
        .await?;
    debug!(?backend, table, "connected");

    let header: Vec<String> = sqlx::query_scalar::<_, String>(backend.columns_query())
        .bind(table)
        .fetch_all(&pool)
        .await?;
    if header.is_empty() {
        pool.close().await;
        return Err(ReportError::Database(format!("table '{table}' not found")));
    }

    let rows = sqlx::query(&backend.select_query(table, &header))
        .fetch_all(&pool)
        .await?;
    pool.close().await;

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&header)?;
    for row in &rows {
        let record: Vec<String> = (0..row.len()).map(|i| column_text(row, i)).collect();
        writer.write_record(&record)?;
    }
    writer
        .flush()
        .map_err(|e| ReportError::io(output, e))?;

    info!(
        table,
        rows = rows.len(),
        columns = header.len(),
        output = %output.display(),
        "table exported"
    );
    Ok(rows.len())
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ReportError::Database(format!(
            "invalid table name '{name}'"
        )))
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Converts a column value to CSV text; NULL and unsupported types are empty.
fn column_text(row: &AnyRow, index: usize) -> String {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(|b| b.to_string()).unwrap_or_default();
    }
    String::new()
}
