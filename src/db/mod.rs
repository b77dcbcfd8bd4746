//! Database connection pool, schema bootstrap, and health check.
//!
//! Each search target names its own queue table, so the table name is part
//! of the handle and is validated once, before it is ever spliced into SQL.

pub mod work;

use crate::error::{Error, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Database handle. Owns the connection pool and the queue table name.
pub struct Db {
    pool: PgPool,
    table: String,
}

/// True if `name` is safe to use unquoted as a Postgres table name.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= 63
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Db {
    /// Connect to Postgres and create a connection pool for `table`.
    pub async fn connect(url: &str, table: &str) -> Result<Self> {
        if !is_valid_identifier(table) {
            return Err(Error::Config(format!("invalid table name: {table:?}")));
        }
        // One bot issues one query at a time.
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(url)
            .await?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Create the queue table and its indexes if they do not exist.
    pub async fn init_schema(&self) -> Result<()> {
        let table = &self.table;
        sqlx::raw_sql(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id                BIGSERIAL PRIMARY KEY,
                sequence          TEXT NOT NULL,
                type              TEXT NOT NULL,
                vin               TEXT,
                carfax_records    INTEGER,
                autocheck_records INTEGER,
                name              TEXT,
                bot               TEXT,
                checked_on        TIMESTAMPTZ,
                UNIQUE (type, sequence)
            );
            CREATE INDEX IF NOT EXISTS {table}_unclaimed_idx
                ON {table} (type, sequence)
                WHERE vin IS NULL AND checked_on IS NULL AND bot IS NULL;"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Simple health check: run a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("vins"));
        assert!(is_valid_identifier("mustang_2021"));
        assert!(is_valid_identifier("_staging"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2021"));
        assert!(!is_valid_identifier("vins; DROP TABLE vins"));
        assert!(!is_valid_identifier("vins-2021"));
        assert!(!is_valid_identifier(&"a".repeat(64)));
    }
}
