//! tcgprice Database Layer
//!
//! Persists scraped price records. The cache talks to storage only through
//! the [`PriceStore`] trait, which exposes two collection primitives
//! (`find_one` and `replace_one`) plus a `count` used for statistics.
//!
//! # Implementations
//!
//! - [`Database`] - `SQLite` via `SQLx`, with embedded migrations
//! - [`MemoryPriceStore`] - in-process store with identical semantics
//!
//! # Example
//!
//! ```ignore
//! use tcgprice_db::{Database, PriceFilter, PriceStore};
//!
//! let db = Database::new("prices.db", 5).await?;
//! db.run_migrations().await?;
//! let newest = db.find_one(&PriceFilter::new("BLTR-EN051")).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod document;
pub mod error;
pub mod filter;
pub mod memory;
pub mod migrations;
pub mod prices;
pub mod store;

// Re-export commonly used types
pub use connection::{ConnectionPool, IN_MEMORY};
pub use document::{format_timestamp, parse_timestamp, PriceDocument};
pub use error::{DatabaseError, Result};
pub use filter::{CountFilter, FieldMatch, PriceFilter};
pub use memory::MemoryPriceStore;
pub use store::{PriceStore, ReplaceOutcome};

use async_trait::async_trait;
use std::path::Path;

/// `SQLite`-backed price store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Open the database at `path` (or `:memory:`).
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let pool = ConnectionPool::new(path, max_connections).await?;
        Ok(Self { pool })
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PriceStore for Database {
    async fn find_one(&self, filter: &PriceFilter) -> Result<Option<PriceDocument>> {
        prices::find_one(self.pool(), filter).await
    }

    async fn replace_one(
        &self,
        filter: &PriceFilter,
        doc: &PriceDocument,
    ) -> Result<ReplaceOutcome> {
        prices::replace_one(self.pool(), filter, doc).await
    }

    async fn count(&self, filter: &CountFilter) -> Result<u64> {
        prices::count(self.pool(), filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_schema() {
        let db = Database::new(IN_MEMORY, 1).await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('price_records') ORDER BY cid")
                .fetch_all(db.pool())
                .await
                .expect("query columns");

        assert_eq!(
            columns,
            vec![
                "id",
                "card_number",
                "card_name",
                "card_art_variant",
                "card_rarity",
                "set_code",
                "booster_set_name",
                "tcg_price",
                "tcg_market_price",
                "pc_ungraded_price",
                "pc_grade7",
                "pc_grade8",
                "pc_grade9",
                "pc_grade9_5",
                "pc_grade10",
                "source_url",
                "last_price_updt",
                "scrape_success",
                "error_message"
            ]
        );
    }

    #[tokio::test]
    async fn test_database_close() {
        let db = Database::new(IN_MEMORY, 1).await.expect("create database");
        db.close().await;
    }

    #[tokio::test]
    async fn test_store_through_trait_object() {
        let db = Database::new(IN_MEMORY, 1).await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        let store: std::sync::Arc<dyn PriceStore> = std::sync::Arc::new(db);

        let doc = PriceDocument {
            card_number: "LOB-001".to_string(),
            card_rarity: Some("Ultra Rare".to_string()),
            last_price_updt: "2026-01-01T00:00:00.000Z".to_string(),
            ..PriceDocument::default()
        };
        store
            .replace_one(&PriceFilter::identity_of(&doc), &doc)
            .await
            .expect("insert");
        assert!(store
            .find_one(&PriceFilter::new("LOB-001"))
            .await
            .expect("find")
            .is_some());
    }
}
