//! In-process [`PriceStore`] backed by a vector behind an async lock.
//!
//! Mirrors the `SQLite` store's semantics exactly; used for tests and for
//! runs that do not need persistence across restarts.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::PriceDocument;
use crate::error::{DatabaseError, Result};
use crate::filter::{CountFilter, PriceFilter};
use crate::store::{PriceStore, ReplaceOutcome};

#[derive(Debug, Default)]
struct Collection {
    next_id: u64,
    rows: Vec<(u64, PriceDocument)>,
}

impl Collection {
    /// Index of the newest row matching `filter`.
    fn newest(&self, filter: &PriceFilter) -> Option<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, (_, doc))| filter.matches(doc))
            .max_by(|(_, (id_a, a)), (_, (id_b, b))| {
                a.last_price_updt
                    .cmp(&b.last_price_updt)
                    .then(id_a.cmp(id_b))
            })
            .map(|(index, _)| index)
    }
}

/// Price store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryPriceStore {
    collection: RwLock<Collection>,
}

impl MemoryPriceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored document, oldest insert first.
    pub async fn documents(&self) -> Vec<PriceDocument> {
        self.collection
            .read()
            .await
            .rows
            .iter()
            .map(|(_, doc)| doc.clone())
            .collect()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn find_one(&self, filter: &PriceFilter) -> Result<Option<PriceDocument>> {
        let collection = self.collection.read().await;
        Ok(collection
            .newest(filter)
            .map(|index| collection.rows[index].1.clone()))
    }

    async fn replace_one(
        &self,
        filter: &PriceFilter,
        doc: &PriceDocument,
    ) -> Result<ReplaceOutcome> {
        if doc.card_number.trim().is_empty() {
            return Err(DatabaseError::Query(
                "refusing to store a document without card_number".to_string(),
            ));
        }

        let mut collection = self.collection.write().await;
        if let Some(index) = collection.newest(filter) {
            let mut replacement = doc.clone();
            replacement.retain_identity_from(&collection.rows[index].1);
            collection.rows[index].1 = replacement;
            return Ok(ReplaceOutcome::Replaced);
        }

        collection.next_id += 1;
        let id = collection.next_id;
        collection.rows.push((id, doc.clone()));
        Ok(ReplaceOutcome::Inserted)
    }

    async fn count(&self, filter: &CountFilter) -> Result<u64> {
        let collection = self.collection.read().await;
        let matching = collection
            .rows
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .count();
        Ok(u64::try_from(matching).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FieldMatch;

    fn doc(number: &str, rarity: &str, name: Option<&str>, ts: &str) -> PriceDocument {
        PriceDocument {
            card_number: number.to_string(),
            card_rarity: Some(rarity.to_string()),
            card_name: name.map(str::to_string),
            last_price_updt: ts.to_string(),
            ..PriceDocument::default()
        }
    }

    #[tokio::test]
    async fn test_blank_name_does_not_erase() {
        let store = MemoryPriceStore::new();
        let first = doc("X", "R", Some("Foo"), "2026-01-01T00:00:00.000Z");
        store
            .replace_one(&PriceFilter::identity_of(&first), &first)
            .await
            .expect("insert");

        let second = doc("X", "R", None, "2026-01-02T00:00:00.000Z");
        let outcome = store
            .replace_one(&PriceFilter::identity_of(&second), &second)
            .await
            .expect("replace");
        assert_eq!(outcome, ReplaceOutcome::Replaced);

        let found = store
            .find_one(&PriceFilter::new("X"))
            .await
            .expect("find")
            .expect("document present");
        assert_eq!(found.card_name.as_deref(), Some("Foo"));
        assert_eq!(store.documents().await.len(), 1);
    }

    #[tokio::test]
    async fn test_newest_wins_with_id_tiebreak() {
        let store = MemoryPriceStore::new();
        for d in [
            doc("X", "Ultra Rare", Some("A"), "2026-01-01T00:00:00.000Z"),
            doc("X", "Secret Rare", Some("B"), "2026-01-01T00:00:00.000Z"),
        ] {
            store
                .replace_one(&PriceFilter::identity_of(&d), &d)
                .await
                .expect("insert");
        }

        let found = store
            .find_one(&PriceFilter::new("x"))
            .await
            .expect("find")
            .expect("document present");
        assert_eq!(found.card_name.as_deref(), Some("B"));

        let ultra = store
            .find_one(&PriceFilter::new("X").with_rarity(FieldMatch::Contains("ULTRA".to_string())))
            .await
            .expect("find")
            .expect("document present");
        assert_eq!(ultra.card_name.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_count() {
        let store = MemoryPriceStore::new();
        let mut d = doc("X", "R", None, "2026-01-01T00:00:00.000Z");
        d.scrape_success = true;
        store
            .replace_one(&PriceFilter::identity_of(&d), &d)
            .await
            .expect("insert");

        let failed = CountFilter {
            updated_after: None,
            scrape_success: Some(false),
        };
        assert_eq!(store.count(&CountFilter::default()).await.expect("count"), 1);
        assert_eq!(store.count(&failed).await.expect("count"), 0);
    }
}
