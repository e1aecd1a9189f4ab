//! `SQLite` operations on the `price_records` table.

use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use tcgprice_core::PriceFields;

use crate::document::{format_timestamp, PriceDocument};
use crate::error::{DatabaseError, Result};
use crate::filter::{CountFilter, FieldMatch, PriceFilter};
use crate::store::ReplaceOutcome;

const COLUMNS: &str = "card_number, card_name, card_art_variant, card_rarity, set_code, \
     booster_set_name, tcg_price, tcg_market_price, pc_ungraded_price, pc_grade7, pc_grade8, \
     pc_grade9, pc_grade9_5, pc_grade10, source_url, last_price_updt, scrape_success, error_message";

const NEWEST_FIRST: &str = " ORDER BY last_price_updt DESC, id DESC LIMIT 1";

fn push_field(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, field: Option<&FieldMatch>) {
    match field {
        None => {}
        Some(FieldMatch::Exact(value)) => {
            qb.push(format!(" AND {column} = "));
            qb.push_bind(value.clone());
        }
        Some(FieldMatch::Contains(needle)) => {
            qb.push(format!(" AND instr(lower({column}), lower("));
            qb.push_bind(needle.clone());
            qb.push(")) > 0");
        }
        Some(FieldMatch::Absent) => {
            qb.push(format!(" AND {column} IS NULL"));
        }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PriceFilter) {
    qb.push("card_number = ");
    qb.push_bind(filter.card_number.clone());
    qb.push(" COLLATE NOCASE");
    push_field(qb, "card_name", filter.card_name.as_ref());
    push_field(qb, "card_rarity", filter.card_rarity.as_ref());
    push_field(qb, "card_art_variant", filter.card_art_variant.as_ref());
}

fn document_from_row(row: &SqliteRow) -> Result<PriceDocument> {
    Ok(PriceDocument {
        card_number: row.try_get("card_number")?,
        card_name: row.try_get("card_name")?,
        card_art_variant: row.try_get("card_art_variant")?,
        card_rarity: row.try_get("card_rarity")?,
        set_code: row.try_get("set_code")?,
        booster_set_name: row.try_get("booster_set_name")?,
        prices: PriceFields {
            tcg_price: row.try_get("tcg_price")?,
            tcg_market_price: row.try_get("tcg_market_price")?,
            pc_ungraded_price: row.try_get("pc_ungraded_price")?,
            pc_grade7: row.try_get("pc_grade7")?,
            pc_grade8: row.try_get("pc_grade8")?,
            pc_grade9: row.try_get("pc_grade9")?,
            pc_grade9_5: row.try_get("pc_grade9_5")?,
            pc_grade10: row.try_get("pc_grade10")?,
        },
        source_url: row.try_get("source_url")?,
        last_price_updt: row.try_get("last_price_updt")?,
        scrape_success: row.try_get("scrape_success")?,
        error_message: row.try_get("error_message")?,
    })
}

/// Fetch the newest document matching `filter`.
pub async fn find_one(pool: &Pool<Sqlite>, filter: &PriceFilter) -> Result<Option<PriceDocument>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM price_records WHERE "));
    push_filter(&mut qb, filter);
    qb.push(NEWEST_FIRST);

    let row = qb.build().fetch_optional(pool).await?;
    row.as_ref().map(document_from_row).transpose()
}

/// Replace the newest document matching `filter`, inserting when none does.
///
/// Both steps run in one `BEGIN IMMEDIATE` transaction, which takes the
/// database write lock up front. Concurrent writers for the same identity
/// queue behind it, so the first inserts and the rest replace. Absent name,
/// rarity, set code and booster fields keep their stored values.
pub async fn replace_one(
    pool: &Pool<Sqlite>,
    filter: &PriceFilter,
    doc: &PriceDocument,
) -> Result<ReplaceOutcome> {
    if doc.card_number.trim().is_empty() {
        return Err(DatabaseError::Query(
            "refusing to store a document without card_number".to_string(),
        ));
    }

    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE price_records SET card_number = ");
    qb.push_bind(doc.card_number.clone());
    qb.push(", card_art_variant = ");
    qb.push_bind(doc.card_art_variant.clone());
    for (column, value) in [
        ("card_name", &doc.card_name),
        ("card_rarity", &doc.card_rarity),
        ("set_code", &doc.set_code),
        ("booster_set_name", &doc.booster_set_name),
    ] {
        qb.push(format!(", {column} = COALESCE("));
        qb.push_bind(value.clone());
        qb.push(format!(", {column})"));
    }
    push_prices(&mut qb, &doc.prices);
    qb.push(", source_url = ");
    qb.push_bind(doc.source_url.clone());
    qb.push(", last_price_updt = ");
    qb.push_bind(doc.last_price_updt.clone());
    qb.push(", scrape_success = ");
    qb.push_bind(doc.scrape_success);
    qb.push(", error_message = ");
    qb.push_bind(doc.error_message.clone());
    qb.push(" WHERE id = (SELECT id FROM price_records WHERE ");
    push_filter(&mut qb, filter);
    qb.push(NEWEST_FIRST);
    qb.push(")");

    let updated = qb.build().execute(&mut *tx).await?.rows_affected();
    if updated > 0 {
        tx.commit().await?;
        tracing::debug!("Replaced price record for {}", doc.card_number);
        return Ok(ReplaceOutcome::Replaced);
    }

    sqlx::query(&format!(
        "INSERT INTO price_records ({COLUMNS})
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&doc.card_number)
    .bind(&doc.card_name)
    .bind(&doc.card_art_variant)
    .bind(&doc.card_rarity)
    .bind(&doc.set_code)
    .bind(&doc.booster_set_name)
    .bind(doc.prices.tcg_price)
    .bind(doc.prices.tcg_market_price)
    .bind(doc.prices.pc_ungraded_price)
    .bind(doc.prices.pc_grade7)
    .bind(doc.prices.pc_grade8)
    .bind(doc.prices.pc_grade9)
    .bind(doc.prices.pc_grade9_5)
    .bind(doc.prices.pc_grade10)
    .bind(&doc.source_url)
    .bind(&doc.last_price_updt)
    .bind(doc.scrape_success)
    .bind(&doc.error_message)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::debug!("Inserted price record for {}", doc.card_number);
    Ok(ReplaceOutcome::Inserted)
}

fn push_prices(qb: &mut QueryBuilder<'_, Sqlite>, prices: &PriceFields) {
    for (column, value) in [
        ("tcg_price", prices.tcg_price),
        ("tcg_market_price", prices.tcg_market_price),
        ("pc_ungraded_price", prices.pc_ungraded_price),
        ("pc_grade7", prices.pc_grade7),
        ("pc_grade8", prices.pc_grade8),
        ("pc_grade9", prices.pc_grade9),
        ("pc_grade9_5", prices.pc_grade9_5),
        ("pc_grade10", prices.pc_grade10),
    ] {
        qb.push(format!(", {column} = "));
        qb.push_bind(value);
    }
}

/// Count documents matching `filter`.
pub async fn count(pool: &Pool<Sqlite>, filter: &CountFilter) -> Result<u64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM price_records WHERE 1 = 1");
    if let Some(cutoff) = filter.updated_after {
        qb.push(" AND last_price_updt > ");
        qb.push_bind(format_timestamp(cutoff));
    }
    if let Some(success) = filter.scrape_success {
        qb.push(" AND scrape_success = ");
        qb.push_bind(success);
    }

    let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
    u64::try_from(total).map_err(|e| DatabaseError::Decode(format!("negative count: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_test_db() -> Database {
        let db = Database::new(":memory:", 1).await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    fn doc(number: &str, rarity: &str, name: Option<&str>, ts: &str) -> PriceDocument {
        PriceDocument {
            card_number: number.to_string(),
            card_rarity: Some(rarity.to_string()),
            card_name: name.map(str::to_string),
            last_price_updt: ts.to_string(),
            scrape_success: true,
            prices: PriceFields {
                tcg_price: Some(1.0),
                ..PriceFields::default()
            },
            ..PriceDocument::default()
        }
    }

    #[tokio::test]
    async fn test_insert_then_find() {
        let db = setup_test_db().await;
        let d = doc("BLTR-EN051", "Secret Rare", Some("Foo"), "2026-01-01T00:00:00.000Z");

        let outcome = replace_one(db.pool(), &PriceFilter::identity_of(&d), &d)
            .await
            .expect("insert");
        assert_eq!(outcome, ReplaceOutcome::Inserted);

        let found = find_one(db.pool(), &PriceFilter::new("bltr-en051"))
            .await
            .expect("find")
            .expect("document present");
        assert_eq!(found, d);
    }

    #[tokio::test]
    async fn test_blank_name_does_not_erase() {
        let db = setup_test_db().await;
        let first = doc("X", "R", Some("Foo"), "2026-01-01T00:00:00.000Z");
        replace_one(db.pool(), &PriceFilter::identity_of(&first), &first)
            .await
            .expect("insert");

        let second = doc("X", "R", None, "2026-01-02T00:00:00.000Z");
        let outcome = replace_one(db.pool(), &PriceFilter::identity_of(&second), &second)
            .await
            .expect("replace");
        assert_eq!(outcome, ReplaceOutcome::Replaced);

        let found = find_one(db.pool(), &PriceFilter::new("X"))
            .await
            .expect("find")
            .expect("document present");
        assert_eq!(found.card_name.as_deref(), Some("Foo"));
        assert_eq!(found.last_price_updt, "2026-01-02T00:00:00.000Z");

        assert_eq!(count(db.pool(), &CountFilter::default()).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_replace_overwrites_prices() {
        let db = setup_test_db().await;
        let first = doc("X", "R", None, "2026-01-01T00:00:00.000Z");
        replace_one(db.pool(), &PriceFilter::identity_of(&first), &first)
            .await
            .expect("insert");

        let mut failed = doc("X", "R", None, "2026-01-02T00:00:00.000Z");
        failed.prices = PriceFields::default();
        failed.scrape_success = false;
        failed.error_message = Some("no prices".to_string());
        replace_one(db.pool(), &PriceFilter::identity_of(&failed), &failed)
            .await
            .expect("replace");

        let found = find_one(db.pool(), &PriceFilter::new("X"))
            .await
            .expect("find")
            .expect("document present");
        assert!(found.prices.is_empty());
        assert!(!found.scrape_success);
    }

    #[tokio::test]
    async fn test_find_prefers_newest_and_contains_rarity() {
        let db = setup_test_db().await;
        for d in [
            doc("X", "Ultra Rare", Some("A"), "2026-01-01T00:00:00.000Z"),
            doc("X", "Quarter Century Secret Rare", Some("B"), "2026-01-03T00:00:00.000Z"),
            doc("X", "Secret Rare", Some("C"), "2026-01-02T00:00:00.000Z"),
        ] {
            replace_one(db.pool(), &PriceFilter::identity_of(&d), &d)
                .await
                .expect("insert");
        }

        let newest = find_one(db.pool(), &PriceFilter::new("X"))
            .await
            .expect("find")
            .expect("document present");
        assert_eq!(newest.card_name.as_deref(), Some("B"));

        let ultra = find_one(
            db.pool(),
            &PriceFilter::new("X").with_rarity(FieldMatch::Contains("ultra rare".to_string())),
        )
        .await
        .expect("find")
        .expect("document present");
        assert_eq!(ultra.card_name.as_deref(), Some("A"));

        let none = find_one(
            db.pool(),
            &PriceFilter::new("X").with_art_variant(FieldMatch::Exact("7th".to_string())),
        )
        .await
        .expect("find");
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_count_filters() {
        let db = setup_test_db().await;
        let ok = doc("A", "R", None, "2026-01-05T00:00:00.000Z");
        let mut failed = doc("B", "R", None, "2026-01-01T00:00:00.000Z");
        failed.scrape_success = false;
        for d in [&ok, &failed] {
            replace_one(db.pool(), &PriceFilter::identity_of(d), d)
                .await
                .expect("insert");
        }

        let cutoff = crate::document::parse_timestamp("2026-01-03T00:00:00Z");
        let recent = CountFilter {
            updated_after: cutoff,
            scrape_success: None,
        };
        let successful = CountFilter {
            updated_after: None,
            scrape_success: Some(true),
        };
        assert_eq!(count(db.pool(), &CountFilter::default()).await.expect("count"), 2);
        assert_eq!(count(db.pool(), &recent).await.expect("count"), 1);
        assert_eq!(count(db.pool(), &successful).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_plain_art_does_not_replace_variant() {
        let db = setup_test_db().await;
        let mut seventh = doc("LOB-005", "Secret Rare", None, "2026-01-01T00:00:00.000Z");
        seventh.card_art_variant = Some("7th".to_string());
        seventh.prices.tcg_price = Some(300.0);
        replace_one(db.pool(), &PriceFilter::identity_of(&seventh), &seventh)
            .await
            .expect("insert variant");

        let plain = doc("LOB-005", "Secret Rare", None, "2026-01-02T00:00:00.000Z");
        let outcome = replace_one(db.pool(), &PriceFilter::identity_of(&plain), &plain)
            .await
            .expect("insert plain");
        assert_eq!(outcome, ReplaceOutcome::Inserted);

        let found = find_one(
            db.pool(),
            &PriceFilter::new("LOB-005").with_art_variant(FieldMatch::Exact("7th".to_string())),
        )
        .await
        .expect("find")
        .expect("variant present");
        assert_eq!(found.prices.tcg_price, Some(300.0));
        assert_eq!(count(db.pool(), &CountFilter::default()).await.expect("count"), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_keep_one_record() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let db = Database::new(tmp.path().join("prices.db"), 5)
            .await
            .expect("create database");
        db.run_migrations().await.expect("run migrations");

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    let mut d = doc(
                        "BLTR-EN051",
                        "Secret Rare",
                        None,
                        &format!("2026-01-01T00:00:{i:02}.000Z"),
                    );
                    d.prices.tcg_price = Some(f64::from(i));
                    replace_one(db.pool(), &PriceFilter::identity_of(&d), &d).await
                })
            })
            .collect();

        let mut inserted = 0;
        for writer in writers {
            let outcome = writer.await.expect("join writer").expect("upsert");
            if outcome == ReplaceOutcome::Inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(count(db.pool(), &CountFilter::default()).await.expect("count"), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_rejects_blank_card_number() {
        let db = setup_test_db().await;
        let d = doc(" ", "R", None, "2026-01-01T00:00:00.000Z");
        assert!(replace_one(db.pool(), &PriceFilter::identity_of(&d), &d)
            .await
            .is_err());
    }
}
