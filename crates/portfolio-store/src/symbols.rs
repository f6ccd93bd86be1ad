use crate::db::PortfolioDb;
use crate::models::StockSymbol;
use anyhow::Result;

/// Symbol directory backing stock search. Seeded by `schema.sql`; not
/// user-scoped.
#[derive(Clone)]
pub struct SymbolStore {
    db: PortfolioDb,
}

impl SymbolStore {
    pub fn new(db: PortfolioDb) -> Self {
        Self { db }
    }

    /// Substring match on ticker or company name, ordered by ticker.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<StockSymbol>> {
        let pattern = format!("%{}%", query);
        let results = sqlx::query_as::<_, StockSymbol>(
            r#"
            SELECT symbol, name FROM stock_symbols
            WHERE symbol LIKE ? OR name LIKE ?
            ORDER BY symbol
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> SymbolStore {
        let db = PortfolioDb::new("sqlite::memory:").await.unwrap();
        SymbolStore::new(db)
    }

    #[tokio::test]
    async fn matches_ticker_prefix() {
        let store = setup().await;

        let results = store.search("AAP", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn matches_company_name_case_insensitively() {
        let store = setup().await;

        let results = store.search("apple", 10).await.unwrap();
        assert!(results.iter().any(|r| r.symbol == "AAPL"));
    }

    #[tokio::test]
    async fn respects_the_limit() {
        let store = setup().await;

        let results = store.search("A", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn unknown_query_returns_nothing() {
        let store = setup().await;
        assert!(store.search("ZZZZZ", 10).await.unwrap().is_empty());
    }
}
