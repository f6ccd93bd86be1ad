use crate::db::{now_utc, PortfolioDb};
use crate::models::PriceEntry;
use anyhow::Result;

/// Shared symbol price cache. Not user-scoped; last write wins.
#[derive(Clone)]
pub struct PriceStore {
    db: PortfolioDb,
}

impl PriceStore {
    pub fn new(db: PortfolioDb) -> Self {
        Self { db }
    }

    /// Record the latest price for a symbol, leaving any known day-change
    /// figures in place. Called opportunistically on position and watchlist
    /// writes.
    pub async fn upsert(&self, symbol: &str, current_price: f64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_prices (symbol, current_price, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(symbol) DO UPDATE SET
                current_price = excluded.current_price,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(symbol)
        .bind(current_price)
        .bind(now_utc())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Record a full quote including day-change figures.
    pub async fn upsert_quote(
        &self,
        symbol: &str,
        current_price: f64,
        day_change: f64,
        day_change_percent: f64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_prices (symbol, current_price, day_change, day_change_percent, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(symbol) DO UPDATE SET
                current_price = excluded.current_price,
                day_change = excluded.day_change,
                day_change_percent = excluded.day_change_percent,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(symbol)
        .bind(current_price)
        .bind(day_change)
        .bind(day_change_percent)
        .bind(now_utc())
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn get(&self, symbol: &str) -> Result<Option<PriceEntry>> {
        let entry = sqlx::query_as::<_, PriceEntry>("SELECT * FROM stock_prices WHERE symbol = ?")
            .bind(symbol)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(entry)
    }
}
