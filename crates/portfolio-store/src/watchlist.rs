use crate::db::{now_utc, PortfolioDb};
use crate::models::{NewWatchlistItem, WatchlistUpdate, WatchlistWithQuote};
use anyhow::Result;

#[derive(Clone)]
pub struct WatchlistStore {
    db: PortfolioDb,
}

impl WatchlistStore {
    pub fn new(db: PortfolioDb) -> Self {
        Self { db }
    }

    /// Whether the user already tracks this symbol.
    pub async fn contains(&self, user_id: i64, symbol: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM watchlist WHERE user_id = ? AND symbol = ? AND is_active = 1",
        )
        .bind(user_id)
        .bind(symbol)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.is_some())
    }

    pub async fn add(&self, user_id: i64, item: NewWatchlistItem) -> Result<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO watchlist (user_id, symbol, name, target_price, alert_type, notes, created_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&item.symbol)
        .bind(&item.name)
        .bind(item.target_price)
        .bind(&item.alert_type)
        .bind(&item.notes)
        .bind(now_utc())
        .fetch_one(self.db.pool())
        .await?;

        Ok(id)
    }

    /// All active watchlist rows for a user, newest first, joined with the
    /// shared price cache.
    pub async fn list(&self, user_id: i64) -> Result<Vec<WatchlistWithQuote>> {
        let items = sqlx::query_as::<_, WatchlistWithQuote>(
            r#"
            SELECT w.id, w.user_id, w.symbol, w.name, w.target_price, w.alert_type, w.notes, w.created_at,
                   s.current_price, s.day_change, s.day_change_percent, s.updated_at AS price_updated
            FROM watchlist w
            LEFT JOIN stock_prices s ON w.symbol = s.symbol
            WHERE w.user_id = ? AND w.is_active = 1
            ORDER BY w.created_at DESC, w.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(items)
    }

    /// One active watchlist row by id, scoped to its owner.
    pub async fn get(&self, id: i64, user_id: i64) -> Result<Option<WatchlistWithQuote>> {
        let item = sqlx::query_as::<_, WatchlistWithQuote>(
            r#"
            SELECT w.id, w.user_id, w.symbol, w.name, w.target_price, w.alert_type, w.notes, w.created_at,
                   s.current_price, s.day_change, s.day_change_percent, s.updated_at AS price_updated
            FROM watchlist w
            LEFT JOIN stock_prices s ON w.symbol = s.symbol
            WHERE w.id = ? AND w.user_id = ? AND w.is_active = 1
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(item)
    }

    /// Update alert settings. Returns false when the row does not exist or
    /// belongs to another user.
    pub async fn update(&self, id: i64, user_id: i64, update: WatchlistUpdate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE watchlist
            SET target_price = ?, alert_type = ?, notes = ?, updated_at = ?
            WHERE id = ? AND user_id = ? AND is_active = 1
            "#,
        )
        .bind(update.target_price)
        .bind(&update.alert_type)
        .bind(&update.notes)
        .bind(now_utc())
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a watchlist row. Returns false when the row does not exist
    /// or belongs to another user.
    pub async fn soft_delete(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE watchlist SET is_active = 0, updated_at = ? WHERE id = ? AND user_id = ? AND is_active = 1",
        )
        .bind(now_utc())
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
