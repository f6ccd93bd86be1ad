use crate::db::{now_utc, PortfolioDb};
use crate::models::{NewPosition, PositionUpdate, PositionWithQuote};
use anyhow::Result;

#[derive(Clone)]
pub struct PositionStore {
    db: PortfolioDb,
}

impl PositionStore {
    pub fn new(db: PortfolioDb) -> Self {
        Self { db }
    }

    /// Add a lot to the user's portfolio.
    ///
    /// If an active position already exists for (user, symbol), the lot is
    /// merged into it: shares are summed and the average price is re-weighted
    /// by total cost. The whole merge is a single upsert against the partial
    /// unique index, so two concurrent adds for the same symbol cannot lose
    /// an update.
    pub async fn add_lot(&self, user_id: i64, position: NewPosition) -> Result<i64> {
        let now = now_utc();
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO portfolio (user_id, symbol, name, shares, avg_price, sector, purchase_date, created_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(user_id, symbol) WHERE is_active = 1 DO UPDATE SET
                shares = portfolio.shares + excluded.shares,
                avg_price = ((portfolio.shares * portfolio.avg_price) + (excluded.shares * excluded.avg_price))
                            / (portfolio.shares + excluded.shares),
                updated_at = excluded.created_at
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&position.symbol)
        .bind(&position.name)
        .bind(position.shares)
        .bind(position.avg_price)
        .bind(&position.sector)
        .bind(&position.purchase_date)
        .bind(&now)
        .fetch_one(self.db.pool())
        .await?;

        Ok(id)
    }

    /// All active positions for a user, joined with the shared price cache.
    pub async fn list(&self, user_id: i64) -> Result<Vec<PositionWithQuote>> {
        let positions = sqlx::query_as::<_, PositionWithQuote>(
            r#"
            SELECT p.id, p.user_id, p.symbol, p.name, p.shares, p.avg_price, p.sector, p.purchase_date,
                   s.current_price, s.day_change, s.day_change_percent, s.updated_at AS price_updated
            FROM portfolio p
            LEFT JOIN stock_prices s ON p.symbol = s.symbol
            WHERE p.user_id = ? AND p.is_active = 1
            ORDER BY p.symbol
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(positions)
    }

    /// One active position by id, scoped to its owner.
    pub async fn get(&self, id: i64, user_id: i64) -> Result<Option<PositionWithQuote>> {
        let position = sqlx::query_as::<_, PositionWithQuote>(
            r#"
            SELECT p.id, p.user_id, p.symbol, p.name, p.shares, p.avg_price, p.sector, p.purchase_date,
                   s.current_price, s.day_change, s.day_change_percent, s.updated_at AS price_updated
            FROM portfolio p
            LEFT JOIN stock_prices s ON p.symbol = s.symbol
            WHERE p.id = ? AND p.user_id = ? AND p.is_active = 1
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(position)
    }

    /// Overwrite a position's shares, average price, and sector. Returns
    /// false when the row does not exist or belongs to another user.
    pub async fn update(&self, id: i64, user_id: i64, update: PositionUpdate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE portfolio
            SET shares = ?, avg_price = ?, sector = ?, updated_at = ?
            WHERE id = ? AND user_id = ? AND is_active = 1
            "#,
        )
        .bind(update.shares)
        .bind(update.avg_price)
        .bind(&update.sector)
        .bind(now_utc())
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a position. Returns false when the row does not exist or
    /// belongs to another user.
    pub async fn soft_delete(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE portfolio SET is_active = 0, updated_at = ? WHERE id = ? AND user_id = ? AND is_active = 1",
        )
        .bind(now_utc())
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(symbol: &str, shares: f64, avg_price: f64) -> NewPosition {
        NewPosition {
            symbol: symbol.to_string(),
            name: format!("{} Inc.", symbol),
            shares,
            avg_price,
            sector: "Technology".to_string(),
            purchase_date: "2025-01-15".to_string(),
        }
    }

    async fn setup() -> (PositionStore, i64) {
        let db = PortfolioDb::new("sqlite::memory:").await.unwrap();
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password_hash, created_at)
             VALUES ('Test', 'User', 't@example.com', 'x', '2025-01-01 00:00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        (PositionStore::new(db), 1)
    }

    #[tokio::test]
    async fn add_and_list_position() {
        let (store, user_id) = setup().await;

        let id = store.add_lot(user_id, lot("AAPL", 10.0, 150.0)).await.unwrap();
        assert!(id > 0);

        let positions = store.list(user_id).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].symbol, "AAPL");
        assert!(positions[0].current_price.is_none());
    }

    #[tokio::test]
    async fn repeat_lot_merges_by_weighted_average() {
        let (store, user_id) = setup().await;

        let first = store.add_lot(user_id, lot("AAPL", 100.0, 150.0)).await.unwrap();
        let second = store.add_lot(user_id, lot("AAPL", 50.0, 180.0)).await.unwrap();
        assert_eq!(first, second);

        let positions = store.list(user_id).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert!((positions[0].shares - 150.0).abs() < 1e-9);
        assert!((positions[0].avg_price - 160.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn new_symbol_does_not_touch_other_rows() {
        let (store, user_id) = setup().await;

        store.add_lot(user_id, lot("AAPL", 10.0, 150.0)).await.unwrap();
        store.add_lot(user_id, lot("MSFT", 5.0, 400.0)).await.unwrap();

        let positions = store.list(user_id).await.unwrap();
        assert_eq!(positions.len(), 2);
        let aapl = positions.iter().find(|p| p.symbol == "AAPL").unwrap();
        assert!((aapl.shares - 10.0).abs() < 1e-9);
        assert!((aapl.avg_price - 150.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn concurrent_lots_for_same_symbol_all_land() {
        let (store, user_id) = setup().await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add_lot(user_id, lot("NVDA", 10.0, 100.0)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let positions = store.list(user_id).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert!((positions[0].shares - 80.0).abs() < 1e-9);
        assert!((positions[0].avg_price - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn positions_are_scoped_per_user() {
        let (store, user_id) = setup().await;
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password_hash, created_at)
             VALUES ('Other', 'User', 'o@example.com', 'x', '2025-01-01 00:00:00')",
        )
        .execute(store.db.pool())
        .await
        .unwrap();
        let other_user = 2;

        store.add_lot(user_id, lot("AAPL", 10.0, 150.0)).await.unwrap();
        store.add_lot(other_user, lot("AAPL", 3.0, 99.0)).await.unwrap();

        let mine = store.list(user_id).await.unwrap();
        let theirs = store.list(other_user).await.unwrap();
        assert!((mine[0].shares - 10.0).abs() < 1e-9);
        assert!((theirs[0].shares - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn soft_delete_hides_row_and_frees_symbol() {
        let (store, user_id) = setup().await;

        let id = store.add_lot(user_id, lot("AAPL", 10.0, 150.0)).await.unwrap();
        assert!(store.soft_delete(id, user_id).await.unwrap());
        assert!(store.list(user_id).await.unwrap().is_empty());
        assert!(store.get(id, user_id).await.unwrap().is_none());

        // Re-adding after a soft delete starts a fresh position.
        store.add_lot(user_id, lot("AAPL", 5.0, 200.0)).await.unwrap();
        let positions = store.list(user_id).await.unwrap();
        assert!((positions[0].shares - 5.0).abs() < 1e-9);
        assert!((positions[0].avg_price - 200.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn update_rejects_foreign_rows() {
        let (store, user_id) = setup().await;
        let id = store.add_lot(user_id, lot("AAPL", 10.0, 150.0)).await.unwrap();

        let update = PositionUpdate {
            shares: 20.0,
            avg_price: 140.0,
            sector: "Technology".to_string(),
        };
        assert!(!store.update(id, 999, update.clone()).await.unwrap());
        assert!(store.update(id, user_id, update).await.unwrap());

        let positions = store.list(user_id).await.unwrap();
        assert!((positions[0].shares - 20.0).abs() < 1e-9);
    }
}
