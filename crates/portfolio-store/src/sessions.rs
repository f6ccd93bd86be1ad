use crate::db::{now_utc, utc_after_secs, PortfolioDb};
use crate::models::Session;
use anyhow::Result;
use credentials::generate_token;

#[derive(Clone)]
pub struct SessionStore {
    db: PortfolioDb,
}

impl SessionStore {
    pub fn new(db: PortfolioDb) -> Self {
        Self { db }
    }

    /// Issue a fresh session for a user with an absolute expiry `ttl_secs`
    /// from now.
    pub async fn create(&self, user_id: i64, ttl_secs: i64) -> Result<Session> {
        self.insert(user_id, generate_token(), utc_after_secs(ttl_secs))
            .await
    }

    /// Insert a session row with an explicit token and expiry.
    pub async fn insert(&self, user_id: i64, token: String, expires_at: String) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO user_sessions (user_id, token, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&token)
        .bind(&expires_at)
        .bind(now_utc())
        .fetch_one(self.db.pool())
        .await?;

        Ok(session)
    }

    /// Resolve a token to its user id. Accepts only tokens that exist and
    /// whose expiry is strictly in the future.
    pub async fn verify(&self, token: &str) -> Result<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM user_sessions WHERE token = ? AND expires_at > ?")
                .bind(token)
                .bind(now_utc())
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(|(user_id,)| user_id))
    }

    /// Delete a session (logout). Returns whether a row was removed.
    pub async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE token = ?")
            .bind(token)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace a session: the old token is deleted and a new one issued, so a
    /// leaked token stops working at the next refresh.
    pub async fn rotate(&self, old_token: &str, user_id: i64, ttl_secs: i64) -> Result<Session> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM user_sessions WHERE token = ?")
            .bind(old_token)
            .execute(&mut *tx)
            .await?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO user_sessions (user_id, token, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(generate_token())
        .bind(utc_after_secs(ttl_secs))
        .bind(now_utc())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(session)
    }

    /// Drop expired sessions. Called periodically by a background task.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= ?")
            .bind(now_utc())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::utc_after_secs;

    async fn setup() -> (SessionStore, i64) {
        let db = PortfolioDb::new("sqlite::memory:").await.unwrap();
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password_hash, created_at)
             VALUES ('Test', 'User', 't@example.com', 'x', '2025-01-01 00:00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        (SessionStore::new(db), 1)
    }

    #[tokio::test]
    async fn create_verify_delete_roundtrip() {
        let (store, user_id) = setup().await;

        let session = store.create(user_id, 3600).await.unwrap();
        assert_eq!(session.token.len(), 64);

        assert_eq!(store.verify(&session.token).await.unwrap(), Some(user_id));

        assert!(store.delete(&session.token).await.unwrap());
        assert_eq!(store.verify(&session.token).await.unwrap(), None);
        assert!(!store.delete(&session.token).await.unwrap());
    }

    #[tokio::test]
    async fn expiry_is_strict() {
        let (store, user_id) = setup().await;

        // Expiry exactly now: rejected. Strictly in the future: accepted.
        let expired = store
            .insert(user_id, "a".repeat(64), now_utc())
            .await
            .unwrap();
        let live = store
            .insert(user_id, "b".repeat(64), utc_after_secs(5))
            .await
            .unwrap();
        let long_gone = store
            .insert(user_id, "c".repeat(64), utc_after_secs(-3600))
            .await
            .unwrap();

        assert_eq!(store.verify(&expired.token).await.unwrap(), None);
        assert_eq!(store.verify(&live.token).await.unwrap(), Some(user_id));
        assert_eq!(store.verify(&long_gone.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let (store, _) = setup().await;
        assert_eq!(store.verify("no-such-token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rotate_invalidates_old_token() {
        let (store, user_id) = setup().await;

        let original = store.create(user_id, 3600).await.unwrap();
        let rotated = store.rotate(&original.token, user_id, 3600).await.unwrap();

        assert_ne!(original.token, rotated.token);
        assert_eq!(store.verify(&original.token).await.unwrap(), None);
        assert_eq!(store.verify(&rotated.token).await.unwrap(), Some(user_id));
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rows() {
        let (store, user_id) = setup().await;

        store
            .insert(user_id, "a".repeat(64), utc_after_secs(-10))
            .await
            .unwrap();
        store
            .insert(user_id, "b".repeat(64), utc_after_secs(3600))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.verify(&"b".repeat(64)).await.unwrap(), Some(user_id));
    }
}
