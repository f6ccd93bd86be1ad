use crate::db::{now_utc, PortfolioDb};
use crate::models::{NewUser, User};
use anyhow::Result;

#[derive(Clone)]
pub struct UserStore {
    db: PortfolioDb,
}

impl UserStore {
    pub fn new(db: PortfolioDb) -> Self {
        Self { db }
    }

    /// Insert a new user. Email uniqueness is enforced by the schema; callers
    /// pre-check with [`find_by_email`](Self::find_by_email) to report
    /// conflicts cleanly.
    pub async fn create(&self, user: NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, phone, country, preferences, created_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
            RETURNING *
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.country)
        .bind(&user.preferences)
        .bind(now_utc())
        .fetch_one(self.db.pool())
        .await?;

        Ok(created)
    }

    /// Look up an active user by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? AND is_active = 1")
                .bind(email)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(user)
    }

    /// Look up an active user by id.
    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND is_active = 1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
        country: Option<&str>,
        preferences: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, phone = ?, country = ?, preferences = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(country)
        .bind(preferences)
        .bind(now_utc())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now_utc())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now_utc())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            phone: None,
            country: Some("UK".to_string()),
            preferences: r#"{"notifications":true}"#.to_string(),
        }
    }

    async fn setup() -> UserStore {
        let db = PortfolioDb::new("sqlite::memory:").await.unwrap();
        UserStore::new(db)
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let store = setup().await;

        let created = store.create(sample_user("ada@example.com")).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.is_active, 1);

        let found = store.find_by_email("ada@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, created.id);

        assert!(store
            .find_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_schema() {
        let store = setup().await;

        store.create(sample_user("dup@example.com")).await.unwrap();
        let second = store.create(sample_user("dup@example.com")).await;

        assert!(second.is_err());
    }

    #[tokio::test]
    async fn profile_update_persists() {
        let store = setup().await;
        let user = store.create(sample_user("ada@example.com")).await.unwrap();

        store
            .update_profile(user.id, "Augusta", "King", Some("+44 1"), None, "{}")
            .await
            .unwrap();

        let updated = store.get(user.id).await.unwrap().unwrap();
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.last_name, "King");
        assert_eq!(updated.phone.as_deref(), Some("+44 1"));
        assert!(updated.updated_at.is_some());
    }
}
