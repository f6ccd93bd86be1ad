use crate::db::now_utc;
use sqlx::SqlitePool;

/// Record a user action in the activity log.
///
/// Best effort: a failed write is logged and swallowed so it never fails the
/// request that triggered it.
pub async fn log_activity(pool: &SqlitePool, user_id: i64, action: &str, details: &str) {
    let result = sqlx::query(
        "INSERT INTO activity_log (user_id, action, details, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(action)
    .bind(details)
    .bind(now_utc())
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!("Failed to write activity log ({}): {}", action, e);
    }
}
