use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub preferences: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub last_login: Option<String>,
    pub is_active: i64,
}

/// Client-facing view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub created_at: String,
    pub last_login: Option<String>,
    pub preferences: serde_json::Value,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let preferences =
            serde_json::from_str(&user.preferences).unwrap_or(serde_json::Value::Null);
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            country: user.country,
            created_at: user.created_at,
            last_login: user.last_login,
            preferences,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub preferences: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewPosition {
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub avg_price: f64,
    pub sector: String,
    pub purchase_date: String,
}

#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub shares: f64,
    pub avg_price: f64,
    pub sector: String,
}

/// Active position joined with its latest quote (if any).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PositionWithQuote {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub name: String,
    pub shares: f64,
    pub avg_price: f64,
    pub sector: String,
    pub purchase_date: String,
    pub current_price: Option<f64>,
    pub day_change: Option<f64>,
    pub day_change_percent: Option<f64>,
    pub price_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PriceEntry {
    pub symbol: String,
    pub current_price: f64,
    pub day_change: f64,
    pub day_change_percent: f64,
    pub updated_at: String,
}

/// Entry in the searchable symbol directory.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockSymbol {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewWatchlistItem {
    pub symbol: String,
    pub name: String,
    pub target_price: Option<f64>,
    pub alert_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WatchlistUpdate {
    pub target_price: Option<f64>,
    pub alert_type: String,
    pub notes: Option<String>,
}

/// Active watchlist row joined with its latest quote (if any).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WatchlistWithQuote {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub name: String,
    pub target_price: Option<f64>,
    pub alert_type: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub current_price: Option<f64>,
    pub day_change: Option<f64>,
    pub day_change_percent: Option<f64>,
    pub price_updated: Option<String>,
}
