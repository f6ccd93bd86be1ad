//! Watchlist endpoints with price-alert evaluation.

use crate::auth::CurrentUser;
use crate::{ApiResponse, AppError, AppState};
use axum::http::StatusCode;
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use credentials::validate::is_valid_symbol;
use portfolio_core::valuation::alert_triggered;
use portfolio_store::activity::log_activity;
use portfolio_store::{NewWatchlistItem, WatchlistUpdate, WatchlistWithQuote};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AddWatchlistRequest {
    pub symbol: String,
    pub name: Option<String>,
    pub target_price: Option<f64>,
    pub alert_type: Option<String>,
    pub notes: Option<String>,
    pub current_price: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateWatchlistRequest {
    pub target_price: Option<f64>,
    pub alert_type: Option<String>,
    pub notes: Option<String>,
}

/// A watchlist row with its alert state evaluated against the latest quote.
#[derive(Serialize)]
pub struct WatchlistView {
    #[serde(flatten)]
    pub item: WatchlistWithQuote,
    pub alert_triggered: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/watchlist", get(get_watchlist).post(add_item))
        .route("/api/watchlist/:id", put(update_item).delete(delete_item))
}

fn validate_alert_type(alert_type: &str) -> Result<(), AppError> {
    match alert_type {
        "above" | "below" => Ok(()),
        _ => Err(AppError::Validation(
            "Alert type must be 'above' or 'below'".to_string(),
        )),
    }
}

fn evaluate(item: WatchlistWithQuote) -> WatchlistView {
    // No quote yet means no alert, whatever the target.
    let triggered = item
        .current_price
        .map(|price| alert_triggered(price, item.target_price, &item.alert_type))
        .unwrap_or(false);
    WatchlistView {
        item,
        alert_triggered: triggered,
    }
}

async fn get_watchlist(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<WatchlistView>>>, AppError> {
    let items = state.watchlist.list(user_id).await?;
    let views = items.into_iter().map(evaluate).collect();

    Ok(Json(ApiResponse::success(views)))
}

async fn add_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<AddWatchlistRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), AppError> {
    let symbol = req.symbol.trim().to_uppercase();

    if !is_valid_symbol(&symbol) {
        return Err(AppError::Validation(
            "Symbol must be 1-5 uppercase letters".to_string(),
        ));
    }
    let alert_type = req.alert_type.unwrap_or_else(|| "above".to_string());
    validate_alert_type(&alert_type)?;

    if state.watchlist.contains(user_id, &symbol).await? {
        return Err(AppError::Conflict(
            "Symbol is already on the watchlist".to_string(),
        ));
    }

    let id = state
        .watchlist
        .add(
            user_id,
            NewWatchlistItem {
                symbol: symbol.clone(),
                name: req.name.unwrap_or_else(|| symbol.clone()),
                target_price: req.target_price,
                alert_type,
                notes: req.notes,
            },
        )
        .await?;

    if let Some(price) = req.current_price {
        state.prices.upsert(&symbol, price).await?;
    }
    log_activity(
        state.db.pool(),
        user_id,
        "watchlist_add",
        &format!("Added {} to watchlist", symbol),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(serde_json::json!({
            "id": id,
            "message": "Symbol added to watchlist"
        }))),
    ))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateWatchlistRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    // Absent fields keep their stored values.
    let existing = state
        .watchlist
        .get(id, user_id)
        .await?
        .ok_or(AppError::NotFound("Watchlist item not found"))?;

    let alert_type = match req.alert_type {
        Some(alert_type) => {
            validate_alert_type(&alert_type)?;
            alert_type
        }
        None => existing.alert_type,
    };

    let updated = state
        .watchlist
        .update(
            id,
            user_id,
            WatchlistUpdate {
                target_price: req.target_price.or(existing.target_price),
                alert_type,
                notes: req.notes.or(existing.notes),
            },
        )
        .await?;
    if !updated {
        return Err(AppError::NotFound("Watchlist item not found"));
    }
    log_activity(
        state.db.pool(),
        user_id,
        "watchlist_update",
        &format!("Updated watchlist item {}", id),
    )
    .await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Watchlist item updated"
    }))))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let deleted = state.watchlist.soft_delete(id, user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Watchlist item not found"));
    }
    log_activity(
        state.db.pool(),
        user_id,
        "watchlist_delete",
        &format!("Removed watchlist item {}", id),
    )
    .await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Symbol removed from watchlist"
    }))))
}
