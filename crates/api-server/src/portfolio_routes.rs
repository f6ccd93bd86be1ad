//! Portfolio endpoints: valued position listing plus lot add, update, and
//! soft delete.

use crate::auth::CurrentUser;
use crate::{ApiResponse, AppError, AppState};
use axum::http::StatusCode;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use credentials::validate::is_valid_symbol;
use portfolio_core::valuation::{summarize, value_position, PositionMetrics, PortfolioTotals, Quote};
use portfolio_store::activity::log_activity;
use portfolio_store::{NewPosition, PositionUpdate, PositionWithQuote};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AddPositionRequest {
    pub symbol: String,
    pub name: Option<String>,
    pub shares: f64,
    pub avg_price: f64,
    pub sector: Option<String>,
    pub purchase_date: Option<String>,
    pub current_price: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdatePositionRequest {
    pub shares: f64,
    pub avg_price: f64,
    pub sector: Option<String>,
    pub current_price: Option<f64>,
}

/// A stored position with its derived valuation figures.
#[derive(Serialize)]
pub struct PositionView {
    #[serde(flatten)]
    pub position: PositionWithQuote,
    #[serde(flatten)]
    pub metrics: PositionMetrics,
}

#[derive(Serialize)]
pub struct PortfolioView {
    pub positions: Vec<PositionView>,
    pub summary: PortfolioTotals,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/portfolio", get(get_portfolio))
        .route("/api/portfolio/positions", post(add_position))
        .route(
            "/api/portfolio/positions/:id",
            put(update_position).delete(delete_position),
        )
}

/// Value one stored row. Unknown quotes fall back to the average price so a
/// freshly added position reports zero gain rather than a total loss.
fn value_row(row: PositionWithQuote) -> PositionView {
    let quote = Quote {
        current_price: row.current_price.unwrap_or(row.avg_price),
        day_change: row.day_change.unwrap_or(0.0),
    };
    let metrics = value_position(row.shares, row.avg_price, quote);
    PositionView {
        position: row,
        metrics,
    }
}

async fn get_portfolio(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<PortfolioView>>, AppError> {
    let rows = state.positions.list(user_id).await?;
    let positions: Vec<PositionView> = rows.into_iter().map(value_row).collect();
    let summary = summarize(positions.iter().map(|p| &p.metrics));

    Ok(Json(ApiResponse::success(PortfolioView {
        positions,
        summary,
    })))
}

async fn add_position(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<AddPositionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), AppError> {
    let symbol = req.symbol.trim().to_uppercase();

    if !is_valid_symbol(&symbol) {
        return Err(AppError::Validation(
            "Symbol must be 1-5 uppercase letters".to_string(),
        ));
    }
    if req.shares <= 0.0 || req.avg_price <= 0.0 {
        return Err(AppError::Validation(
            "Shares and average price must be positive".to_string(),
        ));
    }

    let id = state
        .positions
        .add_lot(
            user_id,
            NewPosition {
                symbol: symbol.clone(),
                name: req.name.unwrap_or_else(|| symbol.clone()),
                shares: req.shares,
                avg_price: req.avg_price,
                sector: req.sector.unwrap_or_else(|| "Other".to_string()),
                purchase_date: req
                    .purchase_date
                    .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string()),
            },
        )
        .await?;

    if let Some(price) = req.current_price {
        state.prices.upsert(&symbol, price).await?;
    }
    log_activity(
        state.db.pool(),
        user_id,
        "position_add",
        &format!("Added {} shares of {}", req.shares, symbol),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(serde_json::json!({
            "id": id,
            "message": "Position added successfully"
        }))),
    ))
}

async fn update_position(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePositionRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if req.shares <= 0.0 || req.avg_price <= 0.0 {
        return Err(AppError::Validation(
            "Shares and average price must be positive".to_string(),
        ));
    }

    let existing = state
        .positions
        .get(id, user_id)
        .await?
        .ok_or(AppError::NotFound("Position not found"))?;

    let updated = state
        .positions
        .update(
            id,
            user_id,
            PositionUpdate {
                shares: req.shares,
                avg_price: req.avg_price,
                sector: req.sector.unwrap_or(existing.sector),
            },
        )
        .await?;
    if !updated {
        return Err(AppError::NotFound("Position not found"));
    }

    if let Some(price) = req.current_price {
        state.prices.upsert(&existing.symbol, price).await?;
    }
    log_activity(
        state.db.pool(),
        user_id,
        "position_update",
        &format!("Updated position {}", existing.symbol),
    )
    .await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Position updated successfully"
    }))))
}

async fn delete_position(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let deleted = state.positions.soft_delete(id, user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Position not found"));
    }
    log_activity(
        state.db.pool(),
        user_id,
        "position_delete",
        &format!("Removed position {}", id),
    )
    .await;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "message": "Position removed successfully"
    }))))
}
