//! Analytics endpoint.
//!
//! Sector allocation and top performers come from real portfolio rows; the
//! performance series and risk metrics are simulated, and the response says
//! so.

use crate::auth::CurrentUser;
use crate::{ApiResponse, AppError, AppState};
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use portfolio_core::analytics::{
    sector_allocation, simulated_performance, top_performers, Period, PerformancePoint,
    RiskMetrics, SectorSlice, TopPerformer,
};
use portfolio_core::valuation::{summarize, value_position, Quote};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_VALUE: f64 = 100_000.0;
const TOP_PERFORMER_LIMIT: usize = 5;

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyticsView {
    pub period: String,
    pub performance: Vec<PerformancePoint>,
    pub sectors: Vec<SectorSlice>,
    pub risk_metrics: RiskMetrics,
    pub top_performers: Vec<TopPerformer>,
    pub simulated: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/analytics", get(get_analytics))
}

async fn get_analytics(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<AnalyticsView>>, AppError> {
    let period = match query.period.as_deref() {
        None => Period::OneMonth,
        Some(raw) => Period::from_str(raw).ok_or_else(|| {
            AppError::Validation("Period must be one of 1M, 3M, 6M, 1Y, 2Y".to_string())
        })?,
    };

    let rows = state.positions.list(user_id).await?;

    let mut metrics = Vec::with_capacity(rows.len());
    let mut sectors = Vec::with_capacity(rows.len());
    let mut performers = Vec::with_capacity(rows.len());
    for row in &rows {
        let quote = Quote {
            current_price: row.current_price.unwrap_or(row.avg_price),
            day_change: row.day_change.unwrap_or(0.0),
        };
        let m = value_position(row.shares, row.avg_price, quote);
        sectors.push((row.sector.as_str(), m.current_value));
        performers.push(TopPerformer {
            symbol: row.symbol.clone(),
            name: row.name.clone(),
            gain_loss_percent: m.gain_loss_percent,
        });
        metrics.push(m);
    }

    let totals = summarize(metrics.iter());
    let base_value = if totals.total_value > 0.0 {
        totals.total_value
    } else {
        DEFAULT_BASE_VALUE
    };

    let today = chrono::Utc::now().date_naive();
    let performance =
        simulated_performance(period, today, base_value, &mut rand::thread_rng());

    Ok(Json(ApiResponse::success(AnalyticsView {
        period: period.to_string(),
        performance,
        sectors: sector_allocation(sectors),
        risk_metrics: RiskMetrics::placeholder(),
        top_performers: top_performers(performers, TOP_PERFORMER_LIMIT),
        simulated: true,
    })))
}
