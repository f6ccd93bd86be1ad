//! Stock symbol search, feeding the add-position and watchlist forms.

use crate::{ApiResponse, AppError, AppState};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use portfolio_store::StockSymbol;
use serde::Deserialize;

const SEARCH_LIMIT: i64 = 10;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/stocks/search", get(search))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<StockSymbol>>>, AppError> {
    let q = query.q.unwrap_or_default();
    let q = q.trim();

    // An empty query is a valid request with no matches.
    if q.is_empty() {
        return Ok(Json(ApiResponse::success(Vec::new())));
    }

    let results = state.symbols.search(q, SEARCH_LIMIT).await?;
    Ok(Json(ApiResponse::success(results)))
}
