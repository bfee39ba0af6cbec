use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{error::AppResult, models::Movie, routes::AppState};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Handler for browsing the local catalog
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let limit = params
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let movies = state.store.list_movies(limit, offset).await?;
    Ok(Json(movies))
}
