use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{TimeWindow, TmdbMovieDetails, TmdbPage},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    time_window: Option<String>,
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
}

fn page_or_first(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

/// Handler for trending movies
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingQuery>,
) -> AppResult<Json<TmdbPage>> {
    let window = match params.time_window.as_deref() {
        Some(raw) => raw.parse::<TimeWindow>()?,
        None => TimeWindow::default(),
    };

    let page = state
        .metadata
        .trending(window, page_or_first(params.page))
        .await?;
    Ok(Json(page))
}

/// Handler for movie title search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<TmdbPage>> {
    if params.query.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Query parameter is required".to_string(),
        ));
    }

    let page = state
        .metadata
        .search(&params.query, page_or_first(params.page))
        .await?;
    Ok(Json(page))
}

/// Handler for movie details
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<i64>,
) -> AppResult<Json<TmdbMovieDetails>> {
    let details = state.metadata.movie_details(tmdb_id).await?;
    Ok(Json(details))
}

/// Handler for the provider's "more like this" list
pub async fn similar(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<TmdbPage>> {
    let page = state
        .metadata
        .similar_movies(tmdb_id, page_or_first(params.page))
        .await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_to_first() {
        assert_eq!(page_or_first(None), 1);
        assert_eq!(page_or_first(Some(0)), 1);
        assert_eq!(page_or_first(Some(4)), 4);
    }
}
