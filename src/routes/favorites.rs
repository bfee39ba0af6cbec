use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{FavoriteResponse, Movie, UserId},
    routes::AppState,
};

/// Handler listing a user's favorites
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.favorites.favorites(UserId(user_id)).await?;
    Ok(Json(movies))
}

/// Handler adding a provider movie to a user's favorites
///
/// The movie is imported into the local catalog first, which is how new
/// titles become available to the recommender.
pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, tmdb_id)): Path<(i64, i64)>,
) -> AppResult<Json<FavoriteResponse>> {
    let user = UserId(user_id);

    let details = state.metadata.movie_details(tmdb_id).await?;
    let movie = state.favorites.import_movie(&details).await?;
    let added = state.favorites.add_favorite(user, movie.id).await?;

    tracing::info!(
        request_id = %request_id,
        user = %user,
        tmdb_id,
        movie_id = %movie.id,
        added,
        "Favorite added"
    );

    let message = if added {
        format!("Added {} to favorites", movie.title)
    } else {
        format!("{} is already in favorites", movie.title)
    };

    Ok(Json(FavoriteResponse { message, movie }))
}

/// Handler removing a movie from a user's favorites
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, tmdb_id)): Path<(i64, i64)>,
) -> AppResult<Json<FavoriteResponse>> {
    let user = UserId(user_id);

    let movie = state
        .favorites
        .movie_by_tmdb_id(tmdb_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} is not in the catalog", tmdb_id)))?;

    if !state.favorites.remove_favorite(user, movie.id).await? {
        return Err(AppError::InvalidInput("Movie not in favorites".to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        user = %user,
        tmdb_id,
        "Favorite removed"
    );

    Ok(Json(FavoriteResponse {
        message: format!("Removed {} from favorites", movie.title),
        movie,
    }))
}
