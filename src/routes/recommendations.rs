use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{RecommendationResponse, UserId},
    routes::AppState,
};

/// Used when `count` is missing, unparsable or not positive
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Kept as text so a malformed value falls back instead of rejecting the request
    count: Option<String>,
}

/// Clamps the requested count to a positive number
pub fn resolve_count(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|count| *count > 0)
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(DEFAULT_RECOMMENDATION_COUNT)
}

/// Handler for personalized recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let user = UserId(user_id);
    let count = resolve_count(params.count.as_deref());

    tracing::info!(
        request_id = %request_id,
        user = %user,
        count,
        "Processing recommendation request"
    );

    let recommendations = state.recommender.recommend(user, count).await?;

    Ok(Json(RecommendationResponse {
        count: recommendations.len(),
        recommendations,
    }))
}
