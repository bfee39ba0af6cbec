use std::sync::Arc;

use crate::services::{
    providers::MetadataProvider,
    recommendations::Recommender,
    store::{FavoriteStore, RecommendationStore},
};

/// Shared application state
///
/// Collaborators are trait objects so tests can run the full router over an
/// in-memory store and a mocked metadata provider.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecommendationStore>,
    pub recommender: Recommender,
    pub favorites: Arc<dyn FavoriteStore>,
    pub metadata: Arc<dyn MetadataProvider>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecommendationStore>,
        recommender: Recommender,
        favorites: Arc<dyn FavoriteStore>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            store,
            recommender,
            favorites,
            metadata,
        }
    }
}
