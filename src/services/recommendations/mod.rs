//! Hybrid movie recommendations
//!
//! Two independent signals are computed for the same user and fused:
//!
//! * content: a genre-preference profile built from the user's liked ratings,
//!   matched against every unrated movie ([`profile`], [`content`])
//! * collaborative: Pearson similarity to co-raters, then a similarity-weighted
//!   rating prediction per unrated movie ([`similarity`], [`collaborative`])
//!
//! Either branch falls back to the popularity ranking ([`popularity`]) when it
//! has no signal. The two lists are merged with positional scores ([`fusion`]).
//!
//! Everything here is recomputed per request from store reads. Nothing is
//! cached or mutated, so concurrent requests need no coordination.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, Rating, UserId},
    services::store::RecommendationStore,
};

pub mod collaborative;
pub mod content;
pub mod fusion;
pub mod popularity;
pub mod profile;
pub mod similarity;

pub use collaborative::CollaborativeScorer;
pub use content::ContentScorer;
pub use fusion::RecommendationFusion;
pub use popularity::PopularityFallback;
pub use profile::{GenreAffinityProfiler, GenreProfile};
pub use similarity::{pearson_correlation, SimilarityMap, UserSimilarityEngine};

/// Store reads kept in flight at once while gathering neighbor data
const STORE_FETCH_CONCURRENCY: usize = 16;

/// A movie with the score that ranked it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMovie {
    pub movie: Movie,
    pub score: f64,
}

impl ScoredMovie {
    pub fn new(movie: Movie, score: f64) -> Self {
        Self { movie, score }
    }
}

/// Sorts by score descending, ties by ascending movie id, and keeps `limit`
pub(crate) fn rank(mut scored: Vec<ScoredMovie>, limit: usize) -> Vec<ScoredMovie> {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.movie.id.cmp(&b.movie.id))
    });
    scored.truncate(limit);
    scored
}

/// Engine tunables
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderConfig {
    /// Fusion weight of the content list
    pub content_weight: f64,
    /// Fusion weight of the collaborative list
    pub collab_weight: f64,
    /// Ratings at or above this count as liked. Tied to the rating scale.
    pub liked_threshold: f64,
    /// Ratings a movie needs before it can be recommended as popular
    pub min_popular_ratings: i64,
    /// Candidates requested from each branch per recommendation returned
    pub candidate_multiplier: usize,
    /// Maximum number of co-raters compared against the target
    pub max_similarity_candidates: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            content_weight: 0.4,
            collab_weight: 0.6,
            liked_threshold: 4.0,
            min_popular_ratings: 5,
            candidate_multiplier: 2,
            max_similarity_candidates: 500,
        }
    }
}

impl RecommenderConfig {
    const WEIGHT_TOLERANCE: f64 = 1e-9;

    pub fn validate(&self) -> AppResult<()> {
        for (name, weight) in [
            ("content_weight", self.content_weight),
            ("collab_weight", self.collab_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(AppError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, weight
                )));
            }
        }

        let total = self.content_weight + self.collab_weight;
        if (total - 1.0).abs() > Self::WEIGHT_TOLERANCE {
            return Err(AppError::Configuration(format!(
                "content_weight + collab_weight must equal 1, got {}",
                total
            )));
        }

        if self.candidate_multiplier == 0 {
            return Err(AppError::Configuration(
                "candidate_multiplier must be positive".to_string(),
            ));
        }

        if self.max_similarity_candidates == 0 {
            return Err(AppError::Configuration(
                "max_similarity_candidates must be positive".to_string(),
            ));
        }

        if !self.liked_threshold.is_finite() {
            return Err(AppError::Configuration(
                "liked_threshold must be a finite number".to_string(),
            ));
        }

        Ok(())
    }
}

/// Public entry point of the engine
#[derive(Clone)]
pub struct Recommender {
    store: Arc<dyn RecommendationStore>,
    config: RecommenderConfig,
    profiler: GenreAffinityProfiler,
    content: ContentScorer,
    similarity: UserSimilarityEngine,
    collaborative: CollaborativeScorer,
    popularity: PopularityFallback,
    fusion: RecommendationFusion,
}

impl Recommender {
    /// Builds a recommender over `store`, rejecting an invalid configuration
    pub fn new(store: Arc<dyn RecommendationStore>, config: RecommenderConfig) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            store,
            profiler: GenreAffinityProfiler::new(config.liked_threshold),
            content: ContentScorer,
            similarity: UserSimilarityEngine::new(config.max_similarity_candidates),
            collaborative: CollaborativeScorer,
            popularity: PopularityFallback::new(config.min_popular_ratings),
            fusion: RecommendationFusion::new(config.content_weight, config.collab_weight),
            config,
        })
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Top `count` movies for `user`, best first
    pub async fn recommend(&self, user: UserId, count: usize) -> AppResult<Vec<Movie>> {
        let scored = self.recommend_scored(user, count).await?;
        Ok(scored.into_iter().map(|s| s.movie).collect())
    }

    /// Same as [`Recommender::recommend`] but keeps the fused scores
    pub async fn recommend_scored(&self, user: UserId, count: usize) -> AppResult<Vec<ScoredMovie>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let candidates = count.saturating_mul(self.config.candidate_multiplier);
        let ratings = self.store.ratings_for_user(user).await?;

        let fused = if ratings.is_empty() {
            tracing::debug!(user = %user, "No ratings, using popularity for both branches");
            let popular = self.popular_candidates(&HashSet::new(), candidates).await?;
            self.fusion.fuse(&popular, &popular, count)
        } else {
            let rated: HashSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();
            let catalog = self.store.all_movies_excluding(user).await?;

            let (content, collaborative) = tokio::try_join!(
                self.content_candidates(user, &ratings, &rated, &catalog, candidates),
                self.collaborative_candidates(user, &ratings, &catalog, candidates),
            )?;

            self.fusion.fuse(&content, &collaborative, count)
        };

        tracing::info!(
            user = %user,
            requested = count,
            returned = fused.len(),
            rating_count = ratings.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations computed"
        );

        Ok(fused)
    }

    async fn popular_candidates(
        &self,
        exclude: &HashSet<MovieId>,
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let popular = self
            .store
            .popular_movies(self.popularity.min_rating_count())
            .await?;

        Ok(self
            .popularity
            .rank(popular, exclude, limit)
            .into_iter()
            .map(|s| s.movie)
            .collect())
    }

    async fn content_candidates(
        &self,
        user: UserId,
        ratings: &[Rating],
        rated: &HashSet<MovieId>,
        catalog: &[Movie],
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let mut genres = HashMap::new();
        for rating in self.profiler.liked(ratings) {
            if !genres.contains_key(&rating.movie_id) {
                let movie_genres = self.store.genres_for_movie(rating.movie_id).await?;
                genres.insert(rating.movie_id, movie_genres);
            }
        }

        let profile = self.profiler.profile(ratings, &genres);
        if profile.is_empty() {
            tracing::debug!(
                user = %user,
                liked_threshold = self.profiler.liked_threshold(),
                "No genre profile, content branch uses popularity"
            );
            return self.popular_candidates(rated, limit).await;
        }

        tracing::debug!(user = %user, genres = profile.len(), "Built genre profile");

        Ok(self
            .content
            .score(&profile, catalog, limit)
            .into_iter()
            .map(|s| s.movie)
            .collect())
    }

    async fn collaborative_candidates(
        &self,
        user: UserId,
        ratings: &[Rating],
        catalog: &[Movie],
        limit: usize,
    ) -> AppResult<Vec<Movie>> {
        let rated_movies: Vec<MovieId> = ratings
            .iter()
            .map(|r| r.movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // `buffered` yields in input order, so results stay deterministic
        let store = Arc::clone(&self.store);
        let co_ratings: Vec<Rating> = stream::iter(rated_movies)
            .map(|movie| {
                let store = Arc::clone(&store);
                async move { store.ratings_for_movie(movie).await }
            })
            .buffered(STORE_FETCH_CONCURRENCY)
            .try_concat()
            .await?;

        let neighbors = self.similarity.select_candidates(user, &co_ratings);

        let neighbor_ratings: BTreeMap<UserId, Vec<Rating>> = stream::iter(neighbors)
            .map(|neighbor| {
                let store = Arc::clone(&store);
                async move {
                    let ratings = store.ratings_for_user(neighbor).await?;
                    Ok::<_, AppError>((neighbor, ratings))
                }
            })
            .buffered(STORE_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let similarities = self.similarity.similarities(ratings, &neighbor_ratings);

        tracing::debug!(
            user = %user,
            compared = neighbor_ratings.len(),
            similar = similarities.len(),
            "Computed user similarities"
        );

        // No neighbors means no collaborative data; fusion then relies on content alone.
        if similarities.is_empty() {
            return Ok(Vec::new());
        }

        let all_neighbor_ratings: Vec<Rating> = neighbor_ratings
            .into_iter()
            .filter(|(neighbor, _)| similarities.contains_key(neighbor))
            .flat_map(|(_, ratings)| ratings)
            .collect();

        Ok(self
            .collaborative
            .score(&similarities, &all_neighbor_ratings, catalog, limit)
            .into_iter()
            .map(|s| s.movie)
            .collect())
    }
}
