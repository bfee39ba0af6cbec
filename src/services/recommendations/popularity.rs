use std::collections::HashSet;

use crate::models::{Movie, MovieId};

use super::{rank, ScoredMovie};

/// Non-personalized ranking by average rating, for users without history
#[derive(Debug, Clone, Copy)]
pub struct PopularityFallback {
    min_rating_count: i64,
}

impl PopularityFallback {
    pub fn new(min_rating_count: i64) -> Self {
        Self { min_rating_count }
    }

    /// Rating count a movie needs to be considered
    pub fn min_rating_count(&self) -> i64 {
        self.min_rating_count
    }

    /// Ranks `(movie, average)` pairs, dropping movies in `exclude`
    ///
    /// The store has already applied the rating-count threshold.
    pub fn rank(
        &self,
        popular: Vec<(Movie, f64)>,
        exclude: &HashSet<MovieId>,
        limit: usize,
    ) -> Vec<ScoredMovie> {
        let scored = popular
            .into_iter()
            .filter(|(movie, _)| !exclude.contains(&movie.id))
            .map(|(movie, average)| ScoredMovie::new(movie, average))
            .collect();

        rank(scored, limit)
    }
}
