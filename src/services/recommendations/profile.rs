use std::collections::{BTreeMap, HashMap};

use crate::models::{GenreId, MovieId, Rating};

/// Normalized genre preferences of one user; weights sum to 1 when non-empty
pub type GenreProfile = BTreeMap<GenreId, f64>;

/// Builds a genre-preference vector from a user's highly rated movies
#[derive(Debug, Clone, Copy)]
pub struct GenreAffinityProfiler {
    liked_threshold: f64,
}

impl GenreAffinityProfiler {
    pub fn new(liked_threshold: f64) -> Self {
        Self { liked_threshold }
    }

    pub fn liked_threshold(&self) -> f64 {
        self.liked_threshold
    }

    /// Ratings that count as "liked"
    pub fn liked<'a>(&self, ratings: &'a [Rating]) -> impl Iterator<Item = &'a Rating> + 'a {
        let threshold = self.liked_threshold;
        ratings.iter().filter(move |r| r.value >= threshold)
    }

    /// Accumulates each liked rating into every genre of the rated movie, then
    /// normalizes by the total.
    ///
    /// Returns an empty profile when nothing qualifies or the total weight is
    /// not positive; callers treat that as "no profile".
    pub fn profile(
        &self,
        ratings: &[Rating],
        genres: &HashMap<MovieId, Vec<GenreId>>,
    ) -> GenreProfile {
        let mut weights = GenreProfile::new();

        for rating in self.liked(ratings) {
            let Some(movie_genres) = genres.get(&rating.movie_id) else {
                continue;
            };
            for genre in movie_genres {
                *weights.entry(*genre).or_insert(0.0) += rating.value;
            }
        }

        let total: f64 = weights.values().sum();
        if total <= 0.0 {
            return GenreProfile::new();
        }

        for weight in weights.values_mut() {
            *weight /= total;
        }

        weights
    }
}
