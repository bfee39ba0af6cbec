use std::collections::HashMap;

use crate::models::{Movie, MovieId, Rating};

use super::{rank, similarity::SimilarityMap, ScoredMovie};

/// Predicts ratings for unrated movies from neighbors' ratings
#[derive(Debug, Clone, Copy, Default)]
pub struct CollaborativeScorer;

impl CollaborativeScorer {
    /// Similarity-weighted mean rating of `movie` among `neighbor_ratings`
    ///
    /// Ratings by users outside `similarities` are ignored. Returns 0 when no
    /// neighbor rated the movie.
    pub fn predict(&self, similarities: &SimilarityMap, neighbor_ratings: &[Rating]) -> f64 {
        let mut weighted_sum = 0.0;
        let mut similarity_sum = 0.0;

        for rating in neighbor_ratings {
            if let Some(similarity) = similarities.get(&rating.user_id) {
                weighted_sum += similarity * rating.value;
                similarity_sum += similarity;
            }
        }

        if similarity_sum == 0.0 {
            return 0.0;
        }

        weighted_sum / similarity_sum
    }

    /// Top `limit` candidates by predicted rating, ties by ascending movie id
    ///
    /// `ratings` holds every rating given by the neighbors; it is grouped per
    /// movie once instead of querying each candidate.
    pub fn score(
        &self,
        similarities: &SimilarityMap,
        ratings: &[Rating],
        candidates: &[Movie],
        limit: usize,
    ) -> Vec<ScoredMovie> {
        let mut by_movie: HashMap<MovieId, Vec<Rating>> = HashMap::new();
        for rating in ratings {
            if similarities.contains_key(&rating.user_id) {
                by_movie.entry(rating.movie_id).or_default().push(*rating);
            }
        }

        let scored = candidates
            .iter()
            .map(|movie| {
                let score = by_movie
                    .get(&movie.id)
                    .map(|movie_ratings| self.predict(similarities, movie_ratings))
                    .unwrap_or(0.0);
                ScoredMovie::new(movie.clone(), score)
            })
            .collect();

        rank(scored, limit)
    }
}
