use crate::models::Movie;

use super::{profile::GenreProfile, rank, ScoredMovie};

/// Average preference weight over the movie's genres; 0 for untagged movies
pub fn content_score(profile: &GenreProfile, movie: &Movie) -> f64 {
    if movie.genres.is_empty() {
        return 0.0;
    }

    let total: f64 = movie
        .genres
        .iter()
        .map(|genre| profile.get(genre).copied().unwrap_or(0.0))
        .sum();

    total / movie.genres.len() as f64
}

/// Scores unrated movies against a genre profile
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentScorer;

impl ContentScorer {
    /// Top `limit` candidates by content score, ties by ascending movie id
    pub fn score(
        &self,
        profile: &GenreProfile,
        candidates: &[Movie],
        limit: usize,
    ) -> Vec<ScoredMovie> {
        let scored = candidates
            .iter()
            .map(|movie| ScoredMovie::new(movie.clone(), content_score(profile, movie)))
            .collect();

        rank(scored, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GenreId, MovieId};

    const ACTION: GenreId = GenreId(1);
    const DRAMA: GenreId = GenreId(2);

    fn profile() -> GenreProfile {
        GenreProfile::from([(ACTION, 5.0 / 9.0), (DRAMA, 4.0 / 9.0)])
    }

    #[test]
    fn test_score_is_an_average_not_a_sum() {
        let both = Movie::new(3, "Both", vec![ACTION, DRAMA]);
        let action = Movie::new(4, "Action only", vec![ACTION]);

        assert!((content_score(&profile(), &both) - 0.5).abs() < 1e-12);
        assert!((content_score(&profile(), &action) - 5.0 / 9.0).abs() < 1e-12);

        let ranked = ContentScorer.score(&profile(), &[both, action], 10);
        assert_eq!(ranked[0].movie.id, MovieId(4));
        assert_eq!(ranked[1].movie.id, MovieId(3));
    }

    #[test]
    fn test_untagged_movie_scores_zero_and_is_kept() {
        let untagged = Movie::new(5, "Untagged", vec![]);
        let ranked = ContentScorer.score(&profile(), &[untagged], 10);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 0.0);
    }

    #[test]
    fn test_unknown_genres_contribute_zero() {
        let movie = Movie::new(6, "Horror and Action", vec![ACTION, GenreId(99)]);
        assert!((content_score(&profile(), &movie) - 5.0 / 18.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_break_by_movie_id_and_truncate() {
        let candidates = vec![
            Movie::new(9, "C", vec![DRAMA]),
            Movie::new(7, "A", vec![DRAMA]),
            Movie::new(8, "B", vec![DRAMA]),
        ];

        let ranked = ContentScorer.score(&profile(), &candidates, 2);
        let ids: Vec<i64> = ranked.iter().map(|s| s.movie.id.0).collect();
        assert_eq!(ids, vec![7, 8]);
    }
}
