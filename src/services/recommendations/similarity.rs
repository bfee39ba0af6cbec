use std::collections::{BTreeMap, HashMap, HashSet};

use crate::models::{MovieId, Rating, UserId};

/// Positive similarity weight per neighbor, in (0, 1]
pub type SimilarityMap = BTreeMap<UserId, f64>;

/// Pearson correlation coefficient of two equally long vectors
///
/// Defined as 0 when fewer than two points are given or either vector has zero
/// variance. The result is clamped to [-1, 1] against rounding drift.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let y_mean = y.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        numerator += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }

    let denominator = (x_var * y_var).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (numerator / denominator).clamp(-1.0, 1.0)
}

/// One value per movie; duplicate ratings of a movie are averaged
pub fn ratings_by_movie(ratings: &[Rating]) -> BTreeMap<MovieId, f64> {
    let mut sums: BTreeMap<MovieId, (f64, u32)> = BTreeMap::new();
    for rating in ratings {
        let entry = sums.entry(rating.movie_id).or_insert((0.0, 0));
        entry.0 += rating.value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(movie, (sum, count))| (movie, sum / f64::from(count)))
        .collect()
}

/// Computes user-to-user similarity over co-rated movies
#[derive(Debug, Clone, Copy)]
pub struct UserSimilarityEngine {
    min_common_support: usize,
    max_candidates: usize,
}

impl UserSimilarityEngine {
    /// Fewer than this many co-rated movies makes correlation meaningless
    pub const MIN_COMMON_SUPPORT: usize = 2;

    pub fn new(max_candidates: usize) -> Self {
        Self {
            min_common_support: Self::MIN_COMMON_SUPPORT,
            max_candidates,
        }
    }

    /// Picks which co-raters to compare against the target
    ///
    /// `co_ratings` are ratings of movies the target has rated. Users are
    /// ranked by how many distinct movies they share with the target
    /// (descending, then ascending id) and capped at `max_candidates`.
    pub fn select_candidates(&self, target: UserId, co_ratings: &[Rating]) -> Vec<UserId> {
        let mut shared: HashMap<UserId, HashSet<MovieId>> = HashMap::new();
        for rating in co_ratings.iter().filter(|r| r.user_id != target) {
            shared.entry(rating.user_id).or_default().insert(rating.movie_id);
        }

        let mut candidates: Vec<(UserId, usize)> = shared
            .into_iter()
            .map(|(user, movies)| (user, movies.len()))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        if candidates.len() > self.max_candidates {
            tracing::debug!(
                target_user = %target,
                available = candidates.len(),
                cap = self.max_candidates,
                "Capping similarity candidates"
            );
            candidates.truncate(self.max_candidates);
        }

        candidates.into_iter().map(|(user, _)| user).collect()
    }

    /// Similarity of the target to each candidate, keeping only positive correlations
    pub fn similarities(
        &self,
        target_ratings: &[Rating],
        candidate_ratings: &BTreeMap<UserId, Vec<Rating>>,
    ) -> SimilarityMap {
        let target = ratings_by_movie(target_ratings);
        let mut similarities = SimilarityMap::new();

        for (user, ratings) in candidate_ratings {
            let other = ratings_by_movie(ratings);

            let (x, y): (Vec<f64>, Vec<f64>) = target
                .iter()
                .filter_map(|(movie, value)| other.get(movie).map(|o| (*value, *o)))
                .unzip();

            if x.len() < self.min_common_support {
                continue;
            }

            let similarity = pearson_correlation(&x, &y);
            if similarity > 0.0 {
                similarities.insert(*user, similarity);
            }
        }

        similarities
    }
}
