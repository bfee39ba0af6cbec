use std::collections::BTreeMap;

use crate::models::{Movie, MovieId};

use super::{rank, ScoredMovie};

/// Merges the content and collaborative lists using positional scores
///
/// A movie at zero-based position `i` of a list of length `L` earns
/// `(L - i) / L * weight` from that list. Scores from both lists add up, so
/// agreement between the two sources is rewarded. An empty list contributes
/// nothing.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationFusion {
    content_weight: f64,
    collab_weight: f64,
}

impl RecommendationFusion {
    pub fn new(content_weight: f64, collab_weight: f64) -> Self {
        Self {
            content_weight,
            collab_weight,
        }
    }

    pub fn fuse(&self, content: &[Movie], collaborative: &[Movie], limit: usize) -> Vec<ScoredMovie> {
        let mut combined: BTreeMap<MovieId, ScoredMovie> = BTreeMap::new();

        for (list, weight) in [
            (content, self.content_weight),
            (collaborative, self.collab_weight),
        ] {
            let len = list.len() as f64;
            for (i, movie) in list.iter().enumerate() {
                let score = (len - i as f64) / len * weight;
                combined
                    .entry(movie.id)
                    .and_modify(|entry| entry.score += score)
                    .or_insert_with(|| ScoredMovie::new(movie.clone(), score));
            }
        }

        rank(combined.into_values().collect(), limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64) -> Movie {
        Movie::new(id, format!("Movie {}", id), vec![])
    }

    fn score_of(fused: &[ScoredMovie], id: i64) -> f64 {
        fused
            .iter()
            .find(|s| s.movie.id == MovieId(id))
            .map(|s| s.score)
            .unwrap()
    }

    #[test]
    fn test_disjoint_single_lists_keep_their_weights() {
        let fused = RecommendationFusion::new(0.4, 0.6).fuse(&[movie(1)], &[movie(2)], 10);

        assert_eq!(fused[0].movie.id, MovieId(2));
        assert!((score_of(&fused, 1) - 0.4).abs() < 1e-12);
        assert!((score_of(&fused, 2) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_agreement_sums_to_one() {
        let fused = RecommendationFusion::new(0.4, 0.6).fuse(&[movie(1)], &[movie(1)], 10);

        assert_eq!(fused.len(), 1);
        assert!((fused[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_positional_scores_decrease_with_rank() {
        let content = vec![movie(1), movie(2), movie(3), movie(4)];
        let fused = RecommendationFusion::new(0.4, 0.6).fuse(&content, &[], 10);

        assert!((score_of(&fused, 1) - 0.4).abs() < 1e-12);
        assert!((score_of(&fused, 2) - 0.3).abs() < 1e-12);
        assert!((score_of(&fused, 4) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_beats_single_source() {
        // Movie 3 is last in both lists but present twice.
        let content = vec![movie(1), movie(3)];
        let collab = vec![movie(2), movie(3)];
        let fused = RecommendationFusion::new(0.4, 0.6).fuse(&content, &collab, 10);

        let ids: Vec<i64> = fused.iter().map(|s| s.movie.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!((score_of(&fused, 3) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_lists_give_empty_result() {
        assert!(RecommendationFusion::new(0.4, 0.6).fuse(&[], &[], 10).is_empty());
    }

    #[test]
    fn test_result_is_truncated() {
        let content = vec![movie(1), movie(2), movie(3)];
        let fused = RecommendationFusion::new(0.5, 0.5).fuse(&content, &content, 2);
        assert_eq!(fused.len(), 2);
    }
}
