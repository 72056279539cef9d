use crate::models::{Catalog, MovieRecord};
use crate::services::similarity::{ScoredMovie, SimilarityResult};

pub const SIMILARITY_WEIGHT: f64 = 0.7;
pub const VOTE_AVERAGE_WEIGHT: f64 = 0.15;
pub const POPULARITY_WEIGHT: f64 = 0.15;

/// Blended ranking score for one candidate
///
/// Vote average and popularity enter on their raw scales (0–10 and unbounded) while
/// similarity lives in [-1, 1], so for most catalogs the quality signals dominate.
/// The weights are kept as they are because existing result orderings depend on them.
pub fn blended_score(similarity: f32, movie: &MovieRecord) -> f64 {
    SIMILARITY_WEIGHT * f64::from(similarity)
        + VOTE_AVERAGE_WEIGHT * movie.vote_average
        + POPULARITY_WEIGHT * movie.popularity
}

/// Re-orders similarity candidates by blended score and returns the top titles
///
/// Equal blended scores keep their similarity order.
pub fn rerank(catalog: &Catalog, candidates: &SimilarityResult, output_count: usize) -> Vec<String> {
    let mut scored: Vec<(&MovieRecord, f64)> = candidates
        .candidates
        .iter()
        .filter_map(|c| {
            catalog
                .get(c.position)
                .map(|movie| (movie, blended_score(c.score, movie)))
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(output_count)
        .map(|(movie, _)| movie.title.clone())
        .collect()
}

/// Mean raw similarity of the `output_count` most similar candidates
///
/// Offline quality measure used by the evaluation harness; 0 when there are no
/// candidates.
pub fn quality_score(candidates: &SimilarityResult, output_count: usize) -> f64 {
    let mut ranked: Vec<ScoredMovie> = candidates.candidates.clone();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(output_count);

    if ranked.is_empty() {
        return 0.0;
    }

    ranked.iter().map(|c| f64::from(c.score)).sum::<f64>() / ranked.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            MovieRecord::new("Query"),
            MovieRecord::new("Close but obscure").with_ratings(5.0, 1.0),
            MovieRecord::new("Far but popular").with_ratings(8.0, 40.0),
            MovieRecord::new("Middle").with_ratings(6.0, 2.0),
            MovieRecord::new("Twin").with_ratings(6.0, 2.0),
        ])
    }

    fn candidates(pairs: &[(usize, f32)]) -> SimilarityResult {
        SimilarityResult {
            query: 0,
            candidates: pairs
                .iter()
                .map(|&(position, score)| ScoredMovie { position, score })
                .collect(),
        }
    }

    #[test]
    fn test_blended_score_uses_raw_values() {
        let movie = MovieRecord::new("X").with_ratings(8.0, 10.0);
        let score = blended_score(0.5, &movie);
        assert!((score - (0.35 + 1.2 + 1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_popularity_outweighs_similarity() {
        let result = rerank(&catalog(), &candidates(&[(1, 0.9), (2, 0.1)]), 2);
        assert_eq!(result, vec!["Far but popular", "Close but obscure"]);
    }

    #[test]
    fn test_equal_scores_keep_similarity_order() {
        let result = rerank(&catalog(), &candidates(&[(4, 0.5), (3, 0.5)]), 2);
        assert_eq!(result, vec!["Twin", "Middle"]);
    }

    #[test]
    fn test_output_count_truncates() {
        let input = candidates(&[(1, 0.9), (2, 0.8), (3, 0.7)]);
        assert_eq!(rerank(&catalog(), &input, 1).len(), 1);
        assert!(rerank(&catalog(), &input, 0).is_empty());
    }

    #[test]
    fn test_rerank_is_deterministic() {
        let input = candidates(&[(1, 0.9), (2, 0.8), (3, 0.7), (4, 0.7)]);
        let first = rerank(&catalog(), &input, 3);
        for _ in 0..5 {
            assert_eq!(rerank(&catalog(), &input, 3), first);
        }
    }

    #[test]
    fn test_quality_score_averages_top_similarities() {
        let input = candidates(&[(3, 0.2), (1, 0.8), (2, 0.6)]);
        assert!((quality_score(&input, 2) - 0.7).abs() < 1e-6);
        assert!((quality_score(&input, 10) - (1.6 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn test_quality_score_of_nothing_is_zero() {
        assert_eq!(quality_score(&SimilarityResult::default(), 5), 0.0);
    }
}
