use ndarray::parallel::prelude::*;
use ndarray::{ArrayView1, Axis};

use crate::error::{RecommenderError, RecommenderResult};
use crate::models::{normalize_title, Catalog};
use crate::services::features::FeatureMatrix;

/// One candidate: catalog position and its cosine similarity to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMovie {
    pub position: usize,
    pub score: f32,
}

/// Nearest neighbours of one query, most similar first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityResult {
    pub query: usize,
    pub candidates: Vec<ScoredMovie>,
}

impl SimilarityResult {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn positions(&self) -> Vec<usize> {
        self.candidates.iter().map(|c| c.position).collect()
    }
}

/// Cosine similarity; 0 when either vector is all zeros
pub fn cosine_similarity(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Similarity of the query row to every row of the matrix, itself included
///
/// Rows are scored in parallel; the output is in catalog order.
pub fn similarity_scores(features: &FeatureMatrix, query: usize) -> RecommenderResult<Vec<f32>> {
    let query_row = features.row(query).ok_or_else(|| {
        RecommenderError::Lookup(format!(
            "Position {} is outside a feature matrix of {} rows",
            query,
            features.rows()
        ))
    })?;

    Ok(features
        .values()
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| cosine_similarity(query_row, row))
        .collect())
}

/// Ranks catalog movies by similarity to the movie at `query`
///
/// Takes the `top_k + 1` best rows (ties keep catalog order), then drops the query itself
/// and anything sharing its title. May return fewer than `top_k` entries.
pub fn rank(
    query: usize,
    features: &FeatureMatrix,
    catalog: &Catalog,
    top_k: usize,
) -> RecommenderResult<SimilarityResult> {
    if features.rows() != catalog.len() {
        return Err(RecommenderError::Alignment(format!(
            "Feature matrix has {} rows but catalog has {} movies",
            features.rows(),
            catalog.len()
        )));
    }

    let query_title = catalog
        .get(query)
        .map(|movie| movie.normalized_title())
        .ok_or_else(|| RecommenderError::Lookup(format!("No movie at position {}", query)))?;

    let scores = similarity_scores(features, query)?;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable sort: equal scores stay in ascending position order
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let candidates = order
        .into_iter()
        .take(top_k.saturating_add(1))
        .filter(|&position| position != query)
        .filter(|&position| {
            catalog
                .get(position)
                .is_some_and(|movie| normalize_title(&movie.title) != query_title)
        })
        .take(top_k)
        .map(|position| ScoredMovie {
            position,
            score: scores[position],
        })
        .collect();

    Ok(SimilarityResult { query, candidates })
}
