//! Offline evaluation harness
//!
//! Scores how similar the nearest neighbours of randomly sampled movies are. Sampling
//! uses a fixed seed so two runs over the same catalog and features agree exactly.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{RecommenderError, RecommenderResult};
use crate::models::Catalog;
use crate::services::features::FeatureMatrix;
use crate::services::rerank::quality_score;
use crate::services::similarity::rank;

pub const EVALUATION_SEED: u64 = 42;
pub const EVALUATION_CANDIDATE_POOL: usize = 10;
pub const EVALUATION_OUTPUT_COUNT: usize = 5;

/// Average top-5 similarity for each requested sample size, in request order
///
/// Every sample size draws its positions from a freshly seeded generator, without
/// replacement. Sizes must be between 1 and the catalog length.
pub fn evaluate(
    catalog: &Catalog,
    features: &FeatureMatrix,
    sample_sizes: &[usize],
) -> RecommenderResult<Vec<f64>> {
    sample_sizes
        .iter()
        .map(|&size| evaluate_sample(catalog, features, size))
        .collect()
}

fn evaluate_sample(
    catalog: &Catalog,
    features: &FeatureMatrix,
    size: usize,
) -> RecommenderResult<f64> {
    if size == 0 || size > catalog.len() {
        return Err(RecommenderError::Data(format!(
            "Sample size {} must be between 1 and {}",
            size,
            catalog.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(EVALUATION_SEED);
    let sample = rand::seq::index::sample(&mut rng, catalog.len(), size);

    let mut total = 0.0;
    for position in sample.iter() {
        let candidates = rank(position, features, catalog, EVALUATION_CANDIDATE_POOL)?;
        total += quality_score(&candidates, EVALUATION_OUTPUT_COUNT);
    }

    let average = total / size as f64;
    tracing::debug!(sample_size = size, average, "Evaluated sample");
    Ok(average)
}
