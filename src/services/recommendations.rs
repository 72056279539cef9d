use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::error::{RecommenderError, RecommenderResult};
use crate::models::Catalog;
use crate::services::evaluation;
use crate::services::feature_cache::FeatureCache;
use crate::services::features::{build_features, FeatureMatrix, DEFAULT_MAX_TEXT_FEATURES};
use crate::services::rerank::rerank;
use crate::services::similarity::rank;

pub const DEFAULT_CANDIDATE_POOL: usize = 10;
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

/// Engine tunables
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderSettings {
    pub max_text_features: usize,
    /// Nearest neighbours considered before re-ranking
    pub candidate_pool: usize,
    /// Titles returned when the caller does not ask for a count
    pub recommendation_count: usize,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            max_text_features: DEFAULT_MAX_TEXT_FEATURES,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
        }
    }
}

impl From<&Config> for RecommenderSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_text_features: config.max_text_features,
            candidate_pool: config.candidate_pool,
            recommendation_count: config.recommendation_count,
        }
    }
}

/// A catalog and the feature matrix built from it, frozen together
///
/// Never mutated after construction; a rebuild produces a new snapshot.
#[derive(Debug)]
pub struct CatalogSnapshot {
    catalog: Catalog,
    features: FeatureMatrix,
    built_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Pairs a catalog with its features, rejecting mismatched row counts
    pub fn new(catalog: Catalog, features: FeatureMatrix) -> RecommenderResult<Self> {
        if features.rows() != catalog.len() {
            return Err(RecommenderError::Alignment(format!(
                "Feature matrix has {} rows but catalog has {} movies",
                features.rows(),
                catalog.len()
            )));
        }

        Ok(Self {
            catalog,
            features,
            built_at: Utc::now(),
        })
    }

    /// Builds features for `catalog` from scratch
    pub fn build(catalog: Catalog, settings: &RecommenderSettings) -> RecommenderResult<Self> {
        let features = build_features(&catalog, settings.max_text_features)?;
        Self::new(catalog, features)
    }

    /// Reuses cached features when they belong to `catalog`, otherwise rebuilds and saves
    ///
    /// A failed save is logged and does not prevent serving the freshly built snapshot.
    pub fn load_or_build(
        catalog: Catalog,
        cache: &FeatureCache,
        settings: &RecommenderSettings,
        force_rebuild: bool,
    ) -> RecommenderResult<Self> {
        if !force_rebuild {
            match cache.load(&catalog) {
                Ok(features) => return Self::new(catalog, features),
                Err(e) => {
                    tracing::warn!(error = %e, "Feature cache unusable, rebuilding");
                }
            }
        }

        let snapshot = Self::build(catalog, settings)?;
        if let Err(e) = cache.save(&snapshot.features, &snapshot.catalog) {
            tracing::error!(error = %e, "Failed to persist feature matrix");
        }
        Ok(snapshot)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Titles similar to `title`, best first
    ///
    /// Lookup error when the title is not in the catalog.
    pub fn recommend(
        &self,
        title: &str,
        candidate_pool: usize,
        output_count: usize,
    ) -> RecommenderResult<Vec<String>> {
        let position = self
            .catalog
            .find_title(title)
            .ok_or_else(|| RecommenderError::Lookup(format!("'{}' is not in the catalog", title)))?;

        let candidates = rank(position, &self.features, &self.catalog, candidate_pool)?;
        Ok(rerank(&self.catalog, &candidates, output_count))
    }

    /// Average neighbour similarity per sample size
    pub fn evaluate(&self, sample_sizes: &[usize]) -> RecommenderResult<Vec<f64>> {
        evaluation::evaluate(&self.catalog, &self.features, sample_sizes)
    }
}

/// Recommendations for the HTTP layer: an unknown title is an empty result, not an error
///
/// The candidate pool grows to at least `count` so larger requests can be filled.
pub fn get_recommendations(
    snapshot: &CatalogSnapshot,
    settings: &RecommenderSettings,
    title: &str,
    count: Option<usize>,
) -> RecommenderResult<Vec<String>> {
    let count = count.unwrap_or(settings.recommendation_count);
    let pool = settings.candidate_pool.max(count);

    match snapshot.recommend(title, pool, count) {
        Ok(titles) => Ok(titles),
        Err(RecommenderError::Lookup(reason)) => {
            tracing::info!(title, reason = %reason, "No catalog match for recommendation query");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}
