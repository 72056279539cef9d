pub mod catalog_loader;
pub mod evaluation;
pub mod feature_cache;
pub mod features;
pub mod recommendations;
pub mod rerank;
pub mod similarity;

pub use catalog_loader::load_catalog;
pub use feature_cache::FeatureCache;
pub use features::{build_features, FeatureMatrix};
pub use recommendations::{CatalogSnapshot, RecommenderSettings};
pub use similarity::{rank, SimilarityResult};
