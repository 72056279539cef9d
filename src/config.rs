use serde::Deserialize;

use crate::services::features::DEFAULT_MAX_TEXT_FEATURES;
use crate::services::recommendations::{DEFAULT_CANDIDATE_POOL, DEFAULT_RECOMMENDATION_COUNT};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Movie metadata CSV the catalog is built from
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Location of the persisted feature matrix
    #[serde(default = "default_feature_cache_path")]
    pub feature_cache_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Vocabulary cap for the TF-IDF text block
    #[serde(default = "default_max_text_features")]
    pub max_text_features: usize,

    /// Number of nearest neighbours handed to the re-ranker
    #[serde(default = "default_candidate_pool")]
    pub candidate_pool: usize,

    /// Titles returned per recommendation request
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Ignore the feature cache on startup and rebuild from the catalog
    #[serde(default)]
    pub rebuild_features: bool,
}

fn default_catalog_path() -> String {
    "data/movies_metadata.csv".to_string()
}

fn default_feature_cache_path() -> String {
    "data/movie_features.bin".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_text_features() -> usize {
    DEFAULT_MAX_TEXT_FEATURES
}

fn default_candidate_pool() -> usize {
    DEFAULT_CANDIDATE_POOL
}

fn default_recommendation_count() -> usize {
    DEFAULT_RECOMMENDATION_COUNT
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
