use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use reelmatch_api::api::{create_router, AppState, DataSources};
use reelmatch_api::config::Config;
use reelmatch_api::services::{load_catalog, CatalogSnapshot, FeatureCache, RecommenderSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let settings = RecommenderSettings::from(&config);
    let sources = DataSources {
        catalog_path: PathBuf::from(&config.catalog_path),
        feature_cache: FeatureCache::new(&config.feature_cache_path),
    };

    // Build or reload the snapshot before accepting traffic
    let snapshot = {
        let sources = sources.clone();
        let settings = settings.clone();
        let force_rebuild = config.rebuild_features;
        tokio::task::spawn_blocking(move || -> anyhow::Result<CatalogSnapshot> {
            let catalog = load_catalog(&sources.catalog_path)?;
            let snapshot = CatalogSnapshot::load_or_build(
                catalog,
                &sources.feature_cache,
                &settings,
                force_rebuild,
            )?;
            Ok(snapshot)
        })
        .await
        .context("Snapshot initialization task failed")?
        .context("Failed to initialize catalog snapshot")?
    };

    tracing::info!(
        movies = snapshot.catalog().len(),
        feature_width = snapshot.features().cols(),
        "Catalog snapshot ready"
    );

    let state = AppState::new(snapshot, settings, sources);
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server running");

    axum::serve(listener, app).await?;
    Ok(())
}
