use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult, RecommenderResult};
use crate::middleware::request_id::RequestId;
use crate::models::{MovieRecord, SEARCH_RESULT_LIMIT};
use crate::services::{load_catalog, recommendations, CatalogSnapshot};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub movie_title: String,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub movie_title: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub genres: Vec<String>,
    pub vote_average: f64,
    pub popularity: f64,
}

impl From<&MovieRecord> for SearchHit {
    fn from(movie: &MovieRecord) -> Self {
        Self {
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            vote_average: movie.vote_average,
            popularity: movie.popularity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub sample_sizes: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub sample_sizes: Vec<usize>,
    pub scores: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct CatalogStatsResponse {
    pub movies: usize,
    pub feature_width: usize,
    pub genre_columns: usize,
    pub company_columns: usize,
    pub text_columns: usize,
    pub built_at: DateTime<Utc>,
}

impl From<&CatalogSnapshot> for CatalogStatsResponse {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        let (genre_columns, company_columns, text_columns) =
            snapshot.features().layout().block_widths();
        Self {
            movies: snapshot.catalog().len(),
            feature_width: snapshot.features().cols(),
            genre_columns,
            company_columns,
            text_columns,
            built_at: snapshot.built_at(),
        }
    }
}

/// Runs CPU-bound engine work off the async executor
async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> RecommenderResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Engine task failed: {}", e)))?
        .map_err(AppError::from)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Recommend titles similar to the requested one
///
/// A title missing from the catalog yields an empty list rather than an error.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    // Validate input
    let title = request.movie_title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::InvalidInput("movie_title is required".to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        title = %title,
        count = ?request.count,
        "Processing recommendation request"
    );

    // Pin the current snapshot; a concurrent rebuild does not affect this request
    let snapshot = state.snapshot().await;
    let settings = state.settings.clone();
    let query = title.clone();
    let recommendations = run_blocking(move || {
        recommendations::get_recommendations(&snapshot, &settings, &query, request.count)
    })
    .await?;

    tracing::info!(
        request_id = %request_id,
        results = recommendations.len(),
        "Recommendation completed"
    );

    Ok(Json(RecommendationResponse {
        movie_title: title,
        recommendations,
    }))
}

/// Catalog titles matching a free-text query, for finding a valid recommendation key
///
/// A blank query yields no results.
pub async fn search_titles(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let query = params.q.trim().to_string();
    let limit = params.limit.unwrap_or(SEARCH_RESULT_LIMIT).min(SEARCH_RESULT_LIMIT);

    let snapshot = state.snapshot().await;
    let results: Vec<SearchHit> = snapshot
        .catalog()
        .search(&query, limit)
        .into_iter()
        .map(SearchHit::from)
        .collect();

    tracing::debug!(query = %query, results = results.len(), "Title search completed");

    Json(SearchResponse { query, results })
}

/// Average neighbour similarity for each requested sample size
pub async fn evaluate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<EvaluationRequest>,
) -> AppResult<Json<EvaluationResponse>> {
    if request.sample_sizes.is_empty() {
        return Err(AppError::InvalidInput(
            "sample_sizes must not be empty".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        sample_sizes = ?request.sample_sizes,
        "Processing evaluation request"
    );

    // Sample sizes are range-checked by the engine against the catalog length
    let snapshot = state.snapshot().await;
    let sample_sizes = request.sample_sizes.clone();
    let scores = run_blocking(move || snapshot.evaluate(&sample_sizes)).await?;

    Ok(Json(EvaluationResponse {
        sample_sizes: request.sample_sizes,
        scores,
    }))
}

/// Shape of the snapshot currently being served
pub async fn catalog_stats(State(state): State<AppState>) -> Json<CatalogStatsResponse> {
    let snapshot = state.snapshot().await;
    Json(CatalogStatsResponse::from(snapshot.as_ref()))
}

/// Reloads the catalog, rebuilds and persists features, then swaps the served snapshot
pub async fn rebuild_catalog(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<CatalogStatsResponse>> {
    // Serialize rebuilds so the cache file and the served snapshot end up from the same run
    let _rebuild = state.rebuild_lock.lock().await;
    tracing::info!(request_id = %request_id, "Rebuilding catalog snapshot");

    // Load, build and persist off the async executor
    let sources = state.sources.clone();
    let settings = state.settings.clone();
    let snapshot = run_blocking(move || {
        let catalog = load_catalog(&sources.catalog_path)?;
        let snapshot = CatalogSnapshot::build(catalog, &settings)?;
        sources
            .feature_cache
            .save(snapshot.features(), snapshot.catalog())?;
        Ok(snapshot)
    })
    .await?;

    // Swap in the finished snapshot; in-flight requests keep the one they pinned
    let stats = CatalogStatsResponse::from(&snapshot);
    state.replace_snapshot(snapshot).await;

    tracing::info!(
        request_id = %request_id,
        movies = stats.movies,
        feature_width = stats.feature_width,
        "Catalog snapshot replaced"
    );

    Ok(Json(stats))
}
