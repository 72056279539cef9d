use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::services::{CatalogSnapshot, FeatureCache, RecommenderSettings};

/// Shared application state
///
/// Requests clone the current snapshot `Arc` and release the lock before computing, so
/// a rebuild can swap in a new snapshot without waiting on in-flight requests.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<Arc<CatalogSnapshot>>>,
    pub settings: Arc<RecommenderSettings>,
    pub sources: Arc<DataSources>,
    /// Held for a whole rebuild so rebuilds run one at a time, in request order
    pub rebuild_lock: Arc<Mutex<()>>,
}

/// Where rebuilds read the catalog from and persist features to
#[derive(Debug, Clone)]
pub struct DataSources {
    pub catalog_path: PathBuf,
    pub feature_cache: FeatureCache,
}

impl AppState {
    pub fn new(
        snapshot: CatalogSnapshot,
        settings: RecommenderSettings,
        sources: DataSources,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
            settings: Arc::new(settings),
            sources: Arc::new(sources),
            rebuild_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The snapshot currently being served
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.inner.read().await)
    }

    /// Atomically replaces the served snapshot, returning the previous one
    pub async fn replace_snapshot(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        let mut current = self.inner.write().await;
        std::mem::replace(&mut *current, Arc::new(snapshot))
    }
}
