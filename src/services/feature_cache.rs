use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{RecommenderError, RecommenderResult};
use crate::models::{Catalog, CatalogFingerprint};
use crate::services::features::{FeatureLayout, FeatureMatrix};

const CACHE_FORMAT_VERSION: u32 = 1;

/// On-disk envelope: the dense matrix plus the catalog it was built from
#[derive(Debug, Serialize, Deserialize)]
struct CachedFeatures {
    format_version: u32,
    fingerprint: CatalogFingerprint,
    shape: (usize, usize),
    data: Vec<f32>,
    genres: Vec<String>,
    companies: Vec<String>,
    vocabulary: Vec<String>,
}

impl CachedFeatures {
    fn from_features(features: &FeatureMatrix, fingerprint: CatalogFingerprint) -> Self {
        let layout = features.layout();
        Self {
            format_version: CACHE_FORMAT_VERSION,
            fingerprint,
            shape: features.values().dim(),
            data: features.values().iter().copied().collect(),
            genres: layout.genres.clone(),
            companies: layout.companies.clone(),
            vocabulary: layout.vocabulary.clone(),
        }
    }

    fn into_features(self) -> RecommenderResult<FeatureMatrix> {
        let values = Array2::from_shape_vec(self.shape, self.data).map_err(|e| {
            RecommenderError::Storage(format!("Cached feature matrix is corrupt: {}", e))
        })?;

        let layout = FeatureLayout {
            genres: self.genres,
            companies: self.companies,
            vocabulary: self.vocabulary,
        };

        FeatureMatrix::new(values, layout)
            .map_err(|e| RecommenderError::Storage(format!("Cached feature layout is corrupt: {}", e)))
    }
}

/// Single-slot file store for a precomputed feature matrix
///
/// Every save overwrites the slot. A catalog fingerprint is written alongside the matrix
/// and checked on load, so a matrix is never served against a catalog it was not built
/// from.
#[derive(Debug, Clone)]
pub struct FeatureCache {
    path: PathBuf,
}

impl FeatureCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists `features` for `catalog`, replacing any previous save
    ///
    /// The matrix is written to a uniquely named temp file in the same directory and
    /// renamed into place, so a failed save leaves the previous slot intact and
    /// concurrent saves never share a temp file.
    pub fn save(&self, features: &FeatureMatrix, catalog: &Catalog) -> RecommenderResult<()> {
        if features.rows() != catalog.len() {
            return Err(RecommenderError::Alignment(format!(
                "Refusing to cache {} feature rows for a catalog of {} movies",
                features.rows(),
                catalog.len()
            )));
        }

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)
                    .map_err(|e| self.storage_error("create directory for", e))?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let envelope = CachedFeatures::from_features(features, catalog.fingerprint());
        let tmp = NamedTempFile::new_in(&dir).map_err(|e| self.storage_error("create", e))?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            bincode::serialize_into(&mut writer, &envelope).map_err(|e| {
                RecommenderError::Storage(format!("Failed to serialize feature matrix: {}", e))
            })?;
            writer.flush().map_err(|e| self.storage_error("write", e))?;
        }

        // An early return drops `tmp`, which deletes it
        tmp.persist(&self.path)
            .map_err(|e| self.storage_error("replace", e.error))?;

        tracing::info!(
            path = %self.path.display(),
            rows = features.rows(),
            cols = features.cols(),
            "Feature matrix cached"
        );
        Ok(())
    }

    /// Loads the cached matrix, checking it was built from `catalog`
    ///
    /// Storage error when nothing was saved yet or the file is unreadable; alignment error
    /// when the stored fingerprint does not match the catalog.
    pub fn load(&self, catalog: &Catalog) -> RecommenderResult<FeatureMatrix> {
        // Read the whole slot first: decoding from a slice bounds every length prefix by
        // the bytes actually present.
        let bytes = std::fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RecommenderError::Storage(format!(
                "No feature matrix has been saved at {}",
                self.path.display()
            )),
            _ => self.storage_error("read", e),
        })?;

        let envelope: CachedFeatures = bincode::deserialize(&bytes)
            .map_err(|e| RecommenderError::Storage(format!("Failed to decode feature cache: {}", e)))?;

        if envelope.format_version != CACHE_FORMAT_VERSION {
            return Err(RecommenderError::Storage(format!(
                "Unsupported feature cache version {}",
                envelope.format_version
            )));
        }

        let expected = catalog.fingerprint();
        if envelope.fingerprint != expected {
            return Err(RecommenderError::Alignment(format!(
                "Cached features were built for {} movies (digest {}), catalog has {} (digest {})",
                envelope.fingerprint.rows,
                envelope.fingerprint.title_digest,
                expected.rows,
                expected.title_digest
            )));
        }

        let features = envelope.into_features()?;
        if features.rows() != catalog.len() {
            return Err(RecommenderError::Alignment(format!(
                "Cached matrix has {} rows but catalog has {} movies",
                features.rows(),
                catalog.len()
            )));
        }

        tracing::info!(
            path = %self.path.display(),
            rows = features.rows(),
            cols = features.cols(),
            "Feature matrix loaded from cache"
        );
        Ok(features)
    }

    fn storage_error(&self, action: &str, err: std::io::Error) -> RecommenderError {
        RecommenderError::Storage(format!(
            "Failed to {} feature cache {}: {}",
            action,
            self.path.display(),
            err
        ))
    }
}
