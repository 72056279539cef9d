//! Feature Builder
//!
//! Turns a catalog into one dense row per movie:
//! `[genre multi-hot][company multi-hot][TF-IDF over content text]`.
//! The column layout is fixed by a single fit over the whole catalog; adding a movie
//! means rebuilding the matrix.

mod multi_hot;
mod text;

use ndarray::{concatenate, Array2, ArrayView1, Axis};

use crate::error::{RecommenderError, RecommenderResult};
use crate::models::Catalog;

pub use multi_hot::{fit_multi_hot_encoder, MultiHotEncoder};
pub use text::{fit_text_vectorizer, tokenize, TfidfVectorizer};

/// Vocabulary cap for the text block
pub const DEFAULT_MAX_TEXT_FEATURES: usize = 500;

/// Column labels of each feature block, in matrix order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureLayout {
    pub genres: Vec<String>,
    pub companies: Vec<String>,
    pub vocabulary: Vec<String>,
}

impl FeatureLayout {
    /// Widths of the genre, company and text blocks
    pub fn block_widths(&self) -> (usize, usize, usize) {
        (self.genres.len(), self.companies.len(), self.vocabulary.len())
    }

    pub fn width(&self) -> usize {
        self.genres.len() + self.companies.len() + self.vocabulary.len()
    }
}

/// Immutable N×D feature matrix, row `i` belonging to catalog position `i`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Array2<f32>,
    layout: FeatureLayout,
}

impl FeatureMatrix {
    pub fn new(values: Array2<f32>, layout: FeatureLayout) -> RecommenderResult<Self> {
        if values.ncols() != layout.width() {
            return Err(RecommenderError::Data(format!(
                "Feature matrix has {} columns but layout describes {}",
                values.ncols(),
                layout.width()
            )));
        }
        Ok(Self { values, layout })
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.rows()).then(|| self.values.row(position))
    }
}

/// Builds the feature matrix for a catalog
///
/// Fails with a data error when the catalog is empty. Genre/company lists that failed
/// to parse upstream are simply empty here and contribute no bits.
pub fn build_features(catalog: &Catalog, max_text_features: usize) -> RecommenderResult<FeatureMatrix> {
    if catalog.is_empty() {
        return Err(RecommenderError::Data(
            "Cannot build features for an empty catalog".to_string(),
        ));
    }

    let contents: Vec<String> = catalog.iter().map(|movie| movie.content()).collect();
    let genres: Vec<&[String]> = catalog.iter().map(|movie| movie.genres.as_slice()).collect();
    let companies: Vec<&[String]> = catalog
        .iter()
        .map(|movie| movie.production_companies.as_slice())
        .collect();

    let text = fit_text_vectorizer(&contents, max_text_features)?;
    let genre_encoder = fit_multi_hot_encoder(&genres);
    let company_encoder = fit_multi_hot_encoder(&companies);

    let genre_block = genre_encoder.transform(&genres);
    let company_block = company_encoder.transform(&companies);
    let text_block = text.transform(&contents);

    let values = concatenate(
        Axis(1),
        &[genre_block.view(), company_block.view(), text_block.view()],
    )
    .map_err(|e| RecommenderError::Data(format!("Failed to assemble feature blocks: {}", e)))?;

    let layout = FeatureLayout {
        genres: genre_encoder.labels().to_vec(),
        companies: company_encoder.labels().to_vec(),
        vocabulary: text.vocabulary().to_vec(),
    };

    tracing::info!(
        movies = catalog.len(),
        genre_columns = layout.genres.len(),
        company_columns = layout.companies.len(),
        text_columns = layout.vocabulary.len(),
        "Feature matrix built"
    );

    FeatureMatrix::new(values, layout)
}
