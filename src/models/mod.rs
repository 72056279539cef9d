mod catalog;
mod movie;

pub use catalog::{Catalog, CatalogFingerprint, SEARCH_RESULT_LIMIT};
pub use movie::{normalize_title, MovieRecord};
