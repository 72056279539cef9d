//! Content-based movie recommendations
//!
//! A movie catalog is turned into one feature row per movie (genres, production
//! companies and TF-IDF over descriptive text). Queries rank movies by cosine
//! similarity and re-rank the nearest neighbours with rating and popularity.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
