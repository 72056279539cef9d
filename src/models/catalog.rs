use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::movie::{normalize_title, MovieRecord};

/// Default cap on title search results
pub const SEARCH_RESULT_LIMIT: usize = 10;

fn title_words(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Ordered movie collection; a movie's position is its handle into the feature matrix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    movies: Vec<MovieRecord>,
}

/// Identity of a catalog snapshot, stored next to persisted features
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFingerprint {
    /// Number of movies
    pub rows: usize,
    /// blake3 digest over every title in catalog order
    pub title_digest: String,
}

impl Catalog {
    pub fn new(movies: Vec<MovieRecord>) -> Self {
        Self { movies }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&MovieRecord> {
        self.movies.get(position)
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MovieRecord> {
        self.movies.iter()
    }

    /// Position of the first movie whose title matches, ignoring case and surrounding whitespace
    pub fn find_title(&self, title: &str) -> Option<usize> {
        let wanted = normalize_title(title);
        self.movies
            .iter()
            .position(|movie| movie.normalized_title() == wanted)
    }

    /// Movies whose titles match `query`, best first, at most `limit` of them
    ///
    /// Exact title matches (ignoring case) come first. Then come titles containing the
    /// whole query, then titles sharing words with it, most shared words first. Titles
    /// that normalize the same are returned once.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&MovieRecord> {
        let wanted = normalize_title(query);
        if wanted.is_empty() || limit == 0 {
            return Vec::new();
        }
        let wanted_words = title_words(&wanted);

        let mut matches: Vec<(usize, &MovieRecord)> = self
            .movies
            .iter()
            .filter_map(|movie| {
                let title = movie.normalized_title();
                if title == wanted {
                    return Some((usize::MAX, movie));
                }
                let shared = title_words(&title).intersection(&wanted_words).count();
                if title.contains(wanted.as_str()) {
                    Some((usize::MAX - 1, movie))
                } else if shared > 0 {
                    Some((shared, movie))
                } else {
                    None
                }
            })
            .collect();

        // Stable: equally good matches keep catalog order
        matches.sort_by(|a, b| b.0.cmp(&a.0));

        let mut seen = HashSet::new();
        matches
            .into_iter()
            .map(|(_, movie)| movie)
            .filter(|movie| seen.insert(movie.normalized_title()))
            .take(limit)
            .collect()
    }

    /// Row count plus a digest of all titles, in order
    pub fn fingerprint(&self) -> CatalogFingerprint {
        let mut hasher = blake3::Hasher::new();
        for movie in &self.movies {
            // Length prefix keeps ["ab", "c"] and ["a", "bc"] apart
            hasher.update(&(movie.title.len() as u64).to_le_bytes());
            hasher.update(movie.title.as_bytes());
        }

        CatalogFingerprint {
            rows: self.movies.len(),
            title_digest: hasher.finalize().to_hex().to_string(),
        }
    }
}

impl FromIterator<MovieRecord> for Catalog {
    fn from_iter<I: IntoIterator<Item = MovieRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a MovieRecord;
    type IntoIter = std::slice::Iter<'a, MovieRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.movies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        ["Heat", "Alpha", " alpha ", "Casino"]
            .into_iter()
            .map(MovieRecord::new)
            .collect()
    }

    #[test]
    fn test_find_title_is_case_insensitive_and_trimmed() {
        let catalog = sample_catalog();
        assert_eq!(catalog.find_title("ALPHA"), Some(1));
        assert_eq!(catalog.find_title("  casino"), Some(3));
        assert_eq!(catalog.find_title("Zzz Unknown"), None);
    }

    #[test]
    fn test_fingerprint_tracks_order_and_length() {
        let catalog = sample_catalog();
        let same = sample_catalog();
        assert_eq!(catalog.fingerprint(), same.fingerprint());
        assert_eq!(catalog.fingerprint().rows, 4);

        let mut reordered: Vec<MovieRecord> = catalog.movies().to_vec();
        reordered.swap(0, 3);
        let reordered = Catalog::new(reordered);
        assert_ne!(catalog.fingerprint(), reordered.fingerprint());

        let shorter: Catalog = catalog.iter().take(3).cloned().collect();
        assert_ne!(catalog.fingerprint(), shorter.fingerprint());
    }

    #[test]
    fn test_fingerprint_separates_title_boundaries() {
        let a: Catalog = ["ab", "c"].into_iter().map(MovieRecord::new).collect();
        let b: Catalog = ["a", "bc"].into_iter().map(MovieRecord::new).collect();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    fn titles<'a>(hits: &[&'a MovieRecord]) -> Vec<&'a str> {
        hits.iter().map(|movie| movie.title.as_str()).collect()
    }

    #[test]
    fn test_search_puts_exact_match_first() {
        let catalog: Catalog = ["Toy Story 2", "The Story of Us", "Toy Story", "Heat"]
            .into_iter()
            .map(MovieRecord::new)
            .collect();

        let hits = catalog.search("toy story", SEARCH_RESULT_LIMIT);
        assert_eq!(titles(&hits), vec!["Toy Story", "Toy Story 2", "The Story of Us"]);
    }

    #[test]
    fn test_search_deduplicates_normalized_titles() {
        let catalog = sample_catalog();
        let hits = catalog.search("alpha", SEARCH_RESULT_LIMIT);
        assert_eq!(titles(&hits), vec!["Alpha"]);
    }

    #[test]
    fn test_search_respects_limit() {
        let catalog: Catalog = (0..30).map(|i| MovieRecord::new(format!("Heat {i}"))).collect();
        assert_eq!(catalog.search("heat", SEARCH_RESULT_LIMIT).len(), 10);
        assert_eq!(catalog.search("heat", 3).len(), 3);
    }

    #[test]
    fn test_search_blank_or_unmatched_query_is_empty() {
        let catalog = sample_catalog();
        assert!(catalog.search("   ", SEARCH_RESULT_LIMIT).is_empty());
        assert!(catalog.search("zzz", SEARCH_RESULT_LIMIT).is_empty());
    }
}
