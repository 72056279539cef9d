use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{RecommenderError, RecommenderResult};
use crate::models::{Catalog, MovieRecord};

/// One CSV row as it appears in the movie metadata export
///
/// Every column is optional text; coercion happens in [`RawMovieRow::into_record`].
#[derive(Debug, Deserialize)]
struct RawMovieRow {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    production_companies: Option<String>,
    #[serde(default)]
    vote_average: Option<String>,
    #[serde(default)]
    popularity: Option<String>,
}

impl RawMovieRow {
    fn into_record(self) -> Option<MovieRecord> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;

        Some(MovieRecord {
            title,
            overview: self.overview.unwrap_or_default(),
            tagline: self.tagline.unwrap_or_default(),
            genres: parse_named_list(self.genres.as_deref().unwrap_or_default()),
            production_companies: parse_named_list(
                self.production_companies.as_deref().unwrap_or_default(),
            ),
            vote_average: parse_number(self.vote_average.as_deref()),
            popularity: parse_number(self.popularity.as_deref()),
        })
    }
}

/// Loads the catalog from a movie metadata CSV file
pub fn load_catalog(path: impl AsRef<Path>) -> RecommenderResult<Catalog> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "Loading movie catalog");

    // The catalog file is server-side, so failing to open it is a storage fault
    let file = std::fs::File::open(path).map_err(|e| {
        RecommenderError::Storage(format!("Failed to open catalog {}: {}", path.display(), e))
    })?;

    read_catalog(file)
}

/// Reads a catalog from any CSV source with a header row
///
/// Rows that cannot be decoded or that carry no title are skipped; they could never be
/// looked up by title anyway.
pub fn read_catalog<R: Read>(reader: R) -> RecommenderResult<Catalog> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    reader
        .headers()
        .map_err(|e| RecommenderError::Data(format!("Failed to read catalog header: {}", e)))?;

    let mut movies = Vec::new();
    let mut skipped = 0usize;

    for (line, row) in reader.deserialize::<RawMovieRow>().enumerate() {
        match row {
            Ok(raw) => match raw.into_record() {
                Some(movie) => movies.push(movie),
                None => skipped += 1,
            },
            Err(e) => {
                tracing::debug!(row = line + 1, error = %e, "Skipping malformed catalog row");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "Some catalog rows were skipped");
    }
    tracing::info!(movies = movies.len(), "Catalog loaded");

    Ok(Catalog::new(movies))
}

/// `'name': '...'` or `"name": "..."`, either quote style on the value
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]name['"]\s*:\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")"#)
        .expect("name pattern is valid")
});

/// One object of a JSON-form list column; other keys are ignored
#[derive(Debug, Deserialize)]
struct NamedEntry {
    #[serde(default)]
    name: Option<String>,
}

/// Extracts the `name` entries from a list-of-objects field
///
/// JSON lists are decoded with `serde_json`. The Python-literal form found in the
/// metadata export (`[{'id': 16, 'name': 'Animation'}]`) falls back to a pattern
/// scan. Anything that is not shaped like a list yields an empty list.
pub fn parse_named_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if !(raw.starts_with('[') && raw.ends_with(']')) {
        return Vec::new();
    }

    if let Ok(entries) = serde_json::from_str::<Vec<NamedEntry>>(raw) {
        return entries.into_iter().filter_map(|entry| entry.name).collect();
    }

    NAME_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| unescape(m.as_str()))
        .collect()
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Numeric column coercion: blanks and garbage become 0
fn parse_number(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_literal_list() {
        let raw = "[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}]";
        assert_eq!(parse_named_list(raw), vec!["Animation", "Comedy"]);
    }

    #[test]
    fn test_parse_json_list() {
        let raw = r#"[{"id": 3, "name": "Pixar Animation Studios"}]"#;
        assert_eq!(parse_named_list(raw), vec!["Pixar Animation Studios"]);
    }

    #[test]
    fn test_parse_json_list_decodes_unicode_escapes() {
        let raw = r#"[{"id": 7, "name": "Caf\u00e9 Films"}, {"id": 8}]"#;
        assert_eq!(parse_named_list(raw), vec!["Café Films"]);
    }

    #[test]
    fn test_parse_names_with_quotes() {
        let raw = r#"[{'name': "Ain't It Cool", 'id': 1}, {'name': 'Rock \'n\' Roll', 'id': 2}]"#;
        assert_eq!(parse_named_list(raw), vec!["Ain't It Cool", "Rock 'n' Roll"]);
    }

    #[test]
    fn test_entries_without_name_are_skipped() {
        let raw = "[{'id': 1}, {'id': 2, 'name': 'Drama'}]";
        assert_eq!(parse_named_list(raw), vec!["Drama"]);
    }

    #[test]
    fn test_malformed_lists_are_empty() {
        assert!(parse_named_list("").is_empty());
        assert!(parse_named_list("False").is_empty());
        assert!(parse_named_list("0.065736").is_empty());
        assert!(parse_named_list("{'name': 'Drama'}").is_empty());
        assert!(parse_named_list("[]").is_empty());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(Some("7.7")), 7.7);
        assert_eq!(parse_number(Some(" 21.946943 ")), 21.946943);
        assert_eq!(parse_number(Some("")), 0.0);
        assert_eq!(parse_number(Some("/ff9qCepilowshEtG2GYWwzt2bs4.jpg")), 0.0);
        assert_eq!(parse_number(Some("NaN")), 0.0);
        assert_eq!(parse_number(None), 0.0);
    }

    #[test]
    fn test_read_catalog_from_csv() {
        let csv = "\
adult,title,genres,overview,tagline,production_companies,vote_average,popularity
False,Toy Story,\"[{'id': 16, 'name': 'Animation'}]\",Led by Woody,,\"[{'name': 'Pixar Animation Studios', 'id': 3}]\",7.7,21.946943
False,Jumanji,\"[{'id': 12, 'name': 'Adventure'}]\",A magical board game,Roll the dice,[],6.9,
False,,[],No title here,,[],5.0,1.0
";
        let catalog = read_catalog(csv.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 2);
        let toy_story = catalog.get(0).unwrap();
        assert_eq!(toy_story.title, "Toy Story");
        assert_eq!(toy_story.genres, vec!["Animation"]);
        assert_eq!(toy_story.production_companies, vec!["Pixar Animation Studios"]);
        assert_eq!(toy_story.tagline, "");
        assert_eq!(toy_story.vote_average, 7.7);

        let jumanji = catalog.get(1).unwrap();
        assert_eq!(jumanji.tagline, "Roll the dice");
        assert!(jumanji.production_companies.is_empty());
        assert_eq!(jumanji.popularity, 0.0);
    }

    #[test]
    fn test_read_catalog_missing_columns_default() {
        let csv = "title,overview\nHeat,A heist\n";
        let catalog = read_catalog(csv.as_bytes()).unwrap();

        let heat = catalog.get(0).unwrap();
        assert_eq!(heat.overview, "A heist");
        assert!(heat.genres.is_empty());
        assert_eq!(heat.vote_average, 0.0);
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let err = load_catalog("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, RecommenderError::Storage(_)));
    }
}
