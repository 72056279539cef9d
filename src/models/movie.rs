use serde::{Deserialize, Serialize};

/// One catalog entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    /// Display title, also the lookup key once normalized
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub production_companies: Vec<String>,
    /// Average user rating, 0 when the source had none
    #[serde(default)]
    pub vote_average: f64,
    /// Source popularity figure, 0 when the source had none
    #[serde(default)]
    pub popularity: f64,
}

impl MovieRecord {
    /// Creates a record with only a title set
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = overview.into();
        self
    }

    pub fn with_tagline(mut self, tagline: impl Into<String>) -> Self {
        self.tagline = tagline.into();
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_production_companies<I, S>(mut self, companies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.production_companies = companies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ratings(mut self, vote_average: f64, popularity: f64) -> Self {
        self.vote_average = vote_average;
        self.popularity = popularity;
        self
    }

    /// Free-text document fed to the TF-IDF vectorizer
    ///
    /// Overview, genres, title, tagline and production companies joined by single
    /// spaces, with the list fields comma-joined.
    pub fn content(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.overview,
            self.genres.join(", "),
            self.title,
            self.tagline,
            self.production_companies.join(", ")
        )
    }

    /// Title in the form used for lookups and duplicate filtering
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Trims and lower-cases a title for comparison
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_field_order() {
        let movie = MovieRecord::new("Toy Story")
            .with_overview("Woody and Buzz")
            .with_tagline("The adventure takes off")
            .with_genres(["Animation", "Comedy"])
            .with_production_companies(["Pixar Animation Studios"]);

        assert_eq!(
            movie.content(),
            "Woody and Buzz Animation, Comedy Toy Story The adventure takes off Pixar Animation Studios"
        );
    }

    #[test]
    fn test_content_with_missing_fields() {
        let movie = MovieRecord::new("Heat");
        assert_eq!(movie.content(), "  Heat  ");
    }

    #[test]
    fn test_normalized_title() {
        assert_eq!(normalize_title("  The MATRIX "), "the matrix");
        assert_eq!(MovieRecord::new("Alpha").normalized_title(), "alpha");
    }
}
