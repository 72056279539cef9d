use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ndarray::{Array2, ArrayViewMut1};
use regex::Regex;

use crate::error::{RecommenderError, RecommenderResult};

/// Words of two or more word characters
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

/// Lower-cases the text and splits it into word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// TF-IDF weights learned from one corpus
///
/// Vocabulary columns are in lexicographic order. Rows produced by
/// [`TfidfVectorizer::transform`] are L2-normalized; documents without any
/// vocabulary term stay all-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfVectorizer {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f32>,
}

/// Fits a TF-IDF vectorizer, keeping the `max_features` most frequent terms
///
/// Term frequency is counted over the whole corpus; ties are broken by term so the
/// vocabulary does not depend on hash order. IDF is smoothed:
/// `ln((1 + n_docs) / (1 + df)) + 1`.
pub fn fit_text_vectorizer<S: AsRef<str>>(
    corpus: &[S],
    max_features: usize,
) -> RecommenderResult<TfidfVectorizer> {
    if corpus.is_empty() {
        return Err(RecommenderError::Data(
            "Cannot fit text vectorizer on an empty corpus".to_string(),
        ));
    }

    let mut term_freq: HashMap<String, usize> = HashMap::new();
    let mut doc_freq: HashMap<String, usize> = HashMap::new();

    for doc in corpus {
        let mut seen: HashSet<String> = HashSet::new();
        for token in tokenize(doc.as_ref()) {
            *term_freq.entry(token.clone()).or_insert(0) += 1;
            seen.insert(token);
        }
        for term in seen {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(max_features);

    let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
    vocabulary.sort();

    let n_docs = corpus.len() as f64;
    let idf = vocabulary
        .iter()
        .map(|term| {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
            (((1.0 + n_docs) / (1.0 + df)).ln() + 1.0) as f32
        })
        .collect();

    let index = vocabulary
        .iter()
        .enumerate()
        .map(|(i, term)| (term.clone(), i))
        .collect();

    tracing::debug!(
        documents = corpus.len(),
        vocabulary = vocabulary.len(),
        "Fitted text vectorizer"
    );

    Ok(TfidfVectorizer {
        vocabulary,
        index,
        idf,
    })
}

impl TfidfVectorizer {
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    /// Dense `documents × vocabulary` block
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Array2<f32> {
        let mut block = Array2::zeros((documents.len(), self.width()));
        for (doc, row) in documents.iter().zip(block.rows_mut()) {
            self.transform_into(doc.as_ref(), row);
        }
        block
    }

    fn transform_into(&self, document: &str, mut row: ArrayViewMut1<f32>) {
        for token in tokenize(document) {
            if let Some(&column) = self.index.get(&token) {
                row[column] += 1.0;
            }
        }

        for (value, idf) in row.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(
            tokenize("A hero, fights! I x-ray"),
            vec!["hero", "fights", "ray"]
        );
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let corpus: Vec<String> = vec![];
        let err = fit_text_vectorizer(&corpus, 500).unwrap_err();
        assert!(matches!(err, RecommenderError::Data(_)));
    }

    #[test]
    fn test_vocabulary_is_sorted_and_capped() {
        let corpus = ["zebra zebra apple", "zebra mango", "apple kiwi"];
        let vectorizer = fit_text_vectorizer(&corpus, 2).unwrap();
        // zebra (3) and apple (2) are the most frequent terms
        assert_eq!(vectorizer.vocabulary(), &["apple", "zebra"]);
    }

    #[test]
    fn test_frequency_ties_break_by_term() {
        let corpus = ["delta beta", "gamma alpha"];
        let vectorizer = fit_text_vectorizer(&corpus, 2).unwrap();
        assert_eq!(vectorizer.vocabulary(), &["alpha", "beta"]);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let corpus = ["hero fights villain", "hero wins", "sad story"];
        let vectorizer = fit_text_vectorizer(&corpus, 500).unwrap();
        let block = vectorizer.transform(&corpus);

        assert_eq!(block.dim(), (3, 6));
        for row in block.rows() {
            let norm = row.dot(&row).sqrt();
            assert!((norm - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let corpus = ["hero fights", "hero wins", "hero story"];
        let vectorizer = fit_text_vectorizer(&corpus, 500).unwrap();
        let block = vectorizer.transform(&corpus[..1]);

        let hero = vectorizer.vocabulary().iter().position(|t| t == "hero").unwrap();
        let fights = vectorizer.vocabulary().iter().position(|t| t == "fights").unwrap();
        assert!(block[[0, fights]] > block[[0, hero]]);
    }

    #[test]
    fn test_document_without_known_terms_is_zero() {
        let corpus = ["hero fights"];
        let vectorizer = fit_text_vectorizer(&corpus, 500).unwrap();
        let block = vectorizer.transform(&["unrelated words"]);
        assert!(block.iter().all(|&v| v == 0.0));
    }
}
