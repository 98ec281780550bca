pub mod stop_words;
pub mod term;

use std::collections::HashSet;

use indexmap::IndexSet;
use regex::Regex;
use tracing::debug;

use crate::error::{PreprocessError, Result};
use crate::utils::matrix::CsrMatrix;
use crate::vectorizer::{stop_words::ENGLISH_STOP_WORDS, term::TermCounts};

/// Alphabetic runs of 3 to 30 characters, digits and underscore excluded
pub const DEFAULT_TOKEN_PATTERN: &str = r"\b[^\d\W_]{3,30}\b";
pub const DEFAULT_VOCAB_SIZE: usize = 10_000;
/// Sentinel term owning column 0 of every persisted matrix
pub const UNKNOWN_TOKEN: &str = "@@UNKNOWN@@";

/// Immutable fitting parameters of a [`CountVectorizer`]
#[derive(Debug, Clone)]
pub struct VectorizerConfig {
    pub token_pattern: &'static str,
    pub lowercase: bool,
    pub stop_words: &'static [&'static str],
    /// keep only the N most frequent terms; ignored when `vocabulary` is set
    pub max_features: Option<usize>,
    /// fixed vocabulary, used as-is in the given order
    pub vocabulary: Option<Vec<String>>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            token_pattern: DEFAULT_TOKEN_PATTERN,
            lowercase: true,
            stop_words: ENGLISH_STOP_WORDS,
            max_features: Some(DEFAULT_VOCAB_SIZE),
            vocabulary: None,
        }
    }
}

/// Bag-of-words count vectorizer.
///
/// `fit` builds a bounded vocabulary from a corpus; the resulting
/// [`FittedVectorizer`] turns documents into rows of a [`CsrMatrix`].
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    config: VectorizerConfig,
    analyzer: Analyzer,
}

#[derive(Debug, Clone)]
struct Analyzer {
    pattern: Regex,
    lowercase: bool,
    stop_words: HashSet<String>,
}

impl Analyzer {
    /// Lowercase, extract tokens, drop stop words
    fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase { text.to_lowercase() } else { text.to_string() };
        self.pattern
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .map(str::to_string)
            .collect()
    }
}

impl CountVectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        let pattern = Regex::new(config.token_pattern).map_err(|e| {
            PreprocessError::Configuration(format!("invalid token pattern '{}': {e}", config.token_pattern))
        })?;
        let analyzer = Analyzer {
            pattern,
            lowercase: config.lowercase,
            stop_words: config.stop_words.iter().map(|w| w.to_string()).collect(),
        };
        Ok(Self { config, analyzer })
    }

    /// Terms of `text` that count towards the bag of words
    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.analyzer.analyze(text)
    }

    /// Learn the vocabulary.
    ///
    /// With a fixed vocabulary the documents are not scanned; otherwise the
    /// `max_features` most frequent terms are kept, in alphabetical order.
    pub fn fit<S: AsRef<str>>(self, docs: &[S]) -> Result<FittedVectorizer> {
        let vocabulary = match &self.config.vocabulary {
            Some(fixed) => fixed_vocabulary(fixed)?,
            None => {
                let mut corpus = TermCounts::new();
                for doc in docs {
                    corpus.add_terms(self.analyzer.analyze(doc.as_ref()));
                }
                debug!(
                    "counted {} distinct terms over {} documents",
                    corpus.len(),
                    docs.len()
                );
                let terms: IndexSet<String> = corpus.most_frequent(self.config.max_features).into_iter().collect();
                if terms.is_empty() {
                    return Err(PreprocessError::Configuration(
                        "empty vocabulary; perhaps the documents only contain stop words".to_string(),
                    ));
                }
                terms
            }
        };
        Ok(FittedVectorizer {
            analyzer: self.analyzer,
            vocabulary,
        })
    }
}

fn fixed_vocabulary(terms: &[String]) -> Result<IndexSet<String>> {
    let mut vocabulary = IndexSet::with_capacity(terms.len());
    for term in terms {
        if term == UNKNOWN_TOKEN {
            return Err(PreprocessError::Configuration(format!(
                "supplied vocabulary must not contain the reserved term '{UNKNOWN_TOKEN}'"
            )));
        }
        if !vocabulary.insert(term.clone()) {
            return Err(PreprocessError::Configuration(format!("duplicate term in vocabulary: '{term}'")));
        }
    }
    if vocabulary.is_empty() {
        return Err(PreprocessError::Configuration("supplied vocabulary is empty".to_string()));
    }
    Ok(vocabulary)
}

/// A vectorizer with a learned vocabulary
#[derive(Debug, Clone)]
pub struct FittedVectorizer {
    analyzer: Analyzer,
    vocabulary: IndexSet<String>,
}

impl FittedVectorizer {
    /// Vocabulary terms in column order
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.iter().map(String::as_str)
    }

    /// Column of `term`, if it is in the vocabulary
    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get_index_of(term)
    }

    /// One row of term counts per document; out-of-vocabulary terms are dropped.
    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> Result<CsrMatrix<i64>> {
        let mut matrix = CsrMatrix::new(self.vocabulary.len());
        for doc in docs {
            let counts: TermCounts = self.analyzer.analyze(doc.as_ref()).into_iter().collect();
            let mut cols = Vec::with_capacity(counts.len());
            let mut vals = Vec::with_capacity(counts.len());
            for (term, count) in counts.iter() {
                if let Some(col) = self.vocabulary.get_index_of(term) {
                    cols.push(col as u32);
                    vals.push(count as i64);
                }
            }
            matrix.push_row(cols, vals)?;
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer(max_features: Option<usize>) -> CountVectorizer {
        CountVectorizer::new(VectorizerConfig {
            max_features,
            ..VectorizerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn analyze_applies_pattern_case_and_stop_words() {
        let v = vectorizer(None);
        let terms = v.analyze("The Quick fox2 ran to the_river, over abc123 and Zebras go");
        assert_eq!(terms, vec!["quick", "ran", "zebras"]);
    }

    #[test]
    fn analyze_respects_length_bounds() {
        let v = vectorizer(None);
        let long = "x".repeat(31);
        let max = "y".repeat(30);
        let terms = v.analyze(&format!("ok fine {long} {max}"));
        assert_eq!(terms, vec!["fine".to_string(), max]);
    }

    #[test]
    fn analyze_treats_underscore_as_non_alphabetic() {
        let v = vectorizer(None);
        assert_eq!(v.analyze("snake_case __init__ words under_"), vec!["words"]);
    }

    #[test]
    fn fit_keeps_most_frequent_terms() {
        let docs = ["apple apple apple banana", "banana cherry apple", "durian"];
        let fitted = vectorizer(Some(2)).fit(&docs).unwrap();
        let names: HashSet<&str> = fitted.feature_names().collect();
        assert_eq!(names, HashSet::from(["apple", "banana"]));
    }

    #[test]
    fn fit_without_bound_keeps_every_term_alphabetically() {
        let docs = ["zebra yak", "xenops"];
        let fitted = vectorizer(None).fit(&docs).unwrap();
        assert_eq!(fitted.feature_names().collect::<Vec<_>>(), vec!["xenops", "yak", "zebra"]);
    }

    #[test]
    fn fixed_vocabulary_overrides_frequency_selection() {
        let v = CountVectorizer::new(VectorizerConfig {
            max_features: Some(1),
            vocabulary: Some(vec!["zebra".into(), "apple".into(), "missing".into()]),
            ..VectorizerConfig::default()
        })
        .unwrap();
        let fitted = v.fit(&["apple apple zebra"]).unwrap();
        assert_eq!(fitted.feature_names().collect::<Vec<_>>(), vec!["zebra", "apple", "missing"]);

        let m = fitted.transform(&["apple zebra apple unknownword"]).unwrap();
        assert_eq!(m.dense_row(0), vec![1, 2, 0]);
    }

    #[test]
    fn duplicate_fixed_term_is_rejected() {
        let v = CountVectorizer::new(VectorizerConfig {
            vocabulary: Some(vec!["apple".into(), "apple".into()]),
            ..VectorizerConfig::default()
        })
        .unwrap();
        assert!(matches!(v.fit::<&str>(&[]), Err(PreprocessError::Configuration(_))));
    }

    #[test]
    fn unknown_sentinel_in_fixed_vocabulary_is_rejected() {
        let v = CountVectorizer::new(VectorizerConfig {
            vocabulary: Some(vec!["apple".into(), UNKNOWN_TOKEN.into()]),
            ..VectorizerConfig::default()
        })
        .unwrap();
        let err = v.fit(&["apple"]).unwrap_err();
        assert!(matches!(err, PreprocessError::Configuration(m) if m.contains(UNKNOWN_TOKEN)));
    }

    #[test]
    fn stop_word_only_corpus_fails_to_fit() {
        let err = vectorizer(None).fit(&["the and of", "whereupon"]).unwrap_err();
        assert!(matches!(err, PreprocessError::Configuration(_)));
    }

    #[test]
    fn transform_counts_and_drops_unknown_terms() {
        let fitted = vectorizer(None).fit(&["river stone river", "stone"]).unwrap();
        let m = fitted.transform(&["river river lake", "", "stone"]).unwrap();
        assert_eq!(m.shape(), (3, 2));
        let river = fitted.column_of("river").unwrap();
        assert_eq!(m.dense_row(0)[river], 2);
        assert_eq!(m.row(1).0.len(), 0);
        assert_eq!(m.column_sums().iter().sum::<i64>(), 3);
    }
}
