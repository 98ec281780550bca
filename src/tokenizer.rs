//! Word splitting applied to corpus text before vectorization.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PreprocessError, Result};

/// Which splitter to use, selected by configuration string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    /// `just_spaces`: split on whitespace
    #[default]
    JustSpaces,
    /// `spacy` / `pretrained`: split with a pretrained tokenizer model
    Pretrained,
}

impl FromStr for TokenizerKind {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "just_spaces" => Ok(TokenizerKind::JustSpaces),
            "spacy" | "pretrained" => Ok(TokenizerKind::Pretrained),
            other => Err(PreprocessError::Configuration(format!(
                "unknown tokenizer type '{other}', expected 'just_spaces' or 'spacy'"
            ))),
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerKind::JustSpaces => f.write_str("just_spaces"),
            TokenizerKind::Pretrained => f.write_str("spacy"),
        }
    }
}

/// A ready-to-use splitter
pub enum WordSplitter {
    Whitespace,
    Pretrained(Box<tokenizers::Tokenizer>),
}

impl fmt::Debug for WordSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordSplitter::Whitespace => f.write_str("WordSplitter::Whitespace"),
            WordSplitter::Pretrained(_) => f.write_str("WordSplitter::Pretrained"),
        }
    }
}

impl WordSplitter {
    /// Build the splitter for `kind`.
    ///
    /// The pretrained splitter loads its tokenizer definition (a `tokenizer.json`)
    /// here, so a missing or broken model fails at startup.
    pub fn from_kind(kind: TokenizerKind, model: Option<&Path>) -> Result<Self> {
        match kind {
            TokenizerKind::JustSpaces => Ok(WordSplitter::Whitespace),
            TokenizerKind::Pretrained => {
                let model = model.ok_or_else(|| {
                    PreprocessError::Configuration(format!("tokenizer type '{kind}' needs a tokenizer model file"))
                })?;
                let tokenizer = tokenizers::Tokenizer::from_file(model).map_err(|e| {
                    PreprocessError::Configuration(format!(
                        "cannot load tokenizer model {}: {e}",
                        model.display()
                    ))
                })?;
                Ok(WordSplitter::Pretrained(Box::new(tokenizer)))
            }
        }
    }

    /// Split `text` into words, in order.
    ///
    /// Pretrained words are the spans of `text` the tokenizer's offsets point
    /// at, so model-specific markers and `[UNK]` ids never leak into the
    /// vocabulary. Pieces sharing one span are emitted once.
    pub fn split_words(&self, text: &str) -> Result<Vec<String>> {
        match self {
            WordSplitter::Whitespace => Ok(text.split_whitespace().map(str::to_string).collect()),
            WordSplitter::Pretrained(tokenizer) => {
                let encoding = tokenizer
                    .encode(text, false)
                    .map_err(|e| PreprocessError::Tokenize(e.to_string()))?;
                let mut words = Vec::with_capacity(encoding.len());
                let mut last_span = None;
                for &(start, end) in encoding.get_offsets() {
                    if last_span == Some((start, end)) {
                        continue;
                    }
                    last_span = Some((start, end));
                    match text.get(start..end).map(str::trim) {
                        Some(word) if !word.is_empty() => words.push(word.to_string()),
                        _ => {}
                    }
                }
                Ok(words)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_known_names() {
        assert_eq!("just_spaces".parse::<TokenizerKind>().unwrap(), TokenizerKind::JustSpaces);
        assert_eq!("spacy".parse::<TokenizerKind>().unwrap(), TokenizerKind::Pretrained);
        assert_eq!(TokenizerKind::default().to_string(), "just_spaces");
    }

    #[test]
    fn unknown_kind_is_configuration_error() {
        let err = "nltk".parse::<TokenizerKind>().unwrap_err();
        assert!(matches!(err, PreprocessError::Configuration(_)));
    }

    #[test]
    fn whitespace_split_keeps_order() {
        let splitter = WordSplitter::from_kind(TokenizerKind::JustSpaces, None).unwrap();
        let tokens = splitter.split_words("  topic\tmodels\n are fun ").unwrap();
        assert_eq!(tokens, vec!["topic", "models", "are", "fun"]);
    }

    #[test]
    fn pretrained_without_model_fails_eagerly() {
        let err = WordSplitter::from_kind(TokenizerKind::Pretrained, None).unwrap_err();
        assert!(matches!(err, PreprocessError::Configuration(_)));
    }

    /// Word-level model over byte-level pieces; "zebras" is out of vocabulary.
    const WORD_LEVEL_MODEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "ByteLevel", "add_prefix_space": false, "trim_offsets": true, "use_regex": true},
        "post_processor": null,
        "decoder": null,
        "model": {"type": "WordLevel", "vocab": {"hello": 0, "Ġworld": 1, "[UNK]": 2}, "unk_token": "[UNK]"}
    }"#;

    #[test]
    fn pretrained_split_returns_source_text_spans() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("tokenizer.json");
        std::fs::write(&model, WORD_LEVEL_MODEL).unwrap();

        let splitter = WordSplitter::from_kind(TokenizerKind::Pretrained, Some(&model)).unwrap();
        let words = splitter.split_words("hello world zebras").unwrap();
        assert_eq!(words, vec!["hello", "world", "zebras"]);
        assert!(words.iter().all(|w| !w.contains('Ġ') && w != "[UNK]"));
    }

    #[test]
    fn pretrained_with_missing_model_fails_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("tokenizer.json");
        let err = WordSplitter::from_kind(TokenizerKind::Pretrained, Some(&missing)).unwrap_err();
        assert!(matches!(err, PreprocessError::Configuration(_)));
    }
}
