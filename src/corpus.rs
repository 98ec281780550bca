//! Newline-delimited JSON corpus loading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PreprocessError, Result};
use crate::tokenizer::WordSplitter;

/// One corpus line. Other fields on the line are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusRecord {
    pub text: String,
}

/// Turns a user-supplied corpus location into a readable local file.
///
/// Remote sources are fetched and cached by an implementation outside this
/// crate; [`LocalFiles`] handles paths already on disk.
pub trait PathResolver {
    fn resolve(&self, path: &Path) -> Result<PathBuf>;
}

/// Resolver for local paths
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl PathResolver for LocalFiles {
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(PreprocessError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ))
        }
    }
}

/// Read `path` and return the text of every record in file order.
///
/// With `tokenize` set, each text is split by `splitter` and re-joined with
/// single spaces. The first malformed line aborts the load.
pub fn load_data(path: &Path, tokenize: bool, splitter: &WordSplitter) -> Result<Vec<String>> {
    info!("loading {}", path.display());
    let file = File::open(path).map_err(|e| PreprocessError::io(path, e))?;
    let mut texts = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| PreprocessError::io(path, e))?;
        let record: CorpusRecord = serde_json::from_str(&line).map_err(|e| PreprocessError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        let text = if tokenize {
            splitter.split_words(&record.text)?.join(" ")
        } else {
            record.text
        };
        texts.push(text);
    }
    debug!("read {} records from {}", texts.len(), path.display());
    Ok(texts)
}

/// Training texts, concatenated across sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainCorpus {
    pub texts: Vec<String>,
    /// source index per text; only set when more than one source was loaded
    pub sources: Option<Vec<usize>>,
}

/// Load every training source in order.
///
/// With several sources each record is labelled with the position of its
/// file in `paths`, parallel to `texts`.
pub fn load_train(
    paths: &[PathBuf],
    tokenize: bool,
    splitter: &WordSplitter,
    resolver: &dyn PathResolver,
) -> Result<TrainCorpus> {
    if paths.is_empty() {
        return Err(PreprocessError::Configuration("no train path given".to_string()));
    }
    let mut corpus = TrainCorpus::default();
    let mut sources = Vec::new();
    for (ix, path) in paths.iter().enumerate() {
        let texts = load_data(&resolver.resolve(path)?, tokenize, splitter)?;
        sources.extend(std::iter::repeat(ix).take(texts.len()));
        corpus.texts.extend(texts);
    }
    if paths.len() > 1 {
        corpus.sources = Some(sources);
    }
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn records_keep_file_order_and_ignore_extra_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "train.jsonl",
            "{\"text\": \"first doc\", \"label\": 1}\n{\"id\": 7, \"text\": \"second  doc\"}\n",
        );
        let texts = load_data(&path, false, &WordSplitter::Whitespace).unwrap();
        assert_eq!(texts, vec!["first doc", "second  doc"]);
    }

    #[test]
    fn tokenize_rejoins_with_single_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "train.jsonl", "{\"text\": \" a\\tb   c \"}\n");
        let texts = load_data(&path, true, &WordSplitter::Whitespace).unwrap();
        assert_eq!(texts, vec!["a b c"]);
    }

    #[test]
    fn missing_text_field_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.jsonl", "{\"text\": \"ok\"}\n{\"body\": \"nope\"}\n");
        match load_data(&path, false, &WordSplitter::Whitespace) {
            Err(PreprocessError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.jsonl", "not json\n");
        assert!(matches!(
            load_data(&path, false, &WordSplitter::Whitespace),
            Err(PreprocessError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn several_sources_are_labelled_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.jsonl", "{\"text\": \"a1\"}\n{\"text\": \"a2\"}\n");
        let b = write(dir.path(), "b.jsonl", "{\"text\": \"b1\"}\n");
        let corpus = load_train(&[a.clone(), b], false, &WordSplitter::Whitespace, &LocalFiles).unwrap();
        assert_eq!(corpus.texts, vec!["a1", "a2", "b1"]);
        assert_eq!(corpus.sources, Some(vec![0, 0, 1]));

        let single = load_train(&[a], false, &WordSplitter::Whitespace, &LocalFiles).unwrap();
        assert_eq!(single.sources, None);
    }

    #[test]
    fn local_resolver_rejects_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFiles.resolve(&dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
    }
}
