//! Build-time pipeline: load, fit, vectorize, estimate background frequencies, persist.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::background;
use crate::corpus::{load_data, load_train, LocalFiles, PathResolver};
use crate::error::{PreprocessError, Result};
use crate::persist::{save_json, save_lines, save_sparse_matrix, OutputLayout, NON_PADDED_NAMESPACES};
use crate::tokenizer::{TokenizerKind, WordSplitter};
use crate::utils::matrix::CsrMatrix;
use crate::vectorizer::{CountVectorizer, VectorizerConfig, DEFAULT_VOCAB_SIZE, UNKNOWN_TOKEN};

/// Options of one preprocessing run
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub train_paths: Vec<PathBuf>,
    pub dev_path: PathBuf,
    pub serialization_dir: PathBuf,
    pub vocab_size: usize,
    /// fixed vocabulary file, one term per line
    pub vocabulary: Option<PathBuf>,
    pub tokenize: bool,
    pub tokenizer: TokenizerKind,
    /// tokenizer definition for [`TokenizerKind::Pretrained`]
    pub tokenizer_model: Option<PathBuf>,
}

impl PreprocessConfig {
    pub fn new(train_paths: Vec<PathBuf>, dev_path: PathBuf, serialization_dir: PathBuf) -> Self {
        Self {
            train_paths,
            dev_path,
            serialization_dir,
            vocab_size: DEFAULT_VOCAB_SIZE,
            vocabulary: None,
            tokenize: false,
            tokenizer: TokenizerKind::default(),
            tokenizer_model: None,
        }
    }

    /// Checks that need no input file
    pub fn validate(&self) -> Result<()> {
        if self.train_paths.is_empty() {
            return Err(PreprocessError::Configuration("at least one train path is required".to_string()));
        }
        if self.vocab_size == 0 {
            return Err(PreprocessError::Configuration("vocab size must be positive".to_string()));
        }
        if self.tokenize && self.tokenizer == TokenizerKind::Pretrained && self.tokenizer_model.is_none() {
            return Err(PreprocessError::Configuration(format!(
                "tokenizer type '{}' needs --tokenizer-model",
                self.tokenizer
            )));
        }
        Ok(())
    }
}

/// What a finished run wrote
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessSummary {
    pub train_rows: usize,
    pub dev_rows: usize,
    /// vocabulary length including the unknown sentinel
    pub vocabulary_len: usize,
    pub sources: usize,
}

/// Run with local input paths
pub fn run(config: &PreprocessConfig) -> Result<PreprocessSummary> {
    run_with_resolver(config, &LocalFiles)
}

/// Run, resolving every input path through `resolver`
pub fn run_with_resolver(config: &PreprocessConfig, resolver: &dyn PathResolver) -> Result<PreprocessSummary> {
    config.validate()?;
    let splitter = if config.tokenize {
        WordSplitter::from_kind(config.tokenizer, config.tokenizer_model.as_deref())?
    } else {
        WordSplitter::Whitespace
    };
    let layout = OutputLayout::prepare(&config.serialization_dir)?;

    let train = load_train(&config.train_paths, config.tokenize, &splitter, resolver)?;
    let dev_texts = load_data(&resolver.resolve(&config.dev_path)?, config.tokenize, &splitter)?;

    let fixed_vocabulary = config
        .vocabulary
        .as_deref()
        .map(|path| resolver.resolve(path).and_then(|p| read_vocabulary(&p)))
        .transpose()?;
    let vectorizer = CountVectorizer::new(VectorizerConfig {
        max_features: Some(config.vocab_size),
        vocabulary: fixed_vocabulary,
        ..VectorizerConfig::default()
    })?;

    info!("fitting count vectorizer...");
    let all_texts: Vec<&str> = train.texts.iter().chain(&dev_texts).map(String::as_str).collect();
    let fitted = vectorizer.fit(&all_texts)?;

    let train_matrix = fitted.transform(&train.texts)?.prepend_zero_column();
    let dev_matrix = fitted.transform(&dev_texts)?.prepend_zero_column();
    let master = CsrMatrix::vstack(&[&train_matrix, &dev_matrix])?;

    let terms: Vec<&str> = std::iter::once(UNKNOWN_TOKEN).chain(fitted.feature_names()).collect();

    info!("generating background frequency...");
    let bgfreq = background::compute(&master, &terms, config.vocab_size)?;

    info!("saving data to {}", layout.root().display());
    save_sparse_matrix(&train_matrix, &layout.train_matrix())?;
    save_sparse_matrix(&dev_matrix, &layout.dev_matrix())?;
    save_json(&bgfreq, &layout.background_frequency())?;

    let mut source_count = 0;
    if let Some(sources) = &train.sources {
        let distinct: BTreeSet<usize> = sources.iter().copied().collect();
        source_count = distinct.len();
        save_lines(sources, &layout.sources())?;
        save_lines(
            std::iter::once(UNKNOWN_TOKEN.to_string()).chain(distinct.iter().map(usize::to_string)),
            &layout.covariate_vocabulary(),
        )?;
    }
    save_lines(&terms, &layout.vocabulary())?;
    save_lines(NON_PADDED_NAMESPACES, &layout.non_padded_namespaces())?;

    let summary = PreprocessSummary {
        train_rows: train_matrix.rows(),
        dev_rows: dev_matrix.rows(),
        vocabulary_len: terms.len(),
        sources: source_count,
    };
    info!(
        "wrote {} train rows, {} dev rows, {} vocabulary terms",
        summary.train_rows, summary.dev_rows, summary.vocabulary_len
    );
    Ok(summary)
}

/// One term per line; line endings stripped, blank lines skipped
fn read_vocabulary(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| PreprocessError::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
