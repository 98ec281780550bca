/// This crate turns a jsonl text corpus into bag-of-words count matrices for
/// topic model training, and reads those matrices back as training instances.
pub mod background;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod persist;
pub mod pipeline;
pub mod reader;
pub mod tokenizer;
pub mod utils;
pub mod vectorizer;

/// Error type and result alias
/// Every failure is fatal to a run; see `PreprocessError` for the taxonomy
/// (configuration, parse, I/O, alignment, container format).
pub use error::{PreprocessError, Result};

/// Count Vectorizer
/// Fits a bounded vocabulary over a corpus and converts documents into rows of
/// a sparse count matrix.
/// - token pattern: alphabetic runs of 3 to 30 characters, lowercased
/// - built-in English stop words removed
/// - top-N terms by corpus frequency, or a fixed vocabulary in supplied order
pub use vectorizer::{CountVectorizer, FittedVectorizer, VectorizerConfig, DEFAULT_VOCAB_SIZE};

/// Sparse count matrix
/// CSR storage of term counts; rows are documents, columns vocabulary terms.
/// Persisted as `.npz` archives readable by `scipy.sparse.load_npz`.
pub use utils::matrix::CsrMatrix;

/// Preprocessing pipeline
/// Runs load, fit, transform, background frequency and persistence, writing
/// the full artifact set under one serialization directory.
pub use pipeline::{run, PreprocessConfig, PreprocessSummary};

/// Dataset Reader
/// Yields one `Instance` (dense count vector + optional covariate label) per
/// row of a persisted matrix, lazily or eagerly.
pub use reader::{Instance, ReaderConfig, VampireReader};
