//! Reads a persisted count matrix back as one training instance per row.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{PreprocessError, Result};
use crate::utils::matrix::{npz::load_npz, CsrMatrix};

/// Reader options, deserializable from a training config
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReaderConfig {
    /// produce instances one at a time instead of all up front
    #[serde(default)]
    pub lazy: bool,
    /// one covariate label per matrix row
    #[serde(default)]
    pub covariate_file: Option<PathBuf>,
}

/// One document: its dense count vector and optional covariate label
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub tokens: Vec<i64>,
    pub covariate_label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VampireReader {
    config: ReaderConfig,
}

impl VampireReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Instances of the matrix at `path`, in row order.
    ///
    /// In lazy mode nothing is read until the first `next()`; in eager mode
    /// everything is loaded and built here and errors surface immediately.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Instances> {
        let mut lazy = LazyInstances {
            state: ReadState::Uninitialized {
                matrix_path: path.as_ref().to_path_buf(),
                covariate_file: self.config.covariate_file.clone(),
            },
        };
        if self.config.lazy {
            return Ok(Instances::Lazy(lazy));
        }
        let instances = lazy.by_ref().collect::<Result<Vec<_>>>()?;
        Ok(Instances::Eager(instances.into_iter()))
    }

    /// Build one instance; an empty covariate is treated as absent
    pub fn text_to_instance(tokens: Vec<i64>, covariate: Option<&str>) -> Instance {
        Instance {
            tokens,
            covariate_label: covariate.filter(|c| !c.is_empty()).map(str::to_string),
        }
    }
}

/// Iterator returned by [`VampireReader::read`]
#[derive(Debug)]
pub enum Instances {
    Lazy(LazyInstances),
    Eager(std::vec::IntoIter<Instance>),
}

impl Iterator for Instances {
    type Item = Result<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Instances::Lazy(lazy) => lazy.next(),
            Instances::Eager(eager) => eager.next().map(Ok),
        }
    }
}

#[derive(Debug)]
pub struct LazyInstances {
    state: ReadState,
}

#[derive(Debug)]
enum ReadState {
    Uninitialized {
        matrix_path: PathBuf,
        covariate_file: Option<PathBuf>,
    },
    Reading {
        matrix: CsrMatrix<i64>,
        covariates: Option<Vec<String>>,
        next_row: usize,
    },
    Exhausted,
}

impl LazyInstances {
    fn load(matrix_path: &Path, covariate_file: Option<&Path>) -> Result<ReadState> {
        let matrix = load_npz::<i64, _>(matrix_path)?;
        let covariates = covariate_file.map(read_covariates).transpose()?;
        debug!(
            "loaded {:?} matrix from {}",
            matrix.shape(),
            matrix_path.display()
        );
        Ok(ReadState::Reading {
            matrix,
            covariates,
            next_row: 0,
        })
    }
}

impl Iterator for LazyInstances {
    type Item = Result<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        if let ReadState::Uninitialized { matrix_path, covariate_file } = &self.state {
            match Self::load(matrix_path, covariate_file.as_deref()) {
                Ok(state) => self.state = state,
                Err(e) => {
                    self.state = ReadState::Exhausted;
                    return Some(Err(e));
                }
            }
        }

        let ReadState::Reading { matrix, covariates, next_row } = &mut self.state else {
            return None;
        };
        if *next_row >= matrix.rows() {
            self.state = ReadState::Exhausted;
            return None;
        }
        let row = *next_row;
        *next_row += 1;

        let covariate = match covariates {
            Some(labels) => match labels.get(row) {
                Some(label) => Some(label.as_str()),
                None => {
                    let available = labels.len();
                    self.state = ReadState::Exhausted;
                    return Some(Err(PreprocessError::Alignment { row, available }));
                }
            },
            None => None,
        };
        Some(Ok(VampireReader::text_to_instance(matrix.dense_row(row), covariate)))
    }
}

fn read_covariates(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| PreprocessError::io(path, e))?;
    Ok(text.lines().map(|line| line.trim().to_string()).collect())
}
