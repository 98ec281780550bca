//! Background term frequencies used as the topic model's prior.

use indexmap::IndexMap;
use num::{Num, ToPrimitive};

use crate::error::{PreprocessError, Result};
use crate::utils::matrix::CsrMatrix;

/// Column sums of `matrix` divided by `vocab_size`, keyed by term.
///
/// `terms` names the matrix columns in order (unknown sentinel included).
/// The normalizer is the configured vocabulary size, not the total count.
pub fn compute<N, S>(matrix: &CsrMatrix<N>, terms: &[S], vocab_size: usize) -> Result<IndexMap<String, f64>>
where
    N: Num + Copy + ToPrimitive,
    S: AsRef<str>,
{
    if terms.len() != matrix.cols() {
        return Err(PreprocessError::Configuration(format!(
            "{} vocabulary terms for a matrix with {} columns",
            terms.len(),
            matrix.cols()
        )));
    }
    if vocab_size == 0 {
        return Err(PreprocessError::Configuration("vocabulary size must be positive".to_string()));
    }
    let norm = vocab_size as f64;
    Ok(terms
        .iter()
        .zip(matrix.column_sums())
        .map(|(term, sum)| (term.as_ref().to_string(), sum.to_f64().unwrap_or(0.0) / norm))
        .collect())
}
