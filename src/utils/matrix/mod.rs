pub mod npz;

use num::Num;

use crate::error::{PreprocessError, Result};
use crate::utils::sort::sort_by_column;

/// Compressed sparse row matrix of term counts.
///
/// Rows are documents in corpus order, columns are vocabulary terms.
/// Row `i` owns `indices[indptr[i]..indptr[i + 1]]` (column indices, ascending)
/// and the matching slice of `data`. Zero entries are never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<N = i64>
where
    N: Num + Copy,
{
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    data: Vec<N>,
}

impl<N> CsrMatrix<N>
where
    N: Num + Copy,
{
    /// Empty matrix with `cols` columns and no rows
    pub fn new(cols: usize) -> Self {
        Self {
            rows: 0,
            cols,
            indptr: vec![0],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build from raw CSR arrays, checking the structure.
    pub fn from_parts(
        rows: usize,
        cols: usize,
        indptr: Vec<usize>,
        indices: Vec<u32>,
        data: Vec<N>,
    ) -> std::result::Result<Self, String> {
        if indptr.len() != rows + 1 {
            return Err(format!("indptr has {} entries, expected {}", indptr.len(), rows + 1));
        }
        if indices.len() != data.len() {
            return Err(format!(
                "indices ({}) and data ({}) differ in length",
                indices.len(),
                data.len()
            ));
        }
        if indptr[0] != 0 || indptr[rows] != data.len() {
            return Err("indptr does not span the stored entries".to_string());
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err("indptr is not monotonic".to_string());
        }
        if let Some(&bad) = indices.iter().find(|&&c| c as usize >= cols) {
            return Err(format!("column index {bad} out of range for {cols} columns"));
        }
        let mut matrix = Self { rows, cols, indptr, indices, data };
        matrix.sort_indices();
        Ok(matrix)
    }

    /// Append one row given as (column, value) pairs in any order.
    /// Zero values are dropped.
    pub fn push_row(&mut self, mut cols: Vec<u32>, mut vals: Vec<N>) -> Result<()> {
        if cols.len() != vals.len() {
            return Err(PreprocessError::Configuration(format!(
                "row has {} columns but {} values",
                cols.len(),
                vals.len()
            )));
        }
        if let Some(&bad) = cols.iter().find(|&&c| c as usize >= self.cols) {
            return Err(PreprocessError::Configuration(format!(
                "column index {bad} out of range for {} columns",
                self.cols
            )));
        }
        sort_by_column(&mut cols, &mut vals);
        for (c, v) in cols.into_iter().zip(vals) {
            if v != N::zero() {
                self.indices.push(c);
                self.data.push(v);
            }
        }
        self.indptr.push(self.indices.len());
        self.rows += 1;
        Ok(())
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn data(&self) -> &[N] {
        &self.data
    }

    /// Column indices and values of row `row`
    ///
    /// # Panics
    /// if `row >= self.rows()`
    pub fn row(&self, row: usize) -> (&[u32], &[N]) {
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        (&self.indices[start..end], &self.data[start..end])
    }

    /// Row `row` as a dense vector of length `cols`
    pub fn dense_row(&self, row: usize) -> Vec<N> {
        let mut dense = vec![N::zero(); self.cols];
        let (cols, vals) = self.row(row);
        for (&c, &v) in cols.iter().zip(vals) {
            dense[c as usize] = v;
        }
        dense
    }

    /// Shift every column right by one and insert an all-zero column 0.
    pub fn prepend_zero_column(mut self) -> Self {
        for c in self.indices.iter_mut() {
            *c += 1;
        }
        self.cols += 1;
        self
    }

    /// Stack matrices with identical column counts on top of each other.
    pub fn vstack(parts: &[&CsrMatrix<N>]) -> Result<Self> {
        let cols = parts.first().map_or(0, |m| m.cols);
        let mut out = Self::new(cols);
        for part in parts {
            if part.cols != cols {
                return Err(PreprocessError::Configuration(format!(
                    "cannot stack a matrix with {} columns onto one with {}",
                    part.cols, cols
                )));
            }
            let offset = out.data.len();
            out.indices.extend_from_slice(&part.indices);
            out.data.extend_from_slice(&part.data);
            out.indptr.extend(part.indptr[1..].iter().map(|p| p + offset));
            out.rows += part.rows;
        }
        Ok(out)
    }

    /// Sum of each column over all rows
    pub fn column_sums(&self) -> Vec<N> {
        let mut sums = vec![N::zero(); self.cols];
        for (&c, &v) in self.indices.iter().zip(&self.data) {
            sums[c as usize] = sums[c as usize] + v;
        }
        sums
    }

    fn sort_indices(&mut self) {
        for row in 0..self.rows {
            let (start, end) = (self.indptr[row], self.indptr[row + 1]);
            sort_by_column(&mut self.indices[start..end], &mut self.data[start..end]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CsrMatrix<i64> {
        let mut m = CsrMatrix::new(4);
        m.push_row(vec![3, 0], vec![2, 1]).unwrap();
        m.push_row(vec![], vec![]).unwrap();
        m.push_row(vec![1, 2], vec![5, 0]).unwrap();
        m
    }

    #[test]
    fn push_row_sorts_and_drops_zeros() {
        let m = sample();
        assert_eq!(m.shape(), (3, 4));
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row(0), (&[0u32, 3][..], &[1i64, 2][..]));
        assert_eq!(m.row(1).0.len(), 0);
        assert_eq!(m.dense_row(2), vec![0, 5, 0, 0]);
    }

    #[test]
    fn push_row_rejects_out_of_range_column() {
        let mut m = CsrMatrix::<i64>::new(2);
        assert!(m.push_row(vec![2], vec![1]).is_err());
        assert_eq!(m.rows(), 0);
    }

    #[test]
    fn prepend_zero_column_shifts_entries() {
        let m = sample().prepend_zero_column();
        assert_eq!(m.shape(), (3, 5));
        assert_eq!(m.dense_row(0), vec![0, 1, 0, 0, 2]);
        assert_eq!(m.column_sums()[0], 0);
    }

    #[test]
    fn vstack_keeps_row_order() {
        let top = sample();
        let mut bottom = CsrMatrix::new(4);
        bottom.push_row(vec![2], vec![7]).unwrap();

        let all = CsrMatrix::vstack(&[&top, &bottom]).unwrap();
        assert_eq!(all.shape(), (4, 4));
        assert_eq!(all.dense_row(0), top.dense_row(0));
        assert_eq!(all.dense_row(3), vec![0, 0, 7, 0]);
        assert_eq!(all.column_sums(), vec![1, 5, 7, 2]);
    }

    #[test]
    fn vstack_rejects_column_mismatch() {
        let a = CsrMatrix::<i64>::new(3);
        let b = CsrMatrix::<i64>::new(4);
        assert!(CsrMatrix::vstack(&[&a, &b]).is_err());
    }

    #[test]
    fn from_parts_validates_structure() {
        assert!(CsrMatrix::<i64>::from_parts(1, 2, vec![0, 1], vec![2], vec![1]).is_err());
        assert!(CsrMatrix::<i64>::from_parts(2, 2, vec![0, 1], vec![0], vec![1]).is_err());
        assert!(CsrMatrix::<i64>::from_parts(2, 2, vec![0, 2, 1], vec![0, 1], vec![1, 1]).is_err());

        let m = CsrMatrix::<i64>::from_parts(1, 3, vec![0, 2], vec![2, 0], vec![4, 3]).unwrap();
        assert_eq!(m.dense_row(0), vec![3, 0, 4]);
    }
}
