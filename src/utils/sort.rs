use core::mem;

/// Sort the entries of one sparse row by column index.
/// - `cols` ascending after the call
/// - `vals` permuted along with `cols`
/// - Stable for equal columns
///
/// LSD radix over bytes; passes whose byte is zero for every key are skipped,
/// so a vocabulary under 65536 terms costs at most 2 passes.
#[inline]
pub fn sort_by_column<N: Copy>(cols: &mut [u32], vals: &mut [N]) {
    assert_eq!(cols.len(), vals.len());
    let n = cols.len();
    if n <= 1 {
        return;
    }

    // Short rows are the common case for documents.
    if n <= 32 {
        insertion_sort_by_column(cols, vals);
        return;
    }

    let max_col = cols.iter().copied().max().unwrap_or(0);
    let passes: Vec<u32> = [0u32, 8, 16, 24]
        .into_iter()
        .filter(|&shift| shift == 0 || (max_col >> shift) != 0)
        .collect();

    let mut cols_tmp = vec![0u32; n];
    let mut vals_tmp: Vec<N> = vals.to_vec();

    let mut src_cols: &mut [u32] = cols;
    let mut src_vals: &mut [N] = vals;
    let mut dst_cols: &mut [u32] = &mut cols_tmp;
    let mut dst_vals: &mut [N] = &mut vals_tmp;

    for &shift in &passes {
        let mut offsets = [0usize; 256];
        for &c in src_cols.iter() {
            offsets[((c >> shift) & 0xFF) as usize] += 1;
        }

        let mut sum = 0usize;
        for o in offsets.iter_mut() {
            let count = *o;
            *o = sum;
            sum += count;
        }

        for idx in 0..n {
            let c = src_cols[idx];
            let bucket = ((c >> shift) & 0xFF) as usize;
            let pos = offsets[bucket];
            offsets[bucket] = pos + 1;
            dst_cols[pos] = c;
            dst_vals[pos] = src_vals[idx];
        }

        mem::swap(&mut src_cols, &mut dst_cols);
        mem::swap(&mut src_vals, &mut dst_vals);
    }

    // odd pass count leaves the result in the scratch buffers
    if passes.len() % 2 == 1 {
        dst_cols.copy_from_slice(src_cols);
        dst_vals.copy_from_slice(src_vals);
    }
}

#[inline]
fn insertion_sort_by_column<N: Copy>(cols: &mut [u32], vals: &mut [N]) {
    for i in 1..cols.len() {
        let mut j = i;
        while j > 0 && cols[j] < cols[j - 1] {
            cols.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// sort by column, ties keep their original order
    fn baseline<N: Copy>(cols: &[u32], vals: &[N]) -> (Vec<u32>, Vec<N>) {
        let mut pairs: Vec<(u32, usize, N)> = cols
            .iter()
            .copied()
            .enumerate()
            .map(|(i, c)| (c, i, vals[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        pairs.into_iter().map(|(c, _, v)| (c, v)).unzip()
    }

    /// xorshift32
    struct Rng(u32);
    impl Rng {
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn empty_and_single_rows_are_untouched() {
        let mut cols: Vec<u32> = vec![];
        let mut vals: Vec<i64> = vec![];
        sort_by_column(&mut cols, &mut vals);
        assert!(cols.is_empty());

        let mut cols = vec![9u32];
        let mut vals = vec![4i64];
        sort_by_column(&mut cols, &mut vals);
        assert_eq!(cols, vec![9]);
        assert_eq!(vals, vec![4]);
    }

    #[test]
    fn counts_follow_their_columns() {
        let mut cols = vec![5u32, 1, 3, 0];
        let mut vals = vec![50i64, 10, 30, 1];
        sort_by_column(&mut cols, &mut vals);
        assert_eq!(cols, vec![0, 1, 3, 5]);
        assert_eq!(vals, vec![1, 10, 30, 50]);
    }

    #[test]
    fn matches_baseline_for_every_pass_count() {
        let mut rng = Rng(0x1234_5678);
        // masks force 1, 2, 3 and 4 radix passes
        for &mask in &[0xFFu32, 0xFFFF, 0x00FF_FFFF, u32::MAX] {
            for &n in &[33usize, 64, 257, 1024] {
                let mut cols: Vec<u32> = (0..n).map(|_| rng.next_u32() & mask).collect();
                let mut vals: Vec<u32> = (0..n as u32).collect();
                let (want_cols, want_vals) = baseline(&cols, &vals);

                sort_by_column(&mut cols, &mut vals);

                assert_eq!(cols, want_cols, "columns mismatch at n={n} mask={mask:#x}");
                assert_eq!(vals, want_vals, "values mismatch at n={n} mask={mask:#x}");
            }
        }
    }
}
