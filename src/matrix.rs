//! Dense octet matrices and shared elimination utilities over GF(256).
//!
//! The decoder and the constraint builder both work on row-major dense
//! matrices of raw bytes. Row operations delegate to the bulk kernels in
//! [`crate::gf256`]; mutable-aliasing pairs are resolved with `split_at_mut`
//! so no row is ever cloned inside an elimination loop.

use crate::gf256::{gf256_addmul_slice, gf256_mul_slice, Gf256};

/// A dense row-major matrix over GF(256).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetMatrix {
    cols: usize,
    rows: Vec<Vec<u8>>,
}

impl OctetMatrix {
    /// Creates a zero matrix with the given dimensions.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            rows: vec![vec![0; cols]; rows],
        }
    }

    /// Creates a matrix from pre-built rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows do not all have the same length.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|r| r.len() == cols),
            "ragged rows in matrix construction"
        );
        Self { cols, rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub const fn col_count(&self) -> usize {
        self.cols
    }

    /// Returns the element at `(row, col)`.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Gf256 {
        Gf256::new(self.rows[row][col])
    }

    /// Sets the element at `(row, col)`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Gf256) {
        self.rows[row][col] = value.raw();
    }

    /// Borrows a row as a byte slice.
    #[inline]
    #[must_use]
    pub fn row(&self, row: usize) -> &[u8] {
        &self.rows[row]
    }

    /// Borrows a row mutably.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [u8] {
        &mut self.rows[row]
    }

    /// Swaps two rows.
    #[inline]
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        self.rows.swap(a, b);
    }

    /// Swaps two columns across every row.
    pub fn swap_columns(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for row in &mut self.rows {
            row.swap(a, b);
        }
    }

    /// Drops all rows at index `len` and beyond.
    pub fn truncate_rows(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    /// Scales a row in place: `row *= factor`.
    pub fn scale_row(&mut self, row: usize, factor: Gf256) {
        gf256_mul_slice(&mut self.rows[row], factor);
    }

    /// Row operation `rows[dst][start_col..] += factor * rows[src][start_col..]`.
    ///
    /// # Panics
    ///
    /// Panics if `dst == src`.
    pub fn scale_add_row(&mut self, dst: usize, src: usize, factor: Gf256, start_col: usize) {
        assert_ne!(dst, src, "row scale-add requires distinct rows");
        let (dst_row, src_row) = if dst < src {
            let (lo, hi) = self.rows.split_at_mut(src);
            (&mut lo[dst], &hi[0])
        } else {
            let (lo, hi) = self.rows.split_at_mut(dst);
            (&mut hi[0], &lo[src])
        };
        gf256_addmul_slice(&mut dst_row[start_col..], &src_row[start_col..], factor);
    }

    /// Matrix product `self * rhs` over GF(256).
    ///
    /// Accumulates whole rows of `rhs` with the addmul kernel, skipping zero
    /// coefficients, which suits the sparse MT factor of the HDPC block.
    ///
    /// # Panics
    ///
    /// Panics if the inner dimensions disagree.
    #[must_use]
    pub fn multiply(&self, rhs: &Self) -> Self {
        assert_eq!(self.cols, rhs.row_count(), "inner dimension mismatch");
        let mut out = Self::zeros(self.row_count(), rhs.col_count());
        for (r, lhs_row) in self.rows.iter().enumerate() {
            for (k, &coeff) in lhs_row.iter().enumerate() {
                if coeff != 0 {
                    gf256_addmul_slice(&mut out.rows[r], &rhs.rows[k], Gf256::new(coeff));
                }
            }
        }
        out
    }

    /// Consumes the matrix, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<u8>> {
        self.rows
    }
}

/// Payload operation `payloads[dst] += factor * payloads[src]`.
///
/// # Panics
///
/// Panics if `dst == src` or the payloads differ in length.
pub(crate) fn scale_add_payload(payloads: &mut [Vec<u8>], dst: usize, src: usize, factor: Gf256) {
    assert_ne!(dst, src, "payload scale-add requires distinct symbols");
    let (dst_sym, src_sym) = if dst < src {
        let (lo, hi) = payloads.split_at_mut(src);
        (&mut lo[dst], &hi[0])
    } else {
        let (lo, hi) = payloads.split_at_mut(dst);
        (&mut hi[0], &lo[src])
    };
    gf256_addmul_slice(dst_sym, src_sym, factor);
}

/// Reduces the window `[first_row, last_row) x [first_col, last_col)` of `a`
/// to reduced row-echelon form, mirroring every operation into `payloads`
/// through the row permutation `d`.
///
/// Rows are assumed to carry no nonzero entries left of `first_col` (the
/// caller's elimination has already cleared them), so whole-row scaling is
/// equivalent to window scaling.
///
/// Returns the number of pivots found (the rank of the window).
pub fn reduce_to_row_echelon(
    a: &mut OctetMatrix,
    first_row: usize,
    last_row: usize,
    first_col: usize,
    last_col: usize,
    d: &mut [usize],
    payloads: &mut [Vec<u8>],
) -> usize {
    let width = last_col - first_col;
    let mut lead = 0usize;
    let mut pivots = 0usize;

    for r in first_row..last_row {
        if lead >= width {
            break;
        }

        // Find a row with a nonzero in the lead column, advancing the lead
        // column when an entire column of the window is zero.
        let mut i = r;
        while a.get(i, first_col + lead).is_zero() {
            i += 1;
            if i == last_row {
                i = r;
                lead += 1;
                if lead == width {
                    return pivots;
                }
            }
        }
        if i != r {
            a.swap_rows(i, r);
            d.swap(i, r);
        }

        let beta = a.get(r, first_col + lead);
        if beta != Gf256::ONE {
            let inv = beta.inv();
            a.scale_row(r, inv);
            gf256_mul_slice(&mut payloads[d[r]], inv);
        }

        for row in first_row..last_row {
            if row == r {
                continue;
            }
            let factor = a.get(row, first_col + lead);
            if !factor.is_zero() {
                a.scale_add_row(row, r, factor, first_col);
                scale_add_payload(payloads, d[row], d[r], factor);
            }
        }

        pivots += 1;
        lead += 1;
    }

    pivots
}

/// Returns true when the `size` x `size` block of `a` anchored at
/// `(first_row, first_col)` is the identity.
#[must_use]
pub fn is_identity_block(a: &OctetMatrix, first_row: usize, first_col: usize, size: usize) -> bool {
    for r in 0..size {
        for c in 0..size {
            let expected = u8::from(r == c);
            if a.get(first_row + r, first_col + c).raw() != expected {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[u8]]) -> OctetMatrix {
        OctetMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect())
    }

    #[test]
    fn swap_rows_and_columns() {
        let mut m = matrix(&[&[1, 2], &[3, 4]]);
        m.swap_rows(0, 1);
        assert_eq!(m.row(0), &[3, 4]);
        m.swap_columns(0, 1);
        assert_eq!(m.row(0), &[4, 3]);
        assert_eq!(m.row(1), &[2, 1]);
    }

    #[test]
    fn scale_add_row_applies_factor() {
        let mut m = matrix(&[&[1, 2, 3], &[4, 5, 6]]);
        m.scale_add_row(1, 0, Gf256::ONE, 1);
        assert_eq!(m.row(1), &[4, 5 ^ 2, 6 ^ 3]);

        let mut m = matrix(&[&[0, 1], &[0, 3]]);
        m.scale_add_row(1, 0, Gf256::new(3), 0);
        assert_eq!(m.get(1, 1), Gf256::new(3) + Gf256::new(3) * Gf256::ONE);
    }

    #[test]
    fn multiply_identity_is_noop() {
        let m = matrix(&[&[7, 11, 13], &[0, 255, 1]]);
        let id = matrix(&[&[1, 0, 0], &[0, 1, 0], &[0, 0, 1]]);
        assert_eq!(m.multiply(&id), m);
    }

    #[test]
    fn multiply_small_known_product() {
        // [2 0] [1 3]   [2*1  2*3]
        // [1 1] [0 5] = [1    3^5]
        let a = matrix(&[&[2, 0], &[1, 1]]);
        let b = matrix(&[&[1, 3], &[0, 5]]);
        let prod = a.multiply(&b);
        assert_eq!(prod.get(0, 0), Gf256::new(2));
        assert_eq!(prod.get(0, 1), Gf256::new(2) * Gf256::new(3));
        assert_eq!(prod.get(1, 0), Gf256::new(1));
        assert_eq!(prod.get(1, 1), Gf256::new(3 ^ 5));
    }

    #[test]
    fn payload_scale_add_splits_both_directions() {
        let mut payloads = vec![vec![1u8, 0], vec![0u8, 1]];
        scale_add_payload(&mut payloads, 0, 1, Gf256::new(2));
        assert_eq!(payloads[0], vec![1, 2]);
        scale_add_payload(&mut payloads, 1, 0, Gf256::ONE);
        assert_eq!(payloads[1], vec![1, 3]);
    }

    #[test]
    fn echelon_reduces_full_rank_window_to_identity() {
        let mut a = matrix(&[&[3, 1, 0], &[1, 1, 2], &[0, 2, 1]]);
        let mut d: Vec<usize> = (0..3).collect();
        let mut payloads = vec![vec![10u8], vec![20u8], vec![30u8]];
        let rank = reduce_to_row_echelon(&mut a, 0, 3, 0, 3, &mut d, &mut payloads);
        assert_eq!(rank, 3);
        assert!(is_identity_block(&a, 0, 0, 3));

        // The mirrored payloads must solve the original system: row r of the
        // identity result means payloads[d[r]] is the r-th unknown. Verify by
        // substituting back into the original equations.
        let orig = matrix(&[&[3, 1, 0], &[1, 1, 2], &[0, 2, 1]]);
        let rhs = [10u8, 20, 30];
        for r in 0..3 {
            let mut acc = Gf256::ZERO;
            for c in 0..3 {
                acc += orig.get(r, c) * Gf256::new(payloads[d[c]][0]);
            }
            assert_eq!(acc.raw(), rhs[r], "equation {r} not satisfied");
        }
    }

    #[test]
    fn echelon_reports_rank_deficiency() {
        // Row 2 = row 0 + row 1, so rank is 2.
        let mut a = matrix(&[&[1, 0, 1], &[0, 1, 1], &[1, 1, 0]]);
        let mut d: Vec<usize> = (0..3).collect();
        let mut payloads = vec![vec![0u8]; 3];
        let rank = reduce_to_row_echelon(&mut a, 0, 3, 0, 3, &mut d, &mut payloads);
        assert_eq!(rank, 2);
        assert!(!is_identity_block(&a, 0, 0, 3));
    }

    #[test]
    fn echelon_respects_window_bounds() {
        // Only the lower-right 2x2 window participates; outside entries stay.
        let mut a = matrix(&[&[9, 9, 9], &[0, 2, 0], &[0, 0, 4]]);
        let mut d: Vec<usize> = (0..3).collect();
        let mut payloads = vec![vec![1u8], vec![2u8], vec![3u8]];
        let rank = reduce_to_row_echelon(&mut a, 1, 3, 1, 3, &mut d, &mut payloads);
        assert_eq!(rank, 2);
        assert_eq!(a.row(0), &[9, 9, 9]);
        assert!(is_identity_block(&a, 1, 1, 2));
    }
}
