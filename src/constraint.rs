//! Constraint-matrix construction.
//!
//! Builds the L x L matrix A whose solution against the received payloads
//! yields the intermediate symbols:
//!
//! ```text
//!         column 0                         column L-1
//! row 0   +--------------+-----+----------------+
//!         |  LDPC ones   | I_S |  LDPC PI ones  |   S rows
//!         +--------------+-----+-------+--------+
//!         |     G_HDPC = MT x GAMMA    |  I_H   |   H rows
//!         +----------------------------+--------+
//!         |  encoding rows (tuple walk per ISI) |   K' rows
//!         +-------------------------------------+
//! ```
//!
//! The first S + H rows pair with zero payloads (the precode constraints);
//! the remaining rows pair with received encoding symbols.

use crate::encode::encode_indexes;
use crate::gf256::{gf256_alpha_pow, Gf256};
use crate::matrix::OctetMatrix;
use crate::params::SystematicParams;
use crate::rfc6330::rand;

/// Builds the L x L constraint matrix for the given parameters.
///
/// Row layout: S LDPC rows, then H HDPC rows, then one encoding row per ISI
/// in `0..K'`. Callers decoding a damaged block replace encoding rows (and
/// their payloads) with rows for the ISIs actually received.
#[must_use]
pub fn build_constraint_matrix(params: &SystematicParams) -> OctetMatrix {
    let l = params.l();
    let mut a = OctetMatrix::zeros(l, l);
    fill_ldpc_rows(&mut a, params);
    fill_hdpc_rows(&mut a, params);
    fill_encoding_rows(&mut a, params);
    a
}

/// LDPC rows [0, S): circulant ones over [0, B), I_S, and two PI ones.
fn fill_ldpc_rows(a: &mut OctetMatrix, params: &SystematicParams) {
    let s = params.s();
    let b = params.b();
    let w = params.w();
    let p = params.p();

    // Three circulant ones per column of [0, B). The shift never collides
    // within a column for supported table sizes (B < S*(S-1)).
    for i in 0..b {
        let shift = 1 + i / s;
        let mut row = i % s;
        a.set(row, i, Gf256::ONE);
        row = (row + shift) % s;
        a.set(row, i, Gf256::ONE);
        row = (row + shift) % s;
        a.set(row, i, Gf256::ONE);
    }

    // S x S identity at columns [B, B + S).
    for r in 0..s {
        a.set(r, b + r, Gf256::ONE);
    }

    // Each LDPC row also covers two PI columns.
    for r in 0..s {
        a.set(r, w + r % p, Gf256::ONE);
        a.set(r, w + (r + 1) % p, Gf256::ONE);
    }
}

/// HDPC rows [S, S + H): G_HDPC = MT x GAMMA over [0, L - H), then I_H.
fn fill_hdpc_rows(a: &mut OctetMatrix, params: &SystematicParams) {
    let s = params.s();
    let h = params.h();
    let width = params.kprime() + s; // == L - H

    let mut mt = OctetMatrix::zeros(h, width);
    for col in 0..width - 1 {
        let r1 = rand(col as u32 + 1, 6, h as u32) as usize;
        let r2 = (r1 + rand(col as u32 + 1, 7, h as u32 - 1) as usize + 1) % h;
        mt.set(r1, col, Gf256::ONE);
        mt.set(r2, col, Gf256::ONE);
    }
    for r in 0..h {
        mt.set(r, width - 1, gf256_alpha_pow(r));
    }

    let mut gamma = OctetMatrix::zeros(width, width);
    for r in 0..width {
        for c in 0..=r {
            gamma.set(r, c, gf256_alpha_pow(r - c));
        }
    }

    let hdpc = mt.multiply(&gamma);
    for r in 0..h {
        for c in 0..width {
            a.set(s + r, c, hdpc.get(r, c));
        }
        a.set(s + r, width + r, Gf256::ONE);
    }
}

/// Encoding rows [S + H, L): ones at the tuple-walk indices for each ISI.
fn fill_encoding_rows(a: &mut OctetMatrix, params: &SystematicParams) {
    let first = params.s() + params.h();
    for row in first..params.l() {
        let isi = (row - first) as u32;
        for index in encode_indexes(params, isi) {
            a.set(row, index, Gf256::ONE);
        }
    }
}

/// Writes the encoding row for a single ISI into an existing matrix row.
///
/// Used when assembling a decode system from received symbols whose ISIs do
/// not match the systematic layout.
pub fn fill_encoding_row(a: &mut OctetMatrix, row: usize, params: &SystematicParams, isi: u32) {
    a.row_mut(row).fill(0);
    for index in encode_indexes(params, isi) {
        a.set(row, index, Gf256::ONE);
    }
}
