//! Index/encode engine: tuple-driven symbol construction.
//!
//! An encoding symbol with ISI `x` is the XOR of a small set of intermediate
//! symbols selected by the LT tuple for `x`. [`encode_indexes`] produces the
//! selected intermediate indices and [`encode_symbol`] XORs the corresponding
//! payloads; both share one traversal, so the constraint-matrix row for an
//! ISI and the symbol arithmetic can never disagree.

use crate::gf256::gf256_add_slice;
use crate::params::SystematicParams;
use crate::rfc6330::tuple;

/// Intermediate-symbol indices combined into the encoding symbol for `isi`.
///
/// The LT walk starts at column `b` and advances by `+a mod W` a further `d`
/// times, collecting every visited column; the PI walk draws `d1` indices
/// over `[0, P)` by rejection-resampling modulo P1, offset into `[W, L)`.
/// The walk lengths stay below the cycle lengths of both prime-modulus
/// walks, so the output indices are distinct.
#[must_use]
pub fn encode_indexes(params: &SystematicParams, isi: u32) -> Vec<usize> {
    let w = params.w();
    let p = params.p();
    let p1 = params.p1();
    let t = tuple(params.j(), w, p1, isi);

    let mut out = Vec::with_capacity(t.d + 1 + t.d1);

    // LT side over W.
    let mut b = t.b % w;
    out.push(b);
    for _ in 0..t.d {
        b = (b + t.a) % w;
        out.push(b);
    }

    // PI side over P via P1 rejection.
    let mut b1 = t.b1 % p1;
    while b1 >= p {
        b1 = (b1 + t.a1) % p1;
    }
    out.push(w + b1);
    for _ in 1..t.d1 {
        b1 = (b1 + t.a1) % p1;
        while b1 >= p {
            b1 = (b1 + t.a1) % p1;
        }
        out.push(w + b1);
    }

    out
}

/// Builds the encoding symbol for `isi` from the L intermediate symbols.
///
/// ISIs below K' reproduce the source symbols; larger ISIs produce repair
/// symbols.
///
/// # Panics
///
/// Panics if `intermediate` does not hold exactly L symbols or the symbols
/// differ in length.
#[must_use]
pub fn encode_symbol(params: &SystematicParams, intermediate: &[Vec<u8>], isi: u32) -> Vec<u8> {
    assert_eq!(
        intermediate.len(),
        params.l(),
        "expected L intermediate symbols"
    );

    let indexes = encode_indexes(params, isi);
    let mut symbol = intermediate[indexes[0]].clone();
    for &index in &indexes[1..] {
        gf256_add_slice(&mut symbol, &intermediate[index]);
    }
    symbol
}
