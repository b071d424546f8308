//! GF(256) finite-field arithmetic for RaptorQ encoding/decoding.
//!
//! Implements the Galois field GF(2^8) used by RFC 6330 with the irreducible
//! polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x1D over GF(2)).
//!
//! # Representation
//!
//! Elements are stored as `u8` values where each bit represents a coefficient
//! of a degree-7 polynomial over GF(2). Addition is XOR; multiplication uses
//! precomputed log/exp (antilog) tables for O(1) operations.
//!
//! # Determinism
//!
//! All operations are deterministic and platform-independent. Table generation
//! is `const`-evaluated at compile time.

/// The irreducible polynomial x^8 + x^4 + x^3 + x^2 + 1.
///
/// Represented as 0x1D (the low 8 bits after subtracting x^8).
/// Full polynomial is 0x11D but we only need the reduction mask.
const POLY: u16 = 0x1D;

/// A primitive element (generator) of GF(256). The value 2 (i.e. x)
/// generates the full multiplicative group of order 255.
const GENERATOR: u16 = 0x02;

/// Logarithm table: `LOG[a]` = discrete log base `GENERATOR` of `a`.
///
/// `LOG[0]` is unused (log of zero is undefined); set to 0 by convention.
static LOG: [u8; 256] = build_log_table();

/// Exponential (antilog) table: `EXP[i]` = `GENERATOR^i mod POLY`.
///
/// Extended to 512 entries so that `EXP[a + b]` works without modular
/// reduction for any `a, b < 255`.
static EXP: [u8; 512] = build_exp_table();

// ============================================================================
// Table generation (const)
// ============================================================================

const fn build_exp_table() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut val: u16 = 1;
    let mut i = 0usize;
    while i < 255 {
        table[i] = val as u8;
        table[i + 255] = val as u8; // mirror for mod-free lookup
        val <<= 1;
        if val & 0x100 != 0 {
            val ^= 0x100 | POLY;
        }
        i += 1;
    }
    // EXP[255] = EXP[0] = 1 (wraps), already set by mirror
    table[255] = 1;
    table[510] = 1;
    table
}

const fn build_log_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut val: u16 = 1;
    let mut i = 0u8;
    // Loop 255 times (exponents 0..254) to fill log for all non-zero elements.
    loop {
        table[val as usize] = i;
        val <<= 1;
        if val & 0x100 != 0 {
            val ^= 0x100 | POLY;
        }
        if i == 254 {
            break;
        }
        i += 1;
    }
    table
}

const fn gf256_mul_const(mut a: u8, mut b: u8) -> u8 {
    let mut acc = 0u8;
    let mut i = 0u8;
    while i < 8 {
        if (b & 1) != 0 {
            acc ^= a;
        }
        let hi = a & 0x80;
        a <<= 1;
        if hi != 0 {
            a ^= POLY as u8;
        }
        b >>= 1;
        i += 1;
    }
    acc
}

#[allow(clippy::large_stack_arrays)]
const fn build_mul_tables() -> [[u8; 256]; 256] {
    let mut tables = [[0u8; 256]; 256];
    let mut c = 0usize;
    while c < 256 {
        let mut x = 0usize;
        while x < 256 {
            tables[c][x] = gf256_mul_const(x as u8, c as u8);
            x += 1;
        }
        c += 1;
    }
    tables
}

static MUL_TABLES: [[u8; 256]; 256] = build_mul_tables();

// ============================================================================
// Field element wrapper
// ============================================================================

/// An element of GF(256).
///
/// Wraps a `u8` and provides field arithmetic operations. All operations
/// are constant-time with respect to the element value (table lookups).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Gf256(pub u8);

impl Gf256 {
    /// The additive identity (zero element).
    pub const ZERO: Self = Self(0);

    /// The multiplicative identity (one element).
    pub const ONE: Self = Self(1);

    /// The primitive element (generator of the multiplicative group).
    pub const ALPHA: Self = Self(GENERATOR as u8);

    /// Creates a field element from a raw byte.
    #[inline]
    #[must_use]
    pub const fn new(val: u8) -> Self {
        Self(val)
    }

    /// Returns the raw byte value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns true if this is the zero element.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Field addition (XOR).
    #[inline]
    #[must_use]
    pub const fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }

    /// Field subtraction (same as addition in characteristic 2).
    #[inline]
    #[must_use]
    pub const fn sub(self, rhs: Self) -> Self {
        self.add(rhs)
    }

    /// Field multiplication using log/exp tables.
    ///
    /// Returns `ZERO` if either operand is zero.
    #[inline]
    #[must_use]
    pub fn mul_field(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return Self::ZERO;
        }
        let log_sum = LOG[self.0 as usize] as usize + LOG[rhs.0 as usize] as usize;
        Self(EXP[log_sum])
    }

    /// Multiplicative inverse.
    ///
    /// # Panics
    ///
    /// Panics if `self` is zero (zero has no multiplicative inverse).
    #[inline]
    #[must_use]
    pub fn inv(self) -> Self {
        assert!(!self.is_zero(), "cannot invert zero in GF(256)");
        // inv(a) = a^254 = EXP[255 - LOG[a]]
        let log_a = LOG[self.0 as usize] as usize;
        Self(EXP[255 - log_a])
    }

    /// Field division: `self / rhs`.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is zero.
    #[inline]
    #[must_use]
    pub fn div_field(self, rhs: Self) -> Self {
        self.mul_field(rhs.inv())
    }

    /// Exponentiation: `self^exp` using the log/exp tables.
    ///
    /// Returns `ONE` for any base raised to the zero power.
    /// Returns `ZERO` for zero raised to any positive power.
    #[must_use]
    pub fn pow(self, exp: usize) -> Self {
        if exp == 0 {
            return Self::ONE;
        }
        if self.is_zero() {
            return Self::ZERO;
        }
        let log_a = LOG[self.0 as usize] as usize;
        let log_result = (log_a * exp) % 255;
        Self(EXP[log_result])
    }
}

/// `ALPHA^exp` for arbitrary exponents (HDPC matrix entries).
#[inline]
#[must_use]
pub fn gf256_alpha_pow(exp: usize) -> Gf256 {
    Gf256(EXP[exp % 255])
}

impl std::fmt::Debug for Gf256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GF({})", self.0)
    }
}

impl std::fmt::Display for Gf256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Gf256 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::add(self, rhs)
    }
}

impl std::ops::Sub for Gf256 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::sub(self, rhs)
    }
}

impl std::ops::Mul for Gf256 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::mul_field(self, rhs)
    }
}

impl std::ops::Div for Gf256 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self::div_field(self, rhs)
    }
}

impl std::ops::AddAssign for Gf256 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = Self::add(*self, rhs);
    }
}

impl std::ops::MulAssign for Gf256 {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = Self::mul_field(*self, rhs);
    }
}

// ============================================================================
// Bulk operations on byte slices (symbol-level XOR + scale)
// ============================================================================

/// XOR `src` into `dst` element-wise: `dst[i] ^= src[i]`.
///
/// Uses 32-byte-wide XOR (4 x u64) for throughput on bulk data, falling back
/// to 8-byte and scalar loops for the tail.
///
/// # Panics
///
/// Panics if `src.len() != dst.len()`.
pub fn gf256_add_slice(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len(), "slice length mismatch");

    // Wide path: 32 bytes (4 x u64) per iteration.
    let mut d_chunks = dst.chunks_exact_mut(32);
    let mut s_chunks = src.chunks_exact(32);
    for (d_chunk, s_chunk) in d_chunks.by_ref().zip(s_chunks.by_ref()) {
        let mut d_words = [
            u64::from_ne_bytes(d_chunk[0..8].try_into().unwrap()),
            u64::from_ne_bytes(d_chunk[8..16].try_into().unwrap()),
            u64::from_ne_bytes(d_chunk[16..24].try_into().unwrap()),
            u64::from_ne_bytes(d_chunk[24..32].try_into().unwrap()),
        ];
        let s_words = [
            u64::from_ne_bytes(s_chunk[0..8].try_into().unwrap()),
            u64::from_ne_bytes(s_chunk[8..16].try_into().unwrap()),
            u64::from_ne_bytes(s_chunk[16..24].try_into().unwrap()),
            u64::from_ne_bytes(s_chunk[24..32].try_into().unwrap()),
        ];
        d_words[0] ^= s_words[0];
        d_words[1] ^= s_words[1];
        d_words[2] ^= s_words[2];
        d_words[3] ^= s_words[3];
        d_chunk[0..8].copy_from_slice(&d_words[0].to_ne_bytes());
        d_chunk[8..16].copy_from_slice(&d_words[1].to_ne_bytes());
        d_chunk[16..24].copy_from_slice(&d_words[2].to_ne_bytes());
        d_chunk[24..32].copy_from_slice(&d_words[3].to_ne_bytes());
    }

    // 8-byte tail.
    let d_rem = d_chunks.into_remainder();
    let s_rem = s_chunks.remainder();
    let mut d8 = d_rem.chunks_exact_mut(8);
    let mut s8 = s_rem.chunks_exact(8);
    for (d_chunk, s_chunk) in d8.by_ref().zip(s8.by_ref()) {
        let d_arr: [u8; 8] = d_chunk.try_into().unwrap();
        let s_arr: [u8; 8] = s_chunk.try_into().unwrap();
        let result = u64::from_ne_bytes(d_arr) ^ u64::from_ne_bytes(s_arr);
        d_chunk.copy_from_slice(&result.to_ne_bytes());
    }

    // Scalar tail.
    for (d, s) in d8.into_remainder().iter_mut().zip(s8.remainder()) {
        *d ^= s;
    }
}

/// Minimum slice length to amortise a 256-byte multiplication table lookup
/// path over per-element branch + double log/exp lookups.
const MUL_TABLE_THRESHOLD: usize = 64;

#[inline]
fn mul_table_for(c: Gf256) -> &'static [u8; 256] {
    &MUL_TABLES[c.0 as usize]
}

/// Multiply every element of `dst` by scalar `c` in GF(256).
///
/// For slices >= `MUL_TABLE_THRESHOLD` bytes, a pre-built 256-entry table
/// replaces per-element branch+double-lookup with a single table lookup.
///
/// If `c` is zero, the entire slice is zeroed. If `c` is one, this is a no-op.
pub fn gf256_mul_slice(dst: &mut [u8], c: Gf256) {
    if c.is_zero() {
        dst.fill(0);
        return;
    }
    if c == Gf256::ONE {
        return;
    }
    if dst.len() >= MUL_TABLE_THRESHOLD {
        let table = mul_table_for(c);
        mul_with_table(dst, table);
    } else {
        let log_c = LOG[c.0 as usize] as usize;
        for d in dst.iter_mut() {
            if *d != 0 {
                *d = EXP[LOG[*d as usize] as usize + log_c];
            }
        }
    }
}

fn mul_with_table(dst: &mut [u8], table: &[u8; 256]) {
    let mut chunks = dst.chunks_exact_mut(8);
    for chunk in chunks.by_ref() {
        let t = [
            table[chunk[0] as usize],
            table[chunk[1] as usize],
            table[chunk[2] as usize],
            table[chunk[3] as usize],
            table[chunk[4] as usize],
            table[chunk[5] as usize],
            table[chunk[6] as usize],
            table[chunk[7] as usize],
        ];
        chunk.copy_from_slice(&t);
    }
    for d in chunks.into_remainder() {
        *d = table[*d as usize];
    }
}

fn addmul_with_table(dst: &mut [u8], src: &[u8], table: &[u8; 256]) {
    let mut d_chunks = dst.chunks_exact_mut(8);
    let mut s_chunks = src.chunks_exact(8);
    for (d_chunk, s_chunk) in d_chunks.by_ref().zip(s_chunks.by_ref()) {
        let t = [
            table[s_chunk[0] as usize],
            table[s_chunk[1] as usize],
            table[s_chunk[2] as usize],
            table[s_chunk[3] as usize],
            table[s_chunk[4] as usize],
            table[s_chunk[5] as usize],
            table[s_chunk[6] as usize],
            table[s_chunk[7] as usize],
        ];
        let d_arr: [u8; 8] = d_chunk[..].try_into().unwrap();
        let result = u64::from_ne_bytes(d_arr) ^ u64::from_ne_bytes(t);
        d_chunk.copy_from_slice(&result.to_ne_bytes());
    }
    for (d, s) in d_chunks
        .into_remainder()
        .iter_mut()
        .zip(s_chunks.remainder())
    {
        *d ^= table[*s as usize];
    }
}

/// Multiply-accumulate: `dst[i] += c * src[i]` in GF(256).
///
/// For slices >= 64 bytes the hot path builds on a 256-entry multiplication
/// table and processes 8 bytes at a time via `u64` wide-XOR. Smaller slices
/// fall back to scalar log/exp lookups.
///
/// # Panics
///
/// Panics if `src.len() != dst.len()`.
pub fn gf256_addmul_slice(dst: &mut [u8], src: &[u8], c: Gf256) {
    assert_eq!(dst.len(), src.len(), "slice length mismatch");
    if c.is_zero() {
        return;
    }
    if c == Gf256::ONE {
        gf256_add_slice(dst, src);
        return;
    }
    if dst.len() >= MUL_TABLE_THRESHOLD {
        let table = mul_table_for(c);
        addmul_with_table(dst, src, table);
    } else {
        let log_c = LOG[c.0 as usize] as usize;
        for (d, s) in dst.iter_mut().zip(src.iter().copied()) {
            if s != 0 {
                *d ^= EXP[LOG[s as usize] as usize + log_c];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mul_reference(a: u8, b: u8) -> u8 {
        gf256_mul_const(a, b)
    }

    #[test]
    fn table_constants() {
        assert_eq!(EXP[0], 1);
        assert_eq!(EXP[1], 2);
        assert_eq!(LOG[1], 0);
        assert_eq!(LOG[2], 1);
        // alpha^255 wraps to 1
        assert_eq!(EXP[255], 1);
    }

    #[test]
    fn mul_matches_carryless_reference() {
        for a in 0..=255u8 {
            for b in [0u8, 1, 2, 3, 0x1D, 0x80, 0xFF] {
                assert_eq!(
                    Gf256(a).mul_field(Gf256(b)).raw(),
                    mul_reference(a, b),
                    "mul mismatch at a={a} b={b}"
                );
            }
        }
    }

    #[test]
    fn inverse_roundtrip() {
        for a in 1..=255u8 {
            let x = Gf256(a);
            assert_eq!(x * x.inv(), Gf256::ONE, "inv failed for {a}");
        }
    }

    #[test]
    #[should_panic(expected = "cannot invert zero")]
    fn inverse_of_zero_panics() {
        let _ = Gf256::ZERO.inv();
    }

    #[test]
    fn alpha_pow_wraps() {
        assert_eq!(gf256_alpha_pow(0), Gf256::ONE);
        assert_eq!(gf256_alpha_pow(1), Gf256::ALPHA);
        assert_eq!(gf256_alpha_pow(255), Gf256::ONE);
        assert_eq!(gf256_alpha_pow(256), Gf256::ALPHA);
        for e in 0..600 {
            assert_eq!(gf256_alpha_pow(e), Gf256::ALPHA.pow(e));
        }
    }

    #[test]
    fn pow_basics() {
        assert_eq!(Gf256(7).pow(0), Gf256::ONE);
        assert_eq!(Gf256::ZERO.pow(5), Gf256::ZERO);
        assert_eq!(Gf256(3).pow(2), Gf256(3) * Gf256(3));
    }

    #[test]
    fn add_slice_xors() {
        // Length 67 covers the 32-byte, 8-byte, and scalar paths.
        let mut dst: Vec<u8> = (0..67u8).collect();
        let src: Vec<u8> = (0..67u8).map(|i| i.wrapping_mul(3)).collect();
        let expected: Vec<u8> = dst.iter().zip(&src).map(|(d, s)| d ^ s).collect();
        gf256_add_slice(&mut dst, &src);
        assert_eq!(dst, expected);
    }

    #[test]
    fn mul_slice_zero_and_one() {
        let mut a = vec![5u8; 100];
        gf256_mul_slice(&mut a, Gf256::ONE);
        assert!(a.iter().all(|&b| b == 5));
        gf256_mul_slice(&mut a, Gf256::ZERO);
        assert!(a.iter().all(|&b| b == 0));
    }

    #[test]
    fn addmul_slice_matches_scalar() {
        for len in [1usize, 7, 8, 63, 64, 65, 200] {
            let mut dst: Vec<u8> = (0..len).map(|i| (i * 17 + 3) as u8).collect();
            let src: Vec<u8> = (0..len).map(|i| (i * 29 + 11) as u8).collect();
            let c = Gf256(0xB7);
            let expected: Vec<u8> = dst
                .iter()
                .zip(&src)
                .map(|(&d, &s)| d ^ mul_reference(s, c.raw()))
                .collect();
            gf256_addmul_slice(&mut dst, &src, c);
            assert_eq!(dst, expected, "len={len}");
        }
    }

    proptest! {
        #[test]
        fn field_axioms(a in any::<u8>(), b in any::<u8>(), c in any::<u8>()) {
            let (a, b, c) = (Gf256(a), Gf256(b), Gf256(c));
            // commutativity
            prop_assert_eq!(a * b, b * a);
            prop_assert_eq!(a + b, b + a);
            // associativity
            prop_assert_eq!((a * b) * c, a * (b * c));
            // distributivity
            prop_assert_eq!(a * (b + c), a * b + a * c);
            // identities
            prop_assert_eq!(a * Gf256::ONE, a);
            prop_assert_eq!(a + Gf256::ZERO, a);
            // characteristic 2
            prop_assert_eq!(a + a, Gf256::ZERO);
        }

        #[test]
        fn division_inverts_multiplication(a in any::<u8>(), b in 1..=255u8) {
            let (a, b) = (Gf256(a), Gf256(b));
            prop_assert_eq!((a * b) / b, a);
        }

        #[test]
        fn addmul_slice_kernel_equivalence(
            data in proptest::collection::vec(any::<u8>(), 0..300),
            src_seed in any::<u8>(),
            c in any::<u8>(),
        ) {
            let src: Vec<u8> = data
                .iter()
                .map(|&b| b.wrapping_mul(31).wrapping_add(src_seed))
                .collect();
            let mut fast = data.clone();
            gf256_addmul_slice(&mut fast, &src, Gf256(c));
            let slow: Vec<u8> = data
                .iter()
                .zip(&src)
                .map(|(&d, &s)| d ^ mul_reference(s, c))
                .collect();
            prop_assert_eq!(fast, slow);
        }
    }
}
