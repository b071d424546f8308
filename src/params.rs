//! Systematic encoding parameters derived from the RFC 6330 table.
//!
//! Every supported source-block size maps to a padded symbol count K' with an
//! associated systematic index J and precode dimensions S (LDPC rows),
//! H (HDPC rows), and W (LT width). The remaining quantities are derived:
//!
//! - `L = K' + S + H` intermediate symbols
//! - `P = L - W` permanently inactivated (PI) symbols
//! - `P1` = smallest prime >= P (PI walk modulus)
//! - `U = P - H` PI symbols that are not HDPC symbols
//! - `B = W - S` LT symbols that are not LDPC symbols

use crate::rfc6330::ceil_prime;
use serde::Serialize;

/// One row of the systematic parameter table: `(K', J, S, H, W)`.
type TableRow = (usize, usize, usize, usize, usize);

/// Prefix of the RFC 6330 Table 2 systematic indices, sorted by K'.
///
/// Covers padded symbol counts up to 200; larger source blocks are rejected
/// by [`SystematicParams::for_kprime`].
#[rustfmt::skip]
const SYSTEMATIC_TABLE: &[TableRow] = &[
    (10, 254, 7, 10, 17),
    (12, 630, 7, 10, 19),
    (18, 682, 11, 10, 29),
    (20, 293, 11, 10, 31),
    (26, 80, 11, 10, 37),
    (30, 566, 11, 10, 41),
    (32, 860, 11, 10, 43),
    (36, 267, 11, 10, 47),
    (42, 822, 11, 10, 53),
    (46, 506, 13, 10, 59),
    (48, 589, 13, 10, 61),
    (49, 87, 13, 10, 61),
    (55, 520, 13, 10, 67),
    (60, 159, 13, 10, 71),
    (62, 235, 13, 10, 73),
    (69, 157, 13, 10, 79),
    (75, 502, 17, 10, 89),
    (84, 334, 17, 10, 97),
    (88, 583, 17, 10, 101),
    (91, 66, 17, 10, 103),
    (95, 352, 17, 10, 107),
    (97, 365, 17, 10, 109),
    (101, 562, 17, 10, 113),
    (114, 5, 19, 10, 127),
    (119, 603, 19, 10, 131),
    (125, 721, 19, 10, 137),
    (127, 28, 19, 10, 139),
    (138, 660, 19, 10, 149),
    (140, 829, 19, 10, 151),
    (149, 900, 23, 10, 163),
    (153, 930, 23, 10, 167),
    (160, 814, 23, 10, 173),
    (166, 661, 23, 10, 179),
    (168, 693, 23, 10, 181),
    (179, 780, 23, 10, 191),
    (181, 605, 23, 10, 193),
    (185, 551, 23, 10, 197),
    (187, 777, 23, 10, 199),
    (200, 491, 23, 10, 211),
];

/// Error produced when a symbol count has no table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// The requested symbol count is not a supported K' value.
    #[error("unsupported symbol count {kprime}: no systematic table entry (supported {min}..={max})")]
    UnsupportedSymbolCount {
        /// Requested padded symbol count.
        kprime: usize,
        /// Smallest supported K'.
        min: usize,
        /// Largest supported K'.
        max: usize,
    },
}

/// Systematic encoding parameters for one padded symbol count K'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystematicParams {
    kprime: usize,
    j: usize,
    s: usize,
    h: usize,
    w: usize,
}

impl SystematicParams {
    fn from_row(row: TableRow) -> Self {
        let (kprime, j, s, h, w) = row;
        Self { kprime, j, s, h, w }
    }

    fn unsupported(kprime: usize) -> ParamError {
        let min = SYSTEMATIC_TABLE[0].0;
        let max = SYSTEMATIC_TABLE[SYSTEMATIC_TABLE.len() - 1].0;
        ParamError::UnsupportedSymbolCount { kprime, min, max }
    }

    /// Looks up the parameters for an exact padded symbol count K'.
    pub fn for_kprime(kprime: usize) -> Result<Self, ParamError> {
        SYSTEMATIC_TABLE
            .binary_search_by_key(&kprime, |row| row.0)
            .map(|pos| Self::from_row(SYSTEMATIC_TABLE[pos]))
            .map_err(|_| Self::unsupported(kprime))
    }

    /// Smallest supported K' that is >= `k` (pads a source block up to K').
    pub fn ceil(k: usize) -> Result<Self, ParamError> {
        let pos = SYSTEMATIC_TABLE.partition_point(|row| row.0 < k);
        SYSTEMATIC_TABLE
            .get(pos)
            .copied()
            .map(Self::from_row)
            .ok_or_else(|| Self::unsupported(k))
    }

    /// Largest supported K' that is <= `k` (segmentation upper-bound search).
    pub fn floor(k: usize) -> Result<Self, ParamError> {
        let pos = SYSTEMATIC_TABLE.partition_point(|row| row.0 <= k);
        pos.checked_sub(1)
            .map(|p| Self::from_row(SYSTEMATIC_TABLE[p]))
            .ok_or_else(|| Self::unsupported(k))
    }

    /// Padded source symbol count K'.
    #[must_use]
    pub const fn kprime(&self) -> usize {
        self.kprime
    }

    /// Systematic index J(K').
    #[must_use]
    pub const fn j(&self) -> usize {
        self.j
    }

    /// LDPC row count S.
    #[must_use]
    pub const fn s(&self) -> usize {
        self.s
    }

    /// HDPC row count H.
    #[must_use]
    pub const fn h(&self) -> usize {
        self.h
    }

    /// LT width W (boundary between LT and PI intermediate symbols).
    #[must_use]
    pub const fn w(&self) -> usize {
        self.w
    }

    /// Intermediate symbol count L = K' + S + H.
    #[must_use]
    pub const fn l(&self) -> usize {
        self.kprime + self.s + self.h
    }

    /// Permanently inactivated symbol count P = L - W.
    #[must_use]
    pub const fn p(&self) -> usize {
        self.l() - self.w
    }

    /// PI walk modulus P1 = smallest prime >= P.
    #[must_use]
    pub fn p1(&self) -> usize {
        ceil_prime(self.p())
    }

    /// PI symbols that are not HDPC symbols: U = P - H.
    #[must_use]
    pub const fn u(&self) -> usize {
        self.p() - self.h
    }

    /// LT symbols that are not LDPC symbols: B = W - S.
    #[must_use]
    pub const fn b(&self) -> usize {
        self.w - self.s
    }
}
