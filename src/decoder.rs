//! Permanent inactivation decoder for the intermediate-symbol system.
//!
//! Solves `A * C = D` for the L intermediate symbols, where A stacks the
//! precode constraint rows over one encoding row per received symbol and D
//! holds the matching payloads (zeros for the constraint rows). The solve
//! runs in five phases over a shrinking active window:
//!
//! 1. Pivoting: choose minimum-nonzero rows (graph heuristic at r == 2,
//!    HDPC rows deferred), swap the pivot into place, move the other r - 1
//!    nonzero columns into the inactivated region, eliminate below.
//! 2. Reduced row-echelon form of the inactivated block plus rank check.
//! 3. Multiply the saved pre-elimination matrix X back into the first i
//!    rows and payloads.
//! 4. Zero the upper-right block against the identity rows from phase 2.
//! 5. Normalize the diagonal and clear the lower triangle.
//!
//! Column and row movements are tracked in the permutation vectors `c` and
//! `d`; the result is assembled as `C[c[idx]] = D[d[idx]]`.
//!
//! # Determinism
//!
//! All pivot selections break ties toward the lowest current row position,
//! and component ties toward the lowest member column, so identical inputs
//! always produce identical outputs and identical failures.

use crate::gf256::{gf256_addmul_slice, gf256_mul_slice, Gf256};
use crate::matrix::{reduce_to_row_echelon, scale_add_payload, OctetMatrix};
use crate::params::SystematicParams;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::{debug, trace};

// ============================================================================
// Errors and statistics
// ============================================================================

/// Decode phase in which a singular matrix was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecodePhase {
    /// Phase 1: no eligible row had a nonzero in the active window.
    Pivoting,
    /// Phase 2: the inactivated block was rank deficient.
    RankCheck,
}

/// Reason for decode failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer equation rows than intermediate symbols.
    #[error("insufficient rows: have {received}, need {required}")]
    InsufficientRows {
        /// Number of rows supplied.
        received: usize,
        /// Minimum required (L).
        required: usize,
    },
    /// The system cannot be solved with the rows supplied; more symbols
    /// may succeed.
    #[error("singular matrix in {phase:?} after {solved} of {required} pivots")]
    SingularMatrix {
        /// Phase that detected the deficiency.
        phase: DecodePhase,
        /// Pivots (phase 1) or echelon rank (phase 2) established so far.
        solved: usize,
        /// Pivots or rank required to proceed.
        required: usize,
    },
    /// Payload rows differ in length.
    #[error("payload size mismatch: expected {expected}, got {actual}")]
    PayloadSizeMismatch {
        /// Length of the first payload row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },
    /// Matrix row count and payload count disagree.
    #[error("dimension mismatch: {rows} matrix rows, {payloads} payloads")]
    DimensionMismatch {
        /// Matrix row count.
        rows: usize,
        /// Payload count.
        payloads: usize,
    },
}

/// Decode failure classification used to separate retryable failures from
/// malformed-input failures at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailureClass {
    /// Retry may succeed with additional symbols/redundancy.
    Recoverable,
    /// Input is malformed; retrying with more symbols cannot help.
    Unrecoverable,
}

impl DecodeError {
    /// Classify this decode failure as recoverable or unrecoverable.
    #[must_use]
    pub const fn failure_class(&self) -> DecodeFailureClass {
        match self {
            Self::InsufficientRows { .. } | Self::SingularMatrix { .. } => {
                DecodeFailureClass::Recoverable
            }
            Self::PayloadSizeMismatch { .. } | Self::DimensionMismatch { .. } => {
                DecodeFailureClass::Unrecoverable
            }
        }
    }

    /// True when this failure can be retried by supplying additional symbols.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.failure_class(), DecodeFailureClass::Recoverable)
    }
}

/// Decode statistics for observability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DecodeStats {
    /// Phase-1 pivot steps completed (final i).
    pub pivot_steps: usize,
    /// Columns in the inactivated region at phase-1 exit (final u).
    pub inactivated: usize,
    /// Pivots selected through the r == 2 component heuristic.
    pub graph_pivots: usize,
    /// Row scale-add operations across all phases.
    pub row_ops: usize,
    /// Row and column swaps performed.
    pub swaps: usize,
}

/// Successful decode: the L intermediate symbols plus statistics.
#[derive(Debug)]
pub struct DecodeOutput {
    /// Recovered intermediate symbols, in logical order.
    pub intermediate: Vec<Vec<u8>>,
    /// Decode statistics.
    pub stats: DecodeStats,
}

// ============================================================================
// Row bookkeeping
// ============================================================================

/// Per-row pivoting state, indexed by current row position.
#[derive(Debug, Clone)]
struct RowState {
    /// Nonzero count within the current active window.
    nonzeros: usize,
    /// Sum of coefficient byte values over the initial window. HDPC rows
    /// carry dense GF(256) coefficients and therefore sort last.
    original_degree: usize,
    /// Whether this equation is an HDPC constraint row.
    is_hdpc: bool,
    /// The two window columns of this row when `nonzeros == 2`.
    edge: SmallVec<[usize; 2]>,
}

// ============================================================================
// Entry point
// ============================================================================

/// Solves the M x L system `a * C = payloads` for the intermediate symbols.
///
/// `a` must have L columns and at least L rows; rows [0, S) are expected to
/// be LDPC constraints and rows [S, S + H) HDPC constraints, as produced by
/// [`crate::constraint::build_constraint_matrix`]. Extra rows beyond L are
/// used as elimination fodder and discarded before back substitution.
pub fn decode_intermediate(
    a: OctetMatrix,
    payloads: Vec<Vec<u8>>,
    params: &SystematicParams,
) -> Result<DecodeOutput, DecodeError> {
    let l = params.l();
    let m = a.row_count();
    assert_eq!(a.col_count(), l, "constraint matrix must have L columns");

    if m < l {
        return Err(DecodeError::InsufficientRows {
            received: m,
            required: l,
        });
    }
    if payloads.len() != m {
        return Err(DecodeError::DimensionMismatch {
            rows: m,
            payloads: payloads.len(),
        });
    }
    let symbol_size = payloads[0].len();
    for row in &payloads {
        if row.len() != symbol_size {
            return Err(DecodeError::PayloadSizeMismatch {
                expected: symbol_size,
                actual: row.len(),
            });
        }
    }

    debug!(
        rows = m,
        intermediate = l,
        pi_count = params.p(),
        symbol_size,
        "starting inactivation decode"
    );

    let mut state = PidState::new(a, payloads, params, symbol_size);
    state.phase1()?;
    state.phase2()?;
    state.phase3();
    state.phase4();
    state.phase5();
    Ok(state.into_output())
}

// ============================================================================
// Solver state
// ============================================================================

struct PidState<'p> {
    params: &'p SystematicParams,
    /// Working matrix, M x L.
    a: OctetMatrix,
    /// Copy of A taken before any elimination; tracks swaps only.
    x: OctetMatrix,
    /// Payload symbols, addressed through `d`.
    payloads: Vec<Vec<u8>>,
    /// Column permutation (length L).
    c: Vec<usize>,
    /// Row permutation (length M).
    d: Vec<usize>,
    /// Pivoting state per current row position.
    rows: Vec<RowState>,
    /// Pivots established so far; the active window starts at row/col i.
    i: usize,
    /// Inactivated column count; the window ends at column L - u.
    u: usize,
    symbol_size: usize,
    stats: DecodeStats,
}

impl<'p> PidState<'p> {
    fn new(
        a: OctetMatrix,
        payloads: Vec<Vec<u8>>,
        params: &'p SystematicParams,
        symbol_size: usize,
    ) -> Self {
        let l = params.l();
        let m = a.row_count();
        let x = a.clone();
        let initial_window = params.w();

        let s = params.s();
        let h = params.h();
        let rows = (0..m)
            .map(|pos| {
                let row = a.row(pos);
                let original_degree = row[..initial_window]
                    .iter()
                    .map(|&byte| usize::from(byte))
                    .sum();
                RowState {
                    nonzeros: 0,
                    original_degree,
                    is_hdpc: (s..s + h).contains(&pos),
                    edge: SmallVec::new(),
                }
            })
            .collect();

        let mut state = Self {
            params,
            a,
            x,
            payloads,
            c: (0..l).collect(),
            d: (0..m).collect(),
            rows,
            i: 0,
            u: params.p(),
            symbol_size,
            stats: DecodeStats::default(),
        };
        state.recompute_window_counts();
        state
    }

    fn row_count(&self) -> usize {
        self.d.len()
    }

    /// Refreshes nonzero counts (and r == 2 edges) over the current window
    /// for every row at position >= i.
    fn recompute_window_counts(&mut self) {
        let start = self.i;
        let end = self.params.l() - self.u;
        for pos in start..self.row_count() {
            let row = self.a.row(pos);
            let mut nonzeros = 0usize;
            let mut edge: SmallVec<[usize; 2]> = SmallVec::new();
            for (col, &byte) in row.iter().enumerate().take(end).skip(start) {
                if byte != 0 {
                    nonzeros += 1;
                    if nonzeros <= 2 {
                        edge.push(col);
                    }
                }
            }
            let state = &mut self.rows[pos];
            state.nonzeros = nonzeros;
            if nonzeros != 2 {
                edge.clear();
            }
            state.edge = edge;
        }
    }

    fn swap_working_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.a.swap_rows(a, b);
        self.x.swap_rows(a, b);
        self.d.swap(a, b);
        self.rows.swap(a, b);
        self.stats.swaps += 1;
    }

    fn swap_working_columns(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.a.swap_columns(a, b);
        self.x.swap_columns(a, b);
        self.c.swap(a, b);
        self.stats.swaps += 1;
    }

    // ------------------------------------------------------------------
    // Phase 1
    // ------------------------------------------------------------------

    fn phase1(&mut self) -> Result<(), DecodeError> {
        let l = self.params.l();
        let hdpc_hold = self.params.s() + self.params.kprime();

        while self.i + self.u < l {
            let chosen = self.choose_row(hdpc_hold).ok_or(DecodeError::SingularMatrix {
                phase: DecodePhase::Pivoting,
                solved: self.i,
                required: l - self.u,
            })?;
            let r = self.rows[chosen].nonzeros;
            trace!(step = self.i, row = chosen, r, "phase 1 pivot");

            self.swap_working_rows(self.i, chosen);
            self.place_pivot_columns(r);
            self.eliminate_below();

            self.i += 1;
            self.u += r - 1;
            self.stats.pivot_steps += 1;
            self.recompute_window_counts();
        }

        self.stats.inactivated = self.u;
        debug!(
            pivots = self.i,
            inactivated = self.u,
            graph_pivots = self.stats.graph_pivots,
            "phase 1 complete"
        );
        Ok(())
    }

    /// Selects the pivot row position for this step, or `None` when no
    /// eligible row has a nonzero in the window.
    ///
    /// HDPC rows are held back until `hdpc_hold` pivots have been chosen;
    /// with M == L that threshold is never reached inside phase 1, so HDPC
    /// rows participate only through elimination and phase 2.
    fn choose_row(&mut self, hdpc_hold: usize) -> Option<usize> {
        let mut r_min = usize::MAX;
        for pos in self.i..self.row_count() {
            let state = &self.rows[pos];
            if state.nonzeros == 0 {
                continue;
            }
            if state.is_hdpc && self.i < hdpc_hold {
                continue;
            }
            r_min = r_min.min(state.nonzeros);
        }
        if r_min == usize::MAX {
            return None;
        }

        if r_min == 2 {
            if let Some(pos) = self.choose_component_row(hdpc_hold) {
                self.stats.graph_pivots += 1;
                return Some(pos);
            }
        }

        // Minimum original degree among rows with r_min nonzeros; lowest
        // position wins ties.
        let mut best: Option<(usize, usize)> = None;
        for pos in self.i..self.row_count() {
            let state = &self.rows[pos];
            if state.nonzeros != r_min || (state.is_hdpc && self.i < hdpc_hold) {
                continue;
            }
            match best {
                None => best = Some((state.original_degree, pos)),
                Some((degree, _)) if state.original_degree < degree => {
                    best = Some((state.original_degree, pos));
                }
                _ => {}
            }
        }
        best.map(|(_, pos)| pos)
    }

    /// r == 2 heuristic: over the graph whose vertices are window columns
    /// and whose edges are the two-nonzero rows, pick the lowest-position
    /// row whose edge lies inside a maximum-size connected component.
    fn choose_component_row(&self, hdpc_hold: usize) -> Option<usize> {
        let start = self.i;
        let width = self.params.l() - self.u - start;

        let mut adjacency: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); width];
        let mut candidates: Vec<usize> = Vec::new();
        for pos in start..self.row_count() {
            let state = &self.rows[pos];
            if state.nonzeros != 2 || (state.is_hdpc && self.i < hdpc_hold) {
                continue;
            }
            let (a, b) = (state.edge[0] - start, state.edge[1] - start);
            adjacency[a].push(b);
            adjacency[b].push(a);
            candidates.push(pos);
        }
        if candidates.is_empty() {
            return None;
        }

        // Iterative BFS component labelling over the touched vertices.
        let mut component = vec![usize::MAX; width];
        let mut sizes: Vec<usize> = Vec::new();
        let mut queue = VecDeque::new();
        for vertex in 0..width {
            if adjacency[vertex].is_empty() || component[vertex] != usize::MAX {
                continue;
            }
            let id = sizes.len();
            let mut size = 0usize;
            component[vertex] = id;
            queue.push_back(vertex);
            while let Some(v) = queue.pop_front() {
                size += 1;
                for &next in &adjacency[v] {
                    if component[next] == usize::MAX {
                        component[next] = id;
                        queue.push_back(next);
                    }
                }
            }
            sizes.push(size);
        }

        // Components are discovered in increasing lowest-vertex order, so
        // taking the first maximum also fixes the tie-break.
        let best = sizes
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(id, _)| id)?;

        candidates.into_iter().find(|&pos| {
            let edge = &self.rows[pos].edge;
            component[edge[0] - start] == best && component[edge[1] - start] == best
        })
    }

    /// Moves one nonzero of the pivot row to column i and the remaining
    /// r - 1 nonzeros to the tail of the window.
    fn place_pivot_columns(&mut self, r: usize) {
        let window_end = self.params.l() - self.u;

        let mut cols: Vec<usize> = Vec::with_capacity(r);
        let row = self.a.row(self.i);
        for (col, &byte) in row.iter().enumerate().take(window_end).skip(self.i) {
            if byte != 0 {
                cols.push(col);
                if cols.len() == r {
                    break;
                }
            }
        }
        debug_assert_eq!(cols.len(), r, "window nonzero count out of sync");

        if self.a.get(self.i, self.i).is_zero() {
            let col = cols.pop().expect("pivot row has a window nonzero");
            self.swap_working_columns(col, self.i);
        } else {
            // The scan started at column i, so the diagonal entry is first.
            cols.remove(0);
        }

        // Largest column first, filling the tail slots left to right.
        let mut remaining = cols.len();
        while let Some(col) = cols.pop() {
            self.swap_working_columns(col, window_end - remaining);
            remaining -= 1;
        }
    }

    /// Clears column i below the pivot, mirroring into the payloads.
    fn eliminate_below(&mut self) {
        let beta = self.a.get(self.i, self.i);
        for row in self.i + 1..self.row_count() {
            let alpha = self.a.get(row, self.i);
            if alpha.is_zero() {
                continue;
            }
            let factor = alpha / beta;
            self.a.scale_add_row(row, self.i, factor, self.i);
            scale_add_payload(&mut self.payloads, self.d[row], self.d[self.i], factor);
            self.stats.row_ops += 1;
        }
    }

    // ------------------------------------------------------------------
    // Phase 2
    // ------------------------------------------------------------------

    fn phase2(&mut self) -> Result<(), DecodeError> {
        let l = self.params.l();
        let m = self.row_count();
        let rank = reduce_to_row_echelon(
            &mut self.a,
            self.i,
            m,
            l - self.u,
            l,
            &mut self.d,
            &mut self.payloads,
        );
        debug!(rank, required = self.u, "phase 2 echelon reduction");
        if rank < self.u {
            return Err(DecodeError::SingularMatrix {
                phase: DecodePhase::RankCheck,
                solved: rank,
                required: self.u,
            });
        }
        // Surplus rows have served their purpose as pivot candidates.
        self.a.truncate_rows(l);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Phase 3
    // ------------------------------------------------------------------

    /// Multiplies the lower-triangular i x i corner of X back into the
    /// first i rows of A and their payloads, undoing the phase-1
    /// eliminations on the pivot rows.
    fn phase3(&mut self) {
        let i = self.i;

        let payload_snapshot: Vec<Vec<u8>> =
            (0..i).map(|k| self.payloads[self.d[k]].clone()).collect();
        for row in 0..i {
            let mut acc = vec![0u8; self.symbol_size];
            for (k, snapshot) in payload_snapshot.iter().enumerate().take(row + 1) {
                let coeff = self.x.get(row, k);
                if !coeff.is_zero() {
                    gf256_addmul_slice(&mut acc, snapshot, coeff);
                    self.stats.row_ops += 1;
                }
            }
            self.payloads[self.d[row]] = acc;
        }

        let matrix_snapshot: Vec<Vec<u8>> = (0..i).map(|r| self.a.row(r).to_vec()).collect();
        for row in 0..i {
            let out = self.a.row_mut(row);
            out.fill(0);
            for (k, snapshot) in matrix_snapshot.iter().enumerate().take(row + 1) {
                let coeff = self.x.get(row, k);
                if !coeff.is_zero() {
                    gf256_addmul_slice(out, snapshot, coeff);
                }
            }
        }
        debug!(rows = i, "phase 3 X multiplication complete");
    }

    // ------------------------------------------------------------------
    // Phase 4
    // ------------------------------------------------------------------

    /// Zeroes the upper-right block using the identity rows established in
    /// phase 2: each nonzero `b = A[row][col]` with `col >= i` is absorbed
    /// into the payload as `D[d[row]] += b * D[d[col]]`.
    fn phase4(&mut self) {
        let l = self.params.l();
        for row in 0..self.i {
            for col in self.i..l {
                let b = self.a.get(row, col);
                if !b.is_zero() {
                    self.a.set(row, col, Gf256::ZERO);
                    scale_add_payload(&mut self.payloads, self.d[row], self.d[col], b);
                    self.stats.row_ops += 1;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Phase 5
    // ------------------------------------------------------------------

    /// Normalizes the diagonal and clears the lower triangle of the first
    /// i rows, finishing the identity.
    fn phase5(&mut self) {
        for j in 0..self.i {
            let diag = self.a.get(j, j);
            if diag != Gf256::ONE {
                let inv = diag.inv();
                self.a.scale_row(j, inv);
                gf256_mul_slice(&mut self.payloads[self.d[j]], inv);
            }
            for col in 0..j {
                let b = self.a.get(j, col);
                if !b.is_zero() {
                    self.a.scale_add_row(j, col, b, 0);
                    scale_add_payload(&mut self.payloads, self.d[j], self.d[col], b);
                    self.stats.row_ops += 1;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Assembly
    // ------------------------------------------------------------------

    fn into_output(mut self) -> DecodeOutput {
        let l = self.params.l();
        let mut intermediate = vec![Vec::new(); l];
        for index in 0..l {
            intermediate[self.c[index]] = std::mem::take(&mut self.payloads[self.d[index]]);
        }
        debug!(
            row_ops = self.stats.row_ops,
            swaps = self.stats.swaps,
            "decode complete"
        );
        DecodeOutput {
            intermediate,
            stats: self.stats,
        }
    }
}
