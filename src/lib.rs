//! RaptorQ (RFC 6330) codec core.
//!
//! Systematic fountain-code machinery for a single source block: GF(256)
//! arithmetic, the precode constraint matrix, tuple-driven encoding, and the
//! five-phase permanent inactivation decoder.
//!
//! # Pipeline
//!
//! 1. Look up [`SystematicParams`] for the padded symbol count K'.
//! 2. Build the L x L constraint matrix with
//!    [`constraint::build_constraint_matrix`] and pair it with S + H zero
//!    payloads followed by the source symbols (or, on the receiving side,
//!    encoding rows for whichever ISIs arrived).
//! 3. Solve for the intermediate symbols with
//!    [`decoder::decode_intermediate`].
//! 4. Produce any encoding symbol from the intermediates with
//!    [`encode::encode_symbol`]; ISIs below K' reproduce the source symbols,
//!    larger ISIs yield repair symbols.
//!
//! Every step is deterministic: the same inputs give the same symbols, the
//! same pivot choices, and the same failures.

pub mod constraint;
pub mod decoder;
pub mod encode;
pub mod gf256;
pub mod matrix;
pub mod params;
pub mod rfc6330;

pub use decoder::{
    decode_intermediate, DecodeError, DecodeFailureClass, DecodeOutput, DecodePhase, DecodeStats,
};
pub use encode::{encode_indexes, encode_symbol};
pub use gf256::Gf256;
pub use matrix::OctetMatrix;
pub use params::{ParamError, SystematicParams};
