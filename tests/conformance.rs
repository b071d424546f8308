//! End-to-end codec conformance: systematic round-trips, loss recovery,
//! determinism, and failure classification.
//!
//! Each scenario assembles the decode system the way a receiver would: the
//! S + H precode constraint rows with zero payloads, then one encoding row
//! per received ISI paired with that symbol's bytes.

use rq_codec::constraint::{build_constraint_matrix, fill_encoding_row};
use rq_codec::{
    decode_intermediate, encode_symbol, DecodeError, OctetMatrix, SystematicParams,
};

// ============================================================================
// Test helpers
// ============================================================================

/// Generate source data with a specific pattern for easier debugging.
fn make_patterned_source(k: usize, symbol_size: usize) -> Vec<Vec<u8>> {
    (0..k)
        .map(|i| {
            (0..symbol_size)
                .map(|j| ((i * 37 + j * 13 + 7) % 256) as u8)
                .collect()
        })
        .collect()
}

/// Decode system for an undamaged systematic block: constraint rows plus the
/// source symbols in ISI order.
fn systematic_system(
    params: &SystematicParams,
    source: &[Vec<u8>],
    symbol_size: usize,
) -> (OctetMatrix, Vec<Vec<u8>>) {
    assert_eq!(source.len(), params.kprime());
    let a = build_constraint_matrix(params);
    let mut payloads = vec![vec![0u8; symbol_size]; params.s() + params.h()];
    payloads.extend(source.iter().cloned());
    (a, payloads)
}

/// Recovers the intermediate symbols of an undamaged block.
fn intermediates_for(
    params: &SystematicParams,
    source: &[Vec<u8>],
    symbol_size: usize,
) -> Vec<Vec<u8>> {
    let (a, payloads) = systematic_system(params, source, symbol_size);
    decode_intermediate(a, payloads, params)
        .expect("systematic system is full rank")
        .intermediate
}

/// Decode system for a damaged block: constraint rows plus one encoding row
/// per received ISI, with payloads generated from the true intermediates.
fn received_system(
    params: &SystematicParams,
    intermediate: &[Vec<u8>],
    received_isis: &[u32],
    symbol_size: usize,
) -> (OctetMatrix, Vec<Vec<u8>>) {
    let base_rows = params.s() + params.h();
    let mut rows = build_constraint_matrix(params).into_rows();
    rows.truncate(base_rows);
    let mut payloads = vec![vec![0u8; symbol_size]; base_rows];

    for &isi in received_isis {
        rows.push(vec![0u8; params.l()]);
        payloads.push(encode_symbol(params, intermediate, isi));
    }

    let mut a = OctetMatrix::from_rows(rows);
    for (offset, &isi) in received_isis.iter().enumerate() {
        fill_encoding_row(&mut a, base_rows + offset, params, isi);
    }
    (a, payloads)
}

// ============================================================================
// Roundtrip
// ============================================================================

#[test]
fn systematic_roundtrip_reencodes_source() {
    let params = SystematicParams::for_kprime(10).unwrap();
    let symbol_size = 64;
    let source = make_patterned_source(params.kprime(), symbol_size);

    let intermediate = intermediates_for(&params, &source, symbol_size);
    assert_eq!(intermediate.len(), params.l());

    for (isi, original) in source.iter().enumerate() {
        let symbol = encode_symbol(&params, &intermediate, isi as u32);
        assert_eq!(&symbol, original, "source symbol {isi} mismatch after roundtrip");
    }
}

#[test]
fn roundtrip_across_block_sizes() {
    for kprime in [10usize, 12, 20, 26, 49] {
        let params = SystematicParams::for_kprime(kprime).unwrap();
        let symbol_size = 32;
        let source = make_patterned_source(kprime, symbol_size);

        let intermediate = intermediates_for(&params, &source, symbol_size);
        for (isi, original) in source.iter().enumerate() {
            let symbol = encode_symbol(&params, &intermediate, isi as u32);
            assert_eq!(&symbol, original, "K'={kprime} source symbol {isi} mismatch");
        }
    }
}

// ============================================================================
// Loss recovery
// ============================================================================

#[test]
fn recovers_from_source_loss() {
    let params = SystematicParams::for_kprime(10).unwrap();
    let symbol_size = 48;
    let k = params.kprime();
    let source = make_patterned_source(k, symbol_size);
    let intermediate = intermediates_for(&params, &source, symbol_size);

    // Drop three source symbols; replace them with five repair symbols for
    // two rows of decoding overhead.
    let dropped = [0usize, 3, 7];
    let mut received: Vec<u32> = (0..k as u32)
        .filter(|isi| !dropped.contains(&(*isi as usize)))
        .collect();
    received.extend(k as u32..k as u32 + 5);

    let (a, payloads) = received_system(&params, &intermediate, &received, symbol_size);
    let output = decode_intermediate(a, payloads, &params).expect("decode should succeed");

    for (isi, original) in source.iter().enumerate() {
        let symbol = encode_symbol(&params, &output.intermediate, isi as u32);
        assert_eq!(
            &symbol, original,
            "source symbol {isi} mismatch after recovering from loss"
        );
    }
}

#[test]
fn recovers_from_repair_only() {
    let params = SystematicParams::for_kprime(10).unwrap();
    let symbol_size = 24;
    let k = params.kprime() as u32;
    let source = make_patterned_source(params.kprime(), symbol_size);
    let intermediate = intermediates_for(&params, &source, symbol_size);

    // Every source symbol lost: K' + 2 repair symbols only.
    let received: Vec<u32> = (k..k + k + 2).collect();
    let (a, payloads) = received_system(&params, &intermediate, &received, symbol_size);
    let output = decode_intermediate(a, payloads, &params).expect("decode should succeed");

    for (isi, original) in source.iter().enumerate() {
        let symbol = encode_symbol(&params, &output.intermediate, isi as u32);
        assert_eq!(
            &symbol, original,
            "source symbol {isi} mismatch with repair-only decode"
        );
    }
}

#[test]
fn mixed_loss_on_larger_block() {
    let params = SystematicParams::for_kprime(20).unwrap();
    let symbol_size = 40;
    let k = params.kprime();
    let source = make_patterned_source(k, symbol_size);
    let intermediate = intermediates_for(&params, &source, symbol_size);

    // Drop every third source symbol.
    let mut received: Vec<u32> = (0..k as u32).filter(|isi| isi % 3 != 0).collect();
    let dropped = k - received.len();
    received.extend(k as u32..(k + dropped + 2) as u32);

    let (a, payloads) = received_system(&params, &intermediate, &received, symbol_size);
    let output = decode_intermediate(a, payloads, &params).expect("decode should succeed");

    for (isi, original) in source.iter().enumerate() {
        let symbol = encode_symbol(&params, &output.intermediate, isi as u32);
        assert_eq!(&symbol, original, "source symbol {isi} mismatch");
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn decode_deterministic_same_input() {
    let params = SystematicParams::for_kprime(12).unwrap();
    let symbol_size = 32;
    let source = make_patterned_source(params.kprime(), symbol_size);

    let (a, payloads) = systematic_system(&params, &source, symbol_size);
    let first = decode_intermediate(a.clone(), payloads.clone(), &params).unwrap();
    let second = decode_intermediate(a, payloads, &params).unwrap();

    assert_eq!(first.intermediate, second.intermediate);
    assert_eq!(first.stats.pivot_steps, second.stats.pivot_steps);
    assert_eq!(first.stats.inactivated, second.stats.inactivated);
    assert_eq!(first.stats.graph_pivots, second.stats.graph_pivots);
    assert_eq!(first.stats.row_ops, second.stats.row_ops);
    assert_eq!(first.stats.swaps, second.stats.swaps);
}

#[test]
fn overhead_rows_do_not_change_the_solution() {
    // The intermediate block is the unique solution of any full-rank system,
    // so extra repair rows must leave it bit-identical.
    let params = SystematicParams::for_kprime(10).unwrap();
    let symbol_size = 16;
    let k = params.kprime() as u32;
    let source = make_patterned_source(params.kprime(), symbol_size);
    let intermediate = intermediates_for(&params, &source, symbol_size);

    let exact: Vec<u32> = (0..k).collect();
    let padded: Vec<u32> = (0..k + 4).collect();

    let (a, payloads) = received_system(&params, &intermediate, &exact, symbol_size);
    let from_exact = decode_intermediate(a, payloads, &params).unwrap();

    let (a, payloads) = received_system(&params, &intermediate, &padded, symbol_size);
    let from_padded = decode_intermediate(a, payloads, &params).unwrap();

    assert_eq!(from_exact.intermediate, from_padded.intermediate);
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn short_one_symbol_reports_insufficient_rows() {
    let params = SystematicParams::for_kprime(10).unwrap();
    let symbol_size = 8;
    let source = make_patterned_source(params.kprime(), symbol_size);
    let intermediate = intermediates_for(&params, &source, symbol_size);

    // Nine of ten source symbols and no repair: one equation short.
    let received: Vec<u32> = (0..params.kprime() as u32 - 1).collect();
    let (a, payloads) = received_system(&params, &intermediate, &received, symbol_size);

    let err = decode_intermediate(a, payloads, &params).unwrap_err();
    assert_eq!(
        err,
        DecodeError::InsufficientRows {
            received: params.l() - 1,
            required: params.l()
        }
    );
    assert!(err.is_recoverable(), "short block should invite more symbols");
}

#[test]
fn duplicate_symbol_reports_singular_matrix() {
    let params = SystematicParams::for_kprime(10).unwrap();
    let symbol_size = 8;
    let k = params.kprime() as u32;
    let source = make_patterned_source(params.kprime(), symbol_size);
    let intermediate = intermediates_for(&params, &source, symbol_size);

    // Enough rows, but one equation appears twice: rank L - 1.
    let mut received: Vec<u32> = (0..k - 1).collect();
    received.push(0);
    let (a, payloads) = received_system(&params, &intermediate, &received, symbol_size);

    let err = decode_intermediate(a, payloads, &params).unwrap_err();
    assert!(
        matches!(err, DecodeError::SingularMatrix { .. }),
        "expected singular failure, got {err:?}"
    );
    assert!(err.is_recoverable());
}

// ============================================================================
// Observability
// ============================================================================

#[test]
fn decode_stats_serialize_for_reporting() {
    let params = SystematicParams::for_kprime(10).unwrap();
    let symbol_size = 8;
    let source = make_patterned_source(params.kprime(), symbol_size);
    let (a, payloads) = systematic_system(&params, &source, symbol_size);
    let output = decode_intermediate(a, payloads, &params).unwrap();

    let json = serde_json::to_value(&output.stats).unwrap();
    assert_eq!(
        json["pivot_steps"].as_u64().unwrap() + json["inactivated"].as_u64().unwrap(),
        params.l() as u64
    );
    assert!(json["row_ops"].as_u64().is_some());
    assert!(json["swaps"].as_u64().is_some());
}
