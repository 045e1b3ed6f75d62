//! E2E tests for the full validation pipeline
//!
//! Drives the realistic workflow end to end: parse a testlab export,
//! produce or load reconstructed spectra, validate, and inspect the
//! report. Covers grid mismatches, shifted resonances and corrupt files
//! in a batch.

use std::fs;

use approx::assert_relative_eq;
use modalcheck_core::unv::{
    parse_multi, parse_single, read_records, read_reconstructed_batch, write_record_file,
    write_single, ParseError,
};
use modalcheck_core::{
    validate, Complex64, Record, RecordKind, RecordMeta, ValidationParams, Values,
};

/// Two-resonance magnitude profile used across these tests
fn bumps(f: f64) -> f64 {
    1.0 + 20.0 * (-((f - 120.0) / 6.0).powi(2)).exp()
        + 12.0 * (-((f - 260.0) / 8.0).powi(2)).exp()
}

/// Testlab-flavored UNV text: one complex FRF on an even 1 Hz grid
fn testlab_unv_text(magnitudes: &[f64]) -> String {
    let mut s = String::from("    -1\n    58\nTestlab export\nNONE\nNONE\nNONE\nNONE\n");
    s.push_str("         4    0    0    0 NONE               11   3 NONE                1   2\n");
    s.push_str(&format!(
        "         5{:10}         1  0.00000e+00  1.00000e+00  0.00000e+00\n",
        magnitudes.len()
    ));
    for _ in 0..4 {
        s.push_str("        18    0    0    0 Frequency            Hz\n");
    }
    for &m in magnitudes {
        s.push_str(&format!(" {:.6e} 0.000000e0\n", m));
    }
    s.push_str("    -1\n");
    s
}

/// Reconstructed-amplitude record built directly from magnitudes
fn reconstructed(frequencies: Vec<f64>, magnitudes: Vec<f64>) -> Record {
    let values: Vec<Complex64> = magnitudes
        .into_iter()
        .map(|m| Complex64::new(m, 0.0))
        .collect();
    Record::new(
        frequencies,
        Values::Complex(values),
        RecordKind::ReconstructedAmplitude,
        RecordMeta::default(),
    )
    .unwrap()
}

/// Complex FRF record with zero phase built directly from magnitudes
fn frf(frequencies: Vec<f64>, magnitudes: Vec<f64>) -> Record {
    let values: Vec<Complex64> = magnitudes
        .into_iter()
        .map(|m| Complex64::new(m, 0.0))
        .collect();
    Record::new(
        frequencies,
        Values::Complex(values),
        RecordKind::Frf,
        RecordMeta::default(),
    )
    .unwrap()
}

/// Test the full file pipeline with a perfect reconstruction
#[test]
fn test_perfect_reconstruction_scores_perfectly() {
    let magnitudes: Vec<f64> = (0..=400).map(|i| bumps(i as f64)).collect();
    let text = testlab_unv_text(&magnitudes);

    let records = parse_multi(text.as_bytes()).unwrap();
    assert_eq!(records.len(), 1);
    let testlab = &records[0];
    assert_eq!(testlab.kind(), RecordKind::Frf);
    assert_eq!(testlab.label(), "Resp:11:3/Ref:1:2");

    // Export the reference and read it back the way a reconstruction
    // result arrives: single record, zero phase.
    let bytes = write_single(testlab).unwrap();
    let recon = parse_single(&bytes).unwrap();
    assert_eq!(recon.kind(), RecordKind::ReconstructedAmplitude);

    let report = validate(testlab, &recon, &ValidationParams::default()).unwrap();
    assert_eq!(report.aligned_points, 401);
    assert!(report.rmse < 1e-12, "rmse = {}", report.rmse);
    assert!(report.mae < 1e-12, "mae = {}", report.mae);
    assert!(report.r_squared.unwrap() > 0.999_999);
    assert!(report.frac.unwrap() > 0.999_999);

    assert_eq!(report.peaks_original.len(), 2, "two resonances expected");
    assert_eq!(report.matches.len(), 2, "both peaks must match");
    assert!(report.unmatched_original.is_empty());
    assert!(report.unmatched_reconstructed.is_empty());
    for m in &report.matches {
        assert_eq!(m.frequency_error_abs, 0.0);
        assert_eq!(m.magnitude_error_abs, 0.0);
    }
}

/// Test that a coarser reconstruction grid drives the alignment
#[test]
fn test_coarser_grid_aligns_on_reconstructed_axis() {
    let testlab_freq: Vec<f64> = (0..=400).map(|i| i as f64).collect();
    let testlab_mags: Vec<f64> = testlab_freq.iter().map(|&f| bumps(f)).collect();
    let testlab = frf(testlab_freq, testlab_mags);

    let recon_freq: Vec<f64> = (0..=200).map(|i| (i * 2) as f64).collect();
    let recon_mags: Vec<f64> = recon_freq.iter().map(|&f| bumps(f)).collect();
    let recon = reconstructed(recon_freq, recon_mags);

    let report = validate(&testlab, &recon, &ValidationParams::default()).unwrap();
    assert_eq!(
        report.aligned_points, 201,
        "metrics must live on the reconstructed grid"
    );
    assert!(report.rmse < 1e-12, "shared samples are identical");
    assert!(report.r_squared.unwrap() > 0.999_999);
    assert_eq!(report.matches.len(), 2);
    for m in &report.matches {
        assert_eq!(
            m.frequency_error_abs, 0.0,
            "peak centers sit on both grids"
        );
    }
}

/// Test that reconstructed samples beyond the reference range are excluded
#[test]
fn test_beyond_range_targets_are_excluded() {
    let testlab_freq: Vec<f64> = (0..=400).map(|i| i as f64).collect();
    let testlab_mags: Vec<f64> = testlab_freq.iter().map(|&f| bumps(f)).collect();
    let testlab = frf(testlab_freq, testlab_mags);

    // Reconstruction extends to 800 Hz where no reference data exists
    let recon_freq: Vec<f64> = (0..=400).map(|i| (i * 2) as f64).collect();
    let recon_mags: Vec<f64> = recon_freq.iter().map(|&f| bumps(f)).collect();
    let recon = reconstructed(recon_freq, recon_mags);

    let report = validate(&testlab, &recon, &ValidationParams::default()).unwrap();
    // Targets survive while the nearest sample (400 Hz) is within 5%
    // relative distance: up to 420 Hz on the 2 Hz grid.
    assert_eq!(report.aligned_points, 211);
}

/// Test that a shifted resonance reports a signed error and the lost
/// resonance lands in the unmatched lists
#[test]
fn test_shifted_peak_reports_signed_errors() {
    let freq: Vec<f64> = (0..=400).map(|i| i as f64).collect();
    let testlab = frf(freq.clone(), freq.iter().map(|&f| bumps(f)).collect());

    // First resonance moved +3 Hz and grown; second moved far out of
    // tolerance to 300 Hz.
    let recon_mags: Vec<f64> = freq
        .iter()
        .map(|&f| {
            1.0 + 22.0 * (-((f - 123.0) / 6.0).powi(2)).exp()
                + 12.0 * (-((f - 300.0) / 8.0).powi(2)).exp()
        })
        .collect();
    let recon = reconstructed(freq, recon_mags);

    let report = validate(&testlab, &recon, &ValidationParams::default()).unwrap();

    assert_eq!(report.matches.len(), 1, "only the 120/123 pair is in tolerance");
    let m = &report.matches[0];
    assert_relative_eq!(m.original.frequency, 120.0, max_relative = 1e-12);
    assert_relative_eq!(m.reconstructed.frequency, 123.0, max_relative = 1e-12);
    assert_relative_eq!(m.frequency_error_abs, 3.0, max_relative = 1e-9);
    assert_relative_eq!(m.frequency_error_pct, 2.5, max_relative = 1e-9);
    assert!(m.magnitude_error_abs > 0.0, "grown peak must read positive");

    assert_eq!(report.unmatched_original.len(), 1);
    assert_relative_eq!(
        report.unmatched_original[0].frequency,
        260.0,
        max_relative = 1e-12
    );
    assert_eq!(report.unmatched_reconstructed.len(), 1);
    assert_relative_eq!(
        report.unmatched_reconstructed[0].frequency,
        300.0,
        max_relative = 1e-12
    );
}

/// Test that one corrupt file never aborts a batch validation run
#[test]
fn test_corrupt_file_in_batch_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let magnitudes: Vec<f64> = (0..=400).map(|i| bumps(i as f64)).collect();

    let testlab_path = dir.path().join("bridge_test.unv");
    fs::write(&testlab_path, testlab_unv_text(&magnitudes)).unwrap();
    let records = read_records(&testlab_path).unwrap();
    let testlab = &records[0];
    assert_eq!(
        testlab.meta().source_file.as_deref(),
        Some("bridge_test.unv")
    );

    let run_001 = dir.path().join("run_001.unv");
    write_record_file(testlab, &run_001).unwrap();
    let broken = dir.path().join("broken.unv");
    fs::write(&broken, "this is not a universal file\n").unwrap();
    let run_002 = dir.path().join("run_002.unv");
    write_record_file(testlab, &run_002).unwrap();

    let batch = read_reconstructed_batch(&[run_001, broken, run_002]);
    assert_eq!(batch.len(), 3, "every input file gets a slot");
    assert_eq!(batch[0].0, "run_001.unv");
    assert!(batch[0].1.is_ok());
    assert!(matches!(batch[1].1, Err(ParseError::NoFunctionData)));
    assert_eq!(batch[2].0, "run_002.unv");
    assert!(batch[2].1.is_ok());

    let params = ValidationParams::default();
    let reports: Vec<_> = batch
        .iter()
        .filter_map(|(_, outcome)| outcome.as_ref().ok())
        .map(|recon| validate(testlab, recon, &params).unwrap())
        .collect();
    assert_eq!(reports.len(), 2, "both healthy files must validate");
    assert!(reports.iter().all(|r| r.rmse < 1e-12));
    assert_eq!(
        reports[0].reconstructed_source.as_deref(),
        Some("run_001.unv")
    );
}

/// Test that the JSON aggregate of a run parses back losslessly
#[test]
fn test_report_json_survives_serialization() {
    let freq: Vec<f64> = (0..=400).map(|i| i as f64).collect();
    let testlab = frf(freq.clone(), freq.iter().map(|&f| bumps(f)).collect());
    let recon = reconstructed(freq.clone(), freq.iter().map(|&f| bumps(f)).collect());

    let report = validate(&testlab, &recon, &ValidationParams::default()).unwrap();
    let json = serde_json::to_string_pretty(&[report.clone()]).unwrap();
    let back: Vec<modalcheck_core::ValidationReport> = serde_json::from_str(&json).unwrap();

    assert_eq!(back.len(), 1);
    assert_eq!(back[0], report);
}
