//! Frequency-axis alignment
//!
//! Puts a testlab record and a reconstructed record onto a shared frequency
//! grid before any metric is computed. The reconstructed axis is the
//! authoritative target; every target frequency takes the nearest testlab
//! sample, and targets whose nearest sample falls outside a relative
//! tolerance are excluded rather than extrapolated.

use num_complex::Complex64;
use thiserror::Error;
use tracing::debug;

use crate::record::Record;

/// Fewest surviving points for a usable alignment
const MIN_ALIGNED_POINTS: usize = 2;

#[derive(Error, Debug)]
pub enum AlignmentError {
    #[error("cannot align: {side} frequency axis is empty")]
    EmptyAxis { side: &'static str },
    #[error(
        "only {kept} of {targets} target frequencies found a testlab sample within \
         relative tolerance {tolerance}; at least {MIN_ALIGNED_POINTS} required"
    )]
    InsufficientOverlap {
        kept: usize,
        targets: usize,
        tolerance: f64,
    },
}

/// Two records restricted to a shared frequency grid
#[derive(Debug, Clone)]
pub struct AlignedPair {
    /// Shared frequency axis, a subset of the reconstructed axis
    pub frequencies: Vec<f64>,
    /// Testlab values at the shared frequencies
    pub reference: Vec<Complex64>,
    /// Reconstructed values at the shared frequencies
    pub reconstructed: Vec<Complex64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Align a testlab record onto a reconstructed record's frequency grid
///
/// Each reconstructed frequency is paired with the nearest testlab sample
/// and kept only when that sample lies within `tolerance` relative to the
/// target (a zero target requires an exact zero sample). Fails when either
/// axis is empty or fewer than two pairs survive.
pub fn align(
    testlab: &Record,
    reconstructed: &Record,
    tolerance: f64,
) -> Result<AlignedPair, AlignmentError> {
    let source = testlab.frequencies();
    let targets = reconstructed.frequencies();
    if source.is_empty() {
        return Err(AlignmentError::EmptyAxis { side: "testlab" });
    }
    if targets.is_empty() {
        return Err(AlignmentError::EmptyAxis {
            side: "reconstructed",
        });
    }

    let reference_all = testlab.to_complex();
    let reconstructed_all = reconstructed.to_complex();

    let mut frequencies = Vec::with_capacity(targets.len());
    let mut reference = Vec::with_capacity(targets.len());
    let mut reconstructed_vals = Vec::with_capacity(targets.len());
    let mut excluded = 0usize;

    for (target_idx, &target) in targets.iter().enumerate() {
        let source_idx = nearest_index(source, target);
        if within_tolerance(target, source[source_idx], tolerance) {
            frequencies.push(target);
            reference.push(reference_all[source_idx]);
            reconstructed_vals.push(reconstructed_all[target_idx]);
        } else {
            excluded += 1;
        }
    }

    if excluded > 0 {
        debug!(
            excluded,
            tolerance, "target frequencies without a testlab sample in tolerance"
        );
    }
    if frequencies.len() < MIN_ALIGNED_POINTS {
        return Err(AlignmentError::InsufficientOverlap {
            kept: frequencies.len(),
            targets: targets.len(),
            tolerance,
        });
    }
    debug!(points = frequencies.len(), "aligned records");

    Ok(AlignedPair {
        frequencies,
        reference,
        reconstructed: reconstructed_vals,
    })
}

/// Index of the sample nearest to `target` in an ascending axis
///
/// Equidistant neighbors resolve to the lower index.
fn nearest_index(axis: &[f64], target: f64) -> usize {
    let upper = axis.partition_point(|&f| f < target);
    if upper == 0 {
        return 0;
    }
    if upper == axis.len() {
        return axis.len() - 1;
    }
    if target - axis[upper - 1] <= axis[upper] - target {
        upper - 1
    } else {
        upper
    }
}

/// Relative-tolerance acceptance; a zero target admits only an exact zero
fn within_tolerance(target: f64, nearest: f64, tolerance: f64) -> bool {
    if target == 0.0 {
        return nearest == 0.0;
    }
    (nearest - target).abs() <= tolerance * target.abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordKind, RecordMeta, Values};

    fn real_record(frequencies: Vec<f64>, values: Vec<f64>, kind: RecordKind) -> Record {
        Record::new(frequencies, Values::Real(values), kind, RecordMeta::default()).unwrap()
    }

    #[test]
    fn test_identical_axes_align_fully() {
        let frequencies = vec![0.0, 10.0, 20.0, 30.0];
        let a = real_record(frequencies.clone(), vec![1.0, 2.0, 3.0, 4.0], RecordKind::Psd);
        let b = real_record(frequencies.clone(), vec![5.0, 6.0, 7.0, 8.0], RecordKind::Psd);

        let aligned = align(&a, &b, 0.05).unwrap();
        assert_eq!(aligned.len(), 4);
        assert_eq!(aligned.frequencies, frequencies);
        assert_eq!(aligned.reference[2].re, 3.0);
        assert_eq!(aligned.reconstructed[2].re, 7.0);
    }

    #[test]
    fn test_reconstructed_grid_is_authoritative() {
        // Testlab at 1 Hz resolution, reconstruction at 2 Hz: the result
        // lives on the coarser reconstructed axis, one point per target.
        let testlab_freq: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let testlab_vals: Vec<f64> = testlab_freq.iter().map(|f| f * 2.0).collect();
        let recon_freq: Vec<f64> = (0..=50).map(|i| (i * 2) as f64).collect();
        let recon_vals: Vec<f64> = recon_freq.iter().map(|f| f * 2.0).collect();

        let testlab = real_record(testlab_freq, testlab_vals, RecordKind::Psd);
        let recon = real_record(recon_freq.clone(), recon_vals, RecordKind::Psd);

        let aligned = align(&testlab, &recon, 0.05).unwrap();
        assert_eq!(aligned.len(), recon_freq.len());
        assert_eq!(aligned.frequencies, recon_freq);
        // Every target hits its exact testlab counterpart
        for (f, y) in aligned.frequencies.iter().zip(&aligned.reference) {
            assert_eq!(y.re, f * 2.0);
        }
    }

    #[test]
    fn test_out_of_tolerance_targets_excluded() {
        let testlab = real_record(vec![10.0, 20.0, 30.0], vec![1.0, 2.0, 3.0], RecordKind::Psd);
        // 29 Hz is 1 Hz from the nearest sample (3.4% relative, kept);
        // 100 Hz is 70 Hz away (excluded).
        let recon = real_record(
            vec![10.0, 20.0, 29.0, 100.0],
            vec![1.0, 1.0, 1.0, 1.0],
            RecordKind::Psd,
        );

        let aligned = align(&testlab, &recon, 0.05).unwrap();
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned.frequencies, vec![10.0, 20.0, 29.0]);
        // The 29 Hz target borrows the 30 Hz testlab value
        assert_eq!(aligned.reference[2].re, 3.0);
    }

    #[test]
    fn test_disjoint_axes_fail() {
        let testlab = real_record(vec![10.0, 20.0], vec![1.0, 2.0], RecordKind::Psd);
        let recon = real_record(
            vec![500.0, 600.0, 700.0],
            vec![1.0, 1.0, 1.0],
            RecordKind::Psd,
        );

        let err = align(&testlab, &recon, 0.05).unwrap_err();
        match err {
            AlignmentError::InsufficientOverlap { kept, targets, .. } => {
                assert_eq!(kept, 0);
                assert_eq!(targets, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_survivor_is_not_enough() {
        let testlab = real_record(vec![10.0, 20.0], vec![1.0, 2.0], RecordKind::Psd);
        let recon = real_record(
            vec![10.0, 600.0, 700.0],
            vec![1.0, 1.0, 1.0],
            RecordKind::Psd,
        );

        assert!(matches!(
            align(&testlab, &recon, 0.05),
            Err(AlignmentError::InsufficientOverlap { kept: 1, .. })
        ));
    }

    #[test]
    fn test_zero_target_requires_exact_zero_sample() {
        // Testlab starts at 0.5 Hz: the 0 Hz target has no exact partner
        // and no relative distance, so it is excluded.
        let testlab = real_record(
            vec![0.5, 10.0, 20.0],
            vec![9.0, 1.0, 2.0],
            RecordKind::Psd,
        );
        let recon = real_record(
            vec![0.0, 10.0, 20.0],
            vec![1.0, 1.0, 1.0],
            RecordKind::Psd,
        );

        let aligned = align(&testlab, &recon, 0.05).unwrap();
        assert_eq!(aligned.frequencies, vec![10.0, 20.0]);
    }

    #[test]
    fn test_nearest_index_picks_closer_side() {
        let axis = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(nearest_index(&axis, -5.0), 0);
        assert_eq!(nearest_index(&axis, 4.9), 0);
        assert_eq!(nearest_index(&axis, 5.1), 1);
        assert_eq!(nearest_index(&axis, 10.0), 1);
        assert_eq!(nearest_index(&axis, 14.0), 1);
        assert_eq!(nearest_index(&axis, 99.0), 3);
        // Equidistant resolves low
        assert_eq!(nearest_index(&axis, 15.0), 1);
    }
}
