//! Resonant peak detection and matching
//!
//! Peaks are strict local maxima of a magnitude series whose topographic
//! prominence clears a floor expressed as a fraction of the series maximum,
//! so a noisy shoulder on a tall resonance does not register while a small
//! but isolated mode does. Matching pairs the peaks of two series one-to-one
//! by nearest frequency within a relative tolerance.

use serde::{Deserialize, Serialize};

/// A detected resonant peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Frequency of the peak sample in Hz
    pub frequency: f64,
    /// Magnitude at the peak sample
    pub magnitude: f64,
    /// Index of the peak sample in the aligned series
    pub index: usize,
}

/// A matched pair of peaks with signed comparison errors
///
/// Errors are reconstructed minus original, so a positive frequency error
/// means the reconstructed peak sits above the original in frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakMatch {
    pub original: Peak,
    pub reconstructed: Peak,
    /// Frequency error in Hz
    pub frequency_error_abs: f64,
    /// Frequency error as a percentage of the original frequency
    pub frequency_error_pct: f64,
    /// Magnitude error in ordinate units
    pub magnitude_error_abs: f64,
    /// Magnitude error as a percentage of the original magnitude
    pub magnitude_error_pct: f64,
}

impl PeakMatch {
    fn new(original: Peak, reconstructed: Peak) -> Self {
        let frequency_error_abs = reconstructed.frequency - original.frequency;
        let frequency_error_pct = if original.frequency != 0.0 {
            100.0 * frequency_error_abs / original.frequency
        } else {
            0.0
        };
        let magnitude_error_abs = reconstructed.magnitude - original.magnitude;
        let magnitude_error_pct = if original.magnitude != 0.0 {
            100.0 * magnitude_error_abs / original.magnitude
        } else {
            0.0
        };
        Self {
            original,
            reconstructed,
            frequency_error_abs,
            frequency_error_pct,
            magnitude_error_abs,
            magnitude_error_pct,
        }
    }
}

/// Result of one-to-one peak matching
#[derive(Debug, Clone, Default)]
pub struct PeakMatchOutcome {
    /// Matched pairs, ordered by original peak frequency
    pub matches: Vec<PeakMatch>,
    /// Original peaks with no partner within tolerance
    pub unmatched_original: Vec<Peak>,
    /// Reconstructed peaks with no partner within tolerance
    pub unmatched_reconstructed: Vec<Peak>,
}

/// Detect resonant peaks in a magnitude series
///
/// A sample is a candidate if it is strictly greater than both neighbors;
/// series endpoints are never peaks. A candidate is retained when its
/// prominence reaches `prominence_ratio` times the series maximum. Series
/// shorter than 3 samples have no interior and yield no peaks.
pub fn detect_peaks(frequencies: &[f64], magnitudes: &[f64], prominence_ratio: f64) -> Vec<Peak> {
    debug_assert_eq!(frequencies.len(), magnitudes.len());
    if magnitudes.len() < 3 {
        return Vec::new();
    }
    let max = magnitudes.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let floor = prominence_ratio * max;

    let mut peaks = Vec::new();
    for i in 1..magnitudes.len() - 1 {
        if magnitudes[i] > magnitudes[i - 1]
            && magnitudes[i] > magnitudes[i + 1]
            && prominence(magnitudes, i) >= floor
        {
            peaks.push(Peak {
                frequency: frequencies[i],
                magnitude: magnitudes[i],
                index: i,
            });
        }
    }
    peaks
}

/// Topographic prominence of the local maximum at `index`
///
/// Each side contributes a base: the lowest sample between the peak and the
/// nearest strictly higher sample on that side, or between the peak and the
/// series end if nothing higher exists. Prominence is the peak height above
/// the higher of the two bases.
fn prominence(magnitudes: &[f64], index: usize) -> f64 {
    let peak = magnitudes[index];

    let mut left_base = peak;
    let mut i = index;
    while i > 0 {
        i -= 1;
        if magnitudes[i] > peak {
            break;
        }
        left_base = left_base.min(magnitudes[i]);
    }

    let mut right_base = peak;
    let mut i = index;
    while i + 1 < magnitudes.len() {
        i += 1;
        if magnitudes[i] > peak {
            break;
        }
        right_base = right_base.min(magnitudes[i]);
    }

    peak - left_base.max(right_base)
}

/// Match original peaks against reconstructed peaks one-to-one
///
/// Candidate pairs are visited in order of ascending absolute frequency
/// distance (ties broken by index pair, so the result is deterministic);
/// a pair is committed when neither peak is taken yet and the frequency
/// distance is within `tolerance` relative to the original frequency.
pub fn match_peaks(original: &[Peak], reconstructed: &[Peak], tolerance: f64) -> PeakMatchOutcome {
    let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(original.len() * reconstructed.len());
    for i in 0..original.len() {
        for j in 0..reconstructed.len() {
            candidates.push((i, j));
        }
    }
    candidates.sort_by(|&(i, j), &(k, l)| {
        let d_ij = (original[i].frequency - reconstructed[j].frequency).abs();
        let d_kl = (original[k].frequency - reconstructed[l].frequency).abs();
        d_ij.total_cmp(&d_kl).then(i.cmp(&k)).then(j.cmp(&l))
    });

    let mut used_original = vec![false; original.len()];
    let mut used_reconstructed = vec![false; reconstructed.len()];
    let mut outcome = PeakMatchOutcome::default();

    for (i, j) in candidates {
        if used_original[i] || used_reconstructed[j] {
            continue;
        }
        if !within_relative_tolerance(original[i].frequency, reconstructed[j].frequency, tolerance) {
            continue;
        }
        used_original[i] = true;
        used_reconstructed[j] = true;
        outcome.matches.push(PeakMatch::new(original[i], reconstructed[j]));
    }

    outcome.matches.sort_by(|a, b| a.original.index.cmp(&b.original.index));
    outcome.unmatched_original = original
        .iter()
        .enumerate()
        .filter(|(i, _)| !used_original[*i])
        .map(|(_, p)| *p)
        .collect();
    outcome.unmatched_reconstructed = reconstructed
        .iter()
        .enumerate()
        .filter(|(j, _)| !used_reconstructed[*j])
        .map(|(_, p)| *p)
        .collect();
    outcome
}

/// Relative-tolerance acceptance against a reference frequency
///
/// A zero reference admits only an exact zero candidate, since a relative
/// distance from zero is undefined.
fn within_relative_tolerance(reference: f64, candidate: f64, tolerance: f64) -> bool {
    if reference == 0.0 {
        return candidate == 0.0;
    }
    (candidate - reference).abs() / reference.abs() <= tolerance
}
