//! Validation orchestration
//!
//! Runs the full comparison pipeline for one testlab/reconstructed record
//! pair: alignment onto the reconstructed grid, magnitude error metrics,
//! FRAC where the reference carries phase, then peak detection and
//! one-to-one matching. The outcome is a [`ValidationReport`] that the
//! caller renders or serializes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::align::{align, AlignmentError};
use super::metrics;
use super::peaks::{detect_peaks, match_peaks};
use crate::record::{Record, RecordKind};
use crate::report::ValidationReport;
use crate::{DEFAULT_FREQUENCY_TOLERANCE, DEFAULT_PROMINENCE_RATIO};

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("testlab record is not a complex FRF (kind: {kind}); FRAC needs phase data")]
    NotComplex { kind: RecordKind },
    #[error("FRAC undefined: a compared series has zero energy")]
    ZeroEnergy,
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
}

/// Tunable parameters for a validation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationParams {
    /// Peak prominence floor as a fraction of the magnitude maximum
    pub prominence_ratio: f64,
    /// Relative frequency tolerance for alignment and peak matching
    pub frequency_tolerance: f64,
    /// Treat an uncomputable FRAC as an error instead of reporting `None`
    pub require_frac: bool,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            prominence_ratio: DEFAULT_PROMINENCE_RATIO,
            frequency_tolerance: DEFAULT_FREQUENCY_TOLERANCE,
            require_frac: false,
        }
    }
}

impl ValidationParams {
    pub fn with_prominence_ratio(mut self, ratio: f64) -> Self {
        self.prominence_ratio = ratio;
        self
    }

    pub fn with_frequency_tolerance(mut self, tolerance: f64) -> Self {
        self.frequency_tolerance = tolerance;
        self
    }

    pub fn with_require_frac(mut self, require: bool) -> Self {
        self.require_frac = require;
        self
    }
}

/// Validate a reconstructed record against its testlab reference
///
/// Global metrics and peak analysis always run on the aligned magnitudes.
/// FRAC runs only when the testlab record is an FRF with nonzero energy on
/// both sides; otherwise the report carries `frac: None`, unless
/// `require_frac` turns the missing metric into an error.
pub fn validate(
    testlab: &Record,
    reconstructed: &Record,
    params: &ValidationParams,
) -> Result<ValidationReport, ValidationError> {
    debug!(
        testlab = %testlab.label(),
        reconstructed = %reconstructed.label(),
        tolerance = params.frequency_tolerance,
        "starting validation"
    );

    let aligned = align(testlab, reconstructed, params.frequency_tolerance)?;

    let magnitude_ref: Vec<f64> = aligned.reference.iter().map(|z| z.norm()).collect();
    let magnitude_rec: Vec<f64> = aligned.reconstructed.iter().map(|z| z.norm()).collect();

    let rmse = metrics::rmse(&magnitude_ref, &magnitude_rec);
    let mae = metrics::mae(&magnitude_ref, &magnitude_rec);
    let r_squared = metrics::r_squared(&magnitude_ref, &magnitude_rec);

    let frac = if testlab.kind() == RecordKind::Frf {
        match metrics::frac(&aligned.reference, &aligned.reconstructed) {
            Some(value) => Some(value),
            None if params.require_frac => return Err(ValidationError::ZeroEnergy),
            None => {
                warn!("FRAC undefined: a compared series has zero energy");
                None
            }
        }
    } else if params.require_frac {
        return Err(ValidationError::NotComplex {
            kind: testlab.kind(),
        });
    } else {
        debug!(kind = %testlab.kind(), "testlab record carries no phase; skipping FRAC");
        None
    };

    let peaks_original = detect_peaks(&aligned.frequencies, &magnitude_ref, params.prominence_ratio);
    let peaks_reconstructed =
        detect_peaks(&aligned.frequencies, &magnitude_rec, params.prominence_ratio);
    let matching = match_peaks(&peaks_original, &peaks_reconstructed, params.frequency_tolerance);

    debug!(
        points = aligned.len(),
        rmse,
        mae,
        peaks_original = peaks_original.len(),
        peaks_reconstructed = peaks_reconstructed.len(),
        matched = matching.matches.len(),
        "validation complete"
    );

    Ok(ValidationReport {
        generated_at: Utc::now(),
        testlab_label: testlab.label(),
        testlab_source: testlab.meta().source_file.clone(),
        reconstructed_label: reconstructed.label(),
        reconstructed_source: reconstructed.meta().source_file.clone(),
        params: *params,
        aligned_points: aligned.len(),
        rmse,
        mae,
        r_squared,
        frac,
        peaks_original,
        peaks_reconstructed,
        matches: matching.matches,
        unmatched_original: matching.unmatched_original,
        unmatched_reconstructed: matching.unmatched_reconstructed,
    })
}
