//! Validation report rendering and serialization
//!
//! [`ValidationReport`] is the complete outcome of one validation run. It
//! renders as a fixed-width text report with three numbered sections
//! (global error metrics, shape metrics, resonant peak analysis) and
//! serializes to JSON for downstream tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validate::{Peak, PeakMatch, ValidationParams};

/// Outcome of validating one reconstructed record against its reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// When the validation ran
    pub generated_at: DateTime<Utc>,
    /// DOF label of the testlab reference
    pub testlab_label: String,
    /// File the testlab reference was read from, when known
    pub testlab_source: Option<String>,
    /// DOF label of the reconstructed record
    pub reconstructed_label: String,
    /// File the reconstructed record was read from, when known
    pub reconstructed_source: Option<String>,
    /// Parameters the run used
    pub params: ValidationParams,
    /// Number of frequency points surviving alignment
    pub aligned_points: usize,
    /// Root mean squared magnitude error
    pub rmse: f64,
    /// Mean absolute magnitude error
    pub mae: f64,
    /// Coefficient of determination, `None` for a constant reference
    pub r_squared: Option<f64>,
    /// FRAC shape score, `None` when the reference carries no phase or
    /// either series has zero energy
    pub frac: Option<f64>,
    /// Peaks detected in the aligned testlab magnitudes
    pub peaks_original: Vec<Peak>,
    /// Peaks detected in the aligned reconstructed magnitudes
    pub peaks_reconstructed: Vec<Peak>,
    /// Matched peak pairs, ordered by original frequency
    pub matches: Vec<PeakMatch>,
    /// Original peaks left without a partner
    pub unmatched_original: Vec<Peak>,
    /// Reconstructed peaks left without a partner
    pub unmatched_reconstructed: Vec<Peak>,
}

impl ValidationReport {
    /// Render the fixed-width text report
    pub fn render_text(&self) -> String {
        let border = "=".repeat(75);
        let rule = format!("    {}", "-".repeat(71));
        let mut lines: Vec<String> = Vec::new();

        lines.push(border.clone());
        lines.push("              QUANTITATIVE VALIDATION METRICS REPORT".to_string());
        lines.push(border.clone());
        lines.push(format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(format!(
            "Testlab:       {}{}",
            self.testlab_label,
            source_suffix(&self.testlab_source)
        ));
        lines.push(format!(
            "Reconstructed: {}{}",
            self.reconstructed_label,
            source_suffix(&self.reconstructed_source)
        ));
        lines.push(format!("Aligned Points: {}", self.aligned_points));
        lines.push(String::new());

        lines.push("[1] GLOBAL ERROR METRICS".to_string());
        lines.push(rule.clone());
        lines.push(format!(
            "    Root Mean Squared Error (RMSE):    {}",
            sci(self.rmse, 6)
        ));
        lines.push(format!(
            "    Mean Absolute Error (MAE):         {}",
            sci(self.mae, 6)
        ));
        match self.r_squared {
            Some(r2) => {
                lines.push(format!("    Coefficient of Determination (R²): {r2:.6}"));
                lines.push(format!("        → {} linear correlation", quality_band(r2)));
            }
            None => lines.push(
                "    Coefficient of Determination (R²): undefined (constant reference)"
                    .to_string(),
            ),
        }
        lines.push(String::new());

        lines.push("[2] ADVANCED SHAPE METRICS".to_string());
        lines.push(rule.clone());
        match self.frac {
            Some(frac) => {
                lines.push("    Frequency Response Assurance".to_string());
                lines.push(format!("    Criterion (FRAC):                  {frac:.6}"));
                lines.push(format!("        → {}", frac_band(frac)));
            }
            None => lines.push(
                "    FRAC: unable to calculate (requires a complex FRF reference)".to_string(),
            ),
        }
        lines.push(String::new());

        lines.push("[3] FEATURE-SPECIFIC ANALYSIS: RESONANT PEAKS".to_string());
        lines.push(rule.clone());
        lines.push(format!(
            "    Peaks Detected in Original Signal:      {}",
            self.peaks_original.len()
        ));
        lines.push(format!(
            "    Peaks Detected in Reconstructed Signal: {}",
            self.peaks_reconstructed.len()
        ));
        lines.push(format!(
            "    Successfully Matched Peak Pairs:        {}",
            self.matches.len()
        ));
        lines.push(String::new());

        if self.matches.is_empty() {
            lines.push(
                "    No resonant peaks could be matched between the two signals.".to_string(),
            );
        } else {
            lines.push("    Peak-by-Peak Comparison:".to_string());
            lines.push(rule.clone());
            for (i, m) in self.matches.iter().enumerate() {
                lines.push(format!("    Peak #{}:", i + 1));
                lines.push(format!(
                    "      Frequency (Original):    {:10.2} Hz",
                    m.original.frequency
                ));
                lines.push(format!(
                    "      Frequency (Reconstruct): {:10.2} Hz",
                    m.reconstructed.frequency
                ));
                lines.push(format!(
                    "      Frequency Error:         {:+10.2} Hz ({:+6.2}%)",
                    m.frequency_error_abs, m.frequency_error_pct
                ));
                lines.push(format!(
                    "      Magnitude (Original):    {}",
                    sci(m.original.magnitude, 4)
                ));
                lines.push(format!(
                    "      Magnitude (Reconstruct): {}",
                    sci(m.reconstructed.magnitude, 4)
                ));
                lines.push(format!(
                    "      Magnitude Error:         {} ({:+6.2}%)",
                    signed_sci(m.magnitude_error_abs, 4),
                    m.magnitude_error_pct
                ));
                if i + 1 < self.matches.len() {
                    lines.push(String::new());
                }
            }
        }

        if !self.unmatched_original.is_empty() || !self.unmatched_reconstructed.is_empty() {
            lines.push(String::new());
            lines.push("    Unmatched Peaks:".to_string());
            lines.push(rule.clone());
            for peak in &self.unmatched_original {
                lines.push(format!(
                    "      Original:      {:10.2} Hz  ({})",
                    peak.frequency,
                    sci(peak.magnitude, 4)
                ));
            }
            for peak in &self.unmatched_reconstructed {
                lines.push(format!(
                    "      Reconstructed: {:10.2} Hz  ({})",
                    peak.frequency,
                    sci(peak.magnitude, 4)
                ));
            }
        }

        lines.push(String::new());
        lines.push(border.clone());
        lines.push("Note: FRAC values near 1.0 indicate excellent shape similarity.".to_string());
        lines.push(format!(
            "      Peak matching uses {}% frequency tolerance.",
            self.params.frequency_tolerance * 100.0
        ));
        lines.push(border);

        lines.join("\n")
    }

    /// Serialize the report as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Quality label for a unit-interval score, strict at each boundary
pub fn quality_band(value: f64) -> &'static str {
    if value > 0.95 {
        "Excellent"
    } else if value > 0.85 {
        "Good"
    } else if value > 0.70 {
        "Moderate"
    } else {
        "Poor"
    }
}

fn frac_band(frac: f64) -> &'static str {
    if frac > 0.95 {
        "Excellent shape consistency (>0.95)"
    } else if frac > 0.85 {
        "Good shape consistency (0.85-0.95)"
    } else if frac > 0.70 {
        "Moderate shape consistency (0.70-0.85)"
    } else {
        "Poor shape consistency (<0.70)"
    }
}

fn source_suffix(source: &Option<String>) -> String {
    match source {
        Some(name) => format!("  ({name})"),
        None => String::new(),
    }
}

/// Scientific notation with a signed two-digit exponent
fn sci(value: f64, precision: usize) -> String {
    let raw = format!("{value:.precision$e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ('-', rest),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => raw,
    }
}

fn signed_sci(value: f64, precision: usize) -> String {
    if value.is_sign_negative() {
        sci(value, precision)
    } else {
        format!("+{}", sci(value, precision))
    }
}
