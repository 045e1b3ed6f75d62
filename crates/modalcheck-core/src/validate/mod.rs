//! Validation engine
//!
//! Compares a reconstructed spectrum against its testlab reference in four
//! stages: frequency alignment, global error metrics, FRAC shape scoring,
//! and resonant peak analysis. [`validate`] runs the whole pipeline.

pub mod align;
pub mod engine;
pub mod metrics;
pub mod peaks;

pub use align::{align, AlignedPair, AlignmentError};
pub use engine::{validate, ValidationError, ValidationParams};
pub use peaks::{detect_peaks, match_peaks, Peak, PeakMatch, PeakMatchOutcome};
