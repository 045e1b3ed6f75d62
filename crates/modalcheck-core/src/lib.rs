//! Modalcheck Core - UNV codec and reconstruction validation metrics
//!
//! This library provides the core functionality for validating reconstructed
//! frequency response functions against reference ("testlab") measurements.
//! It reads and writes Universal File Format dataset 58 records and computes
//! global error metrics (RMSE, MAE, R²), the FRAC shape-consistency
//! criterion, and resonant-peak comparisons.

pub mod record;
pub mod report;
pub mod unv;
pub mod validate;

pub use num_complex::Complex64;
pub use record::{Record, RecordKind, RecordMeta, Values};
pub use report::ValidationReport;
pub use unv::{parse_multi, parse_single, write_single, EncodeError, ParseError};
pub use validate::{validate, Peak, PeakMatch, ValidationError, ValidationParams};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date stamped by build.rs (YYYY-MM-DD)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Default peak prominence threshold as a fraction of the magnitude maximum
pub const DEFAULT_PROMINENCE_RATIO: f64 = 0.10;

/// Default relative frequency tolerance for alignment and peak matching
pub const DEFAULT_FREQUENCY_TOLERANCE: f64 = 0.05;
