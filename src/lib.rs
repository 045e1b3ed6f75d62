//! Modalcheck - validate reconstructed modal spectra against Testlab data
//!
//! This library re-exports the UNV codec and validation engine from
//! `modalcheck-core`. The binary in `main.rs` is a thin CLI over it.

pub use modalcheck_core::unv;
pub use modalcheck_core::validate;

pub use modalcheck_core::{Record, RecordKind, RecordMeta, Values};
pub use modalcheck_core::{Peak, PeakMatch, ValidationParams, ValidationReport};
pub use modalcheck_core::{
    BUILD_DATE, DEFAULT_FREQUENCY_TOLERANCE, DEFAULT_PROMINENCE_RATIO, VERSION,
};
