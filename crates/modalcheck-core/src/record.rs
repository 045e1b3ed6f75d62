//! In-memory representation of measured and reconstructed functions
//!
//! A [`Record`] is one function of frequency: an FRF, a PSD, a coherence, or
//! a reconstructed amplitude spectrum. Records are immutable once built and
//! carry their file-format identity (DOF codes, source file) as opaque
//! metadata that the validation engine never interprets.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a [`Record`] from raw arrays
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record has no data points")]
    Empty,
    #[error("Length mismatch: {frequencies} frequencies vs {values} values")]
    LengthMismatch { frequencies: usize, values: usize },
    #[error("Frequency axis not strictly increasing at index {index}")]
    NonMonotonic { index: usize },
    #[error("Non-finite frequency at index {index}")]
    NonFiniteFrequency { index: usize },
    #[error("{kind} records require {expected} ordinate values")]
    KindMismatch {
        kind: RecordKind,
        expected: &'static str,
    },
}

/// The function class of a record
///
/// The kind is a closed set: it decides which metrics apply (only FRF and
/// reconstructed-amplitude records enter FRAC) and whether the ordinate
/// values carry phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Frequency response function, complex-valued
    Frf,
    /// Power spectral density, real-valued
    Psd,
    /// Coherence, real-valued in [0, 1]
    Coherence,
    /// Reconstructed amplitude spectrum: magnitude only, phase fixed at zero
    ReconstructedAmplitude,
}

impl RecordKind {
    /// Whether this kind stores complex ordinate values
    ///
    /// Reconstructed amplitudes are stored as complex with a zero imaginary
    /// part: the zero-phase assumption is applied once at the parse boundary
    /// so every consumer downstream sees an ordinary complex series.
    pub fn stores_complex(self) -> bool {
        matches!(self, RecordKind::Frf | RecordKind::ReconstructedAmplitude)
    }

    /// Short display name
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Frf => "FRF",
            RecordKind::Psd => "PSD",
            RecordKind::Coherence => "Coherence",
            RecordKind::ReconstructedAmplitude => "Reconstructed",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinate storage for a record: real or complex, matching the kind
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Real-valued ordinates (PSD, coherence)
    Real(Vec<f64>),
    /// Complex-valued ordinates (FRF, promoted reconstructed amplitude)
    Complex(Vec<Complex64>),
}

impl Values {
    /// Number of data points
    pub fn len(&self) -> usize {
        match self {
            Values::Real(v) => v.len(),
            Values::Complex(v) => v.len(),
        }
    }

    /// Whether the series is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-format identity of a record, carried opaquely
///
/// Node and direction codes identify the response and reference degrees of
/// freedom. Zero means "not present in the source file"; directions may be
/// negative per the file format's sign convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Function type code from the DOF identification line
    pub function_type: i32,
    /// Response DOF node number
    pub response_node: i32,
    /// Response DOF direction code
    pub response_direction: i32,
    /// Reference DOF node number
    pub reference_node: i32,
    /// Reference DOF direction code
    pub reference_direction: i32,
    /// Name of the file the record was read from
    pub source_file: Option<String>,
    /// Zero-based position of the record within its file
    pub record_index: usize,
}

impl RecordMeta {
    /// Whether any DOF identity was present in the source
    pub fn has_dof_identity(&self) -> bool {
        self.response_node != 0
            || self.response_direction != 0
            || self.reference_node != 0
            || self.reference_direction != 0
    }
}

/// One measured or reconstructed function of frequency
///
/// Invariants, enforced at construction:
/// - frequency and ordinate arrays have the same nonzero length,
/// - frequencies are finite and strictly increasing,
/// - the ordinate storage matches the kind (complex for FRF and
///   reconstructed amplitudes, real for PSD and coherence).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Strictly increasing frequency axis in Hz
    frequencies: Vec<f64>,
    /// Ordinate values, index-aligned with the frequency axis
    values: Values,
    /// Function class
    kind: RecordKind,
    /// Opaque file-format identity
    meta: RecordMeta,
}

impl Record {
    /// Build a record, validating the data-model invariants
    ///
    /// # Arguments
    /// * `frequencies` - Frequency axis in Hz, strictly increasing
    /// * `values` - Ordinate values, same length as `frequencies`
    /// * `kind` - Function class; must agree with the value storage
    /// * `meta` - File-format identity (use `RecordMeta::default()` when absent)
    pub fn new(
        frequencies: Vec<f64>,
        values: Values,
        kind: RecordKind,
        meta: RecordMeta,
    ) -> Result<Self, RecordError> {
        if frequencies.is_empty() {
            return Err(RecordError::Empty);
        }
        if frequencies.len() != values.len() {
            return Err(RecordError::LengthMismatch {
                frequencies: frequencies.len(),
                values: values.len(),
            });
        }
        for (i, &f) in frequencies.iter().enumerate() {
            if !f.is_finite() {
                return Err(RecordError::NonFiniteFrequency { index: i });
            }
            if i > 0 && f <= frequencies[i - 1] {
                return Err(RecordError::NonMonotonic { index: i });
            }
        }
        match (&values, kind.stores_complex()) {
            (Values::Real(_), true) => {
                return Err(RecordError::KindMismatch {
                    kind,
                    expected: "complex",
                })
            }
            (Values::Complex(_), false) => {
                return Err(RecordError::KindMismatch {
                    kind,
                    expected: "real",
                })
            }
            _ => {}
        }
        Ok(Self {
            frequencies,
            values,
            kind,
            meta,
        })
    }

    /// Frequency axis in Hz
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Ordinate values
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Function class
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// File-format identity
    pub fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the record is empty (never true for a validated record)
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// First and last frequency of the axis
    pub fn frequency_range(&self) -> (f64, f64) {
        (self.frequencies[0], self.frequencies[self.frequencies.len() - 1])
    }

    /// Ordinate magnitudes, |value| per point
    pub fn magnitudes(&self) -> Vec<f64> {
        match &self.values {
            Values::Real(v) => v.iter().map(|y| y.abs()).collect(),
            Values::Complex(v) => v.iter().map(|y| y.norm()).collect(),
        }
    }

    /// Ordinates as a complex series, promoting real values with zero phase
    pub fn to_complex(&self) -> Vec<Complex64> {
        match &self.values {
            Values::Real(v) => v.iter().map(|&y| Complex64::new(y, 0.0)).collect(),
            Values::Complex(v) => v.clone(),
        }
    }

    /// Attach the originating file name, consuming the record
    ///
    /// Used by the filesystem helpers, which know the name the parse
    /// functions never see.
    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.meta.source_file = Some(name.into());
        self
    }

    /// Decompose the record into its parts
    pub fn into_parts(self) -> (Vec<f64>, Values, RecordKind, RecordMeta) {
        (self.frequencies, self.values, self.kind, self.meta)
    }

    /// Display label for the record
    ///
    /// Renders the DOF identity as `Resp:<node>:<dir>/Ref:<node>:<dir>`,
    /// falling back to `Record <n>` when the source carried no DOF codes.
    pub fn label(&self) -> String {
        if self.meta.has_dof_identity() {
            format!(
                "Resp:{}:{}/Ref:{}:{}",
                self.meta.response_node,
                self.meta.response_direction,
                self.meta.reference_node,
                self.meta.reference_direction
            )
        } else {
            format!("Record {}", self.meta.record_index + 1)
        }
    }
}
