//! Linear-amplitude record export
//!
//! Serializes one [`Record`] as a single dataset 58 block using the
//! real-single ordinate code and an explicit frequency column, whatever the
//! record's original kind. Numeric fields carry 17 significant digits so a
//! written record reparses with bit-exact frequencies; phase is dropped by
//! design (exports are linear amplitude spectra).

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::reader::{DATASET_FUNCTION, ORDINATE_REAL_SINGLE};
use crate::record::Record;

/// Errors raised while exporting a record
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Non-finite value at index {index} cannot be exported")]
    NonFinite { index: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a record as a single linear-amplitude dataset
///
/// The output reparses through [`super::parse_single`] with exact
/// frequencies and magnitudes; complex records are written as |value|.
///
/// # Arguments
/// * `record` - Record to export; all values must be finite
pub fn write_single(record: &Record) -> Result<Vec<u8>, EncodeError> {
    let magnitudes = record.magnitudes();
    for (index, &m) in magnitudes.iter().enumerate() {
        if !m.is_finite() {
            return Err(EncodeError::NonFinite { index });
        }
    }

    let meta = record.meta();
    let mut out = String::new();
    out.push_str("    -1\n");
    out.push_str(&format!("{:6}\n", DATASET_FUNCTION));

    // Five identification lines: the record label, then placeholders
    out.push_str(&format!("{}\n", record.label()));
    for _ in 0..4 {
        out.push_str("NONE\n");
    }

    // DOF identification line, preserving the original identity codes
    out.push_str(&format!(
        "{:10}{:10}{:10}{:10} NONE      {:10}{:4} NONE      {:10}{:4}\n",
        meta.function_type,
        0,
        0,
        0,
        meta.response_node,
        meta.response_direction,
        meta.reference_node,
        meta.reference_direction
    ));

    // Data-form line: real single precision, explicit abscissa column
    out.push_str(&format!(
        "{:10}{:10}{:10}{:13.5e}{:13.5e}{:13.5e}\n",
        ORDINATE_REAL_SINGLE,
        record.len(),
        0,
        0.0,
        0.0,
        0.0
    ));

    // Axis-characteristic lines: frequency abscissa, amplitude ordinate
    out.push_str(&format!(
        "{:10}{:5}{:5}{:5} {:<20} {:<20}\n",
        18, 0, 0, 0, "Frequency", "Hz"
    ));
    out.push_str(&format!(
        "{:10}{:5}{:5}{:5} {:<20} {:<20}\n",
        1, 0, 0, 0, "AMPLITUDE", "NONE"
    ));
    for _ in 0..2 {
        out.push_str(&format!(
            "{:10}{:5}{:5}{:5} {:<20} {:<20}\n",
            0, 0, 0, 0, "NONE", "NONE"
        ));
    }

    // One (frequency, amplitude) pair per line, full precision
    for (f, m) in record.frequencies().iter().zip(&magnitudes) {
        out.push_str(&format!(" {:24.16e} {:24.16e}\n", f, m));
    }
    out.push_str("    -1\n");

    debug!(
        points = record.len(),
        label = %record.label(),
        "encoded linear-amplitude record"
    );
    Ok(out.into_bytes())
}

/// Write a record to disk as a single-record linear-amplitude file
pub fn write_record_file<P: AsRef<Path>>(record: &Record, path: P) -> Result<(), EncodeError> {
    let path = path.as_ref();
    let bytes = write_single(record)?;
    fs::write(path, bytes)?;
    debug!(path = %path.display(), "record exported");
    Ok(())
}

/// Conventional export file name for a record
///
/// `Linear_` plus the record label with path-hostile characters replaced,
/// matching the naming used by the desktop tooling around this format.
pub fn export_file_name(record: &Record) -> String {
    let label = record.label().replace(':', "_").replace('/', "-");
    format!("Linear_{}.unv", label.trim())
}
