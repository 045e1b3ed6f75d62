//! Dataset 58 decoding into [`Record`]s
//!
//! Handles two header flavors: full testlab exports (five identification
//! lines, a DOF identification line, the data-form line, four
//! axis-characteristic lines) and the simplified headers written by
//! reconstruction tools, where the data-form line is located by scanning.
//! Payload reading is whitespace-tolerant throughout: numeric fields may be
//! packed or spread across lines in any layout.

use std::fs;
use std::path::Path;

use num_complex::Complex64;
use thiserror::Error;
use tracing::{debug, warn};

use super::block::{split_blocks, RawBlock};
use crate::record::{Record, RecordError, RecordKind, RecordMeta, Values};

/// Dataset type number for function data
pub(super) const DATASET_FUNCTION: i32 = 58;

/// Ordinate data-type codes from the data-form line
pub(super) const ORDINATE_REAL_SINGLE: i32 = 2;
const ORDINATE_REAL_DOUBLE: i32 = 4;
const ORDINATE_COMPLEX_SINGLE: i32 = 5;
const ORDINATE_COMPLEX_DOUBLE: i32 = 6;

/// Function type code identifying coherence records
const FUNCTION_COHERENCE: i32 = 6;

/// Identification lines preceding the DOF line in a full header
const ID_LINE_COUNT: usize = 5;

/// Axis-characteristic lines between the data-form line and the payload
const AXIS_LINE_COUNT: usize = 4;

/// How many lines past the expected position to search for the payload
/// in files with nonstandard headers
const PAYLOAD_SCAN_LIMIT: usize = 100;

/// Recognized block structure with an ordinate data-type code outside the
/// supported set {2, 4, 5, 6}
#[derive(Error, Debug)]
#[error("Unsupported ordinate data type code: {code}")]
pub struct UnsupportedFormatError {
    /// The unrecognized code from the data-form line
    pub code: i32,
}

/// Errors raised while decoding a record file
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unterminated dataset block opened at line {line}")]
    MissingSentinel { line: usize },
    #[error("Missing dataset type line after sentinel at line {line}")]
    MissingDatasetType { line: usize },
    #[error("Invalid dataset type at line {line}: {value:?}")]
    InvalidDatasetType { line: usize, value: String },
    #[error("No function data (dataset 58) found in file")]
    NoFunctionData,
    #[error("Expected exactly one function record, found {count}")]
    MultipleRecords { count: usize },
    #[error("Malformed header in record {record}: {reason}")]
    InvalidHeader { record: usize, reason: String },
    #[error("Invalid numeric field {value:?} in record {record}")]
    BadNumber { record: usize, value: String },
    #[error("No numeric payload found in record {record}")]
    MissingPayload { record: usize },
    #[error("Payload too short in record {record}: expected {expected} values, found {found}")]
    PayloadTooShort {
        record: usize,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite amplitude at index {index}")]
    NonFiniteAmplitude { index: usize },
    #[error(transparent)]
    Unsupported(#[from] UnsupportedFormatError),
    #[error("Invalid record data: {0}")]
    Record(#[from] RecordError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded data-form line of a dataset 58 block
#[derive(Debug, Clone, Copy)]
struct DataForm {
    /// Ordinate data-type code (real/complex, single/double precision)
    ordinate_code: i32,
    /// Declared number of data points
    num_points: usize,
    /// True for an even (min, increment) grid, false for an explicit axis
    even_spacing: bool,
    /// Abscissa minimum (even grids)
    x_min: f64,
    /// Abscissa increment, or axis maximum in simplified files (the
    /// heuristic applies only when reading reconstructed data)
    x_step: f64,
}

/// How to interpret the data-form line's fifth field on even grids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderMode {
    /// Full testlab semantics: the fifth field is always the increment
    Standard,
    /// Simplified reconstructed-file semantics: a fifth field far above the
    /// minimum is treated as the axis maximum instead of the increment
    Reconstructed,
}

/// Try to read a line as a data-form line
///
/// Accepts `<ordinate code> <point count> <spacing> [<x min> <x step> ...]`
/// with integer first fields, a positive point count and spacing 0 or 1.
/// Even grids must carry the minimum and step fields.
fn try_data_form(line: &str) -> Option<DataForm> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }
    let ordinate_code: i32 = tokens[0].parse().ok()?;
    let num_points: usize = tokens[1].parse().ok()?;
    let spacing: i32 = tokens[2].parse().ok()?;
    if num_points == 0 || (spacing != 0 && spacing != 1) {
        return None;
    }
    let (x_min, x_step) = if tokens.len() >= 5 {
        (tokens[3].parse().ok()?, tokens[4].parse().ok()?)
    } else if spacing == 1 {
        return None;
    } else {
        (0.0, 0.0)
    };
    Some(DataForm {
        ordinate_code,
        num_points,
        even_spacing: spacing == 1,
        x_min,
        x_step,
    })
}

/// Read function type and DOF identity from a DOF identification line
///
/// Field layout: function type, function id, version, load case, response
/// entity name, response node, response direction, reference entity name,
/// reference node, reference direction. Missing or non-numeric fields
/// default to zero; simplified files rarely carry a usable DOF line.
fn parse_dof_line(line: &str) -> RecordMeta {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let field = |i: usize| -> i32 {
        tokens
            .get(i)
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    };
    RecordMeta {
        function_type: field(0),
        response_node: field(5),
        response_direction: field(6),
        reference_node: field(8),
        reference_direction: field(9),
        ..Default::default()
    }
}

/// Decode one type 58 block into a Record
fn decode_block(
    block: &RawBlock,
    record_index: usize,
    mode: ReaderMode,
) -> Result<Record, ParseError> {
    let body = &block.lines;

    // Locate the data-form line. Full headers put it right after the ID and
    // DOF lines; simplified headers are found by scanning.
    let standard_position = ID_LINE_COUNT + 1;
    let (form, form_index, standard_layout) =
        match body.get(standard_position).and_then(|l| try_data_form(l)) {
            Some(form) => (form, standard_position, true),
            None => body
                .iter()
                .enumerate()
                .find_map(|(i, l)| try_data_form(l).map(|f| (f, i, false)))
                .ok_or_else(|| ParseError::InvalidHeader {
                    record: record_index,
                    reason: "no data-form line found".to_string(),
                })?,
        };

    let complex = match form.ordinate_code {
        ORDINATE_REAL_SINGLE | ORDINATE_REAL_DOUBLE => false,
        ORDINATE_COMPLEX_SINGLE | ORDINATE_COMPLEX_DOUBLE => true,
        code => return Err(UnsupportedFormatError { code }.into()),
    };

    // DOF identity sits on the line before the data-form line when present
    let mut meta = if form_index > 0 {
        parse_dof_line(&body[form_index - 1])
    } else {
        RecordMeta::default()
    };
    meta.record_index = record_index;

    // Fields per point: abscissa column on uneven grids, one or two
    // ordinate columns depending on the data type
    let ordinate_fields = if complex { 2 } else { 1 };
    let point_fields = ordinate_fields + usize::from(!form.even_spacing);
    let needed = form.num_points * point_fields;

    let data = collect_payload(
        body,
        form_index + 1 + AXIS_LINE_COUNT,
        needed,
        standard_layout,
        record_index,
    )?;

    // Rebuild the frequency axis and ordinate values
    let mut frequencies = Vec::with_capacity(form.num_points);
    let mut reals = Vec::new();
    let mut complexes = Vec::new();
    for (i, point) in data.chunks_exact(point_fields).enumerate() {
        let (freq, ordinates) = if form.even_spacing {
            (even_grid_frequency(&form, i, mode), point)
        } else {
            (point[0], &point[1..])
        };
        frequencies.push(freq);
        if complex {
            complexes.push(Complex64::new(ordinates[0], ordinates[1]));
        } else {
            reals.push(ordinates[0]);
        }
    }

    let kind = if complex {
        RecordKind::Frf
    } else if meta.function_type == FUNCTION_COHERENCE {
        RecordKind::Coherence
    } else {
        RecordKind::Psd
    };
    let values = if complex {
        Values::Complex(complexes)
    } else {
        Values::Real(reals)
    };

    let record = Record::new(frequencies, values, kind, meta)?;
    debug!(
        record = record_index,
        kind = %record.kind(),
        points = record.len(),
        standard_layout,
        "decoded function record"
    );
    Ok(record)
}

/// Frequency of the i-th point on an even grid
///
/// Reconstructed-file heuristic, kept for compatibility with simplified
/// exports: a fifth data-form field well above the minimum holds the axis
/// maximum rather than the increment, and points are spread linearly.
fn even_grid_frequency(form: &DataForm, i: usize, mode: ReaderMode) -> f64 {
    let treat_as_max = mode == ReaderMode::Reconstructed && form.x_step > form.x_min + 1.0;
    if treat_as_max && form.num_points > 1 {
        let span = form.x_step - form.x_min;
        form.x_min + i as f64 * span / (form.num_points - 1) as f64
    } else {
        form.x_min + i as f64 * form.x_step
    }
}

/// Collect `needed` whitespace-separated numeric fields from the payload
///
/// Standard layouts fail on the first non-numeric token; scanned layouts
/// skip leading non-numeric lines (bounded) and ignore stray tokens, the
/// tolerance existing readers extend to simplified files.
fn collect_payload(
    body: &[String],
    expected_start: usize,
    needed: usize,
    strict: bool,
    record_index: usize,
) -> Result<Vec<f64>, ParseError> {
    // Find the first payload line
    let mut start = expected_start;
    if !strict {
        let limit = (expected_start + PAYLOAD_SCAN_LIMIT).min(body.len());
        start = (expected_start..limit)
            .find(|&i| {
                let tokens: Vec<&str> = body[i].split_whitespace().collect();
                !tokens.is_empty() && tokens.iter().all(|t| t.parse::<f64>().is_ok())
            })
            .ok_or(ParseError::MissingPayload {
                record: record_index,
            })?;
    }

    let mut data = Vec::with_capacity(needed);
    for line in body.iter().skip(start) {
        if data.len() >= needed {
            break;
        }
        for token in line.split_whitespace() {
            if data.len() >= needed {
                break;
            }
            match token.parse::<f64>() {
                Ok(v) => data.push(v),
                Err(_) if strict => {
                    return Err(ParseError::BadNumber {
                        record: record_index,
                        value: token.to_string(),
                    })
                }
                Err(_) => debug!(token, "skipping non-numeric payload token"),
            }
        }
    }

    if data.len() < needed {
        return Err(ParseError::PayloadTooShort {
            record: record_index,
            expected: needed,
            found: data.len(),
        });
    }
    Ok(data)
}

/// Decode every function record in a multi-record file
///
/// Non-function datasets (headers, units) are skipped. Records are returned
/// in file order; an empty file or a file holding only non-function
/// datasets yields an empty vector.
pub fn parse_multi(bytes: &[u8]) -> Result<Vec<Record>, ParseError> {
    let text = String::from_utf8_lossy(bytes);
    let blocks = split_blocks(&text)?;

    let mut records = Vec::new();
    for block in &blocks {
        if block.dataset_type != DATASET_FUNCTION {
            debug!(
                dataset_type = block.dataset_type,
                line = block.start_line + 1,
                "skipping non-function dataset"
            );
            continue;
        }
        records.push(decode_block(block, records.len(), ReaderMode::Standard)?);
    }
    Ok(records)
}

/// Decode a single-record reconstructed file
///
/// Requires exactly one function dataset. The result is forced to
/// [`RecordKind::ReconstructedAmplitude`]: the real (first-column) ordinate
/// channel becomes the amplitude and the values are promoted to complex
/// with zero imaginary part, making the zero-phase reconstruction
/// assumption explicit at the boundary. Negative amplitudes pass through;
/// non-finite amplitudes are rejected.
pub fn parse_single(bytes: &[u8]) -> Result<Record, ParseError> {
    let text = String::from_utf8_lossy(bytes);
    let blocks = split_blocks(&text)?;

    let function_blocks: Vec<&RawBlock> = blocks
        .iter()
        .filter(|b| b.dataset_type == DATASET_FUNCTION)
        .collect();
    let block = match function_blocks.len() {
        0 => return Err(ParseError::NoFunctionData),
        1 => function_blocks[0],
        count => return Err(ParseError::MultipleRecords { count }),
    };

    let decoded = decode_block(block, 0, ReaderMode::Reconstructed)?;
    promote_to_amplitude(decoded)
}

/// Apply the zero-phase promotion to a freshly decoded record
fn promote_to_amplitude(record: Record) -> Result<Record, ParseError> {
    let (frequencies, values, _, meta) = record.into_parts();
    let amplitudes: Vec<f64> = match values {
        Values::Real(v) => v,
        Values::Complex(v) => v.iter().map(|z| z.re).collect(),
    };
    for (i, &a) in amplitudes.iter().enumerate() {
        if !a.is_finite() {
            return Err(ParseError::NonFiniteAmplitude { index: i });
        }
    }
    let promoted = amplitudes
        .into_iter()
        .map(|a| Complex64::new(a, 0.0))
        .collect();
    Ok(Record::new(
        frequencies,
        Values::Complex(promoted),
        RecordKind::ReconstructedAmplitude,
        meta,
    )?)
}

/// Read every function record from a testlab file on disk
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, ParseError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let name = file_name_of(path);
    let records: Vec<Record> = parse_multi(&bytes)?
        .into_iter()
        .map(|r| r.with_source_file(name.clone()))
        .collect();
    debug!(file = %name, records = records.len(), "testlab file loaded");
    Ok(records)
}

/// Read a single-record reconstructed file on disk
pub fn read_reconstructed<P: AsRef<Path>>(path: P) -> Result<Record, ParseError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    Ok(parse_single(&bytes)?.with_source_file(file_name_of(path)))
}

/// Read several reconstructed files independently, preserving input order
///
/// A failure on one file is captured in its slot and never aborts the
/// remaining files, so callers can report partial success deterministically.
pub fn read_reconstructed_batch<P: AsRef<Path>>(
    paths: &[P],
) -> Vec<(String, Result<Record, ParseError>)> {
    paths
        .iter()
        .map(|p| {
            let name = file_name_of(p.as_ref());
            let result = read_reconstructed(p);
            match &result {
                Ok(record) => debug!(file = %name, points = record.len(), "reconstructed file loaded"),
                Err(e) => warn!(file = %name, error = %e, "failed to load reconstructed file"),
            }
            (name, result)
        })
        .collect()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
