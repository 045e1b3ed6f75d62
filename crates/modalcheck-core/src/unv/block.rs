//! Sentinel-delimited dataset scanning
//!
//! Splits a file into raw dataset blocks without interpreting their
//! contents. Each block is the text between an opening `-1` marker (plus the
//! dataset type line that follows it) and the closing `-1` marker.

use tracing::trace;

use super::reader::ParseError;

/// Marker line that opens and closes every dataset
const SENTINEL: &str = "-1";

/// One dataset as found in the file, before decoding
#[derive(Debug, Clone)]
pub struct RawBlock {
    /// Dataset type number from the line after the opening sentinel
    pub dataset_type: i32,
    /// Body lines between the type line and the closing sentinel
    pub lines: Vec<String>,
    /// Zero-based line number of the dataset type line, for error context
    pub start_line: usize,
}

/// Split file text into raw dataset blocks
///
/// Content outside sentinel pairs is ignored, matching the tolerant
/// behavior of existing readers for this format. An opening sentinel that is
/// not followed by a type line and a closing sentinel is an error.
pub fn split_blocks(text: &str) -> Result<Vec<RawBlock>, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].trim() != SENTINEL {
            // Preamble or trailing content outside any dataset
            i += 1;
            continue;
        }

        // Opening sentinel found; the next line carries the dataset type
        let type_line = i + 1;
        let raw_type = match lines.get(type_line) {
            Some(l) => l.trim(),
            None => return Err(ParseError::MissingDatasetType { line: i + 1 }),
        };
        let dataset_type: i32 =
            raw_type
                .parse()
                .map_err(|_| ParseError::InvalidDatasetType {
                    line: type_line + 1,
                    value: raw_type.to_string(),
                })?;

        // Collect body lines up to the closing sentinel
        let mut body = Vec::new();
        let mut j = type_line + 1;
        loop {
            match lines.get(j) {
                Some(l) if l.trim() == SENTINEL => break,
                Some(l) => {
                    body.push(l.trim_end().to_string());
                    j += 1;
                }
                None => return Err(ParseError::MissingSentinel { line: i + 1 }),
            }
        }

        trace!(
            dataset_type,
            start_line = type_line + 1,
            body_lines = body.len(),
            "scanned dataset block"
        );
        blocks.push(RawBlock {
            dataset_type,
            lines: body,
            start_line: type_line,
        });
        i = j + 1;
    }

    Ok(blocks)
}
