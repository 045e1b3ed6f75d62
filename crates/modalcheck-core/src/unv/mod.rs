//! Universal File Format dataset 58 codec
//!
//! Reads and writes the sentinel-delimited record files produced by modal
//! test suites. A file is a sequence of datasets, each wrapped in a pair of
//! `-1` marker lines with the dataset type number on the line after the
//! opening marker. Function data lives in type 58 datasets; header (151) and
//! units (164) datasets are skipped on read.
//!
//! Reading handles both full-header testlab exports and the simplified
//! single-record files produced by reconstruction tools. Writing always
//! emits a single type 58 dataset with the real-single linear-amplitude
//! ordinate code and an explicit frequency column, so exported records
//! survive a round trip through [`parse_single`] with exact frequencies.

mod block;
pub mod reader;
pub mod writer;

pub use reader::{
    parse_multi, parse_single, read_reconstructed, read_reconstructed_batch, read_records,
    ParseError, UnsupportedFormatError,
};
pub use writer::{export_file_name, write_record_file, write_single, EncodeError};
