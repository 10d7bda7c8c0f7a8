//! CSV parser with automatic type inference.
//!
//! Parses delimited text into a [`DataFrame`](crate::dataframe::DataFrame).
//! Record splitting (quoting, escaped quotes, CRLF, blank lines) is done by
//! the `csv` crate; this module owns missing-value detection and column
//! type inference.
//!
//! # Type inference
//!
//! - A column is [`Numeric`](DataType::Numeric) when every non-missing
//!   value parses as a number. A column whose values are all missing is
//!   numeric as well.
//! - Every other column is [`Categorical`](DataType::Categorical):
//!   free text, dates written as text, `true`/`false`, and so on.
//! - A header without data rows yields categorical columns of length 0.
//! - In a numeric column, values that parse to NaN or an infinity
//!   (`Nan`, `+inf`, `Infinity`, ...) are stored as missing.
//!
//! # Example
//!
//! ```
//! use u_report::csv_parser::CsvParser;
//! use u_report::dataframe::DataType;
//!
//! let csv = "name,salary,created_at\nAlice,1500,2024-01-03\nBob,2300,2024-02-11\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! assert_eq!(df.row_count(), 2);
//! assert_eq!(df.column(0).unwrap().data_type(), DataType::Categorical);
//! assert_eq!(df.column(1).unwrap().data_type(), DataType::Numeric);
//! assert_eq!(df.column(2).unwrap().data_type(), DataType::Categorical);
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, Trim};
use tracing::debug;

use crate::dataframe::{Column, DataFrame, DataType, ValidityBitmap};
use crate::error::{ReportError, Result};

/// Missing-value markers recognized by default.
///
/// Mirrors the marker set common CSV readers treat as "not available".
const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// CSV parser configuration and entry point.
///
/// ```
/// use u_report::csv_parser::CsvParser;
///
/// let df = CsvParser::new().delimiter(b';').parse_str("a;b\n1;2\n").unwrap();
/// assert_eq!(df.column_names(), &["a", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    null_markers: Vec<String>,
}

impl CsvParser {
    /// Creates a parser with comma delimiter and the default null markers.
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            null_markers: DEFAULT_NULL_MARKERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Sets the field delimiter (default: comma).
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Sets custom null markers (replaces defaults).
    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Parses a file from disk.
    ///
    /// A missing file is [`ReportError::DataUnavailable`]; content that is
    /// not valid UTF-8 or not rectangular is [`ReportError::DataMalformed`].
    pub fn parse_file(&self, path: &Path) -> Result<DataFrame> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ReportError::DataUnavailable {
                path: path.to_path_buf(),
            },
            _ => ReportError::io(path, e),
        })?;

        let content = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            ReportError::DataMalformed {
                line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
                message: format!("invalid UTF-8: {}", e.utf8_error()),
            }
        })?;

        debug!(path = %path.display(), bytes = content.len(), "read input file");
        self.parse_str(&content)
    }

    /// Parses CSV text into a DataFrame.
    pub fn parse_str(&self, input: &str) -> Result<DataFrame> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        self.parse_reader(input.as_bytes())
    }

    /// Parses CSV from any reader.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<DataFrame> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(malformed)?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
            return Err(ReportError::DataMalformed {
                line: 1,
                message: "no columns to parse from input".to_string(),
            });
        }

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(malformed)?;
            for (col_idx, field) in record.iter().enumerate() {
                raw_columns[col_idx].push(field.to_string());
            }
        }

        let mut df = DataFrame::new();
        for (name, raw_col) in headers.into_iter().zip(raw_columns.iter()) {
            let column = self.build_column(raw_col);
            debug!(
                column = %name,
                data_type = %column.data_type(),
                nulls = column.null_count(),
                "inferred column"
            );
            df.add_column(name, column)?;
        }
        Ok(df)
    }

    // ── Internal ─────────────────────────────────────────────────

    fn is_null(&self, value: &str) -> bool {
        self.null_markers.iter().any(|m| m == value)
    }

    /// Infers the column type and builds a typed Column.
    fn build_column(&self, raw_values: &[String]) -> Column {
        let null_flags: Vec<bool> = raw_values.iter().map(|s| self.is_null(s)).collect();

        match infer_type(raw_values, &null_flags) {
            DataType::Numeric => build_numeric_column(raw_values, &null_flags),
            DataType::Categorical => build_categorical_column(raw_values, &null_flags),
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helper functions ──────────────────────────────────────────────────

fn malformed(err: csv::Error) -> ReportError {
    let line = err
        .position()
        .map_or(0, |pos| usize::try_from(pos.line()).unwrap_or(usize::MAX));
    let message = match err.kind() {
        ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, got {len}"),
        ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {err}"),
        _ => err.to_string(),
    };
    ReportError::DataMalformed { line, message }
}

fn infer_type(values: &[String], null_flags: &[bool]) -> DataType {
    if values.is_empty() {
        return DataType::Categorical;
    }
    let all_numeric = values
        .iter()
        .zip(null_flags)
        .filter(|(_, &is_null)| !is_null)
        .all(|(v, _)| v.parse::<f64>().is_ok());
    if all_numeric {
        DataType::Numeric
    } else {
        DataType::Categorical
    }
}

fn build_numeric_column(values: &[String], null_flags: &[bool]) -> Column {
    let mut nums = Vec::with_capacity(values.len());
    let mut validity = ValidityBitmap::empty();

    for (val, &is_null) in values.iter().zip(null_flags) {
        match val.parse::<f64>() {
            Ok(v) if !is_null && v.is_finite() => {
                nums.push(v);
                validity.push(true);
            }
            _ => {
                nums.push(0.0);
                validity.push(false);
            }
        }
    }

    Column::numeric(nums, validity)
}

fn build_categorical_column(values: &[String], null_flags: &[bool]) -> Column {
    let mut dict_map: HashMap<&str, u32> = HashMap::new();
    let mut dictionary: Vec<String> = Vec::new();
    let mut indices = Vec::with_capacity(values.len());
    let mut validity = ValidityBitmap::empty();

    for (val, &is_null) in values.iter().zip(null_flags) {
        if is_null {
            indices.push(0);
            validity.push(false);
            continue;
        }
        let idx = *dict_map.entry(val.as_str()).or_insert_with(|| {
            dictionary.push(val.clone());
            (dictionary.len() - 1) as u32
        });
        indices.push(idx);
        validity.push(true);
    }

    Column::categorical(dictionary, indices, validity)
}

// ── Tests ─────────────────────────────────────────────────────────────
