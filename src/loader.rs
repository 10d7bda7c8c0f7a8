//! Loading and missing-value repair.
//!
//! [`load_data`] reads a CSV file and applies the missing-value policy:
//!
//! - **numeric column**: missing entries are replaced by the median of
//!   the column's own non-missing values;
//! - **categorical column**: every row with a missing entry in that
//!   column is dropped from the whole table.
//!
//! Columns are cleaned one at a time in header order, and each step sees
//! the table left behind by the previous one. Dropping rows for one
//! categorical column therefore changes both the medians and the drops
//! computed for the columns after it. This cascade is surprising but
//! reports depend on it, so it is kept as is.
//!
//! ```
//! use u_report::csv_parser::CsvParser;
//! use u_report::loader::clean_missing_values;
//!
//! let raw = CsvParser::new()
//!     .parse_str("c1,c2\na,x\n,y\nc,\n")
//!     .unwrap();
//! let clean = clean_missing_values(raw);
//! // Row 2 goes with c1, row 3 goes with c2.
//! assert_eq!(clean.row_count(), 1);
//! ```

use std::path::Path;

use tracing::{error, info};

use crate::csv_parser::CsvParser;
use crate::dataframe::{Column, DataFrame};
use crate::error::{ReportError, Result};

/// Loads `path` and repairs missing values.
///
/// Failures are logged and reported as `None`; they never propagate.
/// Use [`try_load_data`] to get the typed error instead.
pub fn load_data(path: &Path) -> Option<DataFrame> {
    match try_load_data(path) {
        Ok(df) => Some(df),
        Err(ReportError::DataUnavailable { path }) => {
            error!(path = %path.display(), "input file not found");
            None
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to load data");
            None
        }
    }
}

/// Loads `path` and repairs missing values, returning the typed error on failure.
pub fn try_load_data(path: &Path) -> Result<DataFrame> {
    let raw = CsvParser::new().parse_file(path)?;
    let (raw_rows, raw_nulls) = (raw.row_count(), raw.total_null_count());
    let df = clean_missing_values(raw);
    info!(
        path = %path.display(),
        rows = df.row_count(),
        columns = df.column_count(),
        dropped_rows = raw_rows - df.row_count(),
        missing_values = raw_nulls,
        "loaded data"
    );
    Ok(df)
}

/// Applies the missing-value policy column by column, in column order.
pub fn clean_missing_values(mut df: DataFrame) -> DataFrame {
    for index in 0..df.column_count() {
        let Some(column) = df.column(index) else {
            continue;
        };
        if !column.validity().has_nulls() {
            continue;
        }

        match column {
            Column::Numeric { .. } => {
                let valid = column.valid_numeric_values().unwrap_or_default();
                let Some(median) = u_numflow::stats::median(&valid) else {
                    // Nothing to take a median of; the column stays missing.
                    continue;
                };
                df.fill_missing(index, median);
            }
            Column::Categorical { validity, .. } => {
                let keep: Vec<bool> = (0..validity.len()).map(|i| validity.is_valid(i)).collect();
                df.retain_rows(&keep);
            }
        }
    }
    df
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::DataType;

    fn frame(columns: Vec<(&str, Column)>) -> DataFrame {
        let mut df = DataFrame::new();
        for (name, col) in columns {
            df.add_column(name.to_string(), col).unwrap();
        }
        df
    }

    #[test]
    fn numeric_missing_filled_with_median() {
        let df = frame(vec![(
            "n",
            Column::from_options(vec![Some(1.0), None, Some(3.0)]),
        )]);
        let clean = clean_missing_values(df);
        let n = clean.column(0).unwrap();
        assert_eq!(n.as_numeric().unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(n.null_count(), 0);
    }

    #[test]
    fn categorical_drops_cascade_in_column_order() {
        let df = frame(vec![
            ("c1", Column::from_strings(vec![Some("a"), None, Some("c")])),
            ("c2", Column::from_strings(vec![Some("x"), Some("y"), None])),
        ]);
        let clean = clean_missing_values(df);
        assert_eq!(clean.row_count(), 1);
        assert_eq!(clean.column(0).unwrap().category_at(0), Some("a"));
        assert_eq!(clean.column(1).unwrap().category_at(0), Some("x"));
    }

    #[test]
    fn median_uses_rows_surviving_earlier_drops() {
        // The drop on `city` happens before `salary` is filled, so the
        // median comes from rows 1 and 4 only: (100 + 300) / 2.
        let df = frame(vec![
            (
                "city",
                Column::from_strings(vec![Some("A"), None, Some("B"), Some("C")]),
            ),
            (
                "salary",
                Column::from_options(vec![Some(100.0), Some(10_000.0), None, Some(300.0)]),
            ),
        ]);
        let clean = clean_missing_values(df);
        assert_eq!(clean.row_count(), 3);
        assert_eq!(
            clean.column(1).unwrap().as_numeric().unwrap(),
            &[100.0, 200.0, 300.0]
        );
    }

    #[test]
    fn numeric_fill_before_later_drop_keeps_earlier_median() {
        // `salary` is filled first, using all three rows.
        let df = frame(vec![
            (
                "salary",
                Column::from_options(vec![Some(1.0), None, Some(5.0), Some(9.0)]),
            ),
            (
                "city",
                Column::from_strings(vec![Some("A"), Some("B"), Some("C"), None]),
            ),
        ]);
        let clean = clean_missing_values(df);
        assert_eq!(clean.row_count(), 3);
        assert_eq!(
            clean.column(0).unwrap().as_numeric().unwrap(),
            &[1.0, 5.0, 5.0]
        );
    }

    #[test]
    fn all_missing_numeric_left_untouched() {
        let df = frame(vec![
            ("empty", Column::from_options(vec![None, None])),
            ("name", Column::from_strings(vec![Some("a"), Some("b")])),
        ]);
        let clean = clean_missing_values(df);
        assert_eq!(clean.row_count(), 2);
        assert_eq!(clean.column(0).unwrap().null_count(), 2);
        assert_eq!(clean.column(0).unwrap().data_type(), DataType::Numeric);
    }

    #[test]
    fn non_finite_tokens_are_filled_like_missing() {
        let raw = CsvParser::new()
            .parse_str("x,y\n1,a\n,b\nNan,c\n3,d\n")
            .unwrap();
        let clean = clean_missing_values(raw);
        let x = clean.column(0).unwrap();
        assert_eq!(x.null_count(), 0);
        assert_eq!(x.as_numeric().unwrap(), &[1.0, 2.0, 2.0, 3.0]);

        let raw = CsvParser::new().parse_str("x\n1\ninf\n3\n").unwrap();
        let summary = crate::analysis::numerical_analysis(
            clean_missing_values(raw).column(0).unwrap(),
        )
        .unwrap();
        assert_eq!(summary.max, Some(3.0));
        assert_eq!(summary.range, Some(2.0));
        assert_eq!(summary.mean, Some(2.0));
    }

    #[test]
    fn load_data_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_data(&dir.path().join("users_data4.csv")).is_none());
    }

    #[test]
    fn load_data_malformed_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "a,b\n1,2,3\n").unwrap();
        assert!(load_data(&path).is_none());
        assert!(matches!(
            try_load_data(&path),
            Err(ReportError::DataMalformed { .. })
        ));
    }

    #[test]
    fn load_data_cleans_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        std::fs::write(
            &path,
            "id,occupation,salary\n1,Nurse,1000\n2,,2000\n3,Pilot,\n4,Nurse,3000\n",
        )
        .unwrap();
        let df = load_data(&path).expect("loads");
        assert_eq!(df.row_count(), 3);
        // Row 2 was dropped before salary was filled: median of 1000 and 3000.
        assert_eq!(
            df.column_by_name("salary").unwrap().as_numeric().unwrap(),
            &[1000.0, 2000.0, 3000.0]
        );
    }
}
