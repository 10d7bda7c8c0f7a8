//! Per-column statistics.
//!
//! Numeric columns get an eleven-value summary ([`NumericSummary`]);
//! every other column gets its top-5 value frequencies
//! ([`FrequencyEntry`]). The dispatch depends only on the column's
//! inferred [`DataType`].
//!
//! # Conventions
//!
//! - Standard deviation and variance are sample statistics (n − 1).
//! - Percentiles interpolate linearly between closest ranks (R-7).
//! - The mode is the smallest of the most frequent values.
//! - Frequency ties keep the order in which values first appear.
//! - Percentages are relative to the table's total row count and rounded
//!   half-to-even at 2 decimals.
//!
//! ```
//! use u_report::csv_parser::CsvParser;
//! use u_report::analysis::analyze_dataframe;
//!
//! let df = CsvParser::new()
//!     .parse_str("grade,score\nA,90\nA,85\nA,70\nB,60\nB,75\n")
//!     .unwrap();
//! let analysis = analyze_dataframe(&df);
//!
//! let (_, grades) = &analysis.categorical[0];
//! assert_eq!(grades[0].value, "A");
//! assert_eq!(grades[0].percentage, 60.0);
//!
//! let (_, score) = &analysis.numeric[0];
//! assert_eq!(score.as_ref().unwrap().max, Some(90.0));
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::dataframe::{Column, DataFrame, DataType};

/// Number of values kept in a categorical frequency table.
pub const TOP_VALUES: usize = 5;

// ── Numeric ───────────────────────────────────────────────────────────

/// Summary statistics for a numeric column with at least one value.
///
/// A field is `None` when the statistic is not defined for the data
/// (for example the variance of a single value).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    /// Number of non-missing values the summary was computed from.
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub mode: Option<f64>,
    pub std_dev: Option<f64>,
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// `max - min`.
    pub range: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
}

impl NumericSummary {
    /// Returns the statistics as labelled entries, in report order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 11] {
        [
            ("Mean", self.mean),
            ("Median", self.median),
            ("Mode", self.mode),
            ("Standard Deviation", self.std_dev),
            ("Variance", self.variance),
            ("Min", self.min),
            ("Max", self.max),
            ("Range", self.range),
            ("25th Percentile", self.p25),
            ("50th Percentile", self.p50),
            ("75th Percentile", self.p75),
        ]
    }
}

/// Computes summary statistics over the non-missing values of `column`.
///
/// Returns `None` when there is nothing to summarise: the column has no
/// non-missing values, or it is not numeric.
///
/// ```
/// use u_report::dataframe::Column;
/// use u_report::analysis::numerical_analysis;
///
/// let col = Column::from_options(vec![Some(4.0), None, Some(2.0), Some(4.0)]);
/// let summary = numerical_analysis(&col).unwrap();
/// assert_eq!(summary.count, 3);
/// assert_eq!(summary.mode, Some(4.0));
/// assert_eq!(summary.range, Some(2.0));
///
/// assert!(numerical_analysis(&Column::from_options(vec![None])).is_none());
/// ```
pub fn numerical_analysis(column: &Column) -> Option<NumericSummary> {
    let valid = column.valid_numeric_values()?;
    if valid.is_empty() {
        return None;
    }

    let min = u_numflow::stats::min(&valid);
    let max = u_numflow::stats::max(&valid);
    let median = u_numflow::stats::median(&valid);

    Some(NumericSummary {
        count: valid.len(),
        mean: u_numflow::stats::mean(&valid),
        median,
        mode: mode(&valid),
        std_dev: u_numflow::stats::std_dev(&valid),
        variance: u_numflow::stats::variance(&valid),
        min,
        max,
        range: min.zip(max).map(|(lo, hi)| hi - lo),
        p25: u_numflow::stats::quantile(&valid, 0.25),
        p50: u_numflow::stats::quantile(&valid, 0.5),
        p75: u_numflow::stats::quantile(&valid, 0.75),
    })
}

/// Most frequent value; ties resolve to the smallest value.
fn mode(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut best: Option<(f64, usize)> = None;
    let mut start = 0;
    while start < sorted.len() {
        let value = sorted[start];
        let run = sorted[start..]
            .iter()
            .take_while(|v| v.total_cmp(&value).is_eq())
            .count();
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((value, run));
        }
        start += run;
    }
    best.map(|(value, _)| value)
}

// ── Categorical ───────────────────────────────────────────────────────

/// One row of a categorical frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
    /// Share of the table's total rows, in percent, rounded to 2 decimals.
    pub percentage: f64,
}

/// Counts the distinct values of `column` and returns the five most
/// frequent, with percentages relative to `total_row_count`.
///
/// Numeric columns have no categories and yield an empty table.
///
/// ```
/// use u_report::dataframe::Column;
/// use u_report::analysis::categorical_analysis;
///
/// let col = Column::from_strings(vec![Some("A"), Some("A"), Some("A"), Some("B"), Some("B")]);
/// let top = categorical_analysis(&col, 5);
/// assert_eq!(top[0].count, 3);
/// assert_eq!(top[0].percentage, 60.0);
/// ```
pub fn categorical_analysis(column: &Column, total_row_count: usize) -> Vec<FrequencyEntry> {
    let Column::Categorical {
        dictionary,
        indices,
        validity,
    } = column
    else {
        return Vec::new();
    };

    // dictionary index -> (count, first row seen)
    let mut freq: HashMap<u32, (usize, usize)> = HashMap::new();
    for row in validity.valid_indices() {
        freq.entry(indices[row]).or_insert((0, row)).0 += 1;
    }

    let mut ranked: Vec<(u32, usize, usize)> = freq
        .into_iter()
        .map(|(idx, (count, first))| (idx, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(TOP_VALUES)
        .map(|(idx, count, _)| FrequencyEntry {
            value: dictionary.get(idx as usize).cloned().unwrap_or_default(),
            count,
            percentage: percentage_of(count, total_row_count),
        })
        .collect()
}

fn percentage_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 / total as f64 * 100.0;
    (pct * 100.0).round_ties_even() / 100.0
}

// ── Dataset ───────────────────────────────────────────────────────────

/// Statistics for a single column, by column type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnStatistics {
    /// `None` when the column has no non-missing values.
    Numeric(Option<NumericSummary>),
    Categorical(Vec<FrequencyEntry>),
}

/// Dispatches a column to the analysis matching its type.
pub fn analyze_column(column: &Column, total_row_count: usize) -> ColumnStatistics {
    match column.data_type() {
        DataType::Numeric => ColumnStatistics::Numeric(numerical_analysis(column)),
        DataType::Categorical => {
            ColumnStatistics::Categorical(categorical_analysis(column, total_row_count))
        }
    }
}

/// Statistics for a whole table.
///
/// Every column of the source table appears in exactly one of
/// `numeric` or `categorical`, in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetAnalysis {
    pub row_count: usize,
    pub column_count: usize,
    pub column_names: Vec<String>,
    pub numeric: Vec<(String, Option<NumericSummary>)>,
    pub categorical: Vec<(String, Vec<FrequencyEntry>)>,
}

/// Analyzes every column of `df`.
pub fn analyze_dataframe(df: &DataFrame) -> DatasetAnalysis {
    let total = df.row_count();
    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for (name, column) in df.iter() {
        match analyze_column(column, total) {
            ColumnStatistics::Numeric(summary) => numeric.push((name.to_string(), summary)),
            ColumnStatistics::Categorical(top) => categorical.push((name.to_string(), top)),
        }
    }

    DatasetAnalysis {
        row_count: total,
        column_count: df.column_count(),
        column_names: df.column_names().to_vec(),
        numeric,
        categorical,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
