//! Column-major table for loaded CSV data.
//!
//! The [`DataFrame`] stores named columns of one of two types, each with
//! a validity bitmap marking missing values.
//!
//! | Type | Storage | Analysis |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | summary statistics |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` + bitmap | top-5 frequencies |
//!
//! # Example
//!
//! ```
//! use u_report::dataframe::{DataFrame, Column, ValidityBitmap};
//!
//! let mut df = DataFrame::new();
//! df.add_column(
//!     "salary".to_string(),
//!     Column::numeric(vec![1200.0, 2300.0, 980.0], ValidityBitmap::all_valid(3)),
//! ).unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.column_count(), 1);
//! ```

use crate::error::ReportError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// Bit-packed validity bitmap using `Vec<u64>`.
///
/// Each bit indicates whether the corresponding row is valid (1) or
/// missing (0).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap where all `len` positions are valid.
    pub fn all_valid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        let mut bits = vec![u64::MAX; n_words];
        let trailing = len % 64;
        if trailing != 0 && n_words > 0 {
            bits[n_words - 1] = (1u64 << trailing) - 1;
        }
        Self { bits, len }
    }

    /// Creates an empty bitmap with no rows.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            len: 0,
        }
    }

    /// Builds a bitmap from per-row validity flags.
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let mut bitmap = Self::empty();
        for valid in flags {
            bitmap.push(valid);
        }
        bitmap
    }

    /// Returns `true` if the value at `idx` is valid (not missing).
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        let (word, bit) = (idx / 64, idx % 64);
        (self.bits[word] >> bit) & 1 == 1
    }

    /// Appends a new position (valid or invalid).
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        let (word, bit) = (idx / 64, idx % 64);
        if word >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.bits[word] |= 1u64 << bit;
        }
    }

    /// Returns the total number of tracked positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitmap tracks zero positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts the number of missing positions.
    pub fn null_count(&self) -> usize {
        let valid_count: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - valid_count
    }

    /// Counts the number of valid positions.
    pub fn valid_count(&self) -> usize {
        self.len - self.null_count()
    }

    /// Returns `true` if any position is missing.
    pub fn has_nulls(&self) -> bool {
        self.null_count() > 0
    }

    /// Returns an iterator over indices of valid positions.
    pub fn valid_indices(&self) -> ValidIndicesIter<'_> {
        ValidIndicesIter {
            bitmap: self,
            current: 0,
        }
    }
}

/// Iterator over valid indices in a [`ValidityBitmap`].
pub struct ValidIndicesIter<'a> {
    bitmap: &'a ValidityBitmap,
    current: usize,
}

impl Iterator for ValidIndicesIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current < self.bitmap.len {
            let idx = self.current;
            self.current += 1;
            if self.bitmap.is_valid(idx) {
                return Some(idx);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.bitmap.len - self.current))
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Storage type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Integer or floating-point values (stored as `f64`).
    Numeric,
    /// Any other text, including dates and booleans written as text.
    Categorical,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "Numeric"),
            Self::Categorical => write!(f, "Categorical"),
        }
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column with validity bitmap for missing values.
///
/// Invalid positions hold a placeholder (0.0 or dictionary index 0)
/// that must be ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dense `f64` values. Missing positions hold `0.0`.
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded text column.
    ///
    /// `dictionary` holds distinct strings in first-seen order of the
    /// parsed file; `indices` maps each row to a dictionary entry.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(values: Vec<f64>, validity: ValidityBitmap) -> Self {
        Self::Numeric { values, validity }
    }

    /// Creates a categorical column from a dictionary and indices.
    pub fn categorical(
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    ) -> Self {
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Builds a categorical column from optional strings (`None` = missing).
    ///
    /// ```
    /// use u_report::dataframe::Column;
    ///
    /// let col = Column::from_strings(vec![Some("a"), None, Some("a")]);
    /// assert_eq!(col.null_count(), 1);
    /// assert_eq!(col.category_at(2), Some("a"));
    /// ```
    pub fn from_strings<S: AsRef<str>>(values: Vec<Option<S>>) -> Self {
        let mut dictionary: Vec<String> = Vec::new();
        let mut lookup: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
        let mut indices = Vec::with_capacity(values.len());
        let mut validity = ValidityBitmap::empty();

        for value in &values {
            match value {
                Some(s) => {
                    let s = s.as_ref();
                    let idx = match lookup.get(s) {
                        Some(&existing) => existing,
                        None => {
                            let idx = dictionary.len() as u32;
                            dictionary.push(s.to_string());
                            lookup.insert(s.to_string(), idx);
                            idx
                        }
                    };
                    indices.push(idx);
                    validity.push(true);
                }
                None => {
                    indices.push(0);
                    validity.push(false);
                }
            }
        }

        Self::categorical(dictionary, indices, validity)
    }

    /// Builds a numeric column from optional values (`None` = missing).
    pub fn from_options(values: Vec<Option<f64>>) -> Self {
        let validity = ValidityBitmap::from_flags(values.iter().map(Option::is_some));
        let values = values.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        Self::numeric(values, validity)
    }

    /// Returns the data type of this column.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Categorical { .. } => DataType::Categorical,
        }
    }

    /// Returns the number of rows in this column.
    pub fn len(&self) -> usize {
        self.validity().len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the validity bitmap.
    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. } | Self::Categorical { validity, .. } => validity,
        }
    }

    /// Returns the number of missing values.
    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    /// Returns the number of valid values.
    pub fn valid_count(&self) -> usize {
        self.validity().valid_count()
    }

    /// Returns `true` if the value at `idx` is valid.
    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity().is_valid(idx)
    }

    /// Returns the raw numeric values, or `None` if not a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric { values, .. } => Some(values),
            Self::Categorical { .. } => None,
        }
    }

    /// Returns valid numeric values (missing excluded), in row order.
    pub fn valid_numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            Self::Numeric { values, validity } => {
                Some(validity.valid_indices().map(|i| values[i]).collect())
            }
            Self::Categorical { .. } => None,
        }
    }

    /// Returns the category string at `idx`, or `None` if missing or not categorical.
    pub fn category_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } => {
                if validity.is_valid(idx) {
                    dictionary.get(indices[idx] as usize).map(String::as_str)
                } else {
                    None
                }
            }
            Self::Numeric { .. } => None,
        }
    }

    /// Returns a numeric column with every missing position set to `fill`.
    ///
    /// Categorical columns are returned unchanged.
    pub fn fill_missing(&self, fill: f64) -> Column {
        match self {
            Self::Numeric { values, validity } => {
                let filled = values
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| if validity.is_valid(i) { v } else { fill })
                    .collect();
                Column::numeric(filled, ValidityBitmap::all_valid(values.len()))
            }
            Self::Categorical { .. } => self.clone(),
        }
    }

    /// Returns a new column holding only the rows where `keep[i]` is `true`.
    pub fn filter(&self, keep: &[bool]) -> Column {
        debug_assert_eq!(keep.len(), self.len());
        let kept = || keep.iter().enumerate().filter(|(_, &k)| k).map(|(i, _)| i);
        match self {
            Self::Numeric { values, validity } => Column::numeric(
                kept().map(|i| values[i]).collect(),
                ValidityBitmap::from_flags(kept().map(|i| validity.is_valid(i))),
            ),
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } => Column::categorical(
                dictionary.clone(),
                kept().map(|i| indices[i]).collect(),
                ValidityBitmap::from_flags(kept().map(|i| validity.is_valid(i))),
            ),
        }
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Column-major tabular data structure.
///
/// All columns have the same number of rows. Column order is the order
/// of the source file's header.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Creates an empty DataFrame with no columns or rows.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Adds a named column to the DataFrame.
    ///
    /// Returns an error if the column length doesn't match the existing
    /// row count (unless this is the first column).
    pub fn add_column(&mut self, name: String, column: Column) -> Result<(), ReportError> {
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(ReportError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Sets every missing entry of the numeric column at `index` to `fill`.
    pub fn fill_missing(&mut self, index: usize, fill: f64) {
        if let Some(slot) = self.columns.get_mut(index) {
            *slot = slot.fill_missing(fill);
        }
    }

    /// Keeps only the rows where `keep[i]` is `true`, across every column.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        self.columns = self.columns.iter().map(|c| c.filter(keep)).collect();
        self.row_count = keep.iter().filter(|&&k| k).count();
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the DataFrame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns column names.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns a reference to the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns a reference to the column with the given `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Returns an iterator over (name, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Returns the inferred type of each column.
    pub fn schema(&self) -> Vec<(&str, DataType)> {
        self.iter().map(|(name, col)| (name, col.data_type())).collect()
    }

    /// Returns the total number of missing values across all columns.
    pub fn total_null_count(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── ValidityBitmap tests ──────────────────────────────────────

    #[test]
    fn bitmap_all_valid() {
        let bm = ValidityBitmap::all_valid(100);
        assert_eq!(bm.len(), 100);
        assert_eq!(bm.null_count(), 0);
        assert!((0..100).all(|i| bm.is_valid(i)));
    }

    #[test]
    fn bitmap_boundary_64() {
        let bm = ValidityBitmap::all_valid(64);
        assert_eq!(bm.bits.len(), 1);
        assert_eq!(bm.null_count(), 0);

        let bm65 = ValidityBitmap::all_valid(65);
        assert_eq!(bm65.bits.len(), 2);
        assert!(bm65.is_valid(64));
    }

    #[test]
    fn bitmap_from_flags_across_words() {
        let bm = ValidityBitmap::from_flags((0..130).map(|i| i % 4 != 0));
        assert_eq!(bm.len(), 130);
        assert_eq!(bm.null_count(), (0..130).filter(|i| i % 4 == 0).count());
        assert!(bm.has_nulls());
    }

    #[test]
    fn bitmap_valid_indices_skip_missing() {
        let bm = ValidityBitmap::from_flags([true, false, true, false, true]);
        let indices: Vec<usize> = bm.valid_indices().collect();
        assert_eq!(indices, vec![0, 2, 4]);
        assert_eq!(bm.valid_count(), 3);
    }

    // ── Column tests ─────────────────────────────────────────────

    #[test]
    fn numeric_column_with_nulls() {
        let col = Column::from_options(vec![Some(1.0), None, Some(3.0), None]);
        assert_eq!(col.data_type(), DataType::Numeric);
        assert_eq!(col.null_count(), 2);
        assert_eq!(col.valid_numeric_values().unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn fill_missing_marks_all_valid() {
        let col = Column::from_options(vec![Some(1.0), None, Some(3.0)]);
        let filled = col.fill_missing(2.0);
        assert_eq!(filled.as_numeric().unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(filled.null_count(), 0);
    }

    #[test]
    fn categorical_from_strings() {
        let col = Column::from_strings(vec![Some("low"), Some("high"), None, Some("low")]);
        assert_eq!(col.data_type(), DataType::Categorical);
        assert_eq!(col.category_at(0), Some("low"));
        assert_eq!(col.category_at(1), Some("high"));
        assert_eq!(col.category_at(2), None);
        assert_eq!(col.category_at(3), Some("low"));
        match &col {
            Column::Categorical { dictionary, .. } => assert_eq!(dictionary.len(), 2),
            Column::Numeric { .. } => unreachable!(),
        }
    }

    #[test]
    fn filter_keeps_validity() {
        let col = Column::from_strings(vec![Some("a"), None, Some("c")]);
        let kept = col.filter(&[false, true, true]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.category_at(0), None);
        assert_eq!(kept.category_at(1), Some("c"));
    }

    // ── DataFrame tests ──────────────────────────────────────────

    #[test]
    fn empty_dataframe() {
        let df = DataFrame::new();
        assert_eq!(df.row_count(), 0);
        assert_eq!(df.column_count(), 0);
        assert!(df.is_empty());
    }

    #[test]
    fn column_length_mismatch() {
        let mut df = DataFrame::new();
        df.add_column("x".into(), Column::from_options(vec![Some(1.0), Some(2.0)]))
            .unwrap();
        let result = df.add_column("y".into(), Column::from_options(vec![Some(1.0)]));
        assert!(matches!(
            result,
            Err(ReportError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn retain_rows_applies_to_all_columns() {
        let mut df = DataFrame::new();
        df.add_column(
            "n".into(),
            Column::from_options(vec![Some(1.0), Some(2.0), Some(3.0)]),
        )
        .unwrap();
        df.add_column(
            "s".into(),
            Column::from_strings(vec![Some("a"), Some("b"), Some("c")]),
        )
        .unwrap();

        df.retain_rows(&[true, false, true]);
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.column(0).unwrap().as_numeric().unwrap(), &[1.0, 3.0]);
        assert_eq!(df.column(1).unwrap().category_at(1), Some("c"));
    }

    #[test]
    fn fill_missing_in_place() {
        let mut df = DataFrame::new();
        df.add_column("n".into(), Column::from_options(vec![Some(1.0), None]))
            .unwrap();
        assert_eq!(df.total_null_count(), 1);
        df.fill_missing(0, 5.0);
        assert_eq!(df.total_null_count(), 0);
        assert_eq!(df.column(0).unwrap().as_numeric().unwrap(), &[1.0, 5.0]);
    }

    #[test]
    fn schema_and_lookup() {
        let mut df = DataFrame::new();
        df.add_column("salary".into(), Column::from_options(vec![Some(900.0)]))
            .unwrap();
        df.add_column("city".into(), Column::from_strings(vec![Some("Brno")]))
            .unwrap();

        assert_eq!(
            df.schema(),
            vec![("salary", DataType::Numeric), ("city", DataType::Categorical)]
        );
        assert!(df.column_by_name("city").is_some());
        assert!(df.column_by_name("missing").is_none());
        assert_eq!(df.column_names(), &["salary", "city"]);
    }
}
