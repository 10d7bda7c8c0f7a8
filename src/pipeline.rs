//! Load, clean and analyze in one call.

use std::path::Path;

use tracing::info;

use crate::analysis::{analyze_dataframe, DatasetAnalysis};
use crate::loader::load_data;

/// Runs the loader and the analyzer on `path`.
///
/// Returns `None` when the file is missing or malformed; the cause has
/// already been logged by the loader.
///
/// ```
/// use u_report::pipeline::analyze_file;
///
/// let dir = tempfile::tempdir().unwrap();
/// assert!(analyze_file(&dir.path().join("missing.csv")).is_none());
/// ```
pub fn analyze_file(path: &Path) -> Option<DatasetAnalysis> {
    let df = load_data(path)?;
    let analysis = analyze_dataframe(&df);
    info!(
        numeric_columns = analysis.numeric.len(),
        categorical_columns = analysis.categorical.len(),
        "analysis complete"
    );
    Some(analysis)
}
