//! Markdown rendering of a [`DatasetAnalysis`].
//!
//! [`render_markdown`] is pure; [`write_report`] writes its output to
//! disk, overwriting any existing file. The same analysis always renders
//! to the same bytes.
//!
//! ```
//! use u_report::analysis::analyze_dataframe;
//! use u_report::csv_parser::CsvParser;
//! use u_report::report::{render_markdown, ReportOptions};
//!
//! let df = CsvParser::new().parse_str("city\nBrno\nBrno\nNitra\n").unwrap();
//! let md = render_markdown(&analyze_dataframe(&df), &ReportOptions::default(), None);
//! assert!(md.contains("- **Total Records:** 3\n"));
//! assert!(md.contains("| Brno | 2 | 66.67% |\n"));
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::analysis::{DatasetAnalysis, FrequencyEntry, NumericSummary};
use crate::error::{ReportError, Result};

/// Default report heading.
pub const DEFAULT_TITLE: &str = "User Data Analysis Report";

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Top-level heading of the document.
    pub title: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Renders the report as a Markdown string.
///
/// `narrative`, when present, is appended as an "AI Analysis" section.
pub fn render_markdown(
    analysis: &DatasetAnalysis,
    options: &ReportOptions,
    narrative: Option<&str>,
) -> String {
    let mut out = String::new();

    let _ = write!(out, "# {}\n\n", options.title);

    out.push_str("## Data Overview\n\n");
    let _ = writeln!(out, "- **Total Records:** {}", analysis.row_count);
    let _ = write!(out, "- **Total Columns:** {}\n\n", analysis.column_count);

    out.push_str("## Numerical Columns Statistics\n\n");
    for (name, summary) in &analysis.numeric {
        let _ = write!(out, "### {}\n\n", escape_cell(name));
        match summary {
            Some(summary) => render_numeric_table(&mut out, summary),
            None => out.push_str("_No non-missing values._\n"),
        }
        out.push('\n');
    }

    out.push_str("## Categorical Columns Analysis\n\n");
    for (name, top) in &analysis.categorical {
        let _ = write!(out, "### {}\n\n", escape_cell(name));
        render_frequency_table(&mut out, top);
        out.push('\n');
    }

    if let Some(text) = narrative {
        out.push_str("## AI Analysis\n\n");
        out.push_str(text.trim_end());
        out.push_str("\n\n");
    }

    out
}

/// Renders the report and writes it to `path` as UTF-8.
///
/// The file is created or truncated. A missing parent directory is an
/// error; nothing is retried.
pub fn write_report(
    path: &Path,
    analysis: &DatasetAnalysis,
    options: &ReportOptions,
    narrative: Option<&str>,
) -> Result<()> {
    let markdown = render_markdown(analysis, options, narrative);

    let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(markdown.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| ReportError::io(path, e))?;

    info!(path = %path.display(), bytes = markdown.len(), "report written");
    Ok(())
}

/// Writes `analysis` to `path` as pretty-printed JSON.
pub fn write_json(path: &Path, analysis: &DatasetAnalysis) -> Result<()> {
    let json = serde_json::to_string_pretty(analysis)?;
    std::fs::write(path, json + "\n").map_err(|e| ReportError::io(path, e))?;
    info!(path = %path.display(), "statistics written as JSON");
    Ok(())
}

fn render_numeric_table(out: &mut String, summary: &NumericSummary) {
    out.push_str("| Statistic | Value |\n|-----------|-------|\n");
    for (label, value) in summary.entries() {
        let _ = writeln!(out, "| {label} | {} |", format_value(value));
    }
}

fn render_frequency_table(out: &mut String, top: &[FrequencyEntry]) {
    out.push_str("| Value | Count | Percentage |\n|-------|-------|------------|\n");
    for entry in top {
        let _ = writeln!(
            out,
            "| {} | {} | {:.2}% |",
            escape_cell(&entry.value),
            entry.count,
            entry.percentage
        );
    }
}

/// Two decimals for finite values, `N/A` otherwise.
fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

/// Keeps a value inside one Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_dataframe;
    use crate::csv_parser::CsvParser;
    use crate::loader::clean_missing_values;

    fn analysis_of(csv: &str) -> DatasetAnalysis {
        let df = clean_missing_values(CsvParser::new().parse_str(csv).unwrap());
        analyze_dataframe(&df)
    }

    #[test]
    fn full_layout() {
        let analysis = analysis_of("grade,score\nA,1\nA,2\nA,3\nB,4\nB,5\n");
        let md = render_markdown(&analysis, &ReportOptions::default(), None);

        let expected_head = "# User Data Analysis Report\n\n\
            ## Data Overview\n\n\
            - **Total Records:** 5\n\
            - **Total Columns:** 2\n\n\
            ## Numerical Columns Statistics\n\n\
            ### score\n\n\
            | Statistic | Value |\n\
            |-----------|-------|\n\
            | Mean | 3.00 |\n\
            | Median | 3.00 |\n\
            | Mode | 1.00 |\n";
        assert!(md.starts_with(expected_head), "got:\n{md}");

        let expected_tail = "## Categorical Columns Analysis\n\n\
            ### grade\n\n\
            | Value | Count | Percentage |\n\
            |-------|-------|------------|\n\
            | A | 3 | 60.00% |\n\
            | B | 2 | 40.00% |\n\n";
        assert!(md.ends_with(expected_tail), "got:\n{md}");
    }

    #[test]
    fn unavailable_statistics_render_as_na() {
        let analysis = analysis_of("x\n7\n");
        let md = render_markdown(&analysis, &ReportOptions::default(), None);
        assert!(md.contains("| Variance | N/A |\n"));
        assert!(md.contains("| Standard Deviation | N/A |\n"));
        assert!(md.contains("| Range | 0.00 |\n"));
    }

    #[test]
    fn column_without_data_gets_a_note() {
        let analysis = analysis_of("empty,name\n,a\n,b\n");
        let md = render_markdown(&analysis, &ReportOptions::default(), None);
        assert!(md.contains("### empty\n\n_No non-missing values._\n\n"));
        assert!(!md.contains("| Mean |"));
    }

    #[test]
    fn custom_title_and_narrative() {
        let analysis = analysis_of("x\n1\n");
        let options = ReportOptions {
            title: "Salaries".into(),
        };
        let md = render_markdown(&analysis, &options, Some("Salaries look stable.\n\n"));
        assert!(md.starts_with("# Salaries\n\n"));
        assert!(md.ends_with("## AI Analysis\n\nSalaries look stable.\n\n"));
    }

    #[test]
    fn pipes_in_values_are_escaped() {
        let analysis = analysis_of("note\na|b\na|b\n");
        let md = render_markdown(&analysis, &ReportOptions::default(), None);
        assert!(md.contains("| a\\|b | 2 | 100.00% |\n"));
    }

    #[test]
    fn format_value_cases() {
        assert_eq!(format_value(Some(2.0)), "2.00");
        assert_eq!(format_value(Some(1234.5678)), "1234.57");
        assert_eq!(format_value(Some(f64::INFINITY)), "inf");
        assert_eq!(format_value(None), "N/A");
    }

    #[test]
    fn write_report_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, "stale content that is longer than nothing").unwrap();

        let analysis = analysis_of("x\n1\n2\n");
        write_report(&path, &analysis, &ReportOptions::default(), None).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            render_markdown(&analysis, &ReportOptions::default(), None)
        );
        assert!(!written.contains("stale"));
    }

    #[test]
    fn json_mirrors_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let analysis = analysis_of("grade,score\nA,1\nA,2\nB,\n");
        write_json(&path, &analysis).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["row_count"], 3);
        assert_eq!(json["column_names"], serde_json::json!(["grade", "score"]));
        assert_eq!(json["numeric"][0][0], "score");
        assert_eq!(json["numeric"][0][1]["median"], 1.5);
        assert_eq!(json["numeric"][0][1]["count"], 3);
        assert_eq!(json["categorical"][0][1][0]["value"], "A");
        assert_eq!(json["categorical"][0][1][0]["percentage"], 66.67);
    }

    #[test]
    fn write_report_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("report.md");
        let analysis = analysis_of("x\n1\n");
        let err = write_report(&path, &analysis, &ReportOptions::default(), None).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        assert!(!path.exists());
    }
}
