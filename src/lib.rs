//! # u-report
//!
//! Data-quality-aware statistics and Markdown reports for CSV files.
//!
//! A run has three stages:
//!
//! - **Load**: parse the file, infer column types, repair missing values
//! - **Analyze**: numeric summaries or categorical frequencies per column
//! - **Report**: render everything as one Markdown document
//!
//! ## Modules
//!
//! - [`dataframe`]: Column-major tabular data model (DataFrame, Column, DataType)
//! - [`csv_parser`]: CSV parsing with automatic type inference
//! - [`loader`]: File loading and the missing-value policy (median fill, row drop)
//! - [`analysis`]: Numeric summaries (mean, median, mode, spread, quartiles), top-5 frequencies
//! - [`report`]: Markdown rendering and report output
//! - [`pipeline`]: Load + clean + analyze in one call
//! - [`llm`]: Optional AI narrative via an OpenAI-compatible chat endpoint
//! - [`export`]: SQLite or PostgreSQL table to CSV export
//! - [`generator`]: Seeded synthetic user data
//! - [`scrape`]: Web page title lookup
//! - [`config`]: Layered configuration (defaults, TOML, environment)
//! - [`error`]: Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_report::analysis::analyze_dataframe;
//! use u_report::csv_parser::CsvParser;
//! use u_report::loader::clean_missing_values;
//! use u_report::report::{render_markdown, ReportOptions};
//!
//! let csv = "occupation,salary\nNurse,1200\nPilot,\nNurse,2400\n";
//! let df = clean_missing_values(CsvParser::new().parse_str(csv).unwrap());
//!
//! // The missing salary is filled with the median of the others.
//! let salary = df.column_by_name("salary").unwrap();
//! assert_eq!(salary.as_numeric().unwrap(), &[1200.0, 1800.0, 2400.0]);
//!
//! let report = render_markdown(&analyze_dataframe(&df), &ReportOptions::default(), None);
//! assert!(report.starts_with("# User Data Analysis Report\n"));
//! assert!(report.contains("| Nurse | 2 | 66.67% |"));
//! ```

pub mod analysis;
pub mod config;
pub mod csv_parser;
pub mod dataframe;
pub mod error;
pub mod export;
pub mod generator;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod scrape;
