//! u-report CLI
//!
//! Analyze a CSV file into a Markdown report, and prepare its input.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use u_report::config::Config;
use u_report::llm::{narrate, OpenAiCompatClient};
use u_report::pipeline::analyze_file;
use u_report::report::{write_json, write_report, ReportOptions};
use u_report::{export, generator, scrape};

/// u-report - CSV statistics and Markdown reports
#[derive(Parser)]
#[command(name = "u-report")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ./u-report.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Defaults to `analyze` with the configured input and output
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, clean and analyze a CSV file, then write the report
    Analyze {
        /// Input CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output Markdown file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report title
        #[arg(short, long)]
        title: Option<String>,
        /// Append an AI-generated narrative
        #[arg(long)]
        ai: bool,
        /// Also write the statistics as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Generate synthetic user data
    Generate {
        /// Number of rows
        #[arg(short = 'n', long)]
        rows: Option<usize>,
        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a SQLite or PostgreSQL table to CSV
    Export {
        /// Database URL, e.g. sqlite://database/test.db or postgres://user@host/db
        #[arg(long)]
        database_url: Option<String>,
        /// Table to export
        #[arg(short, long)]
        table: Option<String>,
        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the title of a web page
    Title {
        /// Page URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let command = cli.command.unwrap_or(Commands::Analyze {
        input: None,
        output: None,
        title: None,
        ai: false,
        json: None,
    });

    match command {
        Commands::Analyze {
            input,
            output,
            title,
            ai,
            json,
        } => {
            let input = input.unwrap_or(config.report.input.clone());
            let output = output.unwrap_or(config.report.output.clone());
            let options = ReportOptions {
                title: title.unwrap_or(config.report.title.clone()),
            };
            let with_ai = ai || config.llm.enabled;
            cmd_analyze(&input, &output, json.as_deref(), &options, with_ai, config).await
        }
        Commands::Generate { rows, seed, output } => {
            let rows = rows.unwrap_or(config.generator.rows);
            let seed = seed.unwrap_or(config.generator.seed);
            let output = output.unwrap_or(config.generator.output);
            generator::write_users_csv(&output, rows, seed)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Generated {rows} rows of user data in {}", output.display());
            Ok(())
        }
        Commands::Export {
            database_url,
            table,
            output,
        } => {
            let url = database_url.unwrap_or(config.database.url);
            let table = table.unwrap_or(config.database.table);
            let output = output.unwrap_or(config.database.output);
            let count = export::export_table(&url, &table, &output)
                .await
                .with_context(|| format!("failed to export table '{table}'"))?;
            println!("Exported {count} rows from '{table}' to {}", output.display());
            Ok(())
        }
        Commands::Title { url } => {
            let title = scrape::fetch_title(&url)
                .await
                .with_context(|| format!("failed to fetch {url}"))?;
            println!("Website: {url}");
            println!("Title: {title}");
            Ok(())
        }
    }
}

async fn cmd_analyze(
    input: &Path,
    output: &Path,
    json: Option<&Path>,
    options: &ReportOptions,
    with_ai: bool,
    config: Config,
) -> anyhow::Result<()> {
    let Some(analysis) = analyze_file(input) else {
        bail!("no report written: could not load {}", input.display());
    };

    let narrative = if with_ai {
        let client = OpenAiCompatClient::new(config.llm);
        Some(narrate(&client, &analysis).await)
    } else {
        None
    };

    write_report(output, &analysis, options, narrative.as_deref())
        .with_context(|| format!("failed to write report to {}", output.display()))?;
    if let Some(json) = json {
        write_json(json, &analysis)
            .with_context(|| format!("failed to write statistics to {}", json.display()))?;
    }

    info!(output = %output.display(), "analysis complete");
    println!("Analysis complete. Report saved to {}", output.display());
    Ok(())
}
