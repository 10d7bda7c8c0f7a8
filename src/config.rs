//! Layered configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults ([`Config::default`]);
//! 2. a TOML file (`u-report.toml` in the working directory, or an
//!    explicit path);
//! 3. environment variables prefixed `UREPORT_`, nested with `__`
//!    (`UREPORT_LLM__MODEL=...`).
//!
//! When no API key is configured, `OPENROUTER_API_KEY` is used.
//!
//! ```toml
//! [report]
//! input = "users_data4.csv"
//! output = "users_analysis.md"
//!
//! [llm]
//! enabled = true
//! model = "mistralai/mistral-7b-instruct:free"
//! ```

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::llm::LlmConfig;
use crate::report::DEFAULT_TITLE;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "u-report.toml";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "UREPORT_";

/// Fallback variable for the LLM API key.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub report: ReportConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub generator: GeneratorConfig,
}

/// `[report]`: input and output of the analyze command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("users_data4.csv"),
            output: PathBuf::from("users_analysis.md"),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// `[database]`: source of the export command.
///
/// `url` is a `sqlite:` or `postgres:` connection URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub table: String,
    pub output: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://database/test.db".to_string(),
            table: "users".to_string(),
            output: PathBuf::from("users_data4.csv"),
        }
    }
}

/// `[generator]`: synthetic user data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub seed: u64,
    pub output: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 100,
            seed: 42,
            output: PathBuf::from("users_data4.csv"),
        }
    }
}

impl Config {
    /// Builds the provider stack without extracting it.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let file = match path {
            Some(path) if !path.exists() => {
                return Err(ReportError::Config(format!(
                    "config file '{}' not found",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        Ok(Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads the configuration and applies the API key fallback.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: Config = Self::figment(path)?.extract()?;
        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());
        }
        debug!(
            input = %config.report.input.display(),
            llm_enabled = config.llm.enabled,
            "configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_sources() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = Config::load(None).unwrap();
            assert_eq!(config.report.input, PathBuf::from("users_data4.csv"));
            assert_eq!(config.report.output, PathBuf::from("users_analysis.md"));
            assert_eq!(config.report.title, "User Data Analysis Report");
            assert_eq!(config.database.table, "users");
            assert!(!config.llm.enabled);
            assert_eq!(config.llm.api_key, None);
            Ok(())
        });
    }

    #[test]
    fn toml_file_then_env() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [report]
                input = "people.csv"
                title = "People"

                [llm]
                model = "from-file"
                "#,
            )?;
            jail.set_env("UREPORT_LLM__MODEL", "from-env");
            jail.set_env("UREPORT_GENERATOR__ROWS", "7");

            let config = Config::load(None).unwrap();
            assert_eq!(config.report.input, PathBuf::from("people.csv"));
            assert_eq!(config.report.title, "People");
            assert_eq!(config.report.output, PathBuf::from("users_analysis.md"));
            assert_eq!(config.llm.model, "from-env");
            assert_eq!(config.generator.rows, 7);
            Ok(())
        });
    }

    #[test]
    fn api_key_fallback() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env(API_KEY_VAR, "sk-fallback");
            assert_eq!(
                Config::load(None).unwrap().llm.api_key.as_deref(),
                Some("sk-fallback")
            );

            jail.set_env("UREPORT_LLM__API_KEY", "sk-explicit");
            assert_eq!(
                Config::load(None).unwrap().llm.api_key.as_deref(),
                Some("sk-explicit")
            );
            Ok(())
        });
    }

    #[test]
    fn explicit_missing_file_is_error() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let err = Config::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert!(matches!(err, ReportError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn invalid_value_is_error() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("custom.toml", "[generator]\nrows = \"many\"\n")?;
            let err = Config::load(Some(Path::new("custom.toml"))).unwrap_err();
            assert!(matches!(err, ReportError::Config(_)));
            Ok(())
        });
    }
}
