//! Optional AI narrative for the report.
//!
//! [`narrate`] turns a [`DatasetAnalysis`] into a prompt, sends it to a
//! [`NarrativeClient`] and returns the reply. Any failure is logged and
//! replaced by [`PLACEHOLDER`], so the report can always be written.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::analysis::DatasetAnalysis;
use crate::error::{ReportError, Result};

/// Text used in place of the narrative when generation fails.
pub const PLACEHOLDER: &str = "AI analysis could not be generated.";

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a data analyst. Summarize datasets clearly and concisely for a business audience.";

/// Chat-completion settings, the `[llm]` configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether `analyze` asks for a narrative at all.
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "mistralai/mistral-7b-instruct:free".to_string(),
            api_key: None,
            max_tokens: Some(1024),
            temperature: Some(0.7),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// A text generation backend.
#[async_trait]
pub trait NarrativeClient: Send + Sync {
    /// Sends one system/user exchange and returns the reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    fn system_prompt(&self) -> &str {
        DEFAULT_SYSTEM_PROMPT
    }
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
/// (OpenRouter, local servers, ...).
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiCompatClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ReportError::Llm("missing API key".to_string()))
    }

    fn endpoint(&self) -> String {
        if self.config.base_url.ends_with('/') {
            format!("{}chat/completions", self.config.base_url)
        } else {
            format!("{}/chat/completions", self.config.base_url)
        }
    }
}

#[async_trait]
impl NarrativeClient for OpenAiCompatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self.api_key()?;

        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Llm(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ReportError::Llm(format!("API error ({status}): {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ReportError::Llm(format!("failed to parse JSON: {e}")))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ReportError::Llm("invalid response format".to_string()))
    }

    fn system_prompt(&self) -> &str {
        &self.config.system_prompt
    }
}

/// Builds the user prompt describing `analysis`.
pub fn build_prompt(analysis: &DatasetAnalysis) -> String {
    let mut prompt = String::from(
        "Analyze the following user data. Give an overview, the key trends \
         and patterns, and recommendations for next steps.\n\n",
    );

    let _ = writeln!(prompt, "Total records: {}", analysis.row_count);
    let _ = writeln!(prompt, "Total columns: {}", analysis.column_count);
    let _ = writeln!(prompt, "Columns: {}", analysis.column_names.join(", "));

    if !analysis.numeric.is_empty() {
        prompt.push_str("\nNumeric columns:\n");
        for (name, summary) in &analysis.numeric {
            match summary {
                Some(s) => {
                    let _ = writeln!(
                        prompt,
                        "- {name}: mean {}, median {}, std dev {}, min {}, max {}",
                        fmt_stat(s.mean),
                        fmt_stat(s.median),
                        fmt_stat(s.std_dev),
                        fmt_stat(s.min),
                        fmt_stat(s.max),
                    );
                }
                None => {
                    let _ = writeln!(prompt, "- {name}: no data");
                }
            }
        }
    }

    if !analysis.categorical.is_empty() {
        prompt.push_str("\nCategorical columns (top values):\n");
        for (name, top) in &analysis.categorical {
            let values: Vec<String> = top
                .iter()
                .map(|e| format!("{} ({}, {:.2}%)", e.value, e.count, e.percentage))
                .collect();
            let _ = writeln!(prompt, "- {name}: {}", values.join(", "));
        }
    }

    prompt
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

/// Asks `client` for a narrative of `analysis`.
///
/// Never fails: errors are logged and [`PLACEHOLDER`] is returned.
pub async fn narrate<C>(client: &C, analysis: &DatasetAnalysis) -> String
where
    C: NarrativeClient + ?Sized,
{
    let prompt = build_prompt(analysis);
    match client.complete(client.system_prompt(), &prompt).await {
        Ok(text) => {
            info!(chars = text.len(), "AI narrative generated");
            text
        }
        Err(err) => {
            warn!(error = %err, "AI narrative failed, using placeholder");
            PLACEHOLDER.to_string()
        }
    }
}
