use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";

/// Which model backend serves scoring and charter calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Local inference server speaking the Ollama chat API.
    Ollama,
    /// Hosted OpenAI-compatible chat completions API.
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderKind,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Only required when `provider` is `OpenAi`. Absence disables scoring.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub score_timeout: Duration,
    pub charter_timeout: Duration,
    pub projects_path: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("LLM_PROVIDER").as_deref().map(str::trim) {
            None => ProviderKind::Ollama,
            Some(p) if p.eq_ignore_ascii_case("ollama") => ProviderKind::Ollama,
            Some(p) if p.eq_ignore_ascii_case("openai") => ProviderKind::OpenAi,
            Some(other) => bail!("LLM_PROVIDER must be 'ollama' or 'openai', got '{other}'"),
        };

        Ok(Config {
            provider,
            ollama_url: var("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            score_timeout: parse_secs(var("SCORE_TIMEOUT_SECS"), 60, "SCORE_TIMEOUT_SECS")?,
            charter_timeout: parse_secs(var("CHARTER_TIMEOUT_SECS"), 120, "CHARTER_TIMEOUT_SECS")?,
            projects_path: var("PROJECTS_PATH").unwrap_or_else(|| "projects.csv".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .trim()
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Model identifier of the selected provider.
    pub fn model(&self) -> &str {
        match self.provider {
            ProviderKind::Ollama => &self.ollama_model,
            ProviderKind::OpenAi => &self.openai_model,
        }
    }
}

fn parse_secs(value: Option<String>, default: u64, key: &str) -> Result<Duration> {
    let secs = match value {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
