use crate::error::TenfiError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_MAX_REWRITES: usize = 5;

const DEFAULT_PREAMBLE: &str = "You are a careful tenant rights advocate. \
You explain leases in plain English, you never invent clauses that are not in the text, \
and you follow the requested output format exactly.";

/// Everything needed to build a completion client and an orchestrator.
///
/// Nothing in the library reads the process environment; `from_env` exists for the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub preamble: String,
    pub max_rewrites: usize,
    pub rights_excerpt_chars: usize,
    pub metadata_excerpt_chars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            preamble: DEFAULT_PREAMBLE.to_string(),
            max_rewrites: DEFAULT_MAX_REWRITES,
            rights_excerpt_chars: 4000,
            metadata_excerpt_chars: 8000,
        }
    }
}

impl AnalyzerConfig {
    pub fn new<S: Into<String>>(model: S) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Load `.env`, then pick up `TENFI_MODEL`, `TENFI_TIMEOUT` and the provider key.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(model) = std::env::var("TENFI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }

        if let Ok(timeout_str) = std::env::var("TENFI_TIMEOUT") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                if (10..=300).contains(&timeout) {
                    config.timeout_seconds = timeout;
                }
            }
        }

        config.with_api_key_from_env()
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Re-read the provider key for the current model, e.g. after the model was overridden.
    pub fn with_api_key_from_env(self) -> Self {
        self.with_api_key_from(|var| std::env::var(var).ok())
    }

    /// Replace the key with the one `lookup` returns for the current model's variable.
    ///
    /// A key resolved for an earlier model is always dropped, even when the new lookup misses.
    pub fn with_api_key_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key = lookup(api_key_env_var(&self.model)).filter(|key| !key.trim().is_empty());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_max_rewrites(mut self, max_rewrites: usize) -> Self {
        self.max_rewrites = max_rewrites;
        self
    }

    pub fn validate(&self) -> Result<(), TenfiError> {
        if self.model.trim().is_empty() {
            return Err(TenfiError::Config("Model name cannot be empty".to_string()));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(TenfiError::Config(
                "Temperature must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(10..=300).contains(&self.timeout_seconds) {
            return Err(TenfiError::Config(
                "Timeout must be between 10 and 300 seconds".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(TenfiError::Config("max_tokens must be greater than 0".to_string()));
        }

        Ok(())
    }

    pub fn describe(&self) -> String {
        format!(
            "Model: {}, Temperature: {}, Timeout: {}s, Max rewrites: {}",
            self.model, self.temperature, self.timeout_seconds, self.max_rewrites
        )
    }
}

/// Environment variable holding the key for the provider that serves `model`.
pub fn api_key_env_var(model: &str) -> &'static str {
    let candidate = model.trim();
    if candidate.starts_with("gemini") {
        "GEMINI_API_KEY"
    } else if candidate.starts_with("gpt-")
        || candidate.starts_with("openai/")
        || candidate.starts_with("chatgpt-")
        || candidate.starts_with("o1")
        || candidate.starts_with("o3")
        || candidate.starts_with("o4")
    {
        "OPENAI_API_KEY"
    } else {
        "ANTHROPIC_API_KEY"
    }
}
