use crate::config::AnalyzerConfig;
use crate::error::{CompletionErrorKind, TenfiError};
use rig::client::CompletionClient as _;
use rig::completion::{AssistantContent, CompletionModel};
use rig::providers::{anthropic, gemini, openai};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, TenfiError>> + Send + 'a>>;

/// Text in, text out. Every call is independent; no conversation state is kept.
pub trait CompletionClient: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str, temperature: f32) -> CompletionFuture<'a>;
    fn model_name(&self) -> &str;
}

pub struct RigCompletionClient {
    config: AnalyzerConfig,
    provider: RigProvider,
}

enum RigProvider {
    OpenAI(openai::Client),
    Anthropic(anthropic::Client),
    Gemini(gemini::Client),
}

impl RigCompletionClient {
    pub fn new(config: AnalyzerConfig) -> Result<Self, TenfiError> {
        config.validate()?;
        let provider = create_provider(&config)?;
        Ok(Self { config, provider })
    }

    fn model_id(&self) -> &str {
        strip_provider_prefix(&self.config.model)
    }

    async fn make_api_request(&self, prompt: &str, temperature: f32) -> Result<String, TenfiError> {
        match &self.provider {
            RigProvider::OpenAI(client) => {
                let model = client.completion_model(self.model_id());
                self.send_completion_request(model, prompt, temperature).await
            }
            RigProvider::Anthropic(client) => {
                let model = client.completion_model(self.model_id());
                self.send_completion_request(model, prompt, temperature).await
            }
            RigProvider::Gemini(client) => {
                let model = client.completion_model(self.model_id());
                self.send_completion_request(model, prompt, temperature).await
            }
        }
    }

    async fn send_completion_request<M: CompletionModel>(
        &self,
        model: M,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, TenfiError> {
        let mut builder = model
            .completion_request(prompt)
            .preamble(self.config.preamble.clone())
            .max_tokens(self.config.max_tokens as u64);

        // Reasoning models reject an explicit temperature
        if supports_temperature(self.model_id()) {
            builder = builder.temperature(temperature as f64);
        }

        let response = builder.send().await.map_err(|e| {
            let message = e.to_string();
            TenfiError::completion(CompletionErrorKind::classify(&message), message)
        })?;

        let mut extracted_text = String::new();
        for content in response.choice.iter() {
            if let AssistantContent::Text(text_content) = content {
                extracted_text.push_str(&text_content.text);
            }
        }

        if extracted_text.trim().is_empty() {
            return Err(TenfiError::completion(
                CompletionErrorKind::Rejected,
                "provider returned no text content",
            ));
        }

        Ok(extracted_text)
    }
}

impl CompletionClient for RigCompletionClient {
    fn complete<'a>(&'a self, prompt: &'a str, temperature: f32) -> CompletionFuture<'a> {
        Box::pin(async move {
            let limit = Duration::from_secs(self.config.timeout_seconds);
            let start_time = std::time::Instant::now();

            let text = timeout(limit, self.make_api_request(prompt, temperature))
                .await
                .map_err(|_| {
                    TenfiError::completion(
                        CompletionErrorKind::Timeout,
                        format!("no response after {} seconds", limit.as_secs()),
                    )
                })??;

            debug!(
                model = %self.config.model,
                prompt_chars = prompt.len(),
                response_chars = text.len(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "completion received"
            );

            Ok(text)
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn create_provider(config: &AnalyzerConfig) -> Result<RigProvider, TenfiError> {
    let model_name = config.model.trim();

    let api_key = || {
        config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                TenfiError::completion(
                    CompletionErrorKind::Authentication,
                    format!(
                        "no API key configured for model '{}' (set {})",
                        model_name,
                        crate::config::api_key_env_var(model_name)
                    ),
                )
            })
    };

    if is_openai_model(model_name) {
        Ok(RigProvider::OpenAI(openai::Client::new(&api_key()?)))
    } else if is_claude_model(model_name) {
        Ok(RigProvider::Anthropic(anthropic::Client::new(&api_key()?)))
    } else if is_gemini_model(model_name) {
        Ok(RigProvider::Gemini(gemini::Client::new(&api_key()?)))
    } else {
        Err(TenfiError::Config(format!(
            "Unsupported model '{}'. Use Anthropic (claude-*), OpenAI (gpt-*) or Gemini (gemini-*) models",
            model_name
        )))
    }
}

/// Build the production client for `config`.
pub fn create_completion_client(
    config: &AnalyzerConfig,
) -> Result<Arc<dyn CompletionClient>, TenfiError> {
    let client = RigCompletionClient::new(config.clone())?;
    Ok(Arc::new(client))
}

fn strip_provider_prefix(model: &str) -> &str {
    let model = model.trim();
    ["openai/", "anthropic/", "gemini/"]
        .iter()
        .find_map(|prefix| model.strip_prefix(prefix))
        .unwrap_or(model)
}

fn supports_temperature(model: &str) -> bool {
    !(model.starts_with("gpt-5") || model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4"))
}

fn is_openai_model(model: &str) -> bool {
    let candidate = model.strip_prefix("openai/").unwrap_or(model);
    let candidate = candidate.strip_prefix("ft:").unwrap_or(candidate);

    candidate.starts_with("gpt-")
        || candidate.starts_with("chatgpt-")
        || candidate.starts_with("o1")
        || candidate.starts_with("o3")
        || candidate.starts_with("o4")
}

fn is_claude_model(model: &str) -> bool {
    let candidate = model.strip_prefix("anthropic/").unwrap_or(model);
    candidate.starts_with("claude-")
}

fn is_gemini_model(model: &str) -> bool {
    let candidate = model.strip_prefix("gemini/").unwrap_or(model);
    candidate.starts_with("gemini-")
}
