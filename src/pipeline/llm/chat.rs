//! Chat-completion backend over `edgequake-llm` providers.
//!
//! Used by default for summaries, and for document generation when the
//! caller prefers OpenAI, Anthropic, Gemini, Ollama, etc. over the hosted
//! inference endpoint. The prompt's instruction is sent as a single user
//! message; chat APIs never echo the prompt, so only the format clean-up
//! from [`crate::pipeline::postprocess::finish`] applies.

use super::{Generate, GeneratedText, Prompt};
use crate::error::GenerationError;
use crate::pipeline::postprocess;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Model used when a provider is named without one.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-nano";

/// [`Generate`] backend wrapping any `edgequake-llm` chat provider.
#[derive(Clone)]
pub struct ChatClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ChatClient {
    /// Wrap a pre-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = n.max(1);
        self
    }

    /// Resolve a provider, from most-specific to least-specific:
    ///
    /// 1. **Named provider + model**: `provider_name` (and `model`, else
    ///    [`DEFAULT_CHAT_MODEL`]) via [`ProviderFactory::create_llm_provider`],
    ///    which reads the matching API key from the environment.
    /// 2. **Environment pair**: `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`
    ///    when both are set.
    /// 3. **Auto-detection**: [`ProviderFactory::from_env`].
    pub fn resolve(provider_name: Option<&str>, model: Option<&str>) -> Result<Self, GenerationError> {
        if let Some(name) = provider_name {
            let model = model.unwrap_or(DEFAULT_CHAT_MODEL);
            return create_provider(name, model).map(Self::new);
        }

        if let (Ok(prov), Ok(model)) = (
            std::env::var("EDGEQUAKE_LLM_PROVIDER"),
            std::env::var("EDGEQUAKE_MODEL"),
        ) {
            if !prov.is_empty() && !model.is_empty() {
                return create_provider(&prov, &model).map(Self::new);
            }
        }

        let (llm_provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| GenerationError::Configuration {
                hint: format!(
                    "No chat provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                    Error: {e}"
                ),
            })?;
        Ok(Self::new(llm_provider))
    }
}

/// Build `CompletionOptions` from the client's sampling settings.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, GenerationError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| GenerationError::Configuration {
        hint: format!("Chat provider '{name}' is not configured: {e}"),
    })
}

impl Generate for ChatClient {
    async fn generate(&self, prompt: &Prompt) -> Result<GeneratedText, GenerationError> {
        let messages = vec![ChatMessage::user(prompt.instruction())];
        let options = build_options(self.temperature, self.max_tokens);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| GenerationError::Upstream {
                status: 0,
                details: e.to_string(),
            })?;
        debug!(
            "Chat completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        let text = postprocess::finish(&response.content, prompt.format())?;
        Ok(GeneratedText {
            text,
            format: prompt.format(),
        })
    }
}
