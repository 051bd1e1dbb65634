//! Client for a hosted text-generation inference endpoint.
//!
//! ## Request
//!
//! One `POST` per generation with a bearer token and a JSON body:
//!
//! ```text
//! { "inputs": "<s>[INST] … [/INST]</s>",
//!   "parameters": { "max_new_tokens": 2048, "temperature": 0.7, "top_p": 0.95,
//!                   "do_sample": true, "return_full_text": false } }
//! ```
//!
//! ## Response
//!
//! The endpoint, and proxies placed in front of it, answer in several JSON
//! shapes. [`UpstreamResponse`] names each one and [`decode_response`] maps
//! status code plus body to either raw text or a typed [`GenerationError`].
//! Decoding is a pure function so every shape is unit-tested without a
//! server.
//!
//! There is no timeout, retry or backoff here: a cold model answers with a
//! "loading" error and the caller decides whether to try again ([`GenerationError::is_retryable`]).

use super::{Generate, GeneratedText, Prompt};
use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::pipeline::postprocess;
use crate::prompts::wrap_instruction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Message for a model that is still loading.
pub const WARMING_UP_MESSAGE: &str = "Model is warming up, please try again in a few seconds";

const LOADING_MARKER: &str = "Model is loading";
/// Wording the hosted endpoint uses for a cold model.
const CURRENTLY_LOADING_MARKER: &str = "is currently loading";


/// Longest upstream error body carried into an error message.
const MAX_ERROR_DETAIL: usize = 500;

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    do_sample: bool,
    return_full_text: bool,
}

/// One element of a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedItem {
    #[serde(default)]
    pub generated_text: Option<String>,
}

/// Every response shape we accept, tried in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UpstreamResponse {
    /// `[{"generated_text": "…"}]`: the endpoint's native form.
    Batch(Vec<GeneratedItem>),
    /// `{"error": "…", "retry": true}`: proxy or endpoint error object.
    ProxyError {
        error: String,
        #[serde(default)]
        retry: bool,
        #[serde(default)]
        status: Option<u16>,
    },
    /// `{"html": "…"}`: a proxy that already post-processed the output.
    Proxy { html: String },
    /// `{"generated_text": "…"}`: single-object form.
    Single {
        #[serde(default)]
        generated_text: Option<String>,
    },
}

fn is_warming_up(body: &str) -> bool {
    if body.contains(LOADING_MARKER) || body.contains(CURRENTLY_LOADING_MARKER) {
        return true;
    }
    matches!(
        serde_json::from_str::<UpstreamResponse>(body),
        Ok(UpstreamResponse::ProxyError { retry: true, .. })
    )
}

/// Map an HTTP status and body to the generated text.
///
/// * non-2xx whose body says the model is loading, or is a proxy error
///   flagged `retry` → [`GenerationError::WarmingUp`] (retryable)
/// * any other non-2xx, a plain 503 outage included → [`GenerationError::Upstream`]
/// * 2xx with no text (`[]`, `{}`, `[{}]`) → [`GenerationError::EmptyResult`]
pub fn decode_response(status: u16, body: &str) -> Result<String, GenerationError> {
    if !(200..300).contains(&status) {
        if is_warming_up(body) {
            return Err(GenerationError::WarmingUp {
                message: WARMING_UP_MESSAGE.to_string(),
                retry: true,
            });
        }
        return Err(GenerationError::Upstream {
            status,
            details: clip(body),
        });
    }

    let parsed: UpstreamResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Upstream {
            status,
            details: format!("unreadable response body: {e}"),
        })?;

    match parsed {
        UpstreamResponse::Batch(items) => items
            .into_iter()
            .next()
            .and_then(|item| item.generated_text)
            .ok_or(GenerationError::EmptyResult),
        UpstreamResponse::Single { generated_text } => {
            generated_text.ok_or(GenerationError::EmptyResult)
        }
        UpstreamResponse::Proxy { html } => Ok(html),
        UpstreamResponse::ProxyError {
            error,
            retry,
            status: inner,
        } => {
            if retry || error.contains(LOADING_MARKER) {
                Err(GenerationError::WarmingUp {
                    message: if retry { error } else { WARMING_UP_MESSAGE.to_string() },
                    retry: true,
                })
            } else {
                Err(GenerationError::Upstream {
                    status: inner.unwrap_or(status),
                    details: clip(&error),
                })
            }
        }
    }
}

fn clip(body: &str) -> String {
    let (head, cut) = crate::pipeline::extract::truncate_chars(body.trim(), MAX_ERROR_DETAIL);
    if cut {
        format!("{head}…")
    } else {
        head.to_string()
    }
}

// ── Health ───────────────────────────────────────────────────────────────

/// Whether the client can make requests at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Health {
    Online,
    Offline { message: String },
}

// ── Client ───────────────────────────────────────────────────────────────

/// [`Generate`] backend for a hosted inference endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl InferenceClient {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("docgen-wizard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenerationError::Configuration {
                hint: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self { http, config })
    }

    /// Client configured from `HUGGINGFACE_API_KEY` / `DOCGEN_ENDPOINT`.
    pub fn from_env() -> Result<Self, GenerationError> {
        Self::new(GenerationConfig::from_env())
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Report whether a credential is configured. Makes no network call.
    pub fn health(&self) -> Health {
        if self.config.is_configured() {
            Health::Online
        } else {
            Health::Offline {
                message: "API key not configured".to_string(),
            }
        }
    }

    fn request_body<'a>(&self, inputs: &'a str) -> InferenceRequest<'a> {
        InferenceRequest {
            inputs,
            parameters: InferenceParameters {
                max_new_tokens: self.config.max_new_tokens,
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                do_sample: self.config.do_sample,
                return_full_text: self.config.return_full_text,
            },
        }
    }

    async fn send(&self, prompt: &Prompt) -> Result<GeneratedText, GenerationError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(GenerationError::Configuration {
                    hint: format!(
                        "Set {} to an inference API token.",
                        crate::config::API_KEY_ENV
                    ),
                })
            }
        };

        let inputs = wrap_instruction(prompt.instruction());
        let body = self.request_body(&inputs);
        info!(
            "Sending generation request ({} prompt chars) to {}",
            inputs.chars().count(),
            self.config.endpoint
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network {
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Network {
                reason: e.to_string(),
            })?;
        debug!("Generation endpoint answered HTTP {} ({} bytes)", status, text.len());

        let raw = decode_response(status, &text).inspect_err(|e| {
            warn!("Generation failed: {}", e);
        })?;
        let answer = postprocess::strip_echo(&raw, &self.config.echo_delimiters);
        let text = postprocess::finish(&answer, prompt.format())?;

        Ok(GeneratedText {
            text,
            format: prompt.format(),
        })
    }
}

impl Generate for InferenceClient {
    async fn generate(&self, prompt: &Prompt) -> Result<GeneratedText, GenerationError> {
        self.send(prompt).await
    }
}
