//! Routine generation: forwards a prompt to the configured generative-AI provider and
//! returns its text. One attempt per request, no retry.

use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Groq,
}

impl Provider {
    /// Environment variable holding the provider's key.
    pub fn key_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
        })
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "groq" => Ok(Provider::Groq),
            other => Err(format!("unknown AI provider: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Prompt is required")]
    MissingPrompt,
    #[error("{} is not configured", .0.key_var())]
    MissingCredential(Provider),
    #[error("provider returned {status}")]
    Upstream { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GenerationError {
    pub fn status(&self) -> StatusCode {
        match self {
            GenerationError::MissingPrompt => StatusCode::BAD_REQUEST,
            GenerationError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GenerationError::MissingCredential(_)
            | GenerationError::Malformed(_)
            | GenerationError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            GenerationError::MissingPrompt => Some("MISSING_PROMPT"),
            GenerationError::MissingCredential(_) => Some("MISSING_API_KEY"),
            _ => None,
        }
    }

    /// Message shown to the caller; upstream detail goes to `details`.
    pub fn public_message(&self) -> String {
        match self {
            GenerationError::MissingPrompt | GenerationError::MissingCredential(_) => self.to_string(),
            GenerationError::Upstream { .. } => "Failed to generate routine".into(),
            GenerationError::Malformed(_) | GenerationError::Transport(_) => {
                "Internal server error: failed to generate routine".into()
            }
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            GenerationError::Upstream { body, .. } => Some(body.clone()),
            GenerationError::Malformed(m) => Some(m.clone()),
            GenerationError::Transport(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct RoutineGenerator {
    config: GenerationConfig,
    client: Client,
}

impl RoutineGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: GenerationConfig, client: Client) -> Self {
        RoutineGenerator { config, client }
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    /// Generate text for `prompt`. A blank prompt is rejected before any credential check.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::MissingPrompt);
        }
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GenerationError::MissingCredential(self.config.provider))?;
        tracing::debug!(provider = %self.config.provider, model = %self.config.model, "generating routine");
        match self.config.provider {
            Provider::Gemini => self.gemini(key, prompt).await,
            Provider::Groq => self.groq(key, prompt).await,
        }
    }

    async fn gemini(&self, key: &str, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };
        let response = self
            .client
            .post(url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await?;
        let body: Value = Self::json_body(response).await?;
        body.pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GenerationError::Malformed("no text in candidates[0].content.parts[0]".into()))
    }

    async fn groq(&self, key: &str, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/openai/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response = self.client.post(url).bearer_auth(key).json(&request).send().await?;
        let body: ChatResponse = serde_json::from_value(Self::json_body(response).await?)
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::Malformed("no content in choices[0].message".into()))
    }

    /// Non-2xx responses become `Upstream` carrying the raw body.
    async fn json_body(response: reqwest::Response) -> Result<Value, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}
