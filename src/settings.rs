//! Process configuration from environment variables (after `.env` is loaded by the binary).

use crate::generation::{
    GenerationConfig, Provider, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_GROQ_BASE_URL,
    DEFAULT_GROQ_MODEL,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_POOL_MAX: u32 = 5;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub db_pool_max: u32,
    pub log_level: String,
    pub body_limit_bytes: usize,
    pub generation: GenerationConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset; unparsable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match get("AI_PROVIDER").map(|p| p.parse::<Provider>()) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "falling back to gemini");
                Provider::Gemini
            }
            None => Provider::Gemini,
        };
        let generation = match provider {
            Provider::Gemini => GenerationConfig {
                provider,
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            },
            Provider::Groq => GenerationConfig {
                provider,
                api_key: get("GROQ_API_KEY"),
                model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.into()),
                base_url: get("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.into()),
            },
        };

        Settings {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port: get("PORT").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT),
            database_url: get("DATABASE_URL"),
            db_pool_max: get("DB_POOL_MAX")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POOL_MAX),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            body_limit_bytes: get("BODY_LIMIT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BODY_LIMIT),
            generation,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
