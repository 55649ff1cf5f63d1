use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
/// Read once at start-up; every component receives the values it needs explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Opaque credential passed through unmodified. Only required by commands that call the LLM.
    openai_api_key: Option<String>,
    pub llm: LlmSettings,
    pub index_dir: PathBuf,
    pub index_retention: usize,
    pub limits: AnalysisLimits,
    pub rust_log: String,
}

/// Endpoint and model selection for the completion/embedding provider.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    /// Upper bound for any single LLM or embedding call.
    pub call_timeout: Duration,
}

/// Truncation limits applied to resume text before it is sent anywhere.
/// Counted in characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisLimits {
    /// Prefix used as context when scoring without a similarity index.
    pub direct_context_chars: usize,
    /// Prefix used as grounding context for weakness narratives.
    pub weakness_context_chars: usize,
    /// Prefix of the resume that is chunked and embedded for the skill index.
    pub index_source_chars: usize,
}

impl Default for AnalysisLimits {
    fn default() -> Self {
        Self {
            direct_context_chars: 2000,
            weakness_context_chars: 3000,
            index_source_chars: 5000,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = LlmSettings::default();
        let default_limits = AnalysisLimits::default();

        Ok(Config {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            llm: LlmSettings {
                api_base: env_or("LLM_API_BASE", &defaults.api_base),
                chat_model: env_or("LLM_MODEL", &defaults.chat_model),
                embedding_model: env_or("EMBEDDING_MODEL", &defaults.embedding_model),
                call_timeout: Duration::from_secs(parse_env("LLM_CALL_TIMEOUT_SECS", 60u64)?),
            },
            index_dir: PathBuf::from(env_or("INDEX_DIR", "resume_indexes")),
            index_retention: parse_env("INDEX_RETENTION", 3usize)?,
            limits: AnalysisLimits {
                direct_context_chars: parse_env(
                    "DIRECT_CONTEXT_CHARS",
                    default_limits.direct_context_chars,
                )?,
                weakness_context_chars: parse_env(
                    "WEAKNESS_CONTEXT_CHARS",
                    default_limits.weakness_context_chars,
                )?,
                index_source_chars: parse_env(
                    "INDEX_SOURCE_CHARS",
                    default_limits.index_source_chars,
                )?,
            },
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Returns the API credential, or a configuration error if none was provided.
    pub fn api_key(&self) -> Result<&str, AppError> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            AppError::Configuration(
                "OpenAI API key not found. Set the OPENAI_API_KEY environment variable".to_string(),
            )
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    parse_setting(key, std::env::var(key).ok().as_deref(), default)
}

/// Parses a numeric setting; `None` (unset) falls back to `default`.
fn parse_setting<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> Result<T, AppError> {
    match raw {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AppError::Configuration(format!("{key} must be a valid number, got '{raw}'"))
        }),
        None => Ok(default),
    }
}

/// Validates a caller-supplied cutoff score.
pub fn validate_cutoff(cutoff_score: u32) -> Result<u32, AppError> {
    if cutoff_score > 100 {
        return Err(AppError::Validation(format!(
            "cutoff score must be between 0 and 100, got {cutoff_score}"
        )));
    }
    Ok(cutoff_score)
}
