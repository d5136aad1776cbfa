use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
///
/// Provider secrets are deliberately absent: they are read when a model is
/// loaded for a session, see `llm_client::selector::ProviderKeys`.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub ollama_base_url: String,
    /// Completions tried per technical question before the fallback is used.
    pub question_max_attempts: u32,
    pub llm_timeout_secs: u64,
    /// Sessions with no message for this long are discarded.
    pub session_idle_secs: u64,
    pub session_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let question_max_attempts = std::env::var("QUESTION_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("QUESTION_MAX_ATTEMPTS must be a positive integer")?;
        if question_max_attempts == 0 {
            bail!("QUESTION_MAX_ATTEMPTS must be at least 1");
        }

        let session_sweep_secs = std::env::var("SESSION_SWEEP_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()
            .context("SESSION_SWEEP_SECS must be a number of seconds")?;
        if session_sweep_secs == 0 {
            bail!("SESSION_SWEEP_SECS must be at least 1");
        }

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            question_max_attempts,
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a number of seconds")?,
            session_idle_secs: std::env::var("SESSION_IDLE_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse::<u64>()
                .context("SESSION_IDLE_SECS must be a number of seconds")?,
            session_sweep_secs,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            question_max_attempts: 5,
            llm_timeout_secs: 120,
            session_idle_secs: 1800,
            session_sweep_secs: 60,
        }
    }
}
