//! Model selector: maps a sidebar identifier to a ready `ChatModel`.
//!
//! Selection never fails loudly: an unknown identifier, a missing secret or
//! a client that cannot be built is logged and reported as `None`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use super::anthropic::AnthropicClient;
use super::ollama::OllamaClient;
use super::openai::OpenAIClient;
use super::{ChatModel, LlmError};

pub const ANTHROPIC_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const OLLAMA_DEFAULT_MODEL: &str = "mistral";

/// The fixed set of identifiers offered to the candidate, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    ClaudeSonnet,
    ClaudeOpus,
    OpenAI,
    Ollama,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 4] = [
        ModelChoice::ClaudeSonnet,
        ModelChoice::ClaudeOpus,
        ModelChoice::OpenAI,
        ModelChoice::Ollama,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            ModelChoice::ClaudeSonnet => "claude-3-sonnet-20240229",
            ModelChoice::ClaudeOpus => "claude-3-opus-20240229",
            ModelChoice::OpenAI => "openai",
            ModelChoice::Ollama => "ollama",
        }
    }

    pub fn parse(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.identifier() == identifier)
    }

    pub fn backend(self) -> Backend {
        match self {
            ModelChoice::ClaudeSonnet | ModelChoice::ClaudeOpus => Backend::Anthropic {
                model: self.identifier(),
            },
            ModelChoice::OpenAI => Backend::OpenAI {
                model: OPENAI_DEFAULT_MODEL,
            },
            ModelChoice::Ollama => Backend::Ollama {
                model: OLLAMA_DEFAULT_MODEL,
            },
        }
    }
}

impl Default for ModelChoice {
    fn default() -> Self {
        ModelChoice::ALL[0]
    }
}

/// Backend families, each carrying the model id it talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Anthropic { model: &'static str },
    OpenAI { model: &'static str },
    Ollama { model: &'static str },
}

impl Backend {
    /// Environment variable holding this backend's secret, if it needs one.
    pub fn secret_env(self) -> Option<&'static str> {
        match self {
            Backend::Anthropic { .. } => Some(ANTHROPIC_KEY_ENV),
            Backend::OpenAI { .. } => Some(OPENAI_KEY_ENV),
            Backend::Ollama { .. } => None,
        }
    }

    pub fn provider_name(self) -> &'static str {
        match self {
            Backend::Anthropic { .. } => "anthropic",
            Backend::OpenAI { .. } => "openai",
            Backend::Ollama { .. } => "ollama",
        }
    }

    pub fn model(self) -> &'static str {
        match self {
            Backend::Anthropic { model } | Backend::OpenAI { model } | Backend::Ollama { model } => {
                model
            }
        }
    }
}

/// Provider secrets as seen at model-load time. Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl ProviderKeys {
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: read_secret(ANTHROPIC_KEY_ENV),
            openai_api_key: read_secret(OPENAI_KEY_ENV),
        }
    }

    fn for_backend(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::Anthropic { .. } => self.anthropic_api_key.as_deref(),
            Backend::OpenAI { .. } => self.openai_api_key.as_deref(),
            Backend::Ollama { .. } => None,
        }
    }

    fn satisfies(&self, backend: Backend) -> bool {
        backend.secret_env().is_none() || self.for_backend(backend).is_some()
    }
}

fn read_secret(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Non-secret settings shared by every backend.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub ollama_base_url: String,
    pub timeout: Duration,
}

/// Resolves `identifier` to a configured model, or `None` when it is
/// unrecognized or its credentials are missing.
pub fn load_model(
    identifier: &str,
    keys: &ProviderKeys,
    settings: &ModelSettings,
) -> Option<Arc<dyn ChatModel>> {
    let Some(choice) = ModelChoice::parse(identifier) else {
        warn!("Unsupported model: {identifier}");
        return None;
    };
    let backend = choice.backend();

    if !keys.satisfies(backend) {
        warn!(
            "Model {identifier} unavailable: {} is not set",
            backend.secret_env().unwrap_or_default()
        );
        return None;
    }

    match build_model(backend, keys, settings) {
        Ok(model) => {
            info!(
                "Loaded model {identifier} ({} / {})",
                backend.provider_name(),
                model.model_name()
            );
            Some(model)
        }
        Err(e) => {
            error!("Error loading AI model {identifier}: {e}");
            None
        }
    }
}

fn build_model(
    backend: Backend,
    keys: &ProviderKeys,
    settings: &ModelSettings,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    let secret = keys.for_backend(backend).unwrap_or_default().to_string();
    let model = backend.model().to_string();

    let built: Arc<dyn ChatModel> = match backend {
        Backend::Anthropic { .. } => {
            Arc::new(AnthropicClient::new(secret, model, settings.timeout)?)
        }
        Backend::OpenAI { .. } => Arc::new(OpenAIClient::new(secret, model, settings.timeout)?),
        Backend::Ollama { .. } => Arc::new(OllamaClient::new(
            &settings.ollama_base_url,
            model,
            settings.timeout,
        )?),
    };
    Ok(built)
}

/// One entry of the model picker.
#[derive(Debug, Clone, Serialize)]
pub struct ModelOption {
    pub id: &'static str,
    pub provider: &'static str,
    pub model: &'static str,
    pub is_default: bool,
    pub available: bool,
}

pub fn list_models(keys: &ProviderKeys) -> Vec<ModelOption> {
    ModelChoice::ALL
        .into_iter()
        .map(|choice| {
            let backend = choice.backend();
            ModelOption {
                id: choice.identifier(),
                provider: backend.provider_name(),
                model: backend.model(),
                is_default: choice == ModelChoice::default(),
                available: keys.satisfies(backend),
            }
        })
        .collect()
}

/// Resolves sidebar identifiers for new sessions.
///
/// Carried in `AppState` as `Arc<dyn ModelLoader>` so the HTTP layer never
/// touches provider construction directly.
pub trait ModelLoader: Send + Sync {
    fn load(&self, identifier: &str) -> Option<Arc<dyn ChatModel>>;

    fn options(&self) -> Vec<ModelOption>;
}

/// Default loader: re-reads provider secrets from the environment on every
/// load, so a key exported after startup is picked up by the next session.
pub struct EnvModelLoader {
    settings: ModelSettings,
}

impl EnvModelLoader {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }
}

impl ModelLoader for EnvModelLoader {
    fn load(&self, identifier: &str) -> Option<Arc<dyn ChatModel>> {
        load_model(identifier, &ProviderKeys::from_env(), &self.settings)
    }

    fn options(&self) -> Vec<ModelOption> {
        list_models(&ProviderKeys::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ModelSettings {
        ModelSettings {
            ollama_base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn anthropic_only() -> ProviderKeys {
        ProviderKeys {
            anthropic_api_key: Some("test-key".to_string()),
            openai_api_key: None,
        }
    }

    #[test]
    fn test_unrecognized_identifier_is_unavailable() {
        assert!(load_model("gpt-neo", &anthropic_only(), &settings()).is_none());
        assert!(load_model("", &anthropic_only(), &settings()).is_none());
    }

    #[test]
    fn test_identifiers_are_case_sensitive() {
        assert_eq!(ModelChoice::parse("OpenAI"), None);
        assert_eq!(ModelChoice::parse("openai"), Some(ModelChoice::OpenAI));
    }

    #[test]
    fn test_missing_secret_is_unavailable() {
        let keys = ProviderKeys::default();
        assert!(load_model("claude-3-sonnet-20240229", &keys, &settings()).is_none());
        assert!(load_model("openai", &keys, &settings()).is_none());
    }

    #[test]
    fn test_claude_models_keep_their_identifier() {
        let model = load_model("claude-3-opus-20240229", &anthropic_only(), &settings()).unwrap();
        assert_eq!(model.model_name(), "claude-3-opus-20240229");
    }

    #[test]
    fn test_openai_uses_default_model() {
        let keys = ProviderKeys {
            anthropic_api_key: None,
            openai_api_key: Some("sk-test".to_string()),
        };
        let model = load_model("openai", &keys, &settings()).unwrap();
        assert_eq!(model.model_name(), "gpt-3.5-turbo");
    }

    #[test]
    fn test_ollama_needs_no_secret() {
        let model = load_model("ollama", &ProviderKeys::default(), &settings()).unwrap();
        assert_eq!(model.model_name(), "mistral");
    }

    #[test]
    fn test_default_choice_is_first() {
        assert_eq!(ModelChoice::default(), ModelChoice::ClaudeSonnet);
        assert_eq!(
            ModelChoice::default().identifier(),
            "claude-3-sonnet-20240229"
        );
    }

    #[test]
    fn test_list_models_reports_availability() {
        let options = list_models(&anthropic_only());
        let ids: Vec<_> = options.iter().map(|o| o.id).collect();
        assert_eq!(
            ids,
            vec![
                "claude-3-sonnet-20240229",
                "claude-3-opus-20240229",
                "openai",
                "ollama"
            ]
        );
        let available: Vec<_> = options.iter().map(|o| o.available).collect();
        assert_eq!(available, vec![true, true, false, true]);
        assert!(options[0].is_default);
        assert!(options[1..].iter().all(|o| !o.is_default));
    }
}
