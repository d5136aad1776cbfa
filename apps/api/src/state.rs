use std::sync::Arc;

use crate::config::Config;
use crate::interview::session::SessionStore;
use crate::llm_client::selector::ModelLoader;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable model resolution. Default: `EnvModelLoader`.
    pub models: Arc<dyn ModelLoader>,
    pub sessions: SessionStore,
}
