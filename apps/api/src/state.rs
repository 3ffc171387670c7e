use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::store::JsonStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    /// `None` when no API key is configured; generation requests then fail
    /// with a configuration error instead of reaching the network.
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub config: Config,
}
