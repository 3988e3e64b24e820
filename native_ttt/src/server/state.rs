use std::sync::Arc;

use super::registry::SessionRegistry;
use crate::config::Config;

/// Shared application state exposed to handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            registry: SessionRegistry::new(),
            config: Arc::new(config),
        }
    }
}
