use std::sync::Arc;
use mediaconv_core::{Config, MediaConverter};

/// Shared application state
pub struct AppState {
    config: Config,
    converter: Arc<MediaConverter>,
}

impl AppState {
    pub fn new(config: Config, converter: Arc<MediaConverter>) -> Self {
        Self { config, converter }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn converter(&self) -> &MediaConverter {
        self.converter.as_ref()
    }
}
