use std::sync::Arc;
use casemirror_core::{Config, CycleRunner, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    runner: Arc<CycleRunner>,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<CycleRunner>) -> Self {
        Self { config, runner }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn runner(&self) -> &CycleRunner {
        self.runner.as_ref()
    }
}
