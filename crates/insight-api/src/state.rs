use std::sync::Arc;

use insight_relay::AnalysisRelay;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The relay owns the quota gate and caller locks, so a single instance is
/// created at startup and shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<AnalysisRelay>,
}

impl AppState {
    pub fn new(config: Config, relay: AnalysisRelay) -> Self {
        Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
        }
    }
}
