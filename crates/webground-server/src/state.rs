use std::sync::Arc;

use webground::orchestrator::ChatOrchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: ChatOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}
