use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::api::ApiClient;
use crate::services::conversation::ChatEngine;
use crate::services::sessions::SessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub api: Arc<dyn ApiClient>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig, api: Arc<dyn ApiClient>) -> Self {
        let sessions = SessionStore::new(config.session_ttl_minutes);
        Self {
            config,
            api,
            sessions,
        }
    }

    pub fn new_engine(&self) -> ChatEngine {
        ChatEngine::new(Arc::clone(&self.api)).with_assistant_name(self.config.assistant_name.clone())
    }
}
