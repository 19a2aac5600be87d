//! State shared by every handler.

use std::sync::Arc;

use domains::traits::{AuthProvider, KanbanStore, Translator};
use services::KanbanServices;

use crate::i18n::FALLBACK_LANG;
use crate::monitoring::Monitor;

#[derive(Clone)]
pub struct AppState {
    pub services: KanbanServices,
    /// Probed by `/liveness`.
    pub store: Arc<dyn KanbanStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub translator: Arc<dyn Translator>,
    pub default_lang: String,
    /// Whether `X-User-Id` identifies the caller.
    pub trust_user_header: bool,
    pub monitor: Arc<Monitor>,
}

impl AppState {
    pub fn new(
        services: KanbanServices,
        store: Arc<dyn KanbanStore>,
        auth: Arc<dyn AuthProvider>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            services,
            store,
            auth,
            translator,
            default_lang: FALLBACK_LANG.to_string(),
            trust_user_header: true,
            monitor: Arc::new(Monitor::new("local")),
        }
    }

    pub fn with_default_lang(mut self, lang: impl Into<String>) -> Self {
        self.default_lang = lang.into();
        self
    }

    pub fn with_user_header(mut self, trusted: bool) -> Self {
        self.trust_user_header = trusted;
        self
    }

    /// Deployment line reported in the liveness gauge (`local`, `prod`, ...).
    pub fn with_environment(mut self, environment: &str) -> Self {
        self.monitor = Arc::new(Monitor::new(environment));
        self
    }
}
