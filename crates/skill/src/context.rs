use std::sync::Arc;
use tracing::Span;

use crate::config::AppConfig;

/// Read-only bundle handed to every skill call
#[derive(Clone)]
pub struct SkillContext {
    config: Arc<AppConfig>,
    span: Span,
}

impl SkillContext {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            span: tracing::info_span!("otto"),
        }
    }

    /// Parent span for everything logged while running skills
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for SkillContext {
    fn default() -> Self {
        Self::new(Arc::new(AppConfig::default()))
    }
}
