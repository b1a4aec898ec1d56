//! Shared types for the API layer.

use std::sync::Arc;

use crate::pipeline::analysis::HealthAnalyzer;

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub analyzer: Arc<HealthAnalyzer>,
}

impl ApiContext {
    pub fn new(analyzer: HealthAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}
