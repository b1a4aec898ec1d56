pub mod api;
pub mod config;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;
use crate::config::AnalyzerConfig;
use crate::pipeline::analysis::{AnalysisError, GeminiClient, HealthAnalyzer, ReasoningClient};
use crate::pipeline::extraction::TesseractCli;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Wire the analyzer from configuration.
///
/// A configured key whose client cannot be built is a startup error, not
/// an unconfigured analyzer. Must run outside an async context: the
/// Gemini client is blocking.
pub fn build_analyzer(config: &AnalyzerConfig) -> Result<HealthAnalyzer, AnalysisError> {
    let reasoning: Option<Arc<dyn ReasoningClient>> = match config.api_key.as_deref() {
        Some(key) => {
            let client: Arc<dyn ReasoningClient> = Arc::new(GeminiClient::new(
                key,
                &config.base_url,
                config.request_timeout,
            )?);
            Some(client)
        }
        None => {
            tracing::warn!(
                "{} not set; analysis requests will report a configuration error",
                config::ENV_API_KEY
            );
            None
        }
    };

    let ocr = Arc::new(TesseractCli::new(config.ocr_timeout));
    Ok(HealthAnalyzer::new(reasoning, ocr, &config.model))
}

/// Entry point for the `health-profiler` binary.
pub fn run() -> Result<(), String> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AnalyzerConfig::from_env().map_err(|e| e.to_string())?;
    tracing::info!(
        model = %config.model,
        bind = %config.bind_addr,
        request_timeout_secs = config.request_timeout.as_secs(),
        ocr_timeout_secs = config.ocr_timeout.as_secs(),
        "Configuration loaded"
    );

    let analyzer = build_analyzer(&config)
        .map_err(|e| format!("Failed to initialize reasoning client: {e}"))?;
    let ctx = ApiContext::new(analyzer);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    runtime.block_on(async {
        let listener = api::server::bind(config.bind_addr).await?;
        api::server::serve(listener, ctx, api::server::ctrl_c_signal()).await
    })
}
