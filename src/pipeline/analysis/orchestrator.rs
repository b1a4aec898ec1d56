use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use super::mapper::map_to_result;
use super::normalize::{normalize_input, ocr_context, recognize_best_effort};
use super::parser::parse_structured_analysis;
use super::prompt::build_payload;
use super::types::{AnalysisInput, AnalysisRequest, AnalysisResult, ReasoningClient};
use super::AnalysisError;
use crate::config::OCR_CONFIG;
use crate::pipeline::extraction::{OcrConfig, OcrEngine};

/// Runs the single-pass analysis pipeline:
/// normalize → OCR (best effort) → prompt → reasoning → parse → map
///
/// Collaborators are injected so tests can substitute them. A missing
/// reasoning client means no credential was configured at startup.
pub struct HealthAnalyzer {
    reasoning: Option<Arc<dyn ReasoningClient>>,
    ocr: Arc<dyn OcrEngine>,
    model_name: String,
    ocr_config: OcrConfig,
}

impl HealthAnalyzer {
    pub fn new(
        reasoning: Option<Arc<dyn ReasoningClient>>,
        ocr: Arc<dyn OcrEngine>,
        model_name: &str,
    ) -> Self {
        Self {
            reasoning,
            ocr,
            model_name: model_name.to_string(),
            ocr_config: OCR_CONFIG,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.reasoning.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Analyze a request. Every expected failure comes back as an
    /// error-shaped result rather than an `Err`.
    pub fn analyze(&self, request: AnalysisRequest) -> AnalysisResult {
        let request_id = Uuid::new_v4();
        let _span = tracing::info_span!("analyze_health_profile", %request_id).entered();

        match self.try_analyze(request) {
            Ok(result) => result,
            Err(e) => {
                match &e {
                    AnalysisError::AnalysisFailed(_) => {
                        tracing::error!(error = %e, kind = ?e.kind(), "Analysis failed")
                    }
                    _ => tracing::warn!(error = %e, kind = ?e.kind(), "Analysis rejected"),
                }
                AnalysisResult::from_error(&e)
            }
        }
    }

    /// Same pipeline, with the failure kept as a typed error.
    pub fn try_analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let reasoning = self
            .reasoning
            .as_deref()
            .ok_or(AnalysisError::ConfigurationMissing)?;
        let input = AnalysisInput::try_from(request)?;
        self.run(reasoning, input)
    }

    /// Analyze an already-validated input.
    pub fn analyze_input(&self, input: AnalysisInput) -> Result<AnalysisResult, AnalysisError> {
        let reasoning = self
            .reasoning
            .as_deref()
            .ok_or(AnalysisError::ConfigurationMissing)?;
        self.run(reasoning, input)
    }

    fn run(
        &self,
        reasoning: &dyn ReasoningClient,
        input: AnalysisInput,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        let mut normalized = normalize_input(input)?;
        let mode = normalized.mode;

        // OCR is an enhancement: the model also sees the image itself.
        let ocr_text = match &normalized.attachment {
            Some(image) => {
                let outcome = recognize_best_effort(self.ocr.as_ref(), &image.bytes, &self.ocr_config);
                tracing::debug!(
                    ocr_succeeded = outcome.succeeded,
                    ocr_text_len = outcome.text.len(),
                    "OCR stage complete"
                );
                normalized.context = ocr_context(&outcome);
                Some(outcome.text)
            }
            None => None,
        };

        let payload = build_payload(&normalized);
        tracing::debug!(
            input_mode = %mode,
            parts = payload.parts().len(),
            prompt_len = payload.text().len(),
            "Calling reasoning service"
        );

        let raw_response = reasoning.generate(&self.model_name, &payload)?;

        let analysis = parse_structured_analysis(&raw_response).map_err(|e| {
            tracing::warn!(
                response_len = raw_response.len(),
                error = ?e,
                "Reasoning service returned unparseable output"
            );
            e
        })?;

        let result = map_to_result(analysis, mode, ocr_text);

        tracing::info!(
            input_mode = %mode,
            status = ?result.status,
            risk_level = ?result.risk_level,
            elapsed_ms = %start.elapsed().as_millis(),
            "Health profile analyzed"
        );

        Ok(result)
    }
}
