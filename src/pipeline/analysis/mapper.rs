use super::types::{
    AnalysisResult, AnalysisStatus, DeveloperInfo, GuardrailStatus, InputMode, RiskLevel,
    StructuredAnalysis,
};

/// Reason reported for an incomplete profile when the model gives none.
pub const INCOMPLETE_PROFILE_REASON: &str = ">50% fields missing";

/// Project the four-step model output onto the external result contract.
///
/// Total over its input: every level of `analysis` may be absent.
/// Decisions use the typed steps; `developer_info` echoes the raw ones.
/// `ocr_text` is `Some` on the image path (empty when OCR failed) and
/// `None` on the manual path.
pub fn map_to_result(
    analysis: StructuredAnalysis,
    input_mode: InputMode,
    ocr_text: Option<String>,
) -> AnalysisResult {
    let guardrail_status = analysis
        .step1_guardrail
        .as_ref()
        .and_then(|g| g.status);

    let status = if guardrail_status == Some(GuardrailStatus::IncompleteProfile) {
        AnalysisStatus::IncompleteProfile
    } else {
        AnalysisStatus::Ok
    };

    let reason = match status {
        AnalysisStatus::IncompleteProfile => Some(
            analysis
                .step1_guardrail
                .as_ref()
                .and_then(|g| g.reason.clone())
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| INCOMPLETE_PROFILE_REASON.to_string()),
        ),
        _ => None,
    };

    let risk_level = analysis
        .step3
        .as_ref()
        .and_then(|s| s.risk_level)
        .unwrap_or(RiskLevel::Unknown);

    let factors = analysis
        .step2
        .as_ref()
        .and_then(|s| s.factors.clone())
        .unwrap_or_default();

    let StructuredAnalysis {
        recommendations,
        raw_steps,
        ..
    } = analysis;

    AnalysisResult {
        status,
        risk_level: Some(risk_level),
        factors: Some(factors),
        recommendations: Some(recommendations.unwrap_or_default()),
        reason,
        error_kind: None,
        detail: None,
        developer_info: Some(DeveloperInfo {
            step1_extraction: raw_steps.step1,
            step2_factor_extraction: raw_steps.step2,
            step3_risk_classification: raw_steps.step3,
            guardrail: raw_steps.step1_guardrail,
            ocr_text,
            input_mode,
        }),
    }
}
