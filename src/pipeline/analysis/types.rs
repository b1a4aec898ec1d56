use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::parser::{lenient, lenient_strings};
use super::{AnalysisError, ErrorKind};

// ──────────────────────────────────────────────
// Input
// ──────────────────────────────────────────────

/// Self-reported exercise frequency from the manual form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseFrequency {
    #[default]
    Rarely,
    Occasionally,
    Regularly,
    Athlete,
}

impl ExerciseFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseFrequency::Rarely => "rarely",
            ExerciseFrequency::Occasionally => "occasionally",
            ExerciseFrequency::Regularly => "regularly",
            ExerciseFrequency::Athlete => "athlete",
        }
    }
}

impl FromStr for ExerciseFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rarely" => Ok(ExerciseFrequency::Rarely),
            "occasionally" => Ok(ExerciseFrequency::Occasionally),
            "regularly" => Ok(ExerciseFrequency::Regularly),
            "athlete" => Ok(ExerciseFrequency::Athlete),
            other => Err(format!("unknown exercise frequency: {other:?}")),
        }
    }
}

/// Health-profile form as submitted by the user.
///
/// Field order is the serialization order of the manual context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualRecord {
    #[serde(default)]
    pub name: String,
    pub age: Option<u32>,
    pub smoker: Option<bool>,
    #[serde(default)]
    pub exercise: ExerciseFrequency,
    pub diet: Option<String>,
    pub notes: Option<String>,
}

/// Inbound call shape, as handed over by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub image: Option<Vec<u8>>,
    pub image_mime_type: Option<String>,
    pub manual_data: Option<ManualRecord>,
}

/// Exactly one input source per analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisInput {
    Image { bytes: Vec<u8>, mime_type: String },
    Manual(ManualRecord),
}

impl AnalysisInput {
    pub fn mode(&self) -> InputMode {
        match self {
            AnalysisInput::Image { .. } => InputMode::ImageOcr,
            AnalysisInput::Manual(_) => InputMode::Manual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputMode {
    #[serde(rename = "image/ocr")]
    ImageOcr,
    #[serde(rename = "manual")]
    Manual,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::ImageOcr => f.write_str("image/ocr"),
            InputMode::Manual => f.write_str("manual"),
        }
    }
}

// ──────────────────────────────────────────────
// Prompt payload
// ──────────────────────────────────────────────

/// One part of a multimodal request.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    /// Raw image bytes; the transport decides the wire encoding.
    InlineImage { mime_type: String, data: Vec<u8> },
    Text(String),
}

/// Ordered request parts: at most one image, then exactly one text part.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPayload {
    parts: Vec<PromptPart>,
}

impl PromptPayload {
    pub fn new(image: Option<(String, Vec<u8>)>, text: String) -> Self {
        let mut parts = Vec::with_capacity(2);
        if let Some((mime_type, data)) = image {
            parts.push(PromptPart::InlineImage { mime_type, data });
        }
        parts.push(PromptPart::Text(text));
        Self { parts }
    }

    pub fn parts(&self) -> &[PromptPart] {
        &self.parts
    }

    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, PromptPart::InlineImage { .. }))
    }

    /// The instruction text (always the last part).
    pub fn text(&self) -> &str {
        match self.parts.last() {
            Some(PromptPart::Text(text)) => text,
            _ => "",
        }
    }
}

/// Multimodal reasoning client abstraction (allows mocking)
pub trait ReasoningClient: Send + Sync {
    /// One round trip: ordered parts in, raw completion text out.
    fn generate(&self, model: &str, payload: &PromptPayload) -> Result<String, AnalysisError>;
}

// ──────────────────────────────────────────────
// Structured analysis (model output)
// ──────────────────────────────────────────────

/// The four-step JSON object the reasoning service is asked to emit.
///
/// Every level is optional. A sub-object or field with the wrong shape is
/// treated as absent instead of failing the whole parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnalysis {
    #[serde(default, deserialize_with = "lenient")]
    pub step1: Option<Step1Extraction>,
    #[serde(default, deserialize_with = "lenient")]
    pub step1_guardrail: Option<Guardrail>,
    #[serde(default, deserialize_with = "lenient")]
    pub step2: Option<Step2Factors>,
    #[serde(default, deserialize_with = "lenient")]
    pub step3: Option<Step3Classification>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub recommendations: Option<Vec<String>>,
    /// Step objects exactly as the model sent them, for the debug echo.
    #[serde(skip)]
    pub raw_steps: RawSteps,
}

/// Untyped copies of the step objects. `None` when the key was absent or null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSteps {
    pub step1: Option<serde_json::Value>,
    pub step1_guardrail: Option<serde_json::Value>,
    pub step2: Option<serde_json::Value>,
    pub step3: Option<serde_json::Value>,
}

impl RawSteps {
    pub fn from_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let take = |key: &str| object.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            step1: take("step1"),
            step1_guardrail: take("step1_guardrail"),
            step2: take("step2"),
            step3: take("step3"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step1Extraction {
    #[serde(default, deserialize_with = "lenient")]
    pub answers: Option<ExtractedAnswers>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub missing_fields: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAnswers {
    #[serde(default, deserialize_with = "lenient")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub smoker: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub exercise: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub diet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailStatus {
    Ok,
    IncompleteProfile,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guardrail {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<GuardrailStatus>,
    #[serde(default, deserialize_with = "lenient")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step2Factors {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub factors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step3Classification {
    #[serde(default, deserialize_with = "lenient")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub rationale: Option<Vec<String>>,
}

// ──────────────────────────────────────────────
// Result (external contract)
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Ok,
    IncompleteProfile,
    Error,
}

/// Intermediate steps echoed back for debugging clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperInfo {
    pub step1_extraction: Option<serde_json::Value>,
    pub step2_factor_extraction: Option<serde_json::Value>,
    pub step3_risk_classification: Option<serde_json::Value>,
    pub guardrail: Option<serde_json::Value>,
    /// OCR text after sanitation and truncation, i.e. what the prompt saw.
    /// Empty when OCR failed, `None` on the manual path.
    pub ocr_text: Option<String>,
    pub input_mode: InputMode,
}

/// What callers of the analyzer receive, for success and failure alike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_info: Option<DeveloperInfo>,
}

impl AnalysisResult {
    /// Uniform error shape for every member of the taxonomy.
    pub fn from_error(err: &AnalysisError) -> Self {
        Self {
            status: AnalysisStatus::Error,
            risk_level: None,
            factors: None,
            recommendations: None,
            reason: Some(err.to_string()),
            error_kind: Some(err.kind()),
            detail: err.detail().map(str::to_string),
            developer_info: None,
        }
    }
}
