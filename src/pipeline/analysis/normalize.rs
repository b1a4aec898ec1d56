use crate::pipeline::extraction::{OcrConfig, OcrEngine, OcrOutcome};

use super::sanitize::sanitize_ocr_text;
use super::types::{AnalysisInput, AnalysisRequest, InputMode, ManualRecord};
use super::AnalysisError;

pub const OCR_CONTEXT_HEADER: &str = "RAW OCR TEXT FROM MEDICAL REPORT (FOR CONTEXT):\n";
pub const OCR_FAILED_CONTEXT: &str = "IMAGE PROVIDED (OCR FAILED)";
pub const MANUAL_CONTEXT_HEADER: &str = "MANUAL USER DATA:\n";

/// MIME type assumed for uploads that do not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

impl TryFrom<AnalysisRequest> for AnalysisInput {
    type Error = AnalysisError;

    /// An image wins over manual data when both are supplied. Empty image
    /// bytes count as no image.
    fn try_from(request: AnalysisRequest) -> Result<Self, Self::Error> {
        let AnalysisRequest {
            image,
            image_mime_type,
            manual_data,
        } = request;

        match (image.filter(|bytes| !bytes.is_empty()), manual_data) {
            (Some(bytes), manual) => {
                if manual.is_some() {
                    tracing::debug!("Both image and manual data supplied, using image");
                }
                let mime_type = image_mime_type
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                Ok(AnalysisInput::Image { bytes, mime_type })
            }
            (None, Some(record)) => Ok(AnalysisInput::Manual(record)),
            (None, None) => Err(AnalysisError::NoInputProvided),
        }
    }
}

/// Image forwarded to the reasoning service as its own payload part.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Canonical form of either input source.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub mode: InputMode,
    /// Empty for images until OCR has run.
    pub context: String,
    pub attachment: Option<ImageAttachment>,
}

/// Turn an input into a text context plus optional image attachment.
pub fn normalize_input(input: AnalysisInput) -> Result<NormalizedInput, AnalysisError> {
    match input {
        AnalysisInput::Image { bytes, mime_type } => Ok(NormalizedInput {
            mode: InputMode::ImageOcr,
            context: String::new(),
            attachment: Some(ImageAttachment { mime_type, bytes }),
        }),
        AnalysisInput::Manual(record) => Ok(NormalizedInput {
            mode: InputMode::Manual,
            context: manual_context(&record)?,
            attachment: None,
        }),
    }
}

/// Pretty-printed JSON of every form field; absent values render as `null`.
pub fn manual_context(record: &ManualRecord) -> Result<String, AnalysisError> {
    let body = serde_json::to_string_pretty(record)
        .map_err(|e| AnalysisError::AnalysisFailed(format!("Manual data serialization: {e}")))?;
    Ok(format!("{MANUAL_CONTEXT_HEADER}{body}"))
}

/// Run OCR once; any failure degrades to an empty, unsuccessful outcome.
pub fn recognize_best_effort(engine: &dyn OcrEngine, image: &[u8], config: &OcrConfig) -> OcrOutcome {
    match engine.recognize(image, config) {
        Ok(text) => OcrOutcome::success(sanitize_ocr_text(&text)),
        Err(e) => {
            tracing::warn!(
                error = %e,
                image_size = image.len(),
                "OCR failed, falling back to image-only analysis"
            );
            OcrOutcome::failed()
        }
    }
}

/// Context string for the image path.
pub fn ocr_context(outcome: &OcrOutcome) -> String {
    if outcome.succeeded {
        format!("{OCR_CONTEXT_HEADER}{}", outcome.text)
    } else {
        OCR_FAILED_CONTEXT.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OCR_CONFIG;
    use crate::pipeline::analysis::types::ExerciseFrequency;
    use crate::pipeline::extraction::{FailingOcrEngine, MockOcrEngine};

    fn jane() -> ManualRecord {
        ManualRecord {
            name: "Jane".into(),
            ..Default::default()
        }
    }

    #[test]
    fn neither_source_is_no_input() {
        let result = AnalysisInput::try_from(AnalysisRequest::default());
        assert!(matches!(result, Err(AnalysisError::NoInputProvided)));
    }

    #[test]
    fn empty_image_without_manual_is_no_input() {
        let request = AnalysisRequest {
            image: Some(vec![]),
            ..Default::default()
        };
        assert!(matches!(
            AnalysisInput::try_from(request),
            Err(AnalysisError::NoInputProvided)
        ));
    }

    #[test]
    fn image_defaults_mime_type() {
        let request = AnalysisRequest {
            image: Some(vec![0xFF, 0xD8]),
            image_mime_type: None,
            manual_data: None,
        };
        let input = AnalysisInput::try_from(request).unwrap();
        assert_eq!(
            input,
            AnalysisInput::Image {
                bytes: vec![0xFF, 0xD8],
                mime_type: DEFAULT_IMAGE_MIME.into()
            }
        );
    }

    #[test]
    fn image_preferred_over_manual() {
        let request = AnalysisRequest {
            image: Some(vec![1]),
            image_mime_type: Some("image/png".into()),
            manual_data: Some(jane()),
        };
        let input = AnalysisInput::try_from(request).unwrap();
        assert_eq!(input.mode(), InputMode::ImageOcr);
    }

    #[test]
    fn image_context_starts_empty_with_attachment() {
        let normalized = normalize_input(AnalysisInput::Image {
            bytes: vec![9, 9],
            mime_type: "image/png".into(),
        })
        .unwrap();
        assert_eq!(normalized.mode, InputMode::ImageOcr);
        assert!(normalized.context.is_empty());
        assert_eq!(normalized.attachment.unwrap().mime_type, "image/png");
    }

    #[test]
    fn manual_context_renders_absent_fields_as_null() {
        let context = manual_context(&jane()).unwrap();
        assert!(context.starts_with(MANUAL_CONTEXT_HEADER));
        assert!(context.contains("\"name\": \"Jane\""));
        assert!(context.contains("\"age\": null"));
        assert!(context.contains("\"smoker\": null"));
        assert!(context.contains("\"exercise\": \"rarely\""));
        assert!(context.contains("\"diet\": null"));
        assert!(context.contains("\"notes\": null"));
    }

    #[test]
    fn manual_context_is_deterministic() {
        let record = ManualRecord {
            name: "Sam".into(),
            age: Some(45),
            smoker: Some(true),
            exercise: ExerciseFrequency::Rarely,
            diet: Some("high sugar".into()),
            notes: None,
        };
        let expected = "MANUAL USER DATA:\n{\n  \"name\": \"Sam\",\n  \"age\": 45,\n  \"smoker\": true,\n  \"exercise\": \"rarely\",\n  \"diet\": \"high sugar\",\n  \"notes\": null\n}";
        assert_eq!(manual_context(&record).unwrap(), expected);
        assert_eq!(manual_context(&record).unwrap(), manual_context(&record).unwrap());
    }

    #[test]
    fn successful_ocr_builds_prefixed_context() {
        let engine = MockOcrEngine::new("Age:  45\u{200B}");
        let outcome = recognize_best_effort(&engine, b"img", &OCR_CONFIG);
        assert!(outcome.succeeded);
        assert_eq!(outcome.text, "Age: 45");
        assert_eq!(
            ocr_context(&outcome),
            "RAW OCR TEXT FROM MEDICAL REPORT (FOR CONTEXT):\nAge: 45"
        );
    }

    #[test]
    fn failed_ocr_degrades_to_sentinel() {
        let engine = FailingOcrEngine::new();
        let outcome = recognize_best_effort(&engine, b"img", &OCR_CONFIG);
        assert!(!outcome.succeeded);
        assert!(outcome.text.is_empty());
        assert_eq!(ocr_context(&outcome), OCR_FAILED_CONTEXT);
    }
}
