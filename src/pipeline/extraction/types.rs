use serde::Serialize;

use super::ExtractionError;

/// Recognition settings passed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. "eng".
    pub lang: &'static str,
    /// `--oem`: 1 = LSTM neural net only.
    pub engine_mode: u8,
    /// `--psm`: 3 = fully automatic page segmentation.
    pub page_seg_mode: u8,
}

/// Result of a best-effort OCR attempt.
///
/// A failed attempt carries empty text; it only changes the context
/// handed to the reasoning service, never aborts the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcrOutcome {
    pub text: String,
    pub succeeded: bool,
}

impl OcrOutcome {
    pub fn success(text: String) -> Self {
        Self {
            text,
            succeeded: true,
        }
    }

    pub fn failed() -> Self {
        Self {
            text: String::new(),
            succeeded: false,
        }
    }
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8], config: &OcrConfig) -> Result<String, ExtractionError>;
}
