pub mod types;
pub mod ocr;

pub use types::*;
pub use ocr::*;

use std::time::Duration;

use thiserror::Error;

/// OCR adapter failures. Never surfaced to API callers: the analysis
/// pipeline absorbs them and degrades to image-only reasoning.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tesseract binary not found (install tesseract-ocr)")]
    EngineNotAvailable,

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),

    #[error("Image is empty")]
    EmptyImage,
}
