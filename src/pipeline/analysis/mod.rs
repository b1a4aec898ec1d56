pub mod types;
pub mod normalize;
pub mod sanitize;
pub mod prompt;
pub mod parser;
pub mod mapper;
pub mod gemini;
pub mod gemini_types;
pub mod orchestrator;

pub use types::*;
pub use normalize::*;
pub use sanitize::*;
pub use prompt::*;
pub use parser::*;
pub use mapper::*;
pub use gemini::*;
pub use orchestrator::*;

use serde::Serialize;
use thiserror::Error;

/// Failures the analysis pipeline reports to its caller.
///
/// OCR faults are deliberately absent: they are absorbed inside the
/// pipeline and turned into a context sentinel.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("GEMINI_API_KEY not configured")]
    ConfigurationMissing,

    #[error("No input provided")]
    NoInputProvided,

    #[error("Model did not return valid JSON")]
    InvalidModelOutput(String),

    #[error("Unified analysis failed: {0}")]
    AnalysisFailed(String),
}

/// Stable, serializable discriminant of [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationMissing,
    NoInputProvided,
    InvalidModelOutput,
    AnalysisFailed,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::ConfigurationMissing => ErrorKind::ConfigurationMissing,
            AnalysisError::NoInputProvided => ErrorKind::NoInputProvided,
            AnalysisError::InvalidModelOutput(_) => ErrorKind::InvalidModelOutput,
            AnalysisError::AnalysisFailed(_) => ErrorKind::AnalysisFailed,
        }
    }

    /// Secondary diagnostic, kept apart from the human-readable reason.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AnalysisError::InvalidModelOutput(diag) => Some(diag),
            _ => None,
        }
    }
}
