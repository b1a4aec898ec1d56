use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::types::{RawSteps, StructuredAnalysis};
use super::AnalysisError;

/// Parse the reasoning service's completion into the four-step shape.
///
/// Markdown fences are removed first; models wrap JSON in them despite
/// being told not to.
pub fn parse_structured_analysis(response: &str) -> Result<StructuredAnalysis, AnalysisError> {
    let cleaned = strip_code_fences(response);
    let value: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|e| AnalysisError::InvalidModelOutput(e.to_string()))?;

    // Derived struct visitors also accept sequences positionally.
    let object = match value {
        serde_json::Value::Object(object) => object,
        other => {
            return Err(AnalysisError::InvalidModelOutput(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )))
        }
    };

    let raw_steps = RawSteps::from_object(&object);
    let mut analysis: StructuredAnalysis = serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| AnalysisError::InvalidModelOutput(e.to_string()))?;
    analysis.raw_steps = raw_steps;
    Ok(analysis)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Remove every ```` ```json ```` and ```` ``` ```` marker, then trim.
pub fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Deserialize a field, treating a value of the wrong shape as absent.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserialize a string list leniently, skipping items that are not strings.
/// A value that is not an array at all is treated as absent.
pub(crate) fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}
