//! `POST /api/analyze`: multipart form in, `AnalysisResult` out.

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::analysis::{AnalysisRequest, AnalysisResult, ExerciseFrequency, ManualRecord};

/// Raw form fields as received. Absent and blank are kept apart until
/// `into_request` applies the form defaults.
#[derive(Debug, Default)]
pub struct AnalyzeForm {
    pub name: Option<String>,
    pub age: Option<String>,
    pub smoker: Option<String>,
    pub exercise: Option<String>,
    pub diet: Option<String>,
    pub health_notes: Option<String>,
    pub image: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
}

impl AnalyzeForm {
    /// Drain a multipart body. Unknown fields are ignored.
    pub async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "image" => {
                    form.image_content_type = field.content_type().map(str::to_string);
                    form.image = Some(field.bytes().await?.to_vec());
                }
                "name" => form.name = Some(field.text().await?),
                "age" => form.age = Some(field.text().await?),
                "smoker" => form.smoker = Some(field.text().await?),
                "exercise" => form.exercise = Some(field.text().await?),
                "diet" => form.diet = Some(field.text().await?),
                "health_notes" => form.health_notes = Some(field.text().await?),
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn has_manual_fields(&self) -> bool {
        [
            &self.name,
            &self.age,
            &self.smoker,
            &self.exercise,
            &self.diet,
            &self.health_notes,
        ]
        .iter()
        .any(|f| f.is_some())
    }

    /// Apply form defaults and validate typed fields.
    ///
    /// A body with no manual fields at all carries no manual record, so an
    /// empty submission reaches the pipeline as "no input".
    pub fn into_request(self) -> Result<AnalysisRequest, ApiError> {
        let manual_data = if self.has_manual_fields() {
            Some(ManualRecord {
                name: self.name.map(|n| n.trim().to_string()).unwrap_or_default(),
                age: parse_age(self.age.as_deref())?,
                smoker: Some(parse_smoker(self.smoker.as_deref())?),
                exercise: parse_exercise(self.exercise.as_deref())?,
                diet: non_blank(self.diet),
                notes: non_blank(self.health_notes),
            })
        } else {
            None
        };

        Ok(AnalysisRequest {
            image: self.image,
            image_mime_type: self.image_content_type,
            manual_data,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_age(raw: Option<&str>) -> Result<Option<u32>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid age: {s}"))),
    }
}

fn parse_smoker(raw: Option<&str>) -> Result<bool, ApiError> {
    let value = raw.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default();
    match value.as_str() {
        "" | "false" | "no" | "off" | "0" => Ok(false),
        "true" | "yes" | "on" | "1" => Ok(true),
        _ => Err(ApiError::BadRequest(format!("Invalid smoker value: {value}"))),
    }
}

fn parse_exercise(raw: Option<&str>) -> Result<ExerciseFrequency, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ExerciseFrequency::default()),
        Some(s) => s.parse().map_err(ApiError::BadRequest),
    }
}

/// `POST /api/analyze`
///
/// Every pipeline outcome, error-shaped results included, is a 200.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let form = AnalyzeForm::read(&mut multipart).await?;
    let request = form.into_request()?;

    tracing::debug!(
        has_image = request.image.as_ref().is_some_and(|b| !b.is_empty()),
        has_manual = request.manual_data.is_some(),
        "Analyze request received"
    );

    let analyzer = ctx.analyzer.clone();
    let result = tokio::task::spawn_blocking(move || analyzer.analyze(request)).await?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_defaults_apply() {
        let form = AnalyzeForm {
            name: Some("Jane".into()),
            ..Default::default()
        };
        let request = form.into_request().unwrap();
        let record = request.manual_data.unwrap();
        assert_eq!(record.name, "Jane");
        assert_eq!(record.age, None);
        assert_eq!(record.smoker, Some(false));
        assert_eq!(record.exercise, ExerciseFrequency::Rarely);
        assert_eq!(record.diet, None);
        assert_eq!(record.notes, None);
    }

    #[test]
    fn blank_fields_become_null() {
        let form = AnalyzeForm {
            name: Some("  ".into()),
            age: Some("".into()),
            diet: Some("   ".into()),
            health_notes: Some("".into()),
            ..Default::default()
        };
        let record = form.into_request().unwrap().manual_data.unwrap();
        assert_eq!(record.name, "");
        assert_eq!(record.age, None);
        assert_eq!(record.diet, None);
        assert_eq!(record.notes, None);
    }

    #[test]
    fn typed_fields_parse() {
        let form = AnalyzeForm {
            age: Some(" 45 ".into()),
            smoker: Some("True".into()),
            exercise: Some("Regularly".into()),
            diet: Some("high sugar".into()),
            health_notes: Some("family history of diabetes".into()),
            ..Default::default()
        };
        let record = form.into_request().unwrap().manual_data.unwrap();
        assert_eq!(record.age, Some(45));
        assert_eq!(record.smoker, Some(true));
        assert_eq!(record.exercise, ExerciseFrequency::Regularly);
        assert_eq!(record.notes.as_deref(), Some("family history of diabetes"));
    }

    #[test]
    fn invalid_age_is_bad_request() {
        let form = AnalyzeForm {
            age: Some("forty".into()),
            ..Default::default()
        };
        assert!(matches!(form.into_request(), Err(ApiError::BadRequest(m)) if m.contains("forty")));
    }

    #[test]
    fn invalid_exercise_is_bad_request() {
        let form = AnalyzeForm {
            exercise: Some("daily".into()),
            ..Default::default()
        };
        assert!(matches!(form.into_request(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn invalid_smoker_is_bad_request() {
        let form = AnalyzeForm {
            smoker: Some("sometimes".into()),
            ..Default::default()
        };
        assert!(matches!(form.into_request(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn empty_form_has_no_manual_record() {
        let request = AnalyzeForm::default().into_request().unwrap();
        assert!(request.manual_data.is_none());
        assert!(request.image.is_none());
    }

    #[test]
    fn image_carries_content_type() {
        let form = AnalyzeForm {
            image: Some(vec![1, 2, 3]),
            image_content_type: Some("image/png".into()),
            ..Default::default()
        };
        let request = form.into_request().unwrap();
        assert_eq!(request.image, Some(vec![1, 2, 3]));
        assert_eq!(request.image_mime_type.as_deref(), Some("image/png"));
        assert!(request.manual_data.is_none());
    }
}
