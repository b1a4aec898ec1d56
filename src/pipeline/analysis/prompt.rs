use super::normalize::NormalizedInput;
use super::types::{InputMode, PromptPayload};

const IMAGE_SOURCE: &str = "an image of a medical report and its OCR text";
const MANUAL_SOURCE: &str = "manual user data";

/// Describe the input source to the model.
pub fn source_description(mode: InputMode) -> &'static str {
    match mode {
        InputMode::ImageOcr => IMAGE_SOURCE,
        InputMode::Manual => MANUAL_SOURCE,
    }
}

/// Build the single-pass analysis instructions for a given context.
pub fn build_analysis_prompt(mode: InputMode, context: &str) -> String {
    let source = source_description(mode);

    format!(
        r#"
You are a highly accurate medical information extraction and health risk assessment system.

The input contains {source}.

Extract only information clearly supported by the input. Never invent values:
if a field is not stated, use null.

TASKS:
1. Extraction: Extract age, smoker status, exercise frequency, and diet.
   List every field you could not extract in "missing_fields".
   - Guardrail: If 3 or more of the four fields (age, smoker, exercise, diet) are missing,
     set step1_guardrail.status to "incomplete_profile". Otherwise set it to "ok".
2. Factor Extraction: Identify health risk factors from the extracted data.
3. Risk Classification: Compute risk level, score (0-100), and rationale.
4. Recommendations: Provide short, actionable recommendations.

OUTPUT FORMAT:
Return ONLY a valid JSON object with the following structure:
{{
  "step1": {{
    "answers": {{
      "age": number or null,
      "smoker": boolean or null,
      "exercise": "rarely/occasionally/regularly/athlete" or null,
      "diet": "string describing diet" or null
    }},
    "missing_fields": ["list", "of", "missing", "fields"],
    "confidence": number (0-1)
  }},
  "step1_guardrail": {{
    "status": "ok" or "incomplete_profile",
    "reason": null or ">50% fields missing"
  }},
  "step2": {{
    "factors": ["factor1", "factor2"],
    "confidence": number (0-1)
  }},
  "step3": {{
    "risk_level": "low/moderate/high",
    "score": integer (0-100),
    "rationale": ["point 1", "point 2"]
  }},
  "recommendations": ["short rec 1", "short rec 2"]
}}

========================
INPUT CONTEXT:
{context}
========================

Respond with the JSON object only. No markdown, no code fences, no explanations.
"#
    )
}

/// Assemble the ordered request: image part first (if any), instructions last.
pub fn build_payload(input: &NormalizedInput) -> PromptPayload {
    let text = build_analysis_prompt(input.mode, &input.context);
    let image = input
        .attachment
        .as_ref()
        .map(|a| (a.mime_type.clone(), a.bytes.clone()));
    PromptPayload::new(image, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis::normalize::ImageAttachment;
    use crate::pipeline::analysis::types::PromptPart;

    #[test]
    fn prompt_contains_context() {
        let prompt = build_analysis_prompt(InputMode::Manual, "MANUAL USER DATA:\n{}");
        assert!(prompt.contains("INPUT CONTEXT:\nMANUAL USER DATA:\n{}\n"));
    }

    #[test]
    fn source_description_follows_mode() {
        let manual = build_analysis_prompt(InputMode::Manual, "");
        let image = build_analysis_prompt(InputMode::ImageOcr, "");
        assert!(manual.contains("The input contains manual user data."));
        assert!(image.contains("The input contains an image of a medical report and its OCR text."));
    }

    #[test]
    fn prompt_states_guardrail_rule_and_json_only() {
        let prompt = build_analysis_prompt(InputMode::Manual, "x");
        assert!(prompt.contains("If 3 or more of the four fields"));
        assert!(prompt.contains("\"incomplete_profile\""));
        assert!(prompt.contains("Return ONLY a valid JSON object"));
        assert!(prompt.contains("No markdown"));
    }

    #[test]
    fn prompt_schema_lists_every_step() {
        let prompt = build_analysis_prompt(InputMode::Manual, "x");
        for key in ["\"step1\"", "\"step1_guardrail\"", "\"step2\"", "\"step3\"", "\"recommendations\""] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn payload_with_image_orders_image_then_text() {
        let input = NormalizedInput {
            mode: InputMode::ImageOcr,
            context: "IMAGE PROVIDED (OCR FAILED)".into(),
            attachment: Some(ImageAttachment {
                mime_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            }),
        };
        let payload = build_payload(&input);
        let parts = payload.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            PromptPart::InlineImage {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3]
            }
        );
        assert!(payload.text().contains("IMAGE PROVIDED (OCR FAILED)"));
    }

    #[test]
    fn manual_payload_is_text_only() {
        let input = NormalizedInput {
            mode: InputMode::Manual,
            context: "MANUAL USER DATA:\n{}".into(),
            attachment: None,
        };
        let payload = build_payload(&input);
        assert_eq!(payload.parts().len(), 1);
        assert!(!payload.has_image());
    }
}
