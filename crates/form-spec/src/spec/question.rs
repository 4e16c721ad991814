use std::num::NonZeroUsize;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerShape;

/// Upload size limit applied when a question does not set `maxSizeMB`.
pub const DEFAULT_MAX_SIZE_MB: f64 = 5.0;

/// MIME types accepted when a question does not set `acceptedFormats`.
pub const DEFAULT_ACCEPTED_FORMATS: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

fn default_max_size_mb() -> f64 {
    DEFAULT_MAX_SIZE_MB
}

fn default_accepted_formats() -> Vec<String> {
    DEFAULT_ACCEPTED_FORMATS
        .iter()
        .map(|format| format.to_string())
        .collect()
}

/// One selectable option of a choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Keyboard/input hint for free-text questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Text,
    Email,
    Number,
    Tel,
    Url,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Email => "email",
            InputType::Number => "number",
            InputType::Tel => "tel",
            InputType::Url => "url",
        }
    }
}

/// Constraints checked by presentation layers while the user types.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InputValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Variant-specific part of a question, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<ChoiceOption>,
        #[serde(
            default,
            rename = "maxSelections",
            skip_serializing_if = "Option::is_none"
        )]
        max_selections: Option<NonZeroUsize>,
    },
    SingleChoice {
        options: Vec<ChoiceOption>,
    },
    Input {
        #[serde(default, rename = "inputType")]
        input_type: InputType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        validation: Option<InputValidation>,
    },
    /// Display-only; never carries an answer.
    Image {
        #[serde(rename = "imageUrl")]
        image_url: String,
        #[serde(default, rename = "altText", skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    ImageUpload {
        #[serde(default = "default_max_size_mb", rename = "maxSizeMB")]
        max_size_mb: f64,
        #[serde(default = "default_accepted_formats", rename = "acceptedFormats")]
        accepted_formats: Vec<String>,
    },
}

/// Definition of a single question inside a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    /// The `type` tag as it appears in catalog documents.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::SingleChoice { .. } => "single-choice",
            QuestionKind::Input { .. } => "input",
            QuestionKind::Image { .. } => "image",
            QuestionKind::ImageUpload { .. } => "image-upload",
        }
    }

    pub fn is_display_only(&self) -> bool {
        matches!(self.kind, QuestionKind::Image { .. })
    }

    /// Shape an answer to this question must have, or `None` for display-only questions.
    pub fn expected_shape(&self) -> Option<AnswerShape> {
        match self.kind {
            QuestionKind::MultipleChoice { .. } => Some(AnswerShape::Selections),
            QuestionKind::SingleChoice { .. }
            | QuestionKind::Input { .. }
            | QuestionKind::ImageUpload { .. } => Some(AnswerShape::Text),
            QuestionKind::Image { .. } => None,
        }
    }

    /// Options of a choice question; empty for every other kind.
    pub fn options(&self) -> &[ChoiceOption] {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. }
            | QuestionKind::SingleChoice { options } => options,
            _ => &[],
        }
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options()
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }

    pub fn max_selections(&self) -> Option<NonZeroUsize> {
        match self.kind {
            QuestionKind::MultipleChoice { max_selections, .. } => max_selections,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upload_defaults_are_filled_in() {
        let question: Question = serde_json::from_value(json!({
            "id": "photo",
            "type": "image-upload",
            "title": "Upload a photo"
        }))
        .expect("deserialize");

        match question.kind {
            QuestionKind::ImageUpload {
                max_size_mb,
                accepted_formats,
            } => {
                assert_eq!(max_size_mb, 5.0);
                assert_eq!(
                    accepted_formats,
                    vec!["image/jpeg", "image/png", "image/webp"]
                );
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert!(!question.required);
    }

    #[test]
    fn camel_case_fields_are_read() {
        let question: Question = serde_json::from_value(json!({
            "id": "topics",
            "type": "multiple-choice",
            "title": "Pick topics",
            "required": true,
            "maxSelections": 2,
            "options": [
                { "id": "a", "label": "Alpha", "value": "alpha", "imageUrl": "https://x/a.png" },
                { "id": "b", "label": "Beta", "value": "beta" }
            ]
        }))
        .expect("deserialize");

        assert_eq!(question.kind_label(), "multiple-choice");
        assert_eq!(question.max_selections().map(NonZeroUsize::get), Some(2));
        assert_eq!(question.option_label("beta"), Some("Beta"));
        assert_eq!(
            question.options()[0].image_url.as_deref(),
            Some("https://x/a.png")
        );
        assert_eq!(question.expected_shape(), Some(AnswerShape::Selections));
    }

    #[test]
    fn zero_max_selections_is_rejected() {
        let result = serde_json::from_value::<Question>(json!({
            "id": "topics",
            "type": "multiple-choice",
            "title": "Pick topics",
            "maxSelections": 0,
            "options": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn image_question_is_display_only() {
        let question: Question = serde_json::from_value(json!({
            "id": "banner",
            "type": "image",
            "title": "Look at this",
            "imageUrl": "https://example.com/banner.png",
            "altText": "Banner"
        }))
        .expect("deserialize");

        assert!(question.is_display_only());
        assert_eq!(question.expected_shape(), None);
        let value = serde_json::to_value(&question).expect("serialize");
        assert_eq!(value["type"], "image");
        assert_eq!(value["imageUrl"], "https://example.com/banner.png");
    }

    #[test]
    fn input_type_defaults_to_text() {
        let question: Question = serde_json::from_value(json!({
            "id": "name",
            "type": "input",
            "title": "Your name",
            "validation": { "minLength": 2 }
        }))
        .expect("deserialize");

        match &question.kind {
            QuestionKind::Input {
                input_type,
                validation,
                ..
            } => {
                assert_eq!(*input_type, InputType::Text);
                assert_eq!(
                    validation.as_ref().and_then(|rules| rules.min_length),
                    Some(2)
                );
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
