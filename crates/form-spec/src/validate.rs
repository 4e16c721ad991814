//! Per-type checks for presentation layers.
//!
//! Nothing here feeds back into [`crate::engine::FormEngine`]: the engine only
//! gates on required answers being present.

use std::num::NonZeroUsize;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{Answer, AnswerShape, AnswerValue};
use crate::spec::question::{Question, QuestionKind};

/// Inline error shown next to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub question_id: String,
    pub message: String,
    pub code: String,
}

/// Checks free text against an input question's length and pattern rules.
///
/// Returns the first failing rule. Zero bounds count as unset.
pub fn validate_input(question: &Question, text: &str) -> Option<ValidationError> {
    let QuestionKind::Input {
        validation: Some(rules),
        ..
    } = &question.kind
    else {
        return None;
    };
    let length = text.chars().count();

    if let Some(min_length) = rules.min_length.filter(|min| *min > 0)
        && length < min_length
    {
        return Some(base_error(
            question,
            &format!("Minimum length is {min_length} characters"),
            "min_length",
        ));
    }

    if let Some(max_length) = rules.max_length.filter(|max| *max > 0)
        && length > max_length
    {
        return Some(base_error(
            question,
            &format!("Maximum length is {max_length} characters"),
            "max_length",
        ));
    }

    if let Some(pattern) = &rules.pattern
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return Some(base_error(question, "Invalid format", "pattern_mismatch"));
    }

    None
}

/// Checks a candidate file for an image-upload question before it is encoded.
pub fn check_upload(
    question: &Question,
    mime_type: &str,
    size_bytes: u64,
) -> Result<(), ValidationError> {
    let QuestionKind::ImageUpload {
        max_size_mb,
        accepted_formats,
    } = &question.kind
    else {
        return Err(base_error(
            question,
            "This question does not accept uploads",
            "type_mismatch",
        ));
    };

    if !accepted_formats.iter().any(|format| format == mime_type) {
        let names = accepted_formats
            .iter()
            .map(|format| format.split_once('/').map_or(format.as_str(), |(_, name)| name))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(base_error(
            question,
            &format!("Please select a valid image format ({names})"),
            "unsupported_format",
        ));
    }

    let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
    if size_mb > *max_size_mb {
        return Err(base_error(
            question,
            &format!("File size must be less than {max_size_mb}MB"),
            "file_too_large",
        ));
    }

    Ok(())
}

/// Toggles `value` in a multiple-choice selection.
///
/// Selected values are removed; new values are appended unless the cap is reached,
/// in which case the selection is returned unchanged.
pub fn toggle_selection(
    max_selections: Option<NonZeroUsize>,
    current: &[String],
    value: &str,
) -> Vec<String> {
    if current.iter().any(|selected| selected == value) {
        return current
            .iter()
            .filter(|selected| *selected != value)
            .cloned()
            .collect();
    }
    if let Some(max) = max_selections
        && current.len() >= max.get()
    {
        return current.to_vec();
    }
    let mut next = current.to_vec();
    next.push(value.to_string());
    next
}

/// Full per-type check of an answer: shape, option membership, and input rules.
///
/// Blank answers pass; whether they may be left blank is the engine's call.
pub fn validate_answer(question: &Question, answer: &Answer) -> Option<ValidationError> {
    let value = answer.value.as_ref().filter(|value| !value.is_empty())?;

    match question.expected_shape() {
        None => {
            return Some(base_error(
                question,
                "This question does not take an answer",
                "type_mismatch",
            ));
        }
        Some(shape) if shape != value.shape() => {
            return Some(base_error(
                question,
                &format!("type mismatch: expected {}", shape_label(shape)),
                "type_mismatch",
            ));
        }
        Some(_) => {}
    }

    match (&question.kind, value) {
        (QuestionKind::SingleChoice { .. }, AnswerValue::Text(text))
            if question.option_label(text).is_none() =>
        {
            Some(base_error(question, "invalid option", "invalid_option"))
        }
        (QuestionKind::MultipleChoice { .. }, AnswerValue::Selections(values)) => {
            if values
                .iter()
                .any(|value| question.option_label(value).is_none())
            {
                return Some(base_error(question, "invalid option", "invalid_option"));
            }
            match question.max_selections() {
                Some(max) if values.len() > max.get() => Some(base_error(
                    question,
                    &format!("Select up to {} options", max.get()),
                    "max_selections",
                )),
                _ => None,
            }
        }
        (QuestionKind::Input { .. }, AnswerValue::Text(text)) => validate_input(question, text),
        _ => None,
    }
}

fn base_error(question: &Question, message: &str, code: &str) -> ValidationError {
    ValidationError {
        question_id: question.id.clone(),
        message: message.into(),
        code: code.into(),
    }
}

fn shape_label(shape: AnswerShape) -> &'static str {
    match shape {
        AnswerShape::Text => "string",
        AnswerShape::Selections => "array",
    }
}
