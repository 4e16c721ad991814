use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_cbor::{to_vec, value::to_value};

/// Shape of the value a question accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerShape {
    Text,
    Selections,
}

/// Payload of an answer: a single string or an ordered list of selected values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Selections(Vec<String>),
}

impl AnswerValue {
    pub fn shape(&self) -> AnswerShape {
        match self {
            AnswerValue::Text(_) => AnswerShape::Text,
            AnswerValue::Selections(_) => AnswerShape::Selections,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            AnswerValue::Selections(_) => None,
        }
    }

    pub fn as_selections(&self) -> Option<&[String]> {
        match self {
            AnswerValue::Selections(values) => Some(values),
            AnswerValue::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.is_empty(),
            AnswerValue::Selections(values) => values.is_empty(),
        }
    }
}

/// The value a user supplied for one question. `value: null` maps to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub value: Option<AnswerValue>,
}

impl Answer {
    pub fn text(question_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            value: Some(AnswerValue::Text(value.into())),
        }
    }

    pub fn selections<I, S>(question_id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question_id: question_id.into(),
            value: Some(AnswerValue::Selections(
                values.into_iter().map(Into::into).collect(),
            )),
        }
    }

    pub fn cleared(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            value: None,
        }
    }

    /// True for a missing value, an empty string, or an empty selection.
    pub fn is_blank(&self) -> bool {
        self.value.as_ref().is_none_or(AnswerValue::is_empty)
    }
}

/// Answers of a submitted session, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,
    pub answers: Vec<Answer>,
}

impl AnswerSet {
    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers
            .iter()
            .find(|answer| answer.question_id == question_id)
    }

    /// Serializes the answer set as canonical CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        let canonical = to_value(self)?;
        to_vec(&canonical)
    }

    /// Serializes the answer set as indented JSON for debugging.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
