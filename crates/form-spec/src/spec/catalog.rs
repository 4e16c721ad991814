use std::collections::HashSet;

use regex::Regex;
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::question::{Question, QuestionKind};

/// Reasons a catalog document is refused.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("question at position {0} has an empty id")]
    EmptyId(usize),
    #[error("question id '{0}' is used more than once")]
    DuplicateId(String),
    #[error("question '{question_id}' has an invalid pattern: {source}")]
    InvalidPattern {
        question_id: String,
        #[source]
        source: regex::Error,
    },
    #[error("question '{question_id}' repeats option value '{value}'")]
    DuplicateOption { question_id: String, value: String },
}

/// On-disk shape of a catalog, before its invariants are checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

/// Ordered, immutable list of questions for one session.
///
/// Question ids are unique; the order defines navigation and overview order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDocument")]
pub struct QuestionCatalog {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    questions: Vec<Question>,
}

impl TryFrom<CatalogDocument> for QuestionCatalog {
    type Error = CatalogError;

    fn try_from(document: CatalogDocument) -> Result<Self, Self::Error> {
        check_questions(&document.questions)?;
        Ok(Self {
            title: document.title,
            description: document.description,
            questions: document.questions,
        })
    }
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        Self::try_from(CatalogDocument {
            title: None,
            description: None,
            questions,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::try_from(document)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Highest valid index; `0` for an empty catalog.
    pub fn last_index(&self) -> usize {
        self.questions.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|question| question.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }
}

impl<'a> IntoIterator for &'a QuestionCatalog {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// JSON Schema describing catalog documents.
pub fn catalog_schema() -> Schema {
    schema_for!(CatalogDocument)
}

fn check_questions(questions: &[Question]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for (position, question) in questions.iter().enumerate() {
        if question.id.trim().is_empty() {
            return Err(CatalogError::EmptyId(position));
        }
        if !seen.insert(question.id.as_str()) {
            return Err(CatalogError::DuplicateId(question.id.clone()));
        }

        if let QuestionKind::Input {
            validation: Some(validation),
            ..
        } = &question.kind
            && let Some(pattern) = &validation.pattern
        {
            Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
                question_id: question.id.clone(),
                source,
            })?;
        }

        let mut values = HashSet::new();
        for option in question.options() {
            if !values.insert(option.value.as_str()) {
                return Err(CatalogError::DuplicateOption {
                    question_id: question.id.clone(),
                    value: option.value.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_lists_question_variants() {
        let schema = serde_json::to_string(&catalog_schema()).expect("serialize schema");
        assert!(schema.contains("image-upload"));
        assert!(schema.contains("questions"));
    }

    #[test]
    fn deserialize_enforces_unique_ids() {
        let result = serde_json::from_value::<QuestionCatalog>(json!({
            "questions": [
                { "id": "q1", "type": "input", "title": "One" },
                { "id": "q1", "type": "input", "title": "Two" }
            ]
        }));
        let error = result.expect_err("duplicate ids");
        assert!(error.to_string().contains("more than once"));
    }
}
