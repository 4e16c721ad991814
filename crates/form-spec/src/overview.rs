use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::answers::{Answer, AnswerValue};
use crate::spec::catalog::QuestionCatalog;
use crate::spec::question::{Question, QuestionKind};

/// How a stored answer is shown on the review screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerDisplay {
    NotAnswered,
    /// Label of the selected option, or the raw value if no option matches.
    Choice(String),
    /// Labels of the selected options, in option order.
    Choices(Vec<String>),
    NoSelections,
    Text(String),
    /// Opaque upload token (for example a data URL).
    Upload(String),
}

impl fmt::Display for AnswerDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerDisplay::NotAnswered => write!(f, "Not answered"),
            AnswerDisplay::Choice(label) | AnswerDisplay::Text(label) => write!(f, "{label}"),
            AnswerDisplay::Choices(labels) => write!(f, "{}", labels.join(", ")),
            AnswerDisplay::NoSelections => write!(f, "No selections"),
            AnswerDisplay::Upload(token) => write!(f, "Uploaded image ({})", abbreviate(token)),
        }
    }
}

/// One reviewable question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewEntry {
    /// Catalog index; pass it to `go_to_question` to edit this answer.
    pub index: usize,
    pub question_id: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub display: AnswerDisplay,
}

impl OverviewEntry {
    /// 1-based number shown next to the entry.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Builds the review list in catalog order, skipping display-only questions.
pub fn build_overview(
    catalog: &QuestionCatalog,
    answers: &HashMap<String, Answer>,
) -> Vec<OverviewEntry> {
    catalog
        .iter()
        .enumerate()
        .filter(|(_, question)| !question.is_display_only())
        .map(|(index, question)| OverviewEntry {
            index,
            question_id: question.id.clone(),
            title: question.title.clone(),
            description: question.description.clone(),
            required: question.required,
            display: display_answer(question, answers.get(&question.id)),
        })
        .collect()
}

pub fn display_answer(question: &Question, answer: Option<&Answer>) -> AnswerDisplay {
    let value = match answer.and_then(|answer| answer.value.as_ref()) {
        None => return AnswerDisplay::NotAnswered,
        Some(AnswerValue::Text(text)) if text.is_empty() => return AnswerDisplay::NotAnswered,
        Some(value) => value,
    };

    match &question.kind {
        QuestionKind::SingleChoice { .. } => {
            let raw = flatten(value);
            let label = question.option_label(&raw).map(str::to_string);
            AnswerDisplay::Choice(label.unwrap_or(raw))
        }
        QuestionKind::MultipleChoice { options, .. } => {
            let selected: Vec<&str> = match value {
                AnswerValue::Selections(values) => values.iter().map(String::as_str).collect(),
                AnswerValue::Text(text) => vec![text.as_str()],
            };
            let labels: Vec<String> = options
                .iter()
                .filter(|option| selected.contains(&option.value.as_str()))
                .map(|option| option.label.clone())
                .collect();
            if labels.is_empty() {
                AnswerDisplay::NoSelections
            } else {
                AnswerDisplay::Choices(labels)
            }
        }
        QuestionKind::Input { .. } => AnswerDisplay::Text(flatten(value)),
        QuestionKind::ImageUpload { .. } => AnswerDisplay::Upload(flatten(value)),
        QuestionKind::Image { .. } => AnswerDisplay::NotAnswered,
    }
}

/// Renders the review screen as plain text.
pub fn render_overview_text(entries: &[OverviewEntry]) -> String {
    let mut lines = vec![
        "Review your answers".to_string(),
        "Please review your responses before submitting".to_string(),
    ];
    for entry in entries {
        let mut heading = format!(" {}. {}", entry.number(), entry.title);
        if entry.required {
            heading.push_str(" [required]");
        }
        lines.push(heading);
        if let Some(description) = &entry.description {
            lines.push(format!("    {}", description));
        }
        lines.push(format!("    {}", entry.display));
    }
    lines.join("\n")
}

fn flatten(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Text(text) => text.clone(),
        AnswerValue::Selections(values) => values.join(", "),
    }
}

fn abbreviate(token: &str) -> String {
    const LIMIT: usize = 32;
    if token.chars().count() <= LIMIT {
        token.to_string()
    } else {
        let head: String = token.chars().take(LIMIT).collect();
        format!("{head}…")
    }
}
