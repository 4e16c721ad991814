use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::answers::Answer;

/// Which screen the session is on, derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Answering { index: usize },
    Overview,
    Complete,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Answering { .. } => "answering",
            Screen::Overview => "overview",
            Screen::Complete => "complete",
        }
    }
}

/// Mutable session state owned by one engine.
///
/// `show_overview` and `is_complete` are never both set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub(crate) current_question_index: usize,
    #[serde(default)]
    pub(crate) answers: HashMap<String, Answer>,
    #[serde(default)]
    pub(crate) is_complete: bool,
    #[serde(default)]
    pub(crate) show_overview: bool,
}

impl SessionState {
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn answers(&self) -> &HashMap<String, Answer> {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn show_overview(&self) -> bool {
        self.show_overview
    }

    pub fn screen(&self) -> Screen {
        if self.is_complete {
            Screen::Complete
        } else if self.show_overview {
            Screen::Overview
        } else {
            Screen::Answering {
                index: self.current_question_index,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_answering_first_question() {
        let state = SessionState::default();
        assert_eq!(state.screen(), Screen::Answering { index: 0 });
        assert!(state.answers().is_empty());
        assert!(!state.is_complete());
        assert!(!state.show_overview());
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let value = serde_json::to_value(SessionState::default()).expect("serialize");
        assert_eq!(value["currentQuestionIndex"], 0);
        assert_eq!(value["showOverview"], false);
        assert_eq!(value["isComplete"], false);
    }
}
