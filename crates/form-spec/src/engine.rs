//! Session state machine for a question catalog.
//!
//! The engine owns one [`SessionState`] and moves it between three screens:
//! answering a question, reviewing the overview, and complete. Every command
//! is total: out-of-range indices are clamped and impossible moves are no-ops.
//! Observers registered with [`FormEngine::subscribe`] are called synchronously
//! after each command that changed the state.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::answers::{Answer, AnswerSet};
use crate::overview::{OverviewEntry, build_overview};
use crate::progress::Progress;
use crate::spec::catalog::QuestionCatalog;
use crate::spec::question::Question;
use crate::state::{Screen, SessionState};

/// Raised when a host hands back a snapshot the engine could never have produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("overview and completion flags are both set")]
    OverviewAfterComplete,
    #[error("question index {index} is outside a catalog of {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("answer stored under '{key}' belongs to question '{question_id}'")]
    MismatchedAnswerKey { key: String, question_id: String },
}

/// What a command changed, passed to observers alongside the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    AnswerUpdated { question_id: String },
    Navigated { from: usize, to: usize },
    OverviewShown,
    Submitted,
}

/// Callback invoked after every state change.
pub trait StateObserver {
    fn state_changed(&mut self, state: &SessionState, change: &StateChange);
}

impl<F> StateObserver for F
where
    F: FnMut(&SessionState, &StateChange),
{
    fn state_changed(&mut self, state: &SessionState, change: &StateChange) {
        self(state, change)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct FormEngine {
    catalog: QuestionCatalog,
    state: SessionState,
    observers: Vec<(SubscriptionId, Box<dyn StateObserver>)>,
    next_subscription: u64,
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("catalog", &self.catalog)
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl FormEngine {
    /// Starts a session on the first question with no answers.
    pub fn new(catalog: QuestionCatalog) -> Self {
        Self {
            catalog,
            state: SessionState::default(),
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Resumes a session from a snapshot previously taken with [`FormEngine::state`].
    pub fn restore(catalog: QuestionCatalog, state: SessionState) -> Result<Self, EngineError> {
        if state.show_overview && state.is_complete {
            return Err(EngineError::OverviewAfterComplete);
        }
        if state.current_question_index > catalog.last_index() {
            return Err(EngineError::IndexOutOfRange {
                index: state.current_question_index,
                len: catalog.len(),
            });
        }
        if let Some((key, answer)) = state
            .answers
            .iter()
            .find(|(key, answer)| **key != answer.question_id)
        {
            return Err(EngineError::MismatchedAnswerKey {
                key: key.clone(),
                question_id: answer.question_id.clone(),
            });
        }
        Ok(Self {
            catalog,
            state,
            observers: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn screen(&self) -> Screen {
        self.state.screen()
    }

    pub fn subscribe<O>(&mut self, observer: O) -> SubscriptionId
    where
        O: StateObserver + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer; returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    /// Stores `answer`, replacing any previous answer for the same question.
    ///
    /// The value is not checked against the question's type; that is left to
    /// the caller (see [`crate::validate`]).
    pub fn update_answer(&mut self, answer: Answer) {
        let question_id = answer.question_id.clone();
        debug!(question_id = %question_id, blank = answer.is_blank(), "answer updated");
        self.state.answers.insert(question_id.clone(), answer);
        self.notify(StateChange::AnswerUpdated { question_id });
    }

    /// Advances one question, or opens the overview from the last question.
    ///
    /// Does not consult [`FormEngine::can_proceed`]; callers gate the call.
    /// A submitted form never reopens the overview; the flags stay exclusive.
    pub fn go_to_next(&mut self) {
        let from = self.state.current_question_index;
        if from + 1 >= self.catalog.len() {
            if self.state.is_complete {
                warn!(index = from, "not reopening the overview on a completed form");
                return;
            }
            if !self.state.show_overview {
                debug!(index = from, "opening overview");
                self.state.show_overview = true;
                self.notify(StateChange::OverviewShown);
            }
            return;
        }
        self.move_to(from + 1);
    }

    /// Steps back one question; does nothing on the first question.
    pub fn go_to_previous(&mut self) {
        let from = self.state.current_question_index;
        if from == 0 {
            return;
        }
        self.move_to(from - 1);
    }

    /// Jumps to `index`, saturated into the catalog's bounds, and leaves the overview.
    pub fn go_to_question(&mut self, index: i64) {
        let target = self.clamp_index(index);
        if target == self.state.current_question_index && !self.state.show_overview {
            return;
        }
        self.state.show_overview = false;
        self.move_to(target);
    }

    /// Marks the session complete. There is no way back: later navigation
    /// moves the index but the screen stays [`Screen::Complete`].
    pub fn submit_form(&mut self) {
        if self.state.is_complete {
            return;
        }
        info!(answers = self.state.answers.len(), "form submitted");
        self.state.is_complete = true;
        self.state.show_overview = false;
        self.notify(StateChange::Submitted);
    }

    /// Whether the current question's required-answer gate is satisfied.
    ///
    /// Only presence matters: per-type validation never blocks navigation.
    pub fn can_proceed(&self) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        if !question.required {
            return true;
        }
        self.state
            .answers
            .get(&question.id)
            .is_some_and(|answer| !answer.is_blank())
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.catalog.get(self.state.current_question_index)
    }

    pub fn current_answer(&self) -> Option<&Answer> {
        let question = self.current_question()?;
        self.state.answers.get(&question.id)
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.state.current_question_index + 1, self.catalog.len())
    }

    pub fn overview(&self) -> Vec<OverviewEntry> {
        build_overview(&self.catalog, &self.state.answers)
    }

    /// Answers in catalog order, available once the form has been submitted.
    pub fn answer_set(&self) -> Option<AnswerSet> {
        if !self.state.is_complete {
            return None;
        }
        let answers = self
            .catalog
            .iter()
            .filter_map(|question| self.state.answers.get(&question.id).cloned())
            .collect();
        Some(AnswerSet {
            form_title: self.catalog.title().map(str::to_string),
            answers,
        })
    }

    fn clamp_index(&self, index: i64) -> usize {
        if index <= 0 {
            return 0;
        }
        usize::try_from(index)
            .unwrap_or(usize::MAX)
            .min(self.catalog.last_index())
    }

    fn move_to(&mut self, to: usize) {
        let from = self.state.current_question_index;
        self.state.current_question_index = to;
        debug!(from, to, "navigated");
        self.notify(StateChange::Navigated { from, to });
    }

    fn notify(&mut self, change: StateChange) {
        for (_, observer) in &mut self.observers {
            observer.state_changed(&self.state, &change);
        }
    }
}
