#![allow(missing_docs)]

pub mod answers;
pub mod engine;
pub mod overview;
pub mod progress;
pub mod spec;
pub mod state;
pub mod validate;

pub use answers::{Answer, AnswerSet, AnswerShape, AnswerValue};
pub use engine::{EngineError, FormEngine, StateChange, StateObserver, SubscriptionId};
pub use overview::{AnswerDisplay, OverviewEntry, build_overview, render_overview_text};
pub use progress::Progress;
pub use spec::{
    CatalogDocument, CatalogError, ChoiceOption, InputType, InputValidation, Question,
    QuestionCatalog, QuestionKind, catalog_schema,
};
pub use state::{Screen, SessionState};
pub use validate::{
    ValidationError, check_upload, toggle_selection, validate_answer, validate_input,
};
