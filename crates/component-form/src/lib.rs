use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    Answer, CatalogError, EngineError, FormEngine, QuestionCatalog, Screen, SessionState,
    catalog_schema, validate_answer as check_answer,
};

const DEFAULT_CATALOG: &str = include_str!("../../form-spec/tests/fixtures/sample_catalog.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to parse session state: {0}")]
    StateParse(#[source] serde_json::Error),
    #[error("failed to parse command: {0}")]
    CommandParse(#[source] serde_json::Error),
    #[error("failed to parse answer: {0}")]
    AnswerParse(#[source] serde_json::Error),
    #[error("question '{0}' is not in the catalog")]
    UnknownQuestion(String),
    #[error("session state rejected: {0}")]
    Restore(#[from] EngineError),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    catalog_json: Option<String>,
}

/// Commands a host can send; mirrors the engine's command surface.
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Command {
    UpdateAnswer { answer: Answer },
    Next,
    Previous,
    GoTo { index: i64 },
    Submit,
}

fn load_catalog(config_json: &str) -> Result<QuestionCatalog, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let catalog_json = config.catalog_json.as_deref().unwrap_or(DEFAULT_CATALOG);
    Ok(QuestionCatalog::from_json_str(catalog_json)?)
}

fn restore_engine(config_json: &str, state_json: &str) -> Result<FormEngine, ComponentError> {
    let catalog = load_catalog(config_json)?;
    if state_json.trim().is_empty() {
        return Ok(FormEngine::new(catalog));
    }
    let state: SessionState =
        serde_json::from_str(state_json).map_err(ComponentError::StateParse)?;
    Ok(FormEngine::restore(catalog, state)?)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn build_view(engine: &FormEngine, accepted: bool) -> Result<Value, ComponentError> {
    let screen = engine.screen();
    let progress = engine.progress();
    let overview = match screen {
        Screen::Overview => encode(&engine.overview())?,
        _ => Value::Null,
    };
    let answer_set = match engine.answer_set() {
        Some(set) => encode(&set)?,
        None => Value::Null,
    };

    Ok(json!({
        "screen": screen.as_str(),
        "accepted": accepted,
        "title": engine.catalog().title(),
        "progress": {
            "current": progress.current,
            "total": progress.total,
            "percentage": progress.percentage(),
            "label": progress.label(),
        },
        "question": encode(&engine.current_question())?,
        "answer": encode(&engine.current_answer())?,
        "can_proceed": engine.can_proceed(),
        "overview": overview,
        "answer_set": answer_set,
        "state": encode(engine.state())?,
    }))
}

/// Returns the catalog document the component is configured with.
pub fn describe(config_json: &str) -> String {
    respond(load_catalog(config_json).and_then(|catalog| encode(&catalog)))
}

/// Returns the JSON Schema for catalog documents.
pub fn get_catalog_schema() -> String {
    respond(encode(&catalog_schema()))
}

/// Starts a fresh session and returns its first view.
pub fn start(config_json: &str) -> String {
    respond(
        load_catalog(config_json).and_then(|catalog| build_view(&FormEngine::new(catalog), true)),
    )
}

/// Renders the view for a host-held session state.
pub fn view(config_json: &str, state_json: &str) -> String {
    respond(restore_engine(config_json, state_json).and_then(|engine| build_view(&engine, true)))
}

/// Applies one command to a host-held session state and returns the new view.
///
/// `next` is only applied when the current question may be left; otherwise the
/// view comes back unchanged with `accepted: false`.
pub fn dispatch(config_json: &str, state_json: &str, command_json: &str) -> String {
    respond(restore_engine(config_json, state_json).and_then(|mut engine| {
        let command: Command =
            serde_json::from_str(command_json).map_err(ComponentError::CommandParse)?;
        debug!(?command, "dispatching command");
        let accepted = match command {
            Command::UpdateAnswer { answer } => {
                engine.update_answer(answer);
                true
            }
            Command::Next if engine.can_proceed() => {
                engine.go_to_next();
                true
            }
            Command::Next => false,
            Command::Previous => {
                engine.go_to_previous();
                true
            }
            Command::GoTo { index } => {
                engine.go_to_question(index);
                true
            }
            Command::Submit => {
                engine.submit_form();
                true
            }
        };
        build_view(&engine, accepted)
    }))
}

/// Runs the per-type checks for an answer without touching any session.
pub fn validate_answer(config_json: &str, answer_json: &str) -> String {
    respond(load_catalog(config_json).and_then(|catalog| {
        let answer: Answer =
            serde_json::from_str(answer_json).map_err(ComponentError::AnswerParse)?;
        let question = catalog
            .find(&answer.question_id)
            .ok_or_else(|| ComponentError::UnknownQuestion(answer.question_id.clone()))?;
        let error = check_answer(question, &answer);
        Ok(json!({
            "valid": error.is_none(),
            "error": encode(&error)?,
        }))
    }))
}
