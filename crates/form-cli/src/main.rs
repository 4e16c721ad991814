mod wizard;

use clap::{Parser, Subcommand};
use form_spec::{
    Answer, FormEngine, Question, QuestionCatalog, QuestionKind, Screen, SessionState,
    StateChange, ValidationError, catalog_schema, check_upload, toggle_selection,
    validate_answer, validate_input,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wizard::{AnswerParseError, Verbosity, WizardPresenter, describe_change};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Environment variable holding the log filter (e.g. `form_spec=debug`).
const LOG_ENV: &str = "FORM_WIZARD_LOG";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based questionnaire wizard",
    long_about = "Walks a question catalog one question at a time, then shows a review screen before submitting"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a catalog interactively in a text shell.
    Wizard {
        /// Path to the catalog JSON.
        #[arg(long, value_name = "CATALOG")]
        catalog: PathBuf,
        /// Optional JSON array of answers to start from.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (progress, state changes, error codes).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit answer JSON on completion.
        #[arg(long)]
        answers_json: bool,
    },
    /// Parse a catalog and report whether it is usable.
    Check {
        /// Path to the catalog JSON.
        #[arg(long, value_name = "CATALOG")]
        catalog: PathBuf,
    },
    /// Print the JSON Schema for catalog documents.
    Schema,
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Wizard {
            catalog,
            answers,
            verbose,
            answers_json,
        } => run_wizard(catalog, answers, verbose, answers_json),
        Command::Check { catalog } => run_check(catalog),
        Command::Schema => run_schema(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}

fn load_catalog(path: &Path) -> CliResult<QuestionCatalog> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read catalog {}: {}", path.display(), err))?;
    Ok(QuestionCatalog::from_json_str(&contents)?)
}

fn run_check(catalog_path: PathBuf) -> CliResult<()> {
    let catalog = load_catalog(&catalog_path)?;
    println!(
        "Catalog OK: {} ({} questions)",
        catalog.title().unwrap_or("untitled"),
        catalog.len()
    );
    for (index, question) in catalog.iter().enumerate() {
        let mut line = format!(" {}. {} ({})", index + 1, question.id, question.kind_label());
        if question.required {
            line.push_str(" [required]");
        }
        println!("{}", line);
    }
    Ok(())
}

fn run_schema() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&catalog_schema())?);
    Ok(())
}

fn run_wizard(
    catalog_path: PathBuf,
    answers_path: Option<PathBuf>,
    verbose: bool,
    answers_json: bool,
) -> CliResult<()> {
    let catalog = load_catalog(&catalog_path)?;
    let mut engine = FormEngine::new(catalog);

    if let Some(path) = answers_path {
        let contents = fs::read_to_string(path)?;
        let initial: Vec<Answer> = serde_json::from_str(&contents)?;
        seed_answers(&mut engine, initial);
    }

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    if presenter.verbosity().is_verbose() {
        engine.subscribe(|_: &SessionState, change: &StateChange| {
            println!("State: {}", describe_change(change));
        });
    }

    let stdin = io::stdin();
    run_session(&mut engine, &mut presenter, &mut stdin.lock())
}

/// Loads answers from a file, skipping any whose question is not in the catalog.
fn seed_answers(engine: &mut FormEngine, answers: Vec<Answer>) {
    for answer in answers {
        let Some(question) = engine.catalog().find(&answer.question_id) else {
            warn!(question_id = %answer.question_id, "ignoring answer for unknown question");
            continue;
        };
        if let Some(error) = validate_answer(question, &answer) {
            warn!(
                question_id = %answer.question_id,
                code = %error.code,
                "initial answer fails validation"
            );
        }
        engine.update_answer(answer);
    }
}

fn run_session<R: BufRead>(
    engine: &mut FormEngine,
    presenter: &mut WizardPresenter,
    input: &mut R,
) -> CliResult<()> {
    presenter.show_header(engine.catalog().title(), engine.catalog().description());

    loop {
        match engine.screen() {
            Screen::Complete => {
                let answer_set = engine
                    .answer_set()
                    .ok_or("form is complete but produced no answers")?;
                presenter.show_completion(&answer_set);
                return Ok(());
            }
            Screen::Overview => {
                presenter.show_overview(&engine.overview());
                let line = read_command(input)?;
                handle_overview_command(engine, presenter, &line);
            }
            Screen::Answering { .. } => {
                let Some(question) = engine.current_question().cloned() else {
                    presenter.show_notice("This catalog has no questions.");
                    engine.go_to_next();
                    continue;
                };
                presenter.show_prompt(&engine.progress(), &question, engine.current_answer());
                let line = read_command(input)?;
                if line.eq_ignore_ascii_case("back") {
                    if engine.state().current_question_index() == 0 {
                        presenter.show_notice("Already at the first question.");
                    }
                    engine.go_to_previous();
                    continue;
                }
                match parse_reply(&question, engine.current_answer(), &line) {
                    Ok(Reply::Advance(answer)) => {
                        if let Some(answer) = answer {
                            engine.update_answer(answer);
                        }
                        if engine.can_proceed() {
                            engine.go_to_next();
                        } else {
                            presenter.show_notice("This question requires an answer.");
                        }
                    }
                    Ok(Reply::Stay { answer, error }) => {
                        engine.update_answer(answer);
                        if let Some(error) = error {
                            presenter.show_validation_error(&error);
                        }
                    }
                    Err(err) => presenter.show_parse_error(&err),
                }
            }
        }
    }
}

fn handle_overview_command(engine: &mut FormEngine, presenter: &WizardPresenter, line: &str) {
    let lowered = line.to_ascii_lowercase();
    match lowered.as_str() {
        "submit" => engine.submit_form(),
        "back" => {
            let last = engine.catalog().last_index();
            engine.go_to_question(i64::try_from(last).unwrap_or(i64::MAX));
        }
        _ => {
            let target = lowered.strip_prefix("edit").unwrap_or(&lowered).trim();
            let entry = target
                .parse::<usize>()
                .ok()
                .and_then(|number| {
                    engine
                        .overview()
                        .into_iter()
                        .find(|entry| entry.number() == number)
                });
            match entry {
                Some(entry) => {
                    debug!(question_id = %entry.question_id, "editing from overview");
                    engine.go_to_question(i64::try_from(entry.index).unwrap_or(i64::MAX));
                }
                None => presenter.show_parse_error(&AnswerParseError::new(
                    format!("Unknown command '{}'.", line),
                    Some("edit <number>, back, or submit".to_string()),
                )),
            }
        }
    }
}

fn read_command<R: BufRead>(input: &mut R) -> CliResult<String> {
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err("input closed before the form was submitted".into());
    }
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        return Err("wizard aborted by user".into());
    }
    Ok(trimmed.to_string())
}

/// What a line of input means for the current question.
#[derive(Debug, PartialEq)]
enum Reply {
    /// Store the answer, if any, and move on when the question allows it.
    Advance(Option<Answer>),
    /// Store the answer and ask the same question again.
    Stay {
        answer: Answer,
        error: Option<ValidationError>,
    },
}

fn parse_reply(
    question: &Question,
    current: Option<&Answer>,
    raw: &str,
) -> Result<Reply, AnswerParseError> {
    if raw.is_empty() || question.is_display_only() {
        return Ok(Reply::Advance(None));
    }

    match &question.kind {
        QuestionKind::SingleChoice { .. } => {
            let value = resolve_option(question, raw)?;
            Ok(Reply::Advance(Some(Answer::text(&question.id, value))))
        }
        QuestionKind::MultipleChoice { .. } => parse_toggles(question, current, raw),
        QuestionKind::Input { .. } => {
            let answer = Answer::text(&question.id, raw);
            match validate_input(question, raw) {
                Some(error) => Ok(Reply::Stay {
                    answer,
                    error: Some(error),
                }),
                None => Ok(Reply::Advance(Some(answer))),
            }
        }
        QuestionKind::ImageUpload { .. } => {
            let token = prepare_upload(question, Path::new(raw))?;
            Ok(Reply::Advance(Some(Answer::text(&question.id, token))))
        }
        QuestionKind::Image { .. } => Ok(Reply::Advance(None)),
    }
}

/// Accepts a 1-based option number, an option value, or an option label.
fn resolve_option(question: &Question, raw: &str) -> Result<String, AnswerParseError> {
    let options = question.options();
    if let Ok(number) = raw.parse::<usize>()
        && let Some(option) = number.checked_sub(1).and_then(|index| options.get(index))
    {
        return Ok(option.value.clone());
    }
    options
        .iter()
        .find(|option| {
            option.value.eq_ignore_ascii_case(raw) || option.label.eq_ignore_ascii_case(raw)
        })
        .map(|option| option.value.clone())
        .ok_or_else(|| {
            let allowed = options
                .iter()
                .map(|option| option.value.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(
                format!("Choose one of: {}.", allowed),
                Some(format!("a number from 1 to {} or one of: {}", options.len(), allowed)),
            )
        })
}

fn parse_toggles(
    question: &Question,
    current: Option<&Answer>,
    raw: &str,
) -> Result<Reply, AnswerParseError> {
    let mut selected = current
        .and_then(|answer| answer.value.as_ref())
        .and_then(|value| value.as_selections())
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    let mut capped = false;

    for token in raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        let value = resolve_option(question, token)?;
        let next = toggle_selection(question.max_selections(), &selected, &value);
        capped |= next == selected;
        selected = next;
    }

    let error = match question.max_selections() {
        Some(max) if capped => Some(ValidationError {
            question_id: question.id.clone(),
            message: format!("Select up to {} options", max),
            code: "max_selections".to_string(),
        }),
        _ => None,
    };
    Ok(Reply::Stay {
        answer: Answer::selections(&question.id, selected),
        error,
    })
}

/// Checks a local file against the upload rules and returns the token stored as the answer.
fn prepare_upload(question: &Question, path: &Path) -> Result<String, AnswerParseError> {
    let metadata = fs::metadata(path).map_err(|err| {
        AnswerParseError::new(
            format!("Could not read {}.", path.display()),
            Some(err.to_string()),
        )
    })?;
    if !metadata.is_file() {
        return Err(AnswerParseError::new(
            format!("{} is not a file.", path.display()),
            None,
        ));
    }
    let mime_type = mime_for_path(path);
    check_upload(question, mime_type, metadata.len()).map_err(|error| {
        AnswerParseError::new(error.message, Some(error.code))
    })?;
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(format!("file://{}", resolved.display()))
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const CATALOG: &str = include_str!("../../form-spec/tests/fixtures/sample_catalog.json");

    fn catalog() -> QuestionCatalog {
        QuestionCatalog::from_json_str(CATALOG).expect("catalog")
    }

    fn question(id: &str) -> Question {
        catalog().find(id).cloned().expect("question")
    }

    #[test]
    fn single_choice_accepts_number_value_and_label() {
        let question = question("hair_type");
        for raw in ["2", "wavy", "Wavy"] {
            assert_eq!(
                parse_reply(&question, None, raw).unwrap(),
                Reply::Advance(Some(Answer::text("hair_type", "wavy")))
            );
        }
        assert!(parse_reply(&question, None, "4").is_err());
        assert!(parse_reply(&question, None, "bald").is_err());
    }

    #[test]
    fn blank_line_advances_without_changing_the_answer() {
        assert_eq!(
            parse_reply(&question("email"), None, "").unwrap(),
            Reply::Advance(None)
        );
        assert_eq!(
            parse_reply(&question("guide"), None, "anything").unwrap(),
            Reply::Advance(None)
        );
    }

    #[test]
    fn toggles_respect_the_selection_cap() {
        let question = question("concerns");
        let reply = parse_toggles(&question, None, "1, 2, 3").unwrap();
        let Reply::Stay { answer, error } = reply else {
            panic!("expected to stay on the question");
        };
        assert_eq!(answer, Answer::selections("concerns", ["hairfall", "dandruff"]));
        assert_eq!(error.map(|error| error.code), Some("max_selections".to_string()));

        let reply = parse_toggles(&question, Some(&answer), "hairfall").unwrap();
        assert_eq!(
            reply,
            Reply::Stay {
                answer: Answer::selections("concerns", ["dandruff"]),
                error: None,
            }
        );
    }

    #[test]
    fn toggles_match_labels_containing_spaces() {
        let question = question("concerns");
        let reply = parse_toggles(&question, None, "Hair fall, dryness").unwrap();
        assert_eq!(
            reply,
            Reply::Stay {
                answer: Answer::selections("concerns", ["hairfall", "dryness"]),
                error: None,
            }
        );
    }

    #[test]
    fn invalid_input_is_kept_but_reported() {
        let reply = parse_reply(&question("email"), None, "not-an-email").unwrap();
        let Reply::Stay { answer, error } = reply else {
            panic!("expected to stay on the question");
        };
        assert_eq!(answer, Answer::text("email", "not-an-email"));
        assert_eq!(error.map(|error| error.code), Some("pattern_mismatch".to_string()));
    }

    #[test]
    fn uploads_are_checked_for_format_and_size() {
        let dir = TempDir::new().expect("temp dir");
        let question = question("scalp_photo");

        let photo = dir.path().join("scalp.PNG");
        fs::write(&photo, [0u8; 128]).expect("write photo");
        let token = prepare_upload(&question, &photo).expect("upload accepted");
        assert!(token.starts_with("file://"));
        assert!(token.ends_with("scalp.PNG"));

        let webp = dir.path().join("scalp.webp");
        fs::write(&webp, [0u8; 16]).expect("write webp");
        let err = prepare_upload(&question, &webp).unwrap_err();
        assert_eq!(err.debug_message.as_deref(), Some("unsupported_format"));

        let large = dir.path().join("large.jpg");
        fs::write(&large, vec![0u8; 3 * 1024 * 1024]).expect("write large");
        let err = prepare_upload(&question, &large).unwrap_err();
        assert_eq!(err.user_message, "File size must be less than 2MB");

        assert!(prepare_upload(&question, &dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn session_walks_to_completion() {
        let mut engine = FormEngine::new(catalog());
        let mut presenter = WizardPresenter::new(Verbosity::Clean, false);
        let script = [
            "",
            "curly",
            "1,2",
            "",
            "",
            "ada@example.com",
            "",
            "submit",
        ];
        let mut input = Cursor::new(format!("{}\n", script.join("\n")));

        run_session(&mut engine, &mut presenter, &mut input).expect("session completes");

        let answers = engine.answer_set().expect("answer set");
        let ids: Vec<_> = answers
            .answers
            .iter()
            .map(|answer| answer.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["hair_type", "concerns", "email"]);
        assert_eq!(
            answers.get("concerns"),
            Some(&Answer::selections("concerns", ["hairfall", "dandruff"]))
        );
    }

    #[test]
    fn overview_edit_returns_to_the_question() {
        let mut engine = FormEngine::new(catalog());
        engine.go_to_question(4);
        engine.go_to_next();
        let presenter = WizardPresenter::new(Verbosity::Clean, false);

        handle_overview_command(&mut engine, &presenter, "edit 4");
        assert_eq!(engine.screen(), Screen::Answering { index: 3 });

        engine.go_to_next();
        engine.go_to_next();
        handle_overview_command(&mut engine, &presenter, "edit 3");
        assert_eq!(engine.screen(), Screen::Overview);

        handle_overview_command(&mut engine, &presenter, "back");
        assert_eq!(engine.screen(), Screen::Answering { index: 4 });
    }

    #[test]
    fn exit_and_closed_input_abort_the_session() {
        let mut engine = FormEngine::new(catalog());
        let mut presenter = WizardPresenter::new(Verbosity::Clean, false);

        let err = run_session(&mut engine, &mut presenter, &mut Cursor::new("exit\n")).unwrap_err();
        assert_eq!(err.to_string(), "wizard aborted by user");

        let err = run_session(&mut engine, &mut presenter, &mut Cursor::new("")).unwrap_err();
        assert!(err.to_string().contains("input closed"));
        assert!(!engine.state().is_complete());
    }

    #[test]
    fn seeded_answers_skip_unknown_questions() {
        let mut engine = FormEngine::new(catalog());
        seed_answers(
            &mut engine,
            vec![Answer::text("hair_type", "wavy"), Answer::text("ghost", "boo")],
        );
        assert_eq!(engine.state().answers().len(), 1);
        assert!(engine.can_proceed());
    }
}
