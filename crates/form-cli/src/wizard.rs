use form_spec::{
    Answer, AnswerSet, OverviewEntry, Progress, Question, QuestionKind, StateChange,
    ValidationError, render_overview_text,
};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: question prompts only.
    Clean,
    /// Verbose output: progress, state changes, and error codes.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts, review screens, and the final answer set.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn show_header(&mut self, title: Option<&str>, description: Option<&str>) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", title.unwrap_or("Questionnaire"));
        if let Some(description) = description {
            println!("{}", description);
        }
        println!("Type 'back' to return to the previous question or 'exit' to quit.");
        self.header_printed = true;
    }

    pub fn show_prompt(&self, progress: &Progress, question: &Question, answer: Option<&Answer>) {
        let prompt = PromptContext::new(progress, question, answer);
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} ({:.0}%)",
                progress.label(),
                progress.percentage()
            );
        }
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.title);
        if prompt.required {
            line.push_str(" *");
        }
        println!("{}", line);
        if let Some(description) = &prompt.description {
            println!("{}", description);
        }
        for detail in &prompt.details {
            println!("  {}", detail);
        }
        if let Some(current) = &prompt.current {
            println!("Current answer: {}", current);
        }
        println!("{}", prompt.hint);
    }

    pub fn show_overview(&self, entries: &[OverviewEntry]) {
        println!("{}", render_overview_text(entries));
        println!("Type 'edit <number>' to change an answer, 'back' to return, or 'submit'.");
    }

    pub fn show_validation_error(&self, error: &ValidationError) {
        eprintln!("Invalid answer: {}", error.message);
        if self.verbosity.is_verbose() {
            eprintln!("  Code: {}", error.code);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_notice(&self, message: &str) {
        println!("{}", message);
    }

    pub fn show_completion(&self, answer_set: &AnswerSet) {
        println!("Done ✅");
        match answer_set.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match answer_set.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub details: Vec<String>,
    pub current: Option<String>,
    pub hint: String,
}

impl PromptContext {
    pub fn new(progress: &Progress, question: &Question, answer: Option<&Answer>) -> Self {
        let selected: Vec<&str> = answer
            .and_then(|answer| answer.value.as_ref())
            .map(|value| match value.as_selections() {
                Some(values) => values.iter().map(String::as_str).collect(),
                None => value.as_text().into_iter().collect(),
            })
            .unwrap_or_default();

        let details = match &question.kind {
            QuestionKind::SingleChoice { options } => options
                .iter()
                .enumerate()
                .map(|(position, option)| format!("{}) {}", position + 1, option.label))
                .collect(),
            QuestionKind::MultipleChoice { options, .. } => options
                .iter()
                .enumerate()
                .map(|(position, option)| {
                    let mark = if selected.contains(&option.value.as_str()) {
                        "x"
                    } else {
                        " "
                    };
                    format!("{}) [{}] {}", position + 1, mark, option.label)
                })
                .collect(),
            QuestionKind::Image {
                image_url,
                alt_text,
                caption,
            } => {
                let mut lines = vec![format!(
                    "[image] {} ({})",
                    image_url,
                    alt_text.as_deref().unwrap_or("no description")
                )];
                lines.extend(caption.clone());
                lines
            }
            QuestionKind::Input { .. } | QuestionKind::ImageUpload { .. } => Vec::new(),
        };

        let current = match &question.kind {
            QuestionKind::SingleChoice { .. } => selected
                .first()
                .map(|value| question.option_label(value).unwrap_or(value).to_string()),
            QuestionKind::Input { .. } | QuestionKind::ImageUpload { .. } => {
                selected.first().map(|value| value.to_string())
            }
            _ => None,
        };

        Self {
            index: progress.current,
            total: progress.total,
            title: question.title.clone(),
            description: question.description.clone(),
            required: question.required,
            details,
            current,
            hint: hint_for(question),
        }
    }
}

fn hint_for(question: &Question) -> String {
    match &question.kind {
        QuestionKind::SingleChoice { .. } => "(enter a number or value)".to_string(),
        QuestionKind::MultipleChoice { max_selections, .. } => {
            let cap = max_selections
                .map(|max| format!(", up to {}", max))
                .unwrap_or_default();
            format!("(numbers or values separated by commas toggle choices{cap}; Enter when done)")
        }
        QuestionKind::Input {
            input_type,
            placeholder,
            ..
        } => match placeholder {
            Some(placeholder) => format!("({}, e.g. {})", input_type.as_str(), placeholder),
            None => format!("({})", input_type.as_str()),
        },
        QuestionKind::Image { .. } => "(press Enter to continue)".to_string(),
        QuestionKind::ImageUpload {
            max_size_mb,
            accepted_formats,
        } => {
            let names = accepted_formats
                .iter()
                .map(|format| format.rsplit('/').next().unwrap_or(format))
                .collect::<Vec<_>>()
                .join("/");
            format!("(path to a {names} file up to {max_size_mb}MB)")
        }
    }
}

/// One-line description of a state change for verbose output.
pub fn describe_change(change: &StateChange) -> String {
    match change {
        StateChange::AnswerUpdated { question_id } => {
            format!("answer for '{}' updated", question_id)
        }
        StateChange::Navigated { from, to } => {
            format!("moved from question {} to {}", from + 1, to + 1)
        }
        StateChange::OverviewShown => "showing overview".to_string(),
        StateChange::Submitted => "form submitted".to_string(),
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
