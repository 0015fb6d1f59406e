use std::io::BufRead;

use serde_json::Value;

/// Controls which bits of state the fill session prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: status, visible and hidden fields.
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

/// Prints prompts and status while a respondent fills out a form.
pub struct FillPresenter {
    verbosity: Verbosity,
    header_printed: bool,
}

impl FillPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self, payload: &FormPayload) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", payload.form_title);
        if let Some(description) = &payload.description {
            println!("{}", description);
        }
        self.header_printed = true;
    }

    pub fn show_status(&self, payload: &FormPayload) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Status: {} ({}/{})",
            payload.status,
            payload.progress.answered,
            payload.progress.total
        );
        let hidden: Vec<&str> = payload
            .fields
            .iter()
            .filter(|field| !field.visible)
            .map(|field| field.id.as_str())
            .collect();
        if !hidden.is_empty() {
            println!("Hidden: {}", hidden.join(", "));
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.label)
        } else {
            format!("{} {}", prompt.index, prompt.label)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
    }

    pub fn show_skipped(&self, field: &PayloadField) {
        println!("{} (file upload, skipped)", field.label);
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, responses: &Value, missing_required: &[String]) {
        if missing_required.is_empty() {
            println!("Done");
        } else {
            println!("Stopped early; missing: {}", missing_required.join(", "));
        }
        match serde_json::to_string_pretty(responses) {
            Ok(pretty) => println!("{}", pretty),
            Err(err) => eprintln!("Failed to serialize responses: {}", err),
        }
    }
}

/// Render payload extracted from the component output.
pub struct FormPayload {
    pub form_title: String,
    pub description: Option<String>,
    pub status: String,
    pub progress: RenderProgress,
    pub fields: Vec<PayloadField>,
}

impl FormPayload {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let form_title = json
            .get("form_title")
            .and_then(Value::as_str)
            .ok_or_else(|| "form payload missing form_title".to_string())?
            .to_string();
        let description = json
            .get("description")
            .and_then(Value::as_str)
            .map(|value| value.to_string());
        let status = json
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("need_input")
            .to_string();
        let fields: Vec<PayloadField> = json
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| "form payload missing fields".to_string())?
            .iter()
            .map(PayloadField::from_json)
            .collect::<Result<_, _>>()?;
        // Progress is omitted when the form hides its progress bar.
        let progress = match json.get("progress").and_then(Value::as_object) {
            Some(progress) => RenderProgress {
                answered: progress
                    .get("answered")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as usize,
                total: progress.get("total").and_then(Value::as_u64).unwrap_or(0) as usize,
            },
            None => RenderProgress {
                answered: 0,
                total: 0,
            },
        };
        Ok(Self {
            form_title,
            description,
            status,
            progress,
            fields,
        })
    }
}

/// Progress counters from the render payload.
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// Minimal view of a field used for prompting.
pub struct PayloadField {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<String>,
    pub visible: bool,
}

impl PayloadField {
    fn from_json(value: &Value) -> Result<Self, String> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "field missing id".to_string())?
            .to_string();
        let label = value
            .get("label")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("field '{}' missing label", id))?
            .to_string();
        let kind = FieldKind::from_label(value.get("type").and_then(Value::as_str).unwrap_or(""));
        let required = value
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let options = value
            .get("options")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let visible = value
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        Ok(Self {
            id,
            label,
            kind,
            required,
            options,
            visible,
        })
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub required: bool,
    pub hint: Option<String>,
}

impl PromptContext {
    pub fn new(field: &PayloadField, progress: &RenderProgress) -> Self {
        Self {
            index: (progress.answered + 1).max(1),
            total: progress.total,
            label: field.label.clone(),
            required: field.required,
            hint: field.kind.hint(&field.options),
        }
    }
}

/// Prompt styles, one per field type label in the render payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Select,
    MultiSelect,
    Attachment,
    Unknown,
}

impl FieldKind {
    fn from_label(label: &str) -> Self {
        match label {
            "singleLineText" => FieldKind::Text,
            "multilineText" => FieldKind::LongText,
            "singleSelect" => FieldKind::Select,
            "multipleSelect" => FieldKind::MultiSelect,
            "attachment" => FieldKind::Attachment,
            _ => FieldKind::Unknown,
        }
    }

    fn hint(&self, options: &[String]) -> Option<String> {
        match self {
            FieldKind::Select if !options.is_empty() => Some(format!("({})", options.join("/"))),
            FieldKind::MultiSelect if !options.is_empty() => {
                Some(format!("(comma separated: {})", options.join(", ")))
            }
            FieldKind::LongText => Some("(use \\n for line breaks)".to_string()),
            _ => None,
        }
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

/// What happened when a field was prompted.
pub enum PromptOutcome {
    Answered(Value),
    Skipped,
    EndOfInput,
}

/// Prompts until the input parses, the field is skipped, or input runs out.
pub fn prompt_field<R: BufRead>(
    prompt: &PromptContext,
    field: &PayloadField,
    presenter: &FillPresenter,
    input: &mut R,
) -> std::io::Result<PromptOutcome> {
    loop {
        presenter.show_prompt(prompt);
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(PromptOutcome::EndOfInput);
        }
        match parse_answer(field, line.trim_end_matches(['\r', '\n'])) {
            Ok(Some(value)) => return Ok(PromptOutcome::Answered(value)),
            Ok(None) if field.required => presenter.show_parse_error(&AnswerParseError::new(
                format!("{} is required", field.label),
                None,
            )),
            Ok(None) => return Ok(PromptOutcome::Skipped),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// Turns a typed line into a response value; a blank line means no answer.
pub fn parse_answer(field: &PayloadField, raw: &str) -> Result<Option<Value>, AnswerParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match field.kind {
        FieldKind::Text | FieldKind::Unknown => Ok(Some(Value::String(trimmed.to_string()))),
        FieldKind::LongText => Ok(Some(Value::String(trimmed.replace("\\n", "\n")))),
        FieldKind::Select => match_option(field, trimmed).map(|choice| Some(Value::String(choice))),
        FieldKind::MultiSelect => {
            let choices = trimmed
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| match_option(field, part).map(Value::String))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Value::Array(choices)))
        }
        FieldKind::Attachment => Err(AnswerParseError::new(
            "file uploads cannot be answered from the terminal",
            None,
        )),
    }
}

/// Resolves an option by name (case-insensitive) or by 1-based position.
fn match_option(field: &PayloadField, raw: &str) -> Result<String, AnswerParseError> {
    if let Some(choice) = field
        .options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(raw))
    {
        return Ok(choice.clone());
    }
    if let Ok(position) = raw.parse::<usize>()
        && let Some(choice) = position.checked_sub(1).and_then(|index| field.options.get(index))
    {
        return Ok(choice.clone());
    }
    Err(AnswerParseError::new(
        format!("'{}' is not an option for {}", raw, field.label),
        Some(field.options.join(", ")),
    ))
}
