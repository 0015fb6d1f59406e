mod fill;

use clap::{Parser, Subcommand, ValueEnum};
use component_form::{
    filter_responses, render_json_ui as component_render_json_ui,
    validate_submission as component_validate_submission, with_response,
};
use fill::{FillPresenter, FormPayload, PromptContext, PromptOutcome, Verbosity, prompt_field};
use form_spec::{
    FieldSpec, FieldType, FormCheck, FormSpec, ResponseMap, SubmissionError, SubmissionPolicy,
    TableField, ValidationResult, build_render_payload, prepare_submission, render_json_ui,
    render_text, resolve_visibility, responses_schema, validate_form, validate_submission,
};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Conditional form CLI",
    long_about = "Previews field visibility, checks conditional logic, and validates \
                  submissions for table-backed forms"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(clap::Args)]
struct PolicyArgs {
    /// JSON file with a submission policy.
    #[arg(long, value_name = "POLICY")]
    policy: Option<PathBuf>,
    /// Accept the client's view of visibility instead of recomputing it.
    #[arg(long)]
    trust_client: bool,
    /// Drop values for hidden fields instead of rejecting the submission.
    #[arg(long)]
    allow_hidden_values: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show which fields are visible for a set of responses.
    Preview {
        /// Path to the form JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Optional JSON file with the current responses.
        #[arg(long, value_name = "RESPONSES")]
        responses: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Check every field's conditional logic before saving the form.
    Check {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Validate a submission the way the submission endpoint does.
    Validate {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Validate a submission and print the record that would be written to the table.
    Submit {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Rewrite field orders as contiguous positions.
    Reindex {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Write the result here instead of stdout.
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Print the JSON Schema of the responses accepted right now.
    Schema {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "RESPONSES")]
        responses: Option<PathBuf>,
    },
    /// Build a form from a table's column list.
    Init {
        /// JSON array of table columns (`id`, `name`, `type`, `options`).
        #[arg(long, value_name = "COLUMNS")]
        columns: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
    },
    /// Fill out a form in the terminal, re-evaluating visibility after every answer.
    Fill {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "RESPONSES")]
        responses: Option<PathBuf>,
        /// Write the submitted responses here.
        #[arg(long, value_name = "OUT")]
        out: Option<PathBuf>,
        /// Show status and hidden fields between prompts.
        #[arg(long, alias = "debug")]
        verbose: bool,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Preview {
            spec,
            responses,
            format,
        } => run_preview(spec, responses, format),
        Command::Check { spec } => run_check(spec),
        Command::Validate {
            spec,
            responses,
            policy,
        } => run_validate(spec, responses, policy),
        Command::Submit {
            spec,
            responses,
            policy,
        } => run_submit(spec, responses, policy),
        Command::Reindex { spec, out } => run_reindex(spec, out),
        Command::Schema { spec, responses } => run_schema(spec, responses),
        Command::Init {
            columns,
            id,
            title,
            out,
        } => run_init(columns, id, title, out),
        Command::Fill {
            spec,
            responses,
            out,
            verbose,
        } => run_fill(spec, responses, out, verbose),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AIRFORM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_spec(path: &Path) -> CliResult<FormSpec> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn load_responses(path: Option<&Path>) -> CliResult<ResponseMap> {
    let Some(path) = path else {
        return Ok(ResponseMap::new());
    };
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let value = match value.get("responses") {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => value,
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(format!("{} does not contain a JSON object", path.display()).into()),
    }
}

fn load_policy(args: &PolicyArgs) -> CliResult<SubmissionPolicy> {
    let mut policy = match &args.policy {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => SubmissionPolicy::default(),
    };
    if args.trust_client {
        policy.trust_client = true;
    }
    if args.allow_hidden_values {
        policy.reject_hidden_values = false;
    }
    if policy.trust_client {
        warn!("visibility is not recomputed; hidden required fields may block or slip through");
    }
    Ok(policy)
}

fn write_or_print(out: Option<PathBuf>, value: &Value) -> CliResult<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(&path, pretty)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", pretty),
    }
    Ok(())
}

fn run_preview(
    spec_path: PathBuf,
    responses_path: Option<PathBuf>,
    format: RenderMode,
) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let responses = load_responses(responses_path.as_deref())?;
    let payload = build_render_payload(&spec, &responses);
    match format {
        RenderMode::Text => println!("{}", render_text(&payload)),
        RenderMode::Json => {
            println!("{}", serde_json::to_string_pretty(&render_json_ui(&payload))?)
        }
    }
    Ok(())
}

fn run_check(spec_path: PathBuf) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let check = validate_form(&spec);
    println!(
        "Form check: {}",
        if check.valid { "valid" } else { "invalid" }
    );
    describe_check(&check);
    if check.valid {
        Ok(())
    } else {
        Err("form check failed".into())
    }
}

fn describe_check(check: &FormCheck) {
    for issue in &check.issues {
        match &issue.field_id {
            Some(field_id) => println!("  {} - {}", field_id, issue.message),
            None => println!("  {}", issue.message),
        }
    }
}

fn run_validate(spec_path: PathBuf, responses_path: PathBuf, args: PolicyArgs) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let responses = load_responses(Some(&responses_path))?;
    let policy = load_policy(&args)?;

    let result = validate_submission(&spec, &responses, &policy);
    println!(
        "Validation result: {}",
        if result.valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("Errors:");
        for error in &result.errors {
            println!(
                "  {} - {}",
                error.path.as_deref().unwrap_or("<unknown>"),
                error.message
            );
        }
    }
    if !result.missing_required.is_empty() {
        println!(
            "Missing required responses: {}",
            result.missing_required.join(", ")
        );
    }
    if !result.hidden_fields.is_empty() {
        println!(
            "Responses for hidden fields: {}",
            result.hidden_fields.join(", ")
        );
    }
    if !result.unknown_fields.is_empty() {
        println!(
            "Unknown response fields: {}",
            result.unknown_fields.join(", ")
        );
    }
}

fn run_submit(spec_path: PathBuf, responses_path: PathBuf, args: PolicyArgs) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let responses = load_responses(Some(&responses_path))?;
    let policy = load_policy(&args)?;

    match prepare_submission(&spec, &responses, &policy) {
        Ok(record) => {
            info!(form_id = %spec.id, columns = record.fields.len(), "submission prepared");
            write_or_print(None, &serde_json::to_value(&record)?)
        }
        Err(SubmissionError::Rejected(result)) => {
            describe_validation(&result);
            Err("submission rejected".into())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_reindex(spec_path: PathBuf, out: Option<PathBuf>) -> CliResult<()> {
    let mut spec = load_spec(&spec_path)?;
    spec.reindex();
    let check = validate_form(&spec);
    if !check.valid {
        describe_check(&check);
    }
    write_or_print(out, &serde_json::to_value(&spec)?)
}

fn run_schema(spec_path: PathBuf, responses_path: Option<PathBuf>) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let responses = load_responses(responses_path.as_deref())?;
    let visibility = resolve_visibility(&spec.fields, &responses);
    write_or_print(None, &responses_schema(&spec, &visibility))
}

fn run_init(
    columns_path: PathBuf,
    id: String,
    title: String,
    out: Option<PathBuf>,
) -> CliResult<()> {
    let columns: Vec<TableField> = serde_json::from_str(&fs::read_to_string(&columns_path)?)?;
    let mut spec = FormSpec::new(id, title);
    for column in &columns {
        match FieldSpec::from_table_field(column) {
            Ok(field) => spec.add_field(field)?,
            Err(err) => warn!(column = %column.name, "skipping column: {}", err),
        }
    }
    if spec.fields.is_empty() {
        return Err(format!(
            "no supported columns; expected one of {}",
            FieldType::ALL.map(|kind| kind.as_str()).join(", ")
        )
        .into());
    }
    write_or_print(out, &serde_json::to_value(&spec)?)
}

fn run_fill(
    spec_path: PathBuf,
    responses_path: Option<PathBuf>,
    out: Option<PathBuf>,
    verbose: bool,
) -> CliResult<()> {
    let spec_str = fs::read_to_string(&spec_path)?;
    let spec: FormSpec = serde_json::from_str(&spec_str)?;
    let config_json = json!({ "form_spec_json": spec_str }).to_string();
    let mut responses = Value::Object(load_responses(responses_path.as_deref())?);

    let mut presenter = FillPresenter::new(Verbosity::from_verbose(verbose));
    let mut asked = BTreeSet::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        let responses_str = responses.to_string();
        let ui = parse_component_result(&component_render_json_ui(
            &spec.id,
            &config_json,
            &responses_str,
        ))?;
        let payload =
            FormPayload::from_json(&ui).map_err(|err| format!("form UI error: {}", err))?;
        presenter.show_header(&payload);
        presenter.show_status(&payload);

        // Visibility is recomputed after each answer, so earlier answers can reveal later fields.
        let Some(field) = payload
            .fields
            .iter()
            .find(|field| field.visible && !asked.contains(&field.id))
        else {
            break;
        };
        asked.insert(field.id.clone());
        if field.kind == fill::FieldKind::Attachment {
            presenter.show_skipped(field);
            continue;
        }

        let prompt = PromptContext::new(field, &payload.progress);
        match prompt_field(&prompt, field, &presenter, &mut input)? {
            PromptOutcome::Answered(value) => {
                let value_json = serde_json::to_string(&value)?;
                responses =
                    parse_component_result(&with_response(&responses_str, &field.id, &value_json))?;
            }
            PromptOutcome::Skipped => {}
            PromptOutcome::EndOfInput => break,
        }
    }

    let filtered = parse_component_result(&filter_responses(
        &spec.id,
        &config_json,
        &responses.to_string(),
    ))?;
    let validation = parse_component_result(&component_validate_submission(
        &spec.id,
        &config_json,
        &filtered.to_string(),
    ))?;
    let missing: Vec<String> = validation["missing_required"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    presenter.show_completion(&filtered, &missing);

    if let Some(path) = out {
        let body = Value::Object(Map::from_iter([("responses".to_string(), filtered)]));
        fs::write(&path, serde_json::to_string_pretty(&body)?)?;
    }
    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}
