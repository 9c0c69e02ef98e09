use clap::{Parser, Subcommand, ValueEnum};
use form_spec::{
    Form, FormMode, FormSchema, FormTexts, Record, SubmitOutcome, WidgetRegistry,
    build_render_payload, render_json_ui, render_text, schema_document,
};
use serde_json::Value;
use std::cell::RefCell;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const MODE_ENV: &str = "GREENTIC_FORM_MODE";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Form schema CLI",
    long_about = "Renders, validates and edits JSON records through the widgets generated from a form schema"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the JSON Schema describing form schema documents.
    Schema,
    /// Build the form for a record and print it.
    Render {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Path to the record JSON.
        #[arg(long, value_name = "ITEM")]
        item: PathBuf,
        /// Form mode such as `create`, `edit` or `custom1|custom2` (defaults to GREENTIC_FORM_MODE, then edit).
        #[arg(long)]
        mode: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
        format: RenderFormat,
    },
    /// Run every widget's validation against a record.
    Validate {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Path to the record JSON.
        #[arg(long, value_name = "ITEM")]
        item: PathBuf,
        /// Form mode (defaults to GREENTIC_FORM_MODE, then edit).
        #[arg(long)]
        mode: Option<String>,
    },
    /// Feed raw values through the form widgets and write the record back.
    Edit {
        /// Path to the form schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Path to the record JSON.
        #[arg(long, value_name = "ITEM")]
        item: PathBuf,
        /// Form mode (defaults to GREENTIC_FORM_MODE, then edit).
        #[arg(long)]
        mode: Option<String>,
        /// Raw input for a field, as `name=value`. May be repeated.
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
        /// Prompt for every visible field on stdin.
        #[arg(long)]
        interactive: bool,
        /// Where to write the updated record (defaults to the item path).
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Schema => run_schema(),
        Command::Render {
            schema,
            item,
            mode,
            format,
        } => run_render(schema, item, mode, format),
        Command::Validate { schema, item, mode } => run_validate(schema, item, mode),
        Command::Edit {
            schema,
            item,
            mode,
            assignments,
            interactive,
            out,
        } => run_edit(schema, item, mode, assignments, interactive, out),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_schema() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&schema_document())?);
    Ok(())
}

fn run_render(
    schema_path: PathBuf,
    item_path: PathBuf,
    mode: Option<String>,
    format: RenderFormat,
) -> CliResult<()> {
    let mode = resolve_mode(mode.as_deref(), env::var(MODE_ENV).ok())?;
    let (_item, form) = open_form(&schema_path, &item_path, mode)?;
    let payload = build_render_payload(&form);
    match format {
        RenderFormat::Text => println!("{}", render_text(&payload)),
        RenderFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&render_json_ui(&payload))?
        ),
    }
    Ok(())
}

fn run_validate(schema_path: PathBuf, item_path: PathBuf, mode: Option<String>) -> CliResult<()> {
    let mode = resolve_mode(mode.as_deref(), env::var(MODE_ENV).ok())?;
    let (_item, mut form) = open_form(&schema_path, &item_path, mode)?;
    let valid = form.validate_all()?;
    println!(
        "Validation result: {}",
        if valid { "valid" } else { "invalid" }
    );
    describe_errors(&form);

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_edit(
    schema_path: PathBuf,
    item_path: PathBuf,
    mode: Option<String>,
    assignments: Vec<(String, String)>,
    interactive: bool,
    out: Option<PathBuf>,
) -> CliResult<()> {
    let mode = resolve_mode(mode.as_deref(), env::var(MODE_ENV).ok())?;
    let (item, mut form) = open_form(&schema_path, &item_path, mode)?;

    for (name, raw) in &assignments {
        form.input(name, raw)?;
    }
    if interactive {
        prompt_fields(&mut form)?;
    }

    match form.submit()? {
        SubmitOutcome::Bound => {
            let target = out.unwrap_or(item_path);
            let record = item.borrow().to_json();
            fs::write(&target, format!("{}\n", serde_json::to_string_pretty(&record)?))?;
            debug!(path = %target.display(), "record written");
            println!("Record saved to {}", target.display());
            Ok(())
        }
        SubmitOutcome::Invalid { .. } => {
            println!("Record not saved.");
            describe_errors(&form);
            Err("validation failed".into())
        }
    }
}

fn open_form(
    schema_path: &Path,
    item_path: &Path,
    mode: FormMode,
) -> CliResult<(Rc<RefCell<Record>>, Form<Record>)> {
    let schema: FormSchema = serde_json::from_str(&fs::read_to_string(schema_path)?)?;
    let item_json: Value = serde_json::from_str(&fs::read_to_string(item_path)?)?;
    let item = Rc::new(RefCell::new(Record::from_json(schema, &item_json)?));

    let mut form = Form::new(Arc::new(WidgetRegistry::default()), FormTexts::default());
    form.bind(&item, mode)?;
    Ok((item, form))
}

fn describe_errors(form: &Form<Record>) {
    let errors = form
        .widgets()
        .filter_map(|widget| widget.error().map(|error| (widget.name(), error)))
        .collect::<Vec<_>>();
    if errors.is_empty() {
        return;
    }
    println!("Errors:");
    for (name, error) in errors {
        println!("  {} - {}", name, error);
    }
}

fn prompt_fields(form: &mut Form<Record>) -> CliResult<()> {
    let fields = form
        .widgets()
        .map(|widget| widget.view())
        .map(|view| (view.name, view.label, view.text))
        .collect::<Vec<_>>();
    for (name, label, current) in fields {
        let default = (!current.is_empty()).then_some(current.as_str());
        if let Some(raw) = prompt_line(&label, default)? {
            form.input(&name, &raw)?;
        }
    }
    Ok(())
}

/// Reads one answer; `None` keeps the current value.
fn prompt_line(prompt: &str, default: Option<&str>) -> CliResult<Option<String>> {
    if let Some(default_value) = default {
        print!("{} [{}]: ", prompt, default_value);
    } else {
        print!("{}: ", prompt);
    }
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn resolve_mode(flag: Option<&str>, env_value: Option<String>) -> CliResult<FormMode> {
    let raw = flag
        .map(str::to_string)
        .or(env_value.filter(|value| !value.trim().is_empty()));
    match raw {
        Some(raw) => Ok(raw.parse::<FormMode>()?),
        None => Ok(FormMode::EDIT),
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
