use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use pbfilter::config::QueryConfig;
use pbfilter::schema::Schema;
use pbfilter::{Params, RawQuery, render, render_lossy};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a filter from a query file (YAML or JSON)
    Build {
        /// Query file
        #[arg(short, long)]
        query: PathBuf,

        /// Schema file used to validate field paths
        #[arg(short, long, env = "PBFILTER_SCHEMA")]
        schema: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,

        /// Print the unrendered expression instead of substituting values
        #[arg(long)]
        raw: bool,
    },

    /// Substitute values into a raw expression
    Render {
        /// Expression containing {:name} placeholders
        #[arg(short, long)]
        expr: String,

        /// JSON object of values, or @path to a JSON file
        #[arg(long, default_value = "{}")]
        values: String,

        /// Leave placeholders without a value in place
        #[arg(long)]
        lossy: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

pub fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Command::Build {
            query,
            schema,
            output,
            raw,
        } => build(query, schema.as_deref(), *output, *raw),
        Command::Render {
            expr,
            values,
            lossy,
        } => {
            let values = load_values(values)?;
            let rendered = if *lossy {
                render_lossy(expr, &values)
            } else {
                render(expr, &values)
            };
            rendered.context("Render: Failed to substitute values")
        }
    }
}

fn build(query: &Path, schema: Option<&Path>, output: OutputFormat, raw: bool) -> Result<String> {
    let config = QueryConfig::load(query).context("CLI: Failed to load query file")?;
    let schema = schema
        .map(Schema::load)
        .transpose()
        .context("CLI: Failed to load schema file")?;

    let compiled = config
        .compile(schema.as_ref())
        .with_context(|| format!("Query: Invalid filter in {:?}", query))?;
    let built = compiled.build();
    tracing::info!(
        "Query: {} parameters in {} bytes of expression",
        built.values.len(),
        built.raw.len()
    );

    format_output(&built, output, raw)
}

fn format_output(built: &RawQuery, output: OutputFormat, raw: bool) -> Result<String> {
    match output {
        OutputFormat::Text if raw => Ok(built.raw.clone()),
        OutputFormat::Text => built.render().context("Render: Failed to substitute values"),
        OutputFormat::Json if raw => {
            serde_json::to_string_pretty(built).context("CLI: Failed to serialize query")
        }
        OutputFormat::Yaml if raw => {
            serde_yaml::to_string(built).context("CLI: Failed to serialize query")
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let filter = built.render().context("Render: Failed to substitute values")?;
            let value = serde_json::json!({ "filter": filter });
            if output == OutputFormat::Json {
                serde_json::to_string_pretty(&value).context("CLI: Failed to serialize filter")
            } else {
                serde_yaml::to_string(&value).context("CLI: Failed to serialize filter")
            }
        }
    }
}

/// Inline JSON object, or `@path` to a file holding one.
pub fn load_values(arg: &str) -> Result<Params> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("CLI: Failed to read values file {:?}", path))?,
        None => arg.to_string(),
    };
    let value: serde_json::Value =
        serde_json::from_str(&text).context("CLI: Values must be valid JSON")?;
    if !value.is_object() {
        return Err(anyhow!("CLI: Values must be a JSON object, got {}", value));
    }
    serde_json::from_value(value).context("CLI: Failed to read values")
}
