//! Binary entry point for vaultscribe.
//!
//! This binary provides the CLI interface for rendering and checking vault
//! note templates.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use vaultscribe::config::VaultscribeConfig;
use vaultscribe::observability;
use vaultscribe::{
    ContextBuilder, IssueSeverity, MessageData, NoteAssembler, RenderContext, TemplateEngine,
    Value,
};

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

/// Vaultscribe - template-driven notes for a knowledge vault.
#[derive(Parser)]
#[command(name = "vaultscribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "VAULTSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Render a template.
    Render {
        /// Template name.
        name: String,

        /// JSON file with context values.
        #[arg(long)]
        context: Option<PathBuf>,

        /// Context value as `key=value`; values are parsed as JSON when
        /// possible. Repeatable.
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Print the rendered document as JSON.
        #[arg(long, conflicts_with = "note")]
        json: bool,

        /// Print the assembled vault note with header defaults filled in.
        #[arg(long)]
        note: bool,
    },

    /// Check templates for problems.
    Validate {
        /// Template name; all templates when omitted.
        name: Option<String>,
    },

    /// List available templates.
    List,

    /// Install the built-in templates without overwriting existing ones.
    Init,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match VaultscribeConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &VaultscribeConfig) -> CliResult {
    let engine = TemplateEngine::from_config(config);

    match cli.command {
        Commands::Render {
            name,
            context,
            vars,
            json,
            note,
        } => cmd_render(engine, &name, context, &vars, json, note),
        Commands::Validate { name } => cmd_validate(&engine, name),
        Commands::List => cmd_list(&engine),
        Commands::Init => cmd_init(&engine, config),
    }
}

fn cmd_render(
    engine: TemplateEngine,
    name: &str,
    context: Option<PathBuf>,
    vars: &[String],
    json: bool,
    note: bool,
) -> CliResult {
    let ctx = build_context(context, vars)?;

    if note {
        let assembler = NoteAssembler::new(engine);
        let Some(note) = assembler.assemble(name, &ctx)? else {
            eprintln!("Template not found: {name}");
            return Ok(ExitCode::FAILURE);
        };
        eprintln!("{}", note.relative_path.display());
        print!("{}", note.to_markdown()?);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(document) = engine.render(name, &ctx)? else {
        eprintln!("Template not found: {name}");
        return Ok(ExitCode::FAILURE);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", document.text);
        for warning in &document.warnings {
            eprintln!("warning: {warning}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(engine: &TemplateEngine, name: Option<String>) -> CliResult {
    let names = match name {
        Some(name) => vec![name],
        None => engine.list()?,
    };

    let mut all_valid = true;
    for name in names {
        let Some(result) = engine.validate(&name)? else {
            eprintln!("Template not found: {name}");
            all_valid = false;
            continue;
        };

        let status = if result.is_valid { "ok" } else { "INVALID" };
        println!("{name}: {status}");
        for issue in &result.issues {
            let marker = match issue.severity {
                IssueSeverity::Error => "  ✗",
                IssueSeverity::Warning => "  !",
            };
            println!("{marker} {issue}");
        }
        all_valid &= result.is_valid;
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_list(engine: &TemplateEngine) -> CliResult {
    let names = engine.list()?;
    if names.is_empty() {
        eprintln!("No templates found. Run `vaultscribe init` to install the defaults.");
    }
    for name in names {
        println!("{name}");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_init(engine: &TemplateEngine, config: &VaultscribeConfig) -> CliResult {
    let installed = engine.install_defaults()?;
    let dir = config.templates_dir();
    if installed.is_empty() {
        println!("All default templates already present in {}", dir.display());
    } else {
        println!("Installed {} template(s) into {}:", installed.len(), dir.display());
        for name in installed {
            println!("  {name}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Base date keys, then the context file, then `--var` values.
fn build_context(
    path: Option<PathBuf>,
    vars: &[String],
) -> Result<RenderContext, Box<dyn std::error::Error>> {
    let mut ctx = ContextBuilder::new().build(&MessageData::default(), None);

    if let Some(path) = path {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&text)?;
        if !json.is_object() {
            return Err(format!("{} must contain a JSON object", path.display()).into());
        }
        ctx.extend(RenderContext::from_json(&json));
    }

    for var in vars {
        let (key, raw) = parse_var(var)?;
        ctx.insert(key, raw);
    }
    Ok(ctx)
}

/// Parses `key=value`; the value is JSON when it parses, else a string.
fn parse_var(var: &str) -> Result<(String, Value), String> {
    let (key, raw) = var
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{var}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{var}'"));
    }
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map_or_else(|_| Value::string(raw), |json| Value::from_json(&json));
    Ok((key.to_string(), value))
}
