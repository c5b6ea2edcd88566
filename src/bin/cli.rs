// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Cadscript CLI

use anyhow::{Context, Result};
use cadscript::{EngineConfig, EngineManager};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;

#[derive(Parser)]
#[command(name = "cadscript")]
#[command(about = "Cadscript - multi-language CAD scripting engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a script and emit the scene as JSON
    Run {
        /// Input script file
        input: String,

        /// Language id (inferred from the file extension when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Write the scene JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Syntax-check a script without executing it
    Validate {
        /// Input script file
        input: String,

        /// Language id (inferred from the file extension when omitted)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// List the commands a language understands, or show one in detail
    Commands {
        /// Command name to describe
        name: Option<String>,

        /// Language id
        #[arg(short, long, default_value = "cadscript")]
        language: String,
    },

    /// List the registered languages
    Languages,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load()?;
    let mut manager = EngineManager::with_config(config);

    match &cli.command {
        Commands::Run {
            input,
            language,
            output,
        } => run_command(&mut manager, input, language.as_deref(), output.as_deref(), cli.verbose),
        Commands::Validate { input, language } => {
            validate_command(&mut manager, input, language.as_deref())
        }
        Commands::Commands { name, language } => {
            commands_command(&mut manager, name.as_deref(), language)
        }
        Commands::Languages => {
            languages_command(&manager);
            Ok(())
        }
    }
}

/// Pick the engine for a run: an explicit flag must name a registered
/// language, otherwise the file extension decides and the current
/// engine stays as the fallback.
fn select_language(manager: &mut EngineManager, input: &str, language: Option<&str>) -> Result<()> {
    if let Some(id) = language {
        if !manager.set_language(id) {
            eprintln!(
                "{} Unknown language: {} (supported: {})",
                "Error:".red(),
                id,
                manager.supported_languages().join(", ")
            );
            std::process::exit(1);
        }
        return Ok(());
    }
    if let Some(extension) = Path::new(input).extension().and_then(|e| e.to_str()) {
        let matched = manager
            .supported_languages()
            .iter()
            .map(|id| id.to_string())
            .find(|id| {
                manager
                    .engine_info(id)
                    .map(|info| info.extensions.contains(&extension))
                    .unwrap_or(false)
            });
        if let Some(id) = matched {
            manager.set_language(&id);
        }
    }
    Ok(())
}

fn read_source(input: &str) -> Result<String> {
    if !Path::new(input).exists() {
        eprintln!("{} Input file not found: {}", "Error:".red(), input);
        std::process::exit(1);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
}

fn run_command(
    manager: &mut EngineManager,
    input: &str,
    language: Option<&str>,
    output: Option<&str>,
    verbose: bool,
) -> Result<()> {
    select_language(manager, input, language)?;
    let source = read_source(input)?;

    if verbose {
        println!("Executing {} as {}", input, manager.current_language().cyan());
    }

    let start = std::time::Instant::now();
    let result = manager.execute(&source);
    let elapsed = start.elapsed();

    for line in &result.logs {
        eprintln!("{} {}", "script:".bright_black(), line);
    }

    if !result.success {
        let message = result
            .error_message()
            .unwrap_or_else(|| "unknown error".to_string());
        eprintln!("{} {}", "Error:".red(), message);
        std::process::exit(1);
    }

    if verbose {
        println!("Executed in {:.2?}", elapsed);
        println!("Objects: {}", result.objects.len());
    }
    for export in &result.exports {
        println!(
            "{} script requested export of {} ({})",
            "note:".yellow(),
            export.filename,
            export.format
        );
    }

    let json = serde_json::to_string_pretty(&result.objects)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
            println!("Scene written to {}", path.cyan());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn validate_command(
    manager: &mut EngineManager,
    input: &str,
    language: Option<&str>,
) -> Result<()> {
    select_language(manager, input, language)?;
    let source = read_source(input)?;

    let report = manager.validate(&source);
    if report.valid {
        println!("{} {}", "OK".green(), input);
        return Ok(());
    }
    for issue in &report.errors {
        let position = match (issue.line, issue.column) {
            (Some(line), Some(column)) => format!("{input}:{line}:{column}"),
            (Some(line), None) => format!("{input}:{line}"),
            _ => input.to_string(),
        };
        eprintln!("{} {}: {}", "Error:".red(), position, issue.message);
    }
    std::process::exit(1);
}

fn commands_command(
    manager: &mut EngineManager,
    name: Option<&str>,
    language: &str,
) -> Result<()> {
    if !manager.set_language(language) {
        eprintln!("{} Unknown language: {}", "Error:".red(), language);
        std::process::exit(1);
    }

    match name {
        Some(name) => {
            let Some(help) = manager.command_help(name) else {
                eprintln!("{} Unknown command: {}", "Error:".red(), name);
                std::process::exit(1);
            };
            println!("{}", help.syntax.bold());
            println!("  {}", help.description);
            if !help.parameters.is_empty() {
                println!();
                for parameter in help.parameters {
                    let optional = if parameter.optional { " (optional)" } else { "" };
                    println!(
                        "  {} {} - {}{}",
                        parameter.name.cyan(),
                        format!("[{}]", parameter.kind).bright_black(),
                        parameter.description,
                        optional
                    );
                }
            }
            println!("\n  {} {}", "example:".bright_black(), help.example);
        }
        None => {
            for command in manager.available_commands() {
                match manager.command_help(&command) {
                    Some(help) => println!("{:<18} {}", command.cyan(), help.description),
                    None => println!("{}", command.cyan()),
                }
            }
        }
    }
    Ok(())
}

fn languages_command(manager: &EngineManager) {
    for id in manager.supported_languages() {
        if let Some(info) = manager.engine_info(id) {
            let marker = if id == manager.current_language() {
                "*"
            } else {
                " "
            };
            println!(
                "{} {:<10} {} ({})",
                marker,
                info.id.cyan(),
                info.description,
                info.extensions
                    .iter()
                    .map(|e| format!(".{e}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
}
