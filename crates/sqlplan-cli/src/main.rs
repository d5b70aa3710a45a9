//! sqlplan CLI
//!
//! Parses SQL statements and prints their plan trees, parameters and hints.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use sqlplan_core::{ParsedStatement, ParserConfig, SqlParser};

/// Parse SQL into logical plan trees.
#[derive(Parser)]
#[command(name = "sqlplan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with parser configuration.
    #[arg(short, long, env = "SQLPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Keep identifier case as written.
    #[arg(long)]
    case_sensitive: bool,

    /// Keep every literal as a constant.
    #[arg(long)]
    no_tokenize: bool,

    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement (reads stdin when SQL is omitted).
    Parse {
        /// Statement text.
        sql: Option<String>,

        /// Treat `?` markers as positional parameters.
        #[arg(long)]
        prepare: bool,
    },

    /// Parse a standalone expression.
    Expr {
        /// Expression text.
        sql: Option<String>,
    },

    /// Parse a data type.
    Type {
        /// Type text, e.g. `map<string, array<int>>`.
        sql: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    debug!(?config, "parser configuration");
    let mut parser = SqlParser::new(config);

    match cli.command {
        Commands::Parse { sql, prepare } => {
            let sql = read_input(sql)?;
            let parsed = if prepare {
                parser.prepare(&sql)?
            } else {
                parser.parse(&sql)?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&parsed)?);
            } else {
                print_statement(&parsed);
            }
        }

        Commands::Expr { sql } => {
            let sql = read_input(sql)?;
            let expr = parser.parse_expression(&sql)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&expr)?);
            } else {
                println!("{expr}");
            }
        }

        Commands::Type { sql } => {
            let sql = read_input(sql)?;
            let data_type = parser.parse_data_type(&sql)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&data_type)?);
            } else {
                println!("{data_type}");
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ParserConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ParserConfig::from_json(&text)?
        }
        None => ParserConfig::default(),
    };
    if cli.case_sensitive {
        config.case_sensitive = true;
    }
    if cli.no_tokenize {
        config.tokenize_literals = false;
    }
    Ok(config)
}

fn read_input(sql: Option<String>) -> anyhow::Result<String> {
    if let Some(sql) = sql {
        return Ok(sql);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("reading SQL from stdin")?;
    Ok(buffer)
}

fn print_statement(parsed: &ParsedStatement) {
    println!("{}", parsed.plan);
    info!(
        cacheable = parsed.cacheable,
        positional = parsed.positional_parameters,
        "parsed"
    );
    if !parsed.parameters.is_empty() {
        println!();
        println!("Parameters:");
        for param in &parsed.parameters {
            println!("  ${} {} = {}", param.ordinal, param.data_type(), param.value);
        }
    }
    if !parsed.hints.is_empty() {
        println!();
        println!("Hints:");
        for (key, value) in &parsed.hints {
            println!("  {key} = {value}");
        }
    }
}
