mod config;
mod error;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use envoyauth::{EvalResult, StatusCode};
use serde_json::Value;
use tracing::Level;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "envoyauth.toml";

#[derive(Parser)]
#[command(name = "envoyauth")]
#[command(about = "Decode policy decisions into Envoy ext_authz directives", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./envoyauth.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a decision document and print the check response
    Decode {
        /// Decision JSON file; reads stdin when omitted
        file: Option<PathBuf>,
        /// Decision ID to report (overrides the config file)
        #[arg(long)]
        decision_id: Option<String>,
        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },
    /// List the HTTP status codes accepted for http_status
    StatusCodes,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::Decode {
            file,
            decision_id,
            compact,
        } => cmd_decode(config, file.as_deref(), decision_id, compact),
        Commands::StatusCodes => cmd_status_codes(),
    }
}

fn cmd_decode(
    config: Config,
    file: Option<&Path>,
    decision_id: Option<String>,
    compact: bool,
) -> Result<()> {
    let decision = read_decision(file)?;

    let mut settings = config.decision;
    if let Some(id) = decision_id {
        settings = settings.with_decision_id(id);
    }

    let (result, timer) = EvalResult::new(decision, settings)?;
    let response = result.check_response();
    let elapsed = timer.stop();
    tracing::info!(decision_id = %result.decision_id(), ?elapsed, "decoded decision");
    let response = response?;

    let rendered = if compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    let mut stdout = io::stdout();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn cmd_status_codes() -> Result<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{:<6}  NAME", "CODE")?;
    writeln!(stdout, "{}", "-".repeat(40))?;
    for status in StatusCode::ALL {
        let marker = if *status == StatusCode::default() {
            "  (default)"
        } else {
            ""
        };
        writeln!(stdout, "{:<6}  {}{marker}", status.code(), status.name())?;
    }
    Ok(())
}

fn read_decision(file: Option<&Path>) -> Result<Value> {
    let content = match file {
        Some(path) => {
            if !path.exists() {
                return Err(Error::DecisionNotFound {
                    path: path.to_path_buf(),
                });
            }
            std::fs::read_to_string(path)?
        }
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    serde_json::from_str(&content).map_err(Error::InvalidDecision)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

fn init_logging(config: &Config, verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => config.log_level()?,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    Ok(())
}
