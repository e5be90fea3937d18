//! Operator CLI for the GreenCart backend.
//!
//! Three subcommands cover the day-to-day loop: `config` prints the
//! effective configuration with source attribution, `doctor` runs offline
//! readiness checks, and `smoke` exercises a running server over HTTP.

pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "greencart",
    about = "GreenCart operator CLI",
    long_about = "Inspect configuration, verify offline readiness, and smoke-test a running greencart-server.",
    after_help = "Examples:\n  greencart config\n  greencart doctor --json\n  greencart smoke --base-url http://127.0.0.1:5001"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog integrity, credit mock, and ranking policy offline")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run HTTP readiness checks against a live server with per-check timing")]
    Smoke {
        #[arg(
            long,
            help = "Server base URL (defaults to the configured bind address and port)"
        )]
        base_url: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Smoke { base_url } => commands::smoke::run(base_url),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
