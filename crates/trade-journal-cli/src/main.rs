mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::journal::JournalCommand;
use commands::symbols::SymbolsCommand;
use commands::trade::{EstimateArgs, RecordArgs};
use config::JournalConfig;

/// Record trades into a combined journal or per-trade PDF reports
#[derive(Parser)]
#[command(
    name = "tjournal",
    version,
    about = "Record trades into a combined journal or per-trade PDF reports",
    long_about = "A CLI for journaling individual trades. Computes contract-multiplier PnL \
                  with decimal precision, then either appends the trade to a per-user \
                  combined journal or renders a formatted PDF report with logo and screenshot."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Username partitioning journal and report storage
    #[arg(long, global = true)]
    user: Option<String>,

    /// Base directory for reports, trade data, logos and symbols
    #[arg(long, global = true)]
    home: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a trade: append to the journal (--combine) or render a PDF report
    Record(RecordArgs),
    /// Preview the PnL of a trade without saving anything
    Estimate(EstimateArgs),
    /// Manage the tradable symbol list
    #[command(subcommand)]
    Symbols(SymbolsCommand),
    /// Query the combined journal
    #[command(subcommand)]
    Journal(JournalCommand),
    /// Show the effective contract multipliers
    Multipliers,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("tjournal {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    match run(cli.command, cli.home, cli.user) {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn run(
    command: Commands,
    home: Option<PathBuf>,
    user: Option<String>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let config = JournalConfig::from_env()?.with_overrides(home, user);

    match command {
        Commands::Record(args) => commands::trade::run_record(args, &config),
        Commands::Estimate(args) => commands::trade::run_estimate(args, &config),
        Commands::Symbols(cmd) => commands::symbols::run_symbols(cmd, &config),
        Commands::Journal(cmd) => commands::journal::run_journal(cmd, &config),
        Commands::Multipliers => commands::symbols::run_multipliers(&config),
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}
