mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::metrics::MetricsArgs;
use commands::monte_carlo::MonteCarloArgs;
use commands::valuation::{DcfArgs, ScenariosArgs};

/// Fundamental equity valuation and scoring
#[derive(Parser)]
#[command(
    name = "eqa",
    version,
    about = "Fundamental equity valuation and scoring",
    long_about = "A CLI for valuing a single company from a financial snapshot with \
                  decimal precision. Supports scenario-weighted DCF, Monte Carlo \
                  valuation, valuation multiples, quality scores (Piotroski, Altman), \
                  composite scoring and a final verdict."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print the assembled report
    Analyze(AnalyzeArgs),
    /// Run a single 5-year DCF valuation
    Dcf(DcfArgs),
    /// Value the bear/base/bull scenarios and their weighted intrinsic value
    Scenarios(ScenariosArgs),
    /// Simulate the intrinsic-value distribution
    MonteCarlo(MonteCarloArgs),
    /// Valuation multiples and quality metrics
    Metrics(MetricsArgs),
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
    let cli = Cli::parse();
    logging::init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::Scenarios(args) => commands::valuation::run_scenarios(args),
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(args),
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Version => {
            println!("eqa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
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
