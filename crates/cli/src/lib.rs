pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "metrika",
    about = "Metrika operator CLI",
    long_about = "Operate the Metrika estimation service: migrations, demo catalog seeding, readiness checks, and terminal estimates.",
    after_help = "Examples:\n  metrika migrate\n  metrika seed\n  metrika doctor --json\n  metrika estimate --project-type hotel --location Athens --size 100 --size-unit rooms --start-month 1 --duration-months 6"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog (safe to re-run)")]
    Seed,
    #[command(about = "Validate config and database connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Generate an estimate against the configured database and print it")]
    Estimate(commands::estimate::EstimateArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Estimate(args) => commands::estimate::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
