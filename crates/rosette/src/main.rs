use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli;
mod job;
mod sim;

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => args.run(),
        Command::Run(args) => args.run(),
    }
}

#[derive(Parser)]
#[command(name = "rosette", about = "Polar printer motion controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a job file and report per-function statistics.
    Check(cli::check::CheckArgs),
    /// Execute a job file against the built-in simulator.
    Run(cli::run::RunArgs),
}
