use std::process::ExitCode;

use clap::Parser;
use cellmatch::runtime::{self, Commands, LogLevel};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log level: trace, debug, info, warn, error or off. RUST_LOG takes precedence
    #[arg(long = "log-level", global = true, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    runtime::setup_global_logger(cli.log_level);

    let result = match cli.command {
        Commands::Demux(mut cmd) => cmd.try_execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:?}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
