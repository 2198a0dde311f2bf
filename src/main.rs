use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use usbmatch::Cli;
use usbmatch::commands;
use usbmatch::output::Output;

/// Exit status for configuration and bus errors.
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    // Initialize tracing with RUST_LOG env filter
    // e.g., RUST_LOG=usbmatch=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            Output::error(format!("{e:#}"));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
