//! C0 Compiler CLI
//!
//! Entry point for `c0c`. Parses CLI arguments, installs logging and
//! delegates to the Driver.

use c0_cli::{Cli, Driver};
use clap::Parser as ClapParser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let driver = Driver::from_cli(&cli);
    match driver.run_file(&cli.input, &cli.output_path()) {
        Ok(output) => {
            print!("{}", output.report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
