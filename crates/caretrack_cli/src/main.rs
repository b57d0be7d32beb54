//! The `caretrack` binary.

use clap::Parser;
use std::process::ExitCode;

use caretrack_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config();

    match caretrack_cli::run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(caretrack_cli::exit_code(&err))
        }
    }
}
