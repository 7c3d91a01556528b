//! Taskrun CLI entry point.
//!
//! Parses arguments, runs the command and exits with the child's exit code,
//! or with a taskrun exit code if the command could not be run.

mod cli;
mod command;

use cli::Cli;
use std::process::ExitCode;
use taskrun::logging;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(cli.verbose);

    match command::execute(cli) {
        Ok(code) => ExitCode::from(command::exit_status_byte(code)),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {:#}", err);
            ExitCode::from(command::error_exit_code(&err) as u8)
        }
    }
}

