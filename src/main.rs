//! Command-line entry point: `checkmm <filename>`.

use checkmm::Database;
use clap::Parser;
use simple_logger::SimpleLogger;
use std::process::ExitCode;

/// A verifier for Metamath databases
#[derive(Debug, clap::Parser)]
#[command(name = "checkmm", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Database file to verify
    filename: String,
}

fn main() -> ExitCode {
    let Ok(cli) = Cli::try_parse() else {
        eprintln!("Syntax: checkmm <filename>");
        return ExitCode::FAILURE;
    };

    SimpleLogger::new().init().unwrap();

    let mut db = Database::new();
    match db.verify(&cli.filename, &[]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(diag) => {
            eprintln!("{diag}");
            ExitCode::FAILURE
        }
    }
}
