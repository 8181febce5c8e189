use std::process::ExitCode;

use colored::Colorize;

fn main() -> ExitCode {
    match ecopack::app::run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "[ERR]".bold().red(), e);
            ExitCode::FAILURE
        }
    }
}
