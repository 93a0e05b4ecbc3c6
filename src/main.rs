use std::process::ExitCode;

use palc::Parser;
use tortuga::{Tortuga, cli::Cli};

/// Diagnostics go to stderr in red; program output stays white.
const ERROR_COLOR: &str = "\x1b[38;5;9m";
const COLOR_RESET: &str = "\x1b[0m";

fn main() -> ExitCode {
	let _ = simple_logger::SimpleLogger::new().env().init();

	let cli = Cli::parse();
	let script = cli.script.unwrap_or_else(|| "./script0.txt".into());
	let tortuga = Tortuga;
	if let Err(error) = tortuga.run_file(&script) {
		eprintln!("{ERROR_COLOR}{error}{COLOR_RESET}");
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}
