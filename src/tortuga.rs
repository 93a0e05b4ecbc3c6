use std::{fs, path::Path};

use anyhow::Context;
use log::debug;

use crate::{interpreter::Interpreter, lexer::Lexer, parser::Parser, utils::RcCell};

/// Ties the pipeline together: source bytes in, side effects out.
pub struct Tortuga;

impl Tortuga {
	pub fn run_file(&self, path: &Path) -> crate::Result<()> {
		let source =
			fs::read(path).with_context(|| format!("Failed to read \"{}\"", path.display()))?;
		self.run(&source)
	}

	/// Run a program from raw source bytes.
	pub fn run(&self, source: &[u8]) -> crate::Result<()> { self.run_to(source, Interpreter::new()) }

	/// Run a program with `print` output captured in `sink` instead of
	/// written to stdout.
	pub fn run_with_output(&self, source: &[u8], sink: RcCell<Vec<u8>>) -> crate::Result<()> {
		self.run_to(source, Interpreter::with_output(sink))
	}

	fn run_to(&self, source: &[u8], mut interpreter: Interpreter) -> crate::Result<()> {
		let tokens = Lexer::tokenize(source)?;
		debug!("lexed {} tokens", tokens.len());
		let statements = Parser::new(tokens).parse()?;
		debug!("parsed {} top-level statements", statements.len());
		interpreter.run(&statements)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn run_pipeline() {
		let tortuga = Tortuga;
		assert!(tortuga.run(b"").is_ok());
		assert!(tortuga.run(b"let x = 1 + 2;").is_ok());
		assert!(tortuga.run(b"let x = ;").is_err());
		assert!(tortuga.run(b"@").is_err());
		assert!(tortuga.run(b"nope();").is_err());
	}

	#[test]
	fn missing_file_is_a_resource_error() {
		let tortuga = Tortuga;
		let result = tortuga.run_file(Path::new("./definitely-not-here.txt"));
		assert!(result.unwrap_err().to_string().contains("Failed to read"));
	}
}
