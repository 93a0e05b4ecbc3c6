pub mod interpreter;
pub mod lexer;
pub mod parser;

/// Top-level error type for the whole pipeline. Every diagnostic the user
/// sees renders from here; `main` prints it and exits with code 1.
#[derive(thiserror::Error, Debug)]
pub enum TortugaError {
	/// Internal error, should never happen
	#[error("InternalError: {0}")]
	Internal(#[from] anyhow::Error),
	#[error(transparent)]
	Lex(#[from] lexer::LexError),
	#[error(transparent)]
	Parse(#[from] parser::ParseError),
	#[error(transparent)]
	Runtime(#[from] interpreter::RuntimeError),
}
