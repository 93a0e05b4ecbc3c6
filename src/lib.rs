//! A tree-walking interpreter for a small turtle-graphics scripting
//! language.
//!
//! Programs are UTF-8 source text executed eagerly in three stages:
//!
//! ```text
//! bytes --(lexer)--> tokens --(parser)--> AST --(interpreter)--> effects
//! ```
//!
//! The lexer materializes every token of the input up front and hands them
//! out through a cursor that skips whitespace, newlines and comments. The
//! parser assembles expressions by inserting tokens into a single growing
//! tree (precedence decides where each operator re-roots) and enforces
//! statement placement rules, so the evaluator never sees a `break` outside
//! a loop. The interpreter walks the AST with explicit control-flow
//! statuses, a flat generation-counted variable stack, and a built-in
//! registry that drives the turtle canvas and its bitmap output.
//!
//! The first error aborts the stage it occurred in; diagnostics carry the
//! source line and render as `[<Stage> error] Line N: ...`.

pub mod cli;
mod environment;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod statement;
mod tortuga;
mod utils;

pub use error::{TortugaError, interpreter::RuntimeError, lexer::LexError, parser::ParseError};
pub use tortuga::Tortuga;
pub use utils::RcCell;

/// Crate-wide result; every public operation fails with a [`TortugaError`].
pub type Result<T> = std::result::Result<T, TortugaError>;
