/// A lexing error with the line it occurred on.
#[derive(thiserror::Error, Debug)]
#[error("[Lexer error] Line {line}: {kind}")]
pub struct LexError {
	line: usize,
	kind: LexErrorKind,
}

impl LexError {
	pub(crate) fn new(line: usize, kind: LexErrorKind) -> Self { Self { line, kind } }
}

/// Ways tokenization can fail.
#[derive(Debug)]
pub enum LexErrorKind {
	/// A byte that fits no UTF-8 pattern, or a sequence decoding to an
	/// invalid scalar value.
	InvalidUtf8Byte(u8),
	/// NUL bytes are not permitted anywhere in the input.
	NullByte,
	/// A code point no token can start with.
	UnexpectedCharacter(char),
	/// A `\x` escape other than `\n`, `\"`, `\\`.
	InvalidEscape(char),
	/// A string literal the input ended inside of.
	UnterminatedString,
	/// A raw newline inside a string literal.
	NewlineInString,
	/// An integer literal that does not fit in an `i64`.
	IntLiteralOutOfRange(String),
	/// A number literal with a dangling `.`.
	MalformedNumber(String),
}

impl std::fmt::Display for LexErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use LexErrorKind::*;
		match self {
			InvalidUtf8Byte(byte) => write!(f, "Invalid byte (0x{byte:02x}) in an UTF-8 sequence."),
			NullByte => write!(f, "Null bytes are not allowed."),
			UnexpectedCharacter(c) => write!(f, "Unexpected character '{c}'."),
			InvalidEscape(c) => write!(f, "Invalid escape sequence \"\\{c}\" in a string literal."),
			UnterminatedString => write!(f, "Unmatched string literal."),
			NewlineInString => write!(f, "String literals cannot span multiple lines."),
			IntLiteralOutOfRange(text) => write!(f, "Int literal '{text}' is out of range."),
			MalformedNumber(text) => write!(f, "Malformed number literal '{text}'."),
		}
	}
}
