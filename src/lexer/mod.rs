//! Lexical analysis: UTF-8 source bytes in, a materialized token vector out.
//!
//! The whole input is tokenized eagerly by [`Lexer::tokenize`]; the parser
//! then reads through a [`TokenStream`], whose accessors skip whitespace,
//! newline and comment tokens. Numeric literals are converted to `i64`/`f64`
//! here, and string escapes are decoded here, so the parser only ever sees
//! finished payloads.

mod token;
mod utf8;

use std::{iter::Peekable, str::CharIndices};

pub(crate) use self::token::{Token, TokenKind};

use crate::error::lexer::{LexError, LexErrorKind};

/// A tokenizer for turtle script source code
pub(crate) struct Lexer<'a> {
	/// Decoded source text
	source: &'a str,
	/// Source iterator
	iter:   Peekable<CharIndices<'a>>,
	/// Byte offset of the beginning of the current lexeme
	start:  usize,
	/// Byte offset one past the character last consumed
	cursor: usize,
	/// Line the cursor is on
	line:   usize,
	tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
	/// Tokenize the whole input. Any malformed byte, literal or escape stops
	/// the scan with an error carrying the line it occurred on.
	pub fn tokenize(bytes: &[u8]) -> Result<TokenStream, LexError> {
		let source = Self::decode(bytes)?;
		let mut lexer = Lexer {
			source: &source,
			iter: source.char_indices().peekable(),
			start: 0,
			cursor: 0,
			line: 1,
			tokens: Vec::new(),
		};
		lexer.scan()?;
		Ok(TokenStream::new(lexer.tokens))
	}

	/// Decode the raw bytes into text, rejecting malformed UTF-8 and NUL.
	fn decode(bytes: &[u8]) -> Result<String, LexError> {
		let mut text = String::with_capacity(bytes.len());
		let mut line = 1;
		let mut offset = 0;
		while offset < bytes.len() {
			match utf8::decode_code_point(bytes, offset) {
				Ok((code_point, length)) => {
					if code_point == '\n' {
						line += 1;
					}
					text.push(code_point);
					offset += length;
				}
				Err(utf8::Utf8Error::InvalidByte(byte)) => {
					return Err(LexError::new(line, LexErrorKind::InvalidUtf8Byte(byte)));
				}
				Err(utf8::Utf8Error::NullByte) => {
					return Err(LexError::new(line, LexErrorKind::NullByte));
				}
			}
		}
		Ok(text)
	}

	fn scan(&mut self) -> Result<(), LexError> {
		while let Some(&(index, _)) = self.iter.peek() {
			self.start = index;
			self.cursor = index;
			self.scan_token()?;
		}
		Ok(())
	}

	/// Scan a single token from the source code
	fn scan_token(&mut self) -> Result<(), LexError> {
		use TokenKind::*;
		let Some(next_char) = self.advance() else { return Ok(()) };
		let line = self.line;
		#[rustfmt::skip]
		let kind = match next_char {
			'\n' => { self.line += 1; Newline }
			' ' | '\t' | '\r' => {
				while self.peek().is_some_and(|c| c == ' ' || c == '\t' || c == '\r') { self.advance(); }
				Whitespace
			}
			'#' => {
				while self.peek().is_some_and(|c| c != '\n') { self.advance(); }
				Comment
			}
			'(' => LeftParen,
			')' => RightParen,
			'[' => LeftBracket,
			']' => RightBracket,
			'{' => LeftBrace,
			'}' => RightBrace,
			',' => Comma,
			';' => Semicolon,
			':' => Colon,
			'\'' => Apostrophe,
			'&' => Ampersand,
			'+' => if self.match_next('=') { PlusEqual } else { Plus },
			'-' => if self.match_next('=') { MinusEqual } else if self.match_next('>') { Arrow } else { Minus },
			'*' => if self.match_next('=') { StarEqual } else { Star },
			'/' => if self.match_next('=') { SlashEqual } else { Slash },
			'%' => if self.match_next('=') { PercentEqual } else { Percent },
			'^' => if self.match_next('=') { CaretEqual } else { Caret },
			'=' => if self.match_next('=') { EqualEqual } else { Equal },
			'<' => if self.match_next('=') { LessEqual } else { Less },
			'>' => if self.match_next('=') { GreaterEqual } else { Greater },
			'!' => {
				if self.match_next('=') { BangEqual }
				else { return Err(LexError::new(line, LexErrorKind::UnexpectedCharacter('!'))) }
			}
			// Unicode spellings accepted alongside the ASCII operator forms.
			'≠' => BangEqual,
			'≤' => LessEqual,
			'≥' => GreaterEqual,
			'∧' => And,
			'∨' => Or,
			'¬' => Not,
			'"' => self.string()?,
			c if c.is_ascii_digit() => self.number()?,
			c if is_identifier_start(c) => self.identifier(),
			c => return Err(LexError::new(line, LexErrorKind::UnexpectedCharacter(c))),
		};
		self.tokens.push(Token::new(kind, line));
		Ok(())
	}

	/// Match the next character if it is the expected one
	fn match_next(&mut self, expected: char) -> bool {
		matches!(self.peek(), Some(c) if c == expected && { self.advance(); true })
	}

	/// Advance to the next character
	fn advance(&mut self) -> Option<char> {
		let (i, c) = self.iter.next()?;
		self.cursor = i + c.len_utf8();
		Some(c)
	}

	/// Peek the current character
	fn peek(&mut self) -> Option<char> { self.iter.peek().map(|&(_, c)| c) }

	/// Peek the second character ahead
	fn peek_second(&self) -> Option<char> {
		let mut it = self.iter.clone();
		it.next()?;
		it.peek().map(|&(_, c)| c)
	}

	/// The source text of the token being scanned
	fn lexeme(&self) -> &str { &self.source[self.start..self.cursor] }

	/// Scan a string literal, decoding escapes
	fn string(&mut self) -> Result<TokenKind, LexError> {
		let mut value = String::new();
		loop {
			match self.advance() {
				None => return Err(LexError::new(self.line, LexErrorKind::UnterminatedString)),
				Some('"') => break,
				Some('\n') => return Err(LexError::new(self.line, LexErrorKind::NewlineInString)),
				Some('\\') => match self.advance() {
					Some('n') => value.push('\n'),
					Some('"') => value.push('"'),
					Some('\\') => value.push('\\'),
					Some(c) => return Err(LexError::new(self.line, LexErrorKind::InvalidEscape(c))),
					None => return Err(LexError::new(self.line, LexErrorKind::UnterminatedString)),
				},
				Some(c) => value.push(c),
			}
		}
		Ok(TokenKind::StringLiteral(value))
	}

	/// Scan a number literal and convert it
	fn number(&mut self) -> Result<TokenKind, LexError> {
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
		}

		let mut is_float = false;
		if self.peek() == Some('.') {
			if self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
				is_float = true;
				self.advance(); // consume '.'
				while self.peek().is_some_and(|c| c.is_ascii_digit()) {
					self.advance();
				}
			} else {
				self.advance(); // consume '.' so the diagnostic shows the whole lexeme
				return Err(LexError::new(self.line, LexErrorKind::MalformedNumber(self.lexeme().to_string())));
			}
		}

		let text = self.lexeme();
		if is_float {
			match text.parse::<f64>() {
				Ok(value) => Ok(TokenKind::FloatLiteral(value)),
				Err(_) => Err(LexError::new(self.line, LexErrorKind::MalformedNumber(text.to_string()))),
			}
		} else {
			match text.parse::<i64>() {
				Ok(value) => Ok(TokenKind::IntLiteral(value)),
				Err(_) => Err(LexError::new(self.line, LexErrorKind::IntLiteralOutOfRange(text.to_string()))),
			}
		}
	}

	/// Scan an identifier or keyword
	fn identifier(&mut self) -> TokenKind {
		while self.peek().is_some_and(is_identifier_continue) {
			self.advance();
		}
		TokenKind::keyword_or_identifier(self.lexeme().to_string())
	}
}

const POLISH_LETTERS: &[char] =
	&['ą', 'ć', 'ę', 'ł', 'ń', 'ó', 'ś', 'ź', 'ż', 'Ą', 'Ć', 'Ę', 'Ł', 'Ń', 'Ó', 'Ś', 'Ź', 'Ż'];

fn is_identifier_start(c: char) -> bool {
	c.is_ascii_alphabetic() || c == '_' || POLISH_LETTERS.contains(&c) || ('\u{0391}'..='\u{03c9}').contains(&c)
}

fn is_identifier_continue(c: char) -> bool { is_identifier_start(c) || c.is_ascii_digit() }

/// The lexer's output: every token of the input, in order, with cursor-style
/// access that skips the ignored kinds.
pub(crate) struct TokenStream {
	tokens: Vec<Token>,
	cursor: usize,
	line:   usize,
}

impl TokenStream {
	fn new(tokens: Vec<Token>) -> Self { Self { tokens, cursor: 0, line: 1 } }

	pub fn len(&self) -> usize { self.tokens.len() }

	/// Consume and return the next significant token.
	pub fn next(&mut self) -> Option<Token> {
		while let Some(token) = self.tokens.get(self.cursor) {
			self.cursor += 1;
			if !token.kind.is_ignored() {
				self.line = token.line;
				return Some(token.clone());
			}
		}
		None
	}

	/// Consume the next significant token without looking at it.
	pub fn discard(&mut self) { let _ = self.next(); }

	/// The n-th forthcoming significant token (1 is the next one).
	pub fn peek(&self, n: usize) -> Option<&Token> {
		let mut remaining = n;
		let mut cursor = self.cursor;
		while let Some(token) = self.tokens.get(cursor) {
			cursor += 1;
			if !token.kind.is_ignored() {
				remaining -= 1;
				if remaining == 0 {
					return Some(token);
				}
			}
		}
		None
	}

	/// Line of the most recently consumed token.
	pub fn current_line(&self) -> usize { self.line }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lex(input: &str, ok: bool) {
		let result = Lexer::tokenize(input.as_bytes());
		assert_eq!(result.is_ok(), ok, "lexing {input:?}");
	}

	fn kinds(input: &str) -> Vec<TokenKind> {
		let mut stream = Lexer::tokenize(input.as_bytes()).unwrap();
		let mut kinds = Vec::new();
		while let Some(token) = stream.next() {
			kinds.push(token.kind);
		}
		kinds
	}

	#[test]
	fn lex_smoke() {
		lex("", true);
		lex("let x = 1;", true);
		lex("(){}[]", true);
		lex("@", false);
		lex("$", false);
		lex("!", false);
		lex("1 + 2 # trailing comment", true);
	}

	#[test]
	fn lex_operators() {
		use TokenKind::*;
		assert_eq!(
			kinds("+ - * / % ^ & ' = == != < <= > >= -> , ; :"),
			vec![
				Plus, Minus, Star, Slash, Percent, Caret, Ampersand, Apostrophe, Equal, EqualEqual,
				BangEqual, Less, LessEqual, Greater, GreaterEqual, Arrow, Comma, Semicolon, Colon
			]
		);
		assert_eq!(
			kinds("+= -= *= /= %= ^="),
			vec![PlusEqual, MinusEqual, StarEqual, SlashEqual, PercentEqual, CaretEqual]
		);
	}

	#[test]
	fn lex_unicode_operator_aliases() {
		use TokenKind::*;
		assert_eq!(kinds("≠ ≤ ≥ ∧ ∨ ¬"), vec![BangEqual, LessEqual, GreaterEqual, And, Or, Not]);
	}

	#[test]
	fn lex_keywords_and_identifiers() {
		use TokenKind::*;
		assert_eq!(
			kinds("if else while for let func break continue return and or not"),
			vec![If, Else, While, For, Let, Func, Break, Continue, Return, And, Or, Not]
		);
		assert_eq!(kinds("true false"), vec![BoolLiteral(true), BoolLiteral(false)]);
		assert_eq!(kinds("foo _bar baz42"), vec![
			Identifier("foo".into()),
			Identifier("_bar".into()),
			Identifier("baz42".into())
		]);
		// Polish and Greek letters are identifier characters.
		assert_eq!(kinds("żółw"), vec![Identifier("żółw".into())]);
		assert_eq!(kinds("Δελτα"), vec![Identifier("Δελτα".into())]);
		// Keywords are case sensitive; this is a plain identifier.
		assert_eq!(kinds("While"), vec![Identifier("While".into())]);
	}

	#[test]
	fn lex_numbers() {
		use TokenKind::*;
		assert_eq!(kinds("0 42 123"), vec![IntLiteral(0), IntLiteral(42), IntLiteral(123)]);
		assert_eq!(kinds("3.14 0.5"), vec![FloatLiteral(3.14), FloatLiteral(0.5)]);
		lex("12.", false);
		lex(".5", false);
		lex("9223372036854775807", true);
		lex("9223372036854775808", false); // one past i64::MAX
	}

	#[test]
	fn lex_strings() {
		use TokenKind::*;
		assert_eq!(kinds(r#""hello""#), vec![StringLiteral("hello".into())]);
		assert_eq!(kinds(r#""a\nb\"c\\d""#), vec![StringLiteral("a\nb\"c\\d".into())]);
		assert_eq!(kinds(r#""żółć 中""#), vec![StringLiteral("żółć 中".into())]);
		lex(r#""unterminated"#, false);
		lex(r#""bad \q escape""#, false);
		lex("\"newline\ninside\"", false);
	}

	#[test]
	fn lex_invalid_bytes() {
		assert!(Lexer::tokenize(&[0xff]).is_err());
		assert!(Lexer::tokenize(&[b'a', 0xc3, b'b']).is_err());
		assert!(Lexer::tokenize(&[b'a', 0, b'b']).is_err());
	}

	#[test]
	fn lex_is_deterministic() {
		let input = "let x = 1 + 2;\nprint(\"%\", x);\n";
		let first = kinds(input);
		let second = kinds(input);
		assert_eq!(first, second);
	}

	#[test]
	fn stream_skips_ignored_tokens() {
		use TokenKind::*;
		let mut stream = Lexer::tokenize(b"let x # comment\n= 1;").unwrap();
		assert_eq!(stream.next().map(|t| t.kind), Some(Let));
		assert_eq!(stream.peek(1).map(|t| &t.kind), Some(&Identifier("x".into())));
		assert_eq!(stream.peek(2).map(|t| &t.kind), Some(&Equal));
		assert_eq!(stream.peek(3).map(|t| &t.kind), Some(&IntLiteral(1)));
		stream.discard(); // x
		assert_eq!(stream.next().map(|t| t.kind), Some(Equal));
		assert_eq!(stream.current_line(), 2);
	}

	#[test]
	fn stream_tracks_lines() {
		let mut stream = Lexer::tokenize(b"a\nb\n\nc").unwrap();
		stream.next();
		assert_eq!(stream.current_line(), 1);
		stream.next();
		assert_eq!(stream.current_line(), 2);
		stream.next();
		assert_eq!(stream.current_line(), 4);
		assert!(stream.next().is_none());
	}

	#[test]
	fn whitespace_collapses_into_one_token() {
		let stream = Lexer::tokenize(b"a  \t\r  b").unwrap();
		assert_eq!(stream.len(), 3);
	}
}
