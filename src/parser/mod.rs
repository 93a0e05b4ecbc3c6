//! Token stream to AST.
//!
//! Statement grammar:
//!
//! ```text
//! program    -> statement* ;
//! statement  -> ";"
//!             | "let" IDENT "=" expression ";"
//!             | "if" expression "{" statement* "}" ( "else" ( "{" statement* "}" | statement ) )?
//!             | "while" expression "{" statement* "}"
//!             | "for" IDENT ":" expression "->" expression "{" statement* "}"
//!             | "func" IDENT "(" ( IDENT ( "," IDENT )* )? ")" ( "{" statement* "}" | statement )
//!             | "break" ";"
//!             | "continue" ";"
//!             | "return" expression? ";"
//!             | expression ( ASSIGN_OP expression )? ";"
//! ```
//!
//! A statement that starts with a value-like token is an assignment exactly
//! when an assignment operator shows up before the closing `;`; the parser
//! peeks ahead to find out and only then commits to a production.
//!
//! Operator precedence (0 binds tightest):
//!
//! |Level|Operators|
//! --|--
//! 0|`^`
//! 1|`*` `/` `%`
//! 2|`+` `-`
//! 3|`==` `!=` `<` `<=` `>` `>=`
//! 4|`and` `or`
//!
//! Unary prefix operators bind tighter than any binary operator, and `^` is
//! the one right-associative level. Placement rules (`break`/`continue` only
//! inside loops, `return` only inside functions) are enforced here, so the
//! evaluator never has to re-check them.

pub(crate) mod expression;

use self::expression::{AstValue, Expr, ExprBuilder};

use crate::{
	error::parser::{ParseError, ParseErrorKind},
	lexer::{Token, TokenKind, TokenStream},
	statement::{AssignOp, Function, Statement},
};

/// Where the statement being parsed sits; controls which constructs are
/// legal and where a block may end.
#[derive(Debug, Clone, Copy, Default)]
struct StatementContext {
	in_block:    bool,
	in_loop:     bool,
	in_function: bool,
}

/// Which boundary tokens may legally end the expression being parsed.
#[derive(Debug, Clone, Copy, Default)]
struct ExprBounds {
	in_parens:     bool,
	before_assign: bool,
	before_arrow:  bool,
	in_subscript:  bool,
}

pub(crate) struct Parser {
	tokens: TokenStream,
}

impl Parser {
	pub fn new(tokens: TokenStream) -> Self { Self { tokens } }

	pub fn parse(mut self) -> Result<Vec<Statement>, ParseError> {
		let mut statements = Vec::new();
		loop {
			self.skip_empty_statements();
			match self.parse_statement(StatementContext::default())? {
				Some(statement) => statements.push(statement),
				None => break,
			}
		}
		Ok(statements)
	}

	/// Consume stray semicolons; they are complete, empty statements.
	fn skip_empty_statements(&mut self) {
		while matches!(self.peek_kind(), Some(TokenKind::Semicolon)) {
			self.tokens.discard();
		}
	}

	fn peek_kind(&self) -> Option<&TokenKind> { self.tokens.peek(1).map(|t| &t.kind) }

	/// Parse one statement. `Ok(None)` means the current statement list is
	/// done: end of input, or a `}` (left unconsumed) inside a block.
	fn parse_statement(&mut self, ctx: StatementContext) -> Result<Option<Statement>, ParseError> {
		let (kind, line) = match self.tokens.peek(1) {
			Some(token) => (token.kind.clone(), token.line),
			None => return Ok(None),
		};
		match kind {
			TokenKind::RightBrace => {
				if ctx.in_block {
					Ok(None)
				} else {
					Err(ParseError::new(line, ParseErrorKind::UnexpectedToken("}".to_string())))
				}
			}
			TokenKind::Let => self.parse_declaration().map(Some),
			TokenKind::If => self.parse_if(ctx).map(Some),
			TokenKind::While => self.parse_while(ctx).map(Some),
			TokenKind::For => self.parse_for(ctx).map(Some),
			TokenKind::Func => self.parse_function().map(Some),
			TokenKind::Break => {
				self.tokens.discard();
				if !ctx.in_loop {
					return Err(ParseError::new(line, ParseErrorKind::BreakOutsideLoop));
				}
				self.expect(&TokenKind::Semicolon, ParseErrorKind::ExpectedSemicolon)?;
				Ok(Some(Statement::Break { line }))
			}
			TokenKind::Continue => {
				self.tokens.discard();
				if !ctx.in_loop {
					return Err(ParseError::new(line, ParseErrorKind::ContinueOutsideLoop));
				}
				self.expect(&TokenKind::Semicolon, ParseErrorKind::ExpectedSemicolon)?;
				Ok(Some(Statement::Continue { line }))
			}
			TokenKind::Return => self.parse_return(ctx).map(Some),
			TokenKind::Identifier(_)
			| TokenKind::IntLiteral(_)
			| TokenKind::FloatLiteral(_)
			| TokenKind::BoolLiteral(_)
			| TokenKind::StringLiteral(_)
			| TokenKind::LeftParen
			| TokenKind::Plus
			| TokenKind::Minus
			| TokenKind::Not
			| TokenKind::Ampersand
			| TokenKind::Caret
			| TokenKind::Apostrophe => {
				let statement = self.parse_expression_or_assignment()?;
				self.expect(&TokenKind::Semicolon, ParseErrorKind::ExpectedSemicolon)?;
				Ok(Some(statement))
			}
			other => Err(ParseError::new(line, ParseErrorKind::UnexpectedToken(other.to_string()))),
		}
	}

	fn parse_declaration(&mut self) -> Result<Statement, ParseError> {
		self.tokens.discard(); // consume 'let'
		let line = self.tokens.current_line();

		let (name, _) = self.expect_identifier(ParseErrorKind::ExpectedVariableName)?;
		if !matches!(self.peek_kind(), Some(TokenKind::Equal)) {
			return Err(ParseError::new(
				self.tokens.current_line(),
				ParseErrorKind::DeclarationWithoutValue(name),
			));
		}
		self.tokens.discard(); // consume '='

		let initializer = self.parse_expression(ExprBounds::default())?;
		self.expect(&TokenKind::Semicolon, ParseErrorKind::ExpectedSemicolon)?;
		Ok(Statement::Declaration { name, line, initializer })
	}

	fn parse_if(&mut self, ctx: StatementContext) -> Result<Statement, ParseError> {
		self.tokens.discard(); // consume 'if'
		let line = self.tokens.current_line();

		let condition = self.parse_expression(ExprBounds::default())?;
		self.expect(&TokenKind::LeftBrace, ParseErrorKind::ExpectedLeftBrace)?;
		let then_branch = self.parse_block_body(StatementContext { in_block: true, ..ctx })?;

		let mut else_branch = Vec::new();
		if matches!(self.peek_kind(), Some(TokenKind::Else)) {
			self.tokens.discard();
			if matches!(self.peek_kind(), Some(TokenKind::LeftBrace)) {
				self.tokens.discard();
				else_branch = self.parse_block_body(StatementContext { in_block: true, ..ctx })?;
			} else {
				// A bare statement is fine too; `else if` chains fall out of
				// this for free.
				match self.parse_statement(StatementContext { in_block: false, ..ctx })? {
					Some(statement) => else_branch.push(statement),
					None => {
						return Err(ParseError::new(self.tokens.current_line(), ParseErrorKind::EmptyElse));
					}
				}
			}
		}
		Ok(Statement::If { condition, line, then_branch, else_branch })
	}

	fn parse_while(&mut self, ctx: StatementContext) -> Result<Statement, ParseError> {
		self.tokens.discard(); // consume 'while'
		let line = self.tokens.current_line();

		let condition = self.parse_expression(ExprBounds::default())?;
		self.expect(&TokenKind::LeftBrace, ParseErrorKind::ExpectedLeftBrace)?;
		let body = self.parse_block_body(StatementContext { in_block: true, in_loop: true, ..ctx })?;
		Ok(Statement::While { condition, line, body })
	}

	fn parse_for(&mut self, ctx: StatementContext) -> Result<Statement, ParseError> {
		self.tokens.discard(); // consume 'for'
		let line = self.tokens.current_line();

		let (iterator, _) = self.expect_identifier(ParseErrorKind::ExpectedIteratorName)?;
		self.expect(&TokenKind::Colon, ParseErrorKind::ExpectedColon)?;
		let start = self.parse_expression(ExprBounds { before_arrow: true, ..Default::default() })?;
		self.expect(&TokenKind::Arrow, ParseErrorKind::ExpectedArrow)?;
		let end = self.parse_expression(ExprBounds::default())?;
		self.expect(&TokenKind::LeftBrace, ParseErrorKind::ExpectedLeftBrace)?;
		let body = self.parse_block_body(StatementContext { in_block: true, in_loop: true, ..ctx })?;
		Ok(Statement::For { iterator, line, start, end, body })
	}

	fn parse_function(&mut self) -> Result<Statement, ParseError> {
		self.tokens.discard(); // consume 'func'
		let line = self.tokens.current_line();

		let (name, _) = self.expect_identifier(ParseErrorKind::ExpectedFunctionName)?;
		self.expect(&TokenKind::LeftParen, ParseErrorKind::ExpectedLeftParen)?;

		let mut parameters = Vec::new();
		let mut allow_comma = false;
		let mut allow_identifier = true;
		let mut allow_right_paren = true;
		loop {
			let token = match self.tokens.next() {
				Some(token) => token,
				None => return Err(ParseError::new(self.tokens.current_line(), ParseErrorKind::UnexpectedEnd)),
			};
			match token.kind {
				TokenKind::RightParen => {
					if !allow_right_paren {
						return Err(ParseError::new(token.line, ParseErrorKind::ExpectedParameter));
					}
					break;
				}
				TokenKind::Identifier(parameter) => {
					if !allow_identifier {
						return Err(ParseError::new(token.line, ParseErrorKind::UnexpectedToken(parameter)));
					}
					parameters.push(parameter);
					allow_comma = true;
					allow_identifier = false;
					allow_right_paren = true;
				}
				TokenKind::Comma => {
					if !allow_comma {
						return Err(ParseError::new(token.line, ParseErrorKind::ExpectedParameter));
					}
					allow_comma = false;
					allow_identifier = true;
					allow_right_paren = false;
				}
				other => {
					return Err(ParseError::new(token.line, ParseErrorKind::UnexpectedToken(other.to_string())));
				}
			}
		}

		// Loop context does not cross a function boundary: the body starts
		// fresh, so `break` inside a function inside a loop is still an error.
		let body_ctx = StatementContext { in_block: true, in_loop: false, in_function: true };
		let body = if matches!(self.peek_kind(), Some(TokenKind::LeftBrace)) {
			self.tokens.discard();
			self.parse_block_body(body_ctx)?
		} else {
			match self.parse_statement(StatementContext { in_block: false, ..body_ctx })? {
				Some(statement) => vec![statement],
				None => {
					return Err(ParseError::new(self.tokens.current_line(), ParseErrorKind::EmptyFunctionBody));
				}
			}
		};
		Ok(Statement::FunctionDefinition(Function {
			name,
			line,
			parameters: std::rc::Rc::new(parameters),
			body: std::rc::Rc::new(body),
		}))
	}

	fn parse_return(&mut self, ctx: StatementContext) -> Result<Statement, ParseError> {
		self.tokens.discard(); // consume 'return'
		let line = self.tokens.current_line();
		if !ctx.in_function {
			return Err(ParseError::new(line, ParseErrorKind::ReturnOutsideFunction));
		}

		let value = match self.peek_kind() {
			None => return Err(ParseError::new(line, ParseErrorKind::UnexpectedEnd)),
			Some(TokenKind::Semicolon) => None,
			Some(_) => Some(self.parse_expression(ExprBounds::default())?),
		};
		self.expect(&TokenKind::Semicolon, ParseErrorKind::ExpectedSemicolon)?;
		Ok(Statement::Return { line, value })
	}

	/// Scan ahead for an assignment operator before the terminating `;` to
	/// decide between an assignment and a bare expression statement.
	fn parse_expression_or_assignment(&mut self) -> Result<Statement, ParseError> {
		let mut distance = 1;
		loop {
			match self.tokens.peek(distance) {
				None => {
					return Err(ParseError::new(self.tokens.current_line(), ParseErrorKind::ExpectedSemicolon));
				}
				Some(token) if token.kind == TokenKind::Semicolon => {
					let expression = self.parse_expression(ExprBounds::default())?;
					return Ok(Statement::Expression(expression));
				}
				Some(token) if token.kind.is_assignment() => return self.parse_assignment(),
				Some(_) => distance += 1,
			}
		}
	}

	fn parse_assignment(&mut self) -> Result<Statement, ParseError> {
		let target = self.parse_expression(ExprBounds { before_assign: true, ..Default::default() })?;

		let (op, line) = match self.tokens.next() {
			Some(token) => match AssignOp::from_token(&token.kind) {
				Some(op) => (op, token.line),
				None => {
					return Err(ParseError::new(token.line, ParseErrorKind::UnexpectedToken(token.kind.to_string())));
				}
			},
			None => return Err(ParseError::new(self.tokens.current_line(), ParseErrorKind::UnexpectedEnd)),
		};

		let value = self.parse_expression(ExprBounds::default())?;
		Ok(Statement::Assignment { target, op, value, line })
	}

	/// Statements up to (and consuming) the closing `}`.
	fn parse_block_body(&mut self, ctx: StatementContext) -> Result<Vec<Statement>, ParseError> {
		let mut statements = Vec::new();
		loop {
			self.skip_empty_statements();
			match self.parse_statement(ctx)? {
				Some(statement) => statements.push(statement),
				None => break,
			}
		}
		self.expect(&TokenKind::RightBrace, ParseErrorKind::ExpectedRightBrace)?;
		Ok(statements)
	}

	/// Feed tokens into an [`ExprBuilder`] until a boundary token shows up.
	/// Which boundaries are legal depends on where the expression sits.
	fn parse_expression(&mut self, bounds: ExprBounds) -> Result<Expr, ParseError> {
		let mut builder = ExprBuilder::new();
		loop {
			let (kind, line) = match self.tokens.peek(1) {
				Some(token) => (token.kind.clone(), token.line),
				None => {
					let line = self.tokens.current_line();
					let kind = if builder.is_empty() {
						ParseErrorKind::EmptyExpression
					} else {
						ParseErrorKind::IncompleteExpression
					};
					return Err(ParseError::new(line, kind));
				}
			};

			let is_boundary = matches!(
				kind,
				TokenKind::Semicolon
					| TokenKind::Comma
					| TokenKind::RightParen
					| TokenKind::RightBracket
					| TokenKind::LeftBrace
					| TokenKind::Arrow
			) || kind.is_assignment();
			if is_boundary {
				if builder.is_empty() {
					return Err(ParseError::new(line, ParseErrorKind::EmptyExpression));
				}
				if !builder.is_complete() {
					return Err(ParseError::new(line, ParseErrorKind::UnexpectedToken(kind.to_string())));
				}
				match &kind {
					TokenKind::RightParen if !bounds.in_parens => {
						return Err(ParseError::new(line, ParseErrorKind::ClosedParenthesisNeverOpened));
					}
					TokenKind::RightBracket if !bounds.in_subscript => {
						return Err(ParseError::new(line, ParseErrorKind::UnexpectedToken("]".to_string())));
					}
					TokenKind::Arrow if !bounds.before_arrow => {
						return Err(ParseError::new(line, ParseErrorKind::UnexpectedToken("->".to_string())));
					}
					k if k.is_assignment() && !bounds.before_assign => {
						return Err(ParseError::new(line, ParseErrorKind::UnexpectedToken(k.to_string())));
					}
					_ => {}
				}
				return builder.finish(line);
			}

			match kind {
				TokenKind::Identifier(name) => {
					self.tokens.discard();
					if matches!(self.peek_kind(), Some(TokenKind::LeftParen)) {
						let call = self.parse_call(name, line)?;
						let call = self.maybe_subscript(call)?;
						builder.attach(call)?;
					} else {
						let value = self.maybe_subscript(Expr::value(AstValue::Identifier(name), line))?;
						builder.attach(value)?;
					}
				}
				TokenKind::IntLiteral(v) => self.attach_literal(&mut builder, AstValue::Int(v), line)?,
				TokenKind::FloatLiteral(v) => self.attach_literal(&mut builder, AstValue::Float(v), line)?,
				TokenKind::BoolLiteral(v) => self.attach_literal(&mut builder, AstValue::Bool(v), line)?,
				TokenKind::StringLiteral(s) => self.attach_literal(&mut builder, AstValue::Str(s), line)?,
				TokenKind::LeftParen => {
					self.tokens.discard();
					let mut inner = self.parse_expression(ExprBounds { in_parens: true, ..Default::default() })?;
					self.expect(&TokenKind::RightParen, ParseErrorKind::UnmatchedParenthesis)?;
					inner.parenthesised = true;
					let inner = self.maybe_subscript(inner)?;
					builder.attach(inner)?;
				}
				TokenKind::Plus
				| TokenKind::Minus
				| TokenKind::Star
				| TokenKind::Slash
				| TokenKind::Percent
				| TokenKind::Caret
				| TokenKind::Ampersand
				| TokenKind::Apostrophe
				| TokenKind::Not
				| TokenKind::And
				| TokenKind::Or
				| TokenKind::EqualEqual
				| TokenKind::BangEqual
				| TokenKind::Less
				| TokenKind::LessEqual
				| TokenKind::Greater
				| TokenKind::GreaterEqual => {
					self.tokens.discard();
					builder.push_operator(&kind, line)?;
				}
				other => return Err(ParseError::new(line, ParseErrorKind::UnexpectedToken(other.to_string()))),
			}
		}
	}

	fn attach_literal(
		&mut self,
		builder: &mut ExprBuilder,
		value: AstValue,
		line: usize,
	) -> Result<(), ParseError> {
		self.tokens.discard();
		let expr = self.maybe_subscript(Expr::value(value, line))?;
		builder.attach(expr)
	}

	/// Arguments of `name(...)`; the identifier is consumed, the `(` is next.
	fn parse_call(&mut self, name: String, line: usize) -> Result<Expr, ParseError> {
		self.tokens.discard(); // consume '('
		let mut args = Vec::new();
		if matches!(self.peek_kind(), Some(TokenKind::RightParen)) {
			self.tokens.discard();
			return Ok(Expr::call(name, args, line));
		}
		loop {
			args.push(self.parse_expression(ExprBounds { in_parens: true, ..Default::default() })?);
			match self.tokens.next() {
				Some(Token { kind: TokenKind::RightParen, .. }) => break,
				Some(Token { kind: TokenKind::Comma, .. }) => continue,
				Some(token) => {
					return Err(ParseError::new(token.line, ParseErrorKind::UnexpectedToken(token.kind.to_string())));
				}
				None => return Err(ParseError::new(self.tokens.current_line(), ParseErrorKind::UnexpectedEnd)),
			}
		}
		Ok(Expr::call(name, args, line))
	}

	/// A `[index]` suffix on a value-like node, if present.
	fn maybe_subscript(&mut self, target: Expr) -> Result<Expr, ParseError> {
		if !matches!(self.peek_kind(), Some(TokenKind::LeftBracket)) {
			return Ok(target);
		}
		let line = target.line;
		self.tokens.discard(); // consume '['
		let index = self.parse_expression(ExprBounds { in_subscript: true, ..Default::default() })?;
		self.expect(&TokenKind::RightBracket, ParseErrorKind::ExpectedRightBracket)?;
		Ok(Expr::subscript(target, index, line))
	}

	fn expect(&mut self, want: &TokenKind, error: ParseErrorKind) -> Result<Token, ParseError> {
		match self.tokens.next() {
			Some(token) if token.kind == *want => Ok(token),
			Some(token) => Err(ParseError::new(token.line, error)),
			None => Err(ParseError::new(self.tokens.current_line(), error)),
		}
	}

	fn expect_identifier(&mut self, error: ParseErrorKind) -> Result<(String, usize), ParseError> {
		match self.tokens.next() {
			Some(Token { kind: TokenKind::Identifier(name), line }) => Ok((name, line)),
			Some(token) => Err(ParseError::new(token.line, error)),
			None => Err(ParseError::new(self.tokens.current_line(), error)),
		}
	}
}
