//! Expression AST and the incremental tree assembly the parser drives.
//!
//! Expressions are not parsed by recursive descent over precedence levels.
//! Instead the parser feeds tokens one at a time into an [`ExprBuilder`]
//! holding a single root:
//!
//! - a value-like node fills the rightmost open slot,
//! - a binary operator walks down the rightmost spine and re-roots the first
//!   subtree it may break apart (anything parenthesised or value-like, or a
//!   binary operator that binds at least as tightly), so looser operators
//!   bubble towards the root,
//! - an operator right after another operator must be a unary prefix
//!   operator and lands in the rightmost open slot itself.
//!
//! Parenthesised subtrees carry a flag and are never re-rooted through,
//! which is what gives `(1 + 2) * 3` its meaning.

use crate::{error::parser::{ParseError, ParseErrorKind}, lexer::TokenKind};

/// A literal or identifier leaf.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AstValue {
	Int(i64),
	Float(f64),
	Bool(bool),
	Str(String),
	Identifier(String),
}

impl std::fmt::Display for AstValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AstValue::Int(v) => write!(f, "{v}"),
			AstValue::Float(v) => write!(f, "{v}"),
			AstValue::Bool(v) => write!(f, "{v}"),
			AstValue::Str(s) => write!(f, "\"{s}\""),
			AstValue::Identifier(name) => write!(f, "{name}"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
	/// `+x`, kept for symmetry; a no-op on numbers.
	Plus,
	/// `-x`.
	Negate,
	/// `not x`.
	Not,
	/// `&x`, take a reference to a variable.
	Reference,
	/// `^x`, resolve a reference back to its variable.
	Dereference,
	/// `'x`, look a name up across the whole stack, not just the current
	/// function window.
	ParentScope,
}

impl UnaryOp {
	pub fn from_token(kind: &TokenKind) -> Option<Self> {
		match kind {
			TokenKind::Plus => Some(UnaryOp::Plus),
			TokenKind::Minus => Some(UnaryOp::Negate),
			TokenKind::Not => Some(UnaryOp::Not),
			TokenKind::Ampersand => Some(UnaryOp::Reference),
			TokenKind::Caret => Some(UnaryOp::Dereference),
			TokenKind::Apostrophe => Some(UnaryOp::ParentScope),
			_ => None,
		}
	}

	pub fn symbol(self) -> &'static str {
		match self {
			UnaryOp::Plus => "+",
			UnaryOp::Negate => "-",
			UnaryOp::Not => "not",
			UnaryOp::Reference => "&",
			UnaryOp::Dereference => "^",
			UnaryOp::ParentScope => "'",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Pow,
	And,
	Or,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
}

impl BinaryOp {
	pub fn from_token(kind: &TokenKind) -> Option<Self> {
		match kind {
			TokenKind::Plus => Some(BinaryOp::Add),
			TokenKind::Minus => Some(BinaryOp::Sub),
			TokenKind::Star => Some(BinaryOp::Mul),
			TokenKind::Slash => Some(BinaryOp::Div),
			TokenKind::Percent => Some(BinaryOp::Rem),
			TokenKind::Caret => Some(BinaryOp::Pow),
			TokenKind::And => Some(BinaryOp::And),
			TokenKind::Or => Some(BinaryOp::Or),
			TokenKind::EqualEqual => Some(BinaryOp::Eq),
			TokenKind::BangEqual => Some(BinaryOp::Ne),
			TokenKind::Less => Some(BinaryOp::Lt),
			TokenKind::LessEqual => Some(BinaryOp::Le),
			TokenKind::Greater => Some(BinaryOp::Gt),
			TokenKind::GreaterEqual => Some(BinaryOp::Ge),
			_ => None,
		}
	}

	/// Binding strength, 0 = tightest.
	pub fn precedence(self) -> u8 {
		match self {
			BinaryOp::Pow => 0,
			BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 1,
			BinaryOp::Add | BinaryOp::Sub => 2,
			BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 3,
			BinaryOp::And | BinaryOp::Or => 4,
		}
	}

	/// Exponentiation chains to the right; everything else to the left.
	pub fn is_right_associative(self) -> bool { matches!(self, BinaryOp::Pow) }

	pub fn symbol(self) -> &'static str {
		match self {
			BinaryOp::Add => "+",
			BinaryOp::Sub => "-",
			BinaryOp::Mul => "*",
			BinaryOp::Div => "/",
			BinaryOp::Rem => "%",
			BinaryOp::Pow => "^",
			BinaryOp::And => "and",
			BinaryOp::Or => "or",
			BinaryOp::Eq => "==",
			BinaryOp::Ne => "!=",
			BinaryOp::Lt => "<",
			BinaryOp::Le => "<=",
			BinaryOp::Gt => ">",
			BinaryOp::Ge => ">=",
		}
	}
}

/// An expression node. Children sit in `Option`s because the builder fills
/// them incrementally; a finished expression has no empty slots.
#[derive(Debug, Clone)]
pub(crate) struct Expr {
	pub kind:          ExprKind,
	pub line:          usize,
	pub parenthesised: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum ExprKind {
	Value(AstValue),
	Unary { op: UnaryOp, operand: Option<Box<Expr>> },
	Binary { op: BinaryOp, lhs: Option<Box<Expr>>, rhs: Option<Box<Expr>> },
	Call { name: String, args: Vec<Expr> },
	Subscript { target: Box<Expr>, index: Box<Expr> },
}

impl Expr {
	pub fn value(value: AstValue, line: usize) -> Self {
		Self { kind: ExprKind::Value(value), line, parenthesised: false }
	}

	fn unary(op: UnaryOp, line: usize) -> Self {
		Self { kind: ExprKind::Unary { op, operand: None }, line, parenthesised: false }
	}

	fn binary(op: BinaryOp, line: usize) -> Self {
		Self { kind: ExprKind::Binary { op, lhs: None, rhs: None }, line, parenthesised: false }
	}

	pub fn call(name: String, args: Vec<Expr>, line: usize) -> Self {
		Self { kind: ExprKind::Call { name, args }, line, parenthesised: false }
	}

	pub fn subscript(target: Expr, index: Expr, line: usize) -> Self {
		Self {
			kind: ExprKind::Subscript { target: Box::new(target), index: Box::new(index) },
			line,
			parenthesised: false,
		}
	}

	/// The identifier this expression names, if it is a plain name.
	pub fn identifier_name(&self) -> Option<&str> {
		match &self.kind {
			ExprKind::Value(AstValue::Identifier(name)) => Some(name),
			_ => None,
		}
	}
}

/// Assembles one expression from a stream of value-like nodes and operator
/// tokens. The parser owns the token handling; the builder owns the tree
/// surgery.
pub(crate) struct ExprBuilder {
	root:     Option<Expr>,
	/// Whether the last insertion was value-like. True exactly when the tree
	/// has no open slot.
	complete: bool,
}

impl ExprBuilder {
	pub fn new() -> Self { Self { root: None, complete: false } }

	pub fn is_empty(&self) -> bool { self.root.is_none() }

	pub fn is_complete(&self) -> bool { self.complete }

	/// Attach a finished value-like node (literal, identifier, call,
	/// subscript or parenthesised subtree) at the rightmost open slot.
	pub fn attach(&mut self, expr: Expr) -> Result<(), ParseError> {
		self.place_at_open_slot(expr)?;
		self.complete = true;
		Ok(())
	}

	/// Insert an operator token.
	pub fn push_operator(&mut self, kind: &TokenKind, line: usize) -> Result<(), ParseError> {
		if self.root.is_none() {
			let op = UnaryOp::from_token(kind)
				.ok_or_else(|| ParseError::new(line, ParseErrorKind::NotAUnaryOperator(kind.to_string())))?;
			self.root = Some(Expr::unary(op, line));
			self.complete = false;
			return Ok(());
		}
		if self.complete {
			let op = BinaryOp::from_token(kind)
				.ok_or_else(|| ParseError::new(line, ParseErrorKind::NotABinaryOperator(kind.to_string())))?;
			self.insert_binary(op, line);
			self.complete = false;
			return Ok(());
		}
		// An operator directly after another operator is a unary prefix
		// operator; it occupies the open slot and opens one of its own.
		let op = UnaryOp::from_token(kind)
			.ok_or_else(|| ParseError::new(line, ParseErrorKind::NotAUnaryOperator(kind.to_string())))?;
		self.place_at_open_slot(Expr::unary(op, line))
	}

	/// The finished expression, or an error if it never got one value or
	/// still ends on an operator.
	pub fn finish(self, line: usize) -> Result<Expr, ParseError> {
		match self.root {
			None => Err(ParseError::new(line, ParseErrorKind::EmptyExpression)),
			Some(root) if self.complete => Ok(root),
			Some(_) => Err(ParseError::new(line, ParseErrorKind::IncompleteExpression)),
		}
	}

	/// Walk the rightmost spine to the first open slot and put `expr` there.
	fn place_at_open_slot(&mut self, expr: Expr) -> Result<(), ParseError> {
		let line = expr.line;
		let Some(mut current) = self.root.as_mut() else {
			self.root = Some(expr);
			return Ok(());
		};
		loop {
			match &mut current.kind {
				ExprKind::Unary { operand: slot @ None, .. } => {
					*slot = Some(Box::new(expr));
					return Ok(());
				}
				ExprKind::Binary { rhs: slot @ None, .. } => {
					*slot = Some(Box::new(expr));
					return Ok(());
				}
				ExprKind::Unary { operand: Some(child), .. } => current = child,
				ExprKind::Binary { rhs: Some(child), .. } => current = child,
				ExprKind::Value(value) => {
					return Err(ParseError::new(line, ParseErrorKind::MissingOperator(value.to_string())));
				}
				ExprKind::Call { name, .. } => {
					return Err(ParseError::new(line, ParseErrorKind::MissingOperator(name.clone())));
				}
				ExprKind::Subscript { .. } => {
					return Err(ParseError::new(line, ParseErrorKind::MissingOperator("]".to_string())));
				}
			}
		}
	}

	/// Walk the rightmost spine past every binary operator that binds looser
	/// than `op` and take the subtree found there as the new operator's left
	/// operand. Parenthesised subtrees stop the walk: nothing re-roots
	/// through them.
	fn insert_binary(&mut self, op: BinaryOp, line: usize) {
		fn walk(current: &mut Expr, op: BinaryOp, line: usize) {
			let descend = match &current.kind {
				ExprKind::Binary { op: existing, .. } if !current.parenthesised => {
					let (existing, new) = (existing.precedence(), op.precedence());
					existing > new || (existing == new && op.is_right_associative())
				}
				_ => false,
			};
			if descend {
				if let ExprKind::Binary { rhs: Some(child), .. } = &mut current.kind {
					walk(child, op, line);
					return;
				}
			}
			let lhs = std::mem::replace(current, Expr::binary(op, line));
			if let ExprKind::Binary { lhs: slot, .. } = &mut current.kind {
				*slot = Some(Box::new(lhs));
			}
		}
		if let Some(current) = self.root.as_mut() {
			walk(current, op, line);
		}
	}
}

impl std::fmt::Display for Expr {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		fn child(f: &mut std::fmt::Formatter<'_>, slot: &Option<Box<Expr>>) -> std::fmt::Result {
			match slot {
				Some(expr) => write!(f, "{expr}"),
				None => write!(f, "_"),
			}
		}
		if self.parenthesised {
			write!(f, "(group ")?;
		}
		match &self.kind {
			ExprKind::Value(value) => write!(f, "{value}")?,
			ExprKind::Unary { op, operand } => {
				write!(f, "({} ", op.symbol())?;
				child(f, operand)?;
				write!(f, ")")?;
			}
			ExprKind::Binary { op, lhs, rhs } => {
				write!(f, "({} ", op.symbol())?;
				child(f, lhs)?;
				write!(f, " ")?;
				child(f, rhs)?;
				write!(f, ")")?;
			}
			ExprKind::Call { name, args } => {
				write!(f, "(call {name}")?;
				for arg in args {
					write!(f, " {arg}")?;
				}
				write!(f, ")")?;
			}
			ExprKind::Subscript { target, index } => write!(f, "(index {target} {index})")?,
		}
		if self.parenthesised {
			write!(f, ")")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn value(v: i64) -> Expr { Expr::value(AstValue::Int(v), 1) }

	#[test]
	fn builder_assembles_by_precedence() {
		// 1 + 2 * 3  =>  (+ 1 (* 2 3))
		let mut builder = ExprBuilder::new();
		builder.attach(value(1)).unwrap();
		builder.push_operator(&TokenKind::Plus, 1).unwrap();
		builder.attach(value(2)).unwrap();
		builder.push_operator(&TokenKind::Star, 1).unwrap();
		builder.attach(value(3)).unwrap();
		assert_eq!(builder.finish(1).unwrap().to_string(), "(+ 1 (* 2 3))");
	}

	#[test]
	fn builder_re_roots_loose_operators() {
		// 1 * 2 + 3  =>  (+ (* 1 2) 3)
		let mut builder = ExprBuilder::new();
		builder.attach(value(1)).unwrap();
		builder.push_operator(&TokenKind::Star, 1).unwrap();
		builder.attach(value(2)).unwrap();
		builder.push_operator(&TokenKind::Plus, 1).unwrap();
		builder.attach(value(3)).unwrap();
		assert_eq!(builder.finish(1).unwrap().to_string(), "(+ (* 1 2) 3)");
	}

	#[test]
	fn builder_rejects_two_values_in_a_row() {
		let mut builder = ExprBuilder::new();
		builder.attach(value(1)).unwrap();
		assert!(builder.attach(value(2)).is_err());
	}

	#[test]
	fn builder_rejects_trailing_operator() {
		let mut builder = ExprBuilder::new();
		builder.attach(value(1)).unwrap();
		builder.push_operator(&TokenKind::Plus, 1).unwrap();
		assert!(builder.finish(1).is_err());
	}

	#[test]
	fn builder_rejects_empty_expression() {
		assert!(ExprBuilder::new().finish(1).is_err());
	}

	#[test]
	fn star_is_not_a_prefix_operator() {
		let mut builder = ExprBuilder::new();
		assert!(builder.push_operator(&TokenKind::Star, 1).is_err());
	}

	#[test]
	fn not_is_not_a_binary_operator() {
		let mut builder = ExprBuilder::new();
		builder.attach(value(1)).unwrap();
		assert!(builder.push_operator(&TokenKind::Not, 1).is_err());
	}
}
