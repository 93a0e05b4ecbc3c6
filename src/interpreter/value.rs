//! Runtime values and the numeric operation tables.
//!
//! `Int` and `Float` mix freely in arithmetic and comparisons: an `Int`
//! meeting a `Float` promotes the result to `Float` with the integer read as
//! `f64`. Everything else is strict; there is no truthiness and no implicit
//! string conversion anywhere.

use crate::{error::interpreter::RuntimeErrorKind, parser::expression::BinaryOp};

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
	Void,
	Int(i64),
	Float(f64),
	Bool(bool),
	Str(String),
	/// A handle to a variable slot, stamped with the generation of the
	/// variable it was taken to so dangling handles are caught on use.
	Reference { slot: usize, generation: u64 },
}

impl Value {
	/// The name `typename` reports and error messages use.
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Void => "Void",
			Value::Int(_) => "Int",
			Value::Float(_) => "Float",
			Value::Bool(_) => "Bool",
			Value::Str(_) => "String",
			Value::Reference { .. } => "Reference",
		}
	}
}

impl std::fmt::Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Void => write!(f, "Void"),
			Value::Int(v) => write!(f, "{v}"),
			Value::Float(v) => write!(f, "{v}"),
			Value::Bool(v) => write!(f, "{v}"),
			Value::Str(s) => write!(f, "{s}"),
			Value::Reference { .. } => write!(f, "Reference"),
		}
	}
}

/// Apply an arithmetic operator with numeric promotion.
pub(crate) fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeErrorKind> {
	match (lhs, rhs) {
		(Value::Int(l), Value::Int(r)) => int_arithmetic(op, *l, *r).map(Value::Int),
		(Value::Float(l), Value::Float(r)) => Ok(Value::Float(float_arithmetic(op, *l, *r))),
		(Value::Int(l), Value::Float(r)) => Ok(Value::Float(float_arithmetic(op, *l as f64, *r))),
		(Value::Float(l), Value::Int(r)) => Ok(Value::Float(float_arithmetic(op, *l, *r as f64))),
		_ => Err(RuntimeErrorKind::ArithmeticType {
			op:  op.symbol(),
			lhs: lhs.type_name(),
			rhs: rhs.type_name(),
		}),
	}
}

fn int_arithmetic(op: BinaryOp, lhs: i64, rhs: i64) -> Result<i64, RuntimeErrorKind> {
	match op {
		BinaryOp::Add => Ok(lhs.wrapping_add(rhs)),
		BinaryOp::Sub => Ok(lhs.wrapping_sub(rhs)),
		BinaryOp::Mul => Ok(lhs.wrapping_mul(rhs)),
		BinaryOp::Div => lhs.checked_div(rhs).ok_or(RuntimeErrorKind::DivisionByZero),
		BinaryOp::Rem => lhs.checked_rem(rhs).ok_or(RuntimeErrorKind::DivisionByZero),
		// Through f64, truncated back; matches what the canvas-facing math
		// does everywhere else, at the cost of precision above 2^53.
		BinaryOp::Pow => Ok((lhs as f64).powf(rhs as f64) as i64),
		_ => Err(RuntimeErrorKind::ArithmeticType { op: op.symbol(), lhs: "Int", rhs: "Int" }),
	}
}

fn float_arithmetic(op: BinaryOp, lhs: f64, rhs: f64) -> f64 {
	match op {
		BinaryOp::Add => lhs + rhs,
		BinaryOp::Sub => lhs - rhs,
		BinaryOp::Mul => lhs * rhs,
		BinaryOp::Div => lhs / rhs,
		BinaryOp::Rem => lhs % rhs,
		BinaryOp::Pow => lhs.powf(rhs),
		_ => f64::NAN,
	}
}

/// Apply a comparison operator. Numbers cross-promote; `Bool` and `String`
/// only support equality.
pub(crate) fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<bool, RuntimeErrorKind> {
	let mismatch = || RuntimeErrorKind::ComparisonType {
		op:  op.symbol(),
		lhs: lhs.type_name(),
		rhs: rhs.type_name(),
	};
	match (lhs, rhs) {
		(Value::Int(l), Value::Int(r)) => Ok(ordered_compare(op, l, r)),
		(Value::Float(l), Value::Float(r)) => Ok(ordered_compare(op, l, r)),
		(Value::Int(l), Value::Float(r)) => Ok(ordered_compare(op, &(*l as f64), r)),
		(Value::Float(l), Value::Int(r)) => Ok(ordered_compare(op, l, &(*r as f64))),
		(Value::Bool(l), Value::Bool(r)) => match op {
			BinaryOp::Eq => Ok(l == r),
			BinaryOp::Ne => Ok(l != r),
			_ => Err(mismatch()),
		},
		(Value::Str(l), Value::Str(r)) => match op {
			BinaryOp::Eq => Ok(l == r),
			BinaryOp::Ne => Ok(l != r),
			_ => Err(mismatch()),
		},
		_ => Err(mismatch()),
	}
}

fn ordered_compare<T: PartialOrd>(op: BinaryOp, lhs: &T, rhs: &T) -> bool {
	match op {
		BinaryOp::Eq => lhs == rhs,
		BinaryOp::Ne => lhs != rhs,
		BinaryOp::Lt => lhs < rhs,
		BinaryOp::Le => lhs <= rhs,
		BinaryOp::Gt => lhs > rhs,
		BinaryOp::Ge => lhs >= rhs,
		_ => false,
	}
}
