//! The tree-walking evaluator.
//!
//! Statements report how they finished through [`Flow`]: `break`, `continue`
//! and `return` are ordinary status values that bubble up through the
//! statement walk until a loop or a call frame absorbs them. Hard failures
//! travel separately as `Err(RuntimeError)` and abort the run.
//!
//! Expression evaluation has two entry points. [`Interpreter::eval`] always
//! produces a finished [`Value`]; identifiers load the variable they name.
//! [`Interpreter::eval_place`] is used in assignment position and resolves
//! an expression to the variable *slot* it denotes instead, which is what
//! `x = ...`, `^r = ...` and `'outer = ...` store through.

pub(crate) mod builtins;
pub(crate) mod canvas;
pub(crate) mod value;

use std::{rc::Rc, time::{SystemTime, UNIX_EPOCH}};

use log::debug;
use rand::{SeedableRng, rngs::StdRng};

use self::{canvas::Canvas, value::Value};

use crate::{
	environment::VariableStack,
	error::interpreter::{RuntimeError, RuntimeErrorKind},
	parser::expression::{AstValue, BinaryOp, Expr, ExprKind, UnaryOp},
	statement::{AssignOp, Statement},
	utils::RcCell,
};

/// How a statement finished.
#[derive(Debug)]
pub(crate) enum Flow {
	Normal,
	Break,
	Continue,
	Return(Value),
}

/// A user-defined function as registered in the table. The table is
/// truncated together with the variable stack on block exit, which is what
/// scopes nested definitions to their enclosing block.
#[derive(Clone)]
struct UserFunction {
	name:       String,
	parameters: Rc<Vec<String>>,
	body:       Rc<Vec<Statement>>,
}

/// Where `print` output goes. Tests capture it in a buffer; the buffer path
/// carries no color escapes.
pub(crate) enum OutputSink {
	Stdout,
	Buffer(RcCell<Vec<u8>>),
}

/// Program output is written in white; diagnostics print in red elsewhere.
const OUTPUT_COLOR: &str = "\x1b[38;5;15m";

const MAX_CALL_ARGUMENTS: usize = 16;

pub(crate) struct Interpreter {
	vars:      VariableStack,
	functions: Vec<UserFunction>,
	builtins:  Vec<builtins::Builtin>,
	canvas:    Option<Canvas>,
	rng:       StdRng,
	out:       OutputSink,
}

impl Interpreter {
	pub fn new() -> Self { Self::with_sink(OutputSink::Stdout) }

	pub fn with_output(buffer: RcCell<Vec<u8>>) -> Self { Self::with_sink(OutputSink::Buffer(buffer)) }

	fn with_sink(out: OutputSink) -> Self {
		let seed = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|elapsed| elapsed.as_nanos() as u64)
			.unwrap_or_default();
		Self {
			vars: VariableStack::new(),
			functions: Vec::new(),
			builtins: builtins::registry(),
			canvas: None,
			rng: StdRng::seed_from_u64(seed),
			out,
		}
	}

	/// Run a whole program. The parser keeps `break`/`continue`/`return` out
	/// of the top level, so plain completion is the only non-error outcome.
	pub fn run(&mut self, statements: &[Statement]) -> Result<(), RuntimeError> {
		for statement in statements {
			self.exec(statement)?;
		}
		Ok(())
	}

	fn exec(&mut self, statement: &Statement) -> Result<Flow, RuntimeError> {
		match statement {
			Statement::Expression(expression) => {
				self.eval(expression)?;
				Ok(Flow::Normal)
			}
			Statement::Declaration { name, line, initializer } => {
				if self.vars.lookup(name).is_some() {
					return Err(RuntimeError::new(*line, RuntimeErrorKind::DuplicateDeclaration(name.clone())));
				}
				let value = self.eval(initializer)?;
				if matches!(value, Value::Void) {
					return Err(RuntimeError::new(*line, RuntimeErrorKind::VoidValue));
				}
				self.vars.push(name.clone(), value);
				Ok(Flow::Normal)
			}
			Statement::Assignment { target, op, value, line } => {
				let slot = self.eval_place(target)?;
				let rhs = self.eval(value)?;
				if matches!(rhs, Value::Void) {
					return Err(RuntimeError::new(*line, RuntimeErrorKind::VoidValue));
				}
				let next = match compound_operator(*op) {
					None => rhs,
					Some(op) => {
						let current = self.vars.value(slot).clone();
						value::arithmetic(op, &current, &rhs)
							.map_err(|kind| RuntimeError::new(*line, kind))?
					}
				};
				self.vars.set_value(slot, next);
				Ok(Flow::Normal)
			}
			Statement::If { condition, line, then_branch, else_branch } => {
				if self.eval_bool(condition, *line)? {
					self.exec_block(then_branch)
				} else {
					self.exec_block(else_branch)
				}
			}
			Statement::While { condition, line, body } => {
				loop {
					if !self.eval_bool(condition, *line)? {
						break;
					}
					match self.exec_block(body)? {
						Flow::Break => break,
						Flow::Normal | Flow::Continue => {}
						flow @ Flow::Return(_) => return Ok(flow),
					}
				}
				Ok(Flow::Normal)
			}
			Statement::For { iterator, line, start, end, body } => {
				let start = self.eval_for_bound(start, *line)?;
				let end = self.eval_for_bound(end, *line)?;
				let slot = self.vars.push(iterator.clone(), Value::Int(start));
				let result = self.run_for(slot, iterator, *line, end, body);
				self.vars.truncate(slot);
				result
			}
			Statement::FunctionDefinition(function) => {
				self.functions.push(UserFunction {
					name:       function.name.clone(),
					parameters: function.parameters.clone(),
					body:       function.body.clone(),
				});
				Ok(Flow::Normal)
			}
			Statement::Break { .. } => Ok(Flow::Break),
			Statement::Continue { .. } => Ok(Flow::Continue),
			Statement::Return { value, .. } => {
				let result = match value {
					Some(expression) => self.eval(expression)?,
					None => Value::Void,
				};
				Ok(Flow::Return(result))
			}
		}
	}

	fn run_for(
		&mut self,
		slot: usize,
		iterator: &str,
		line: usize,
		end: i64,
		body: &[Statement],
	) -> Result<Flow, RuntimeError> {
		loop {
			if self.iterator_value(slot, iterator, line)? >= end {
				break;
			}
			match self.exec_block(body)? {
				Flow::Break => break,
				Flow::Normal | Flow::Continue => {}
				flow @ Flow::Return(_) => return Ok(flow),
			}
			// Re-read after the body; assigning to the iterator is allowed.
			let current = self.iterator_value(slot, iterator, line)?;
			self.vars.set_value(slot, Value::Int(current.wrapping_add(1)));
		}
		Ok(Flow::Normal)
	}

	fn iterator_value(&self, slot: usize, iterator: &str, line: usize) -> Result<i64, RuntimeError> {
		match self.vars.value(slot) {
			Value::Int(value) => Ok(*value),
			_ => Err(RuntimeError::new(line, RuntimeErrorKind::ForIteratorType(iterator.to_string()))),
		}
	}

	fn eval_for_bound(&mut self, bound: &Expr, line: usize) -> Result<i64, RuntimeError> {
		match self.eval(bound)? {
			Value::Int(value) => Ok(value),
			other => Err(RuntimeError::new(line, RuntimeErrorKind::ForBoundType(other.type_name()))),
		}
	}

	/// Execute a nested block: snapshot the variable stack and the function
	/// table, run, truncate both on every exit path, error included.
	fn exec_block(&mut self, statements: &[Statement]) -> Result<Flow, RuntimeError> {
		let vars_len = self.vars.len();
		let funcs_len = self.functions.len();
		let result = self.exec_statements(statements);
		self.vars.truncate(vars_len);
		self.functions.truncate(funcs_len);
		result
	}

	fn exec_statements(&mut self, statements: &[Statement]) -> Result<Flow, RuntimeError> {
		for statement in statements {
			match self.exec(statement)? {
				Flow::Normal => {}
				flow => return Ok(flow),
			}
		}
		Ok(Flow::Normal)
	}

	/// Evaluate to a finished value; identifiers load their variable.
	fn eval(&mut self, expression: &Expr) -> Result<Value, RuntimeError> {
		let line = expression.line;
		match &expression.kind {
			ExprKind::Value(AstValue::Int(v)) => Ok(Value::Int(*v)),
			ExprKind::Value(AstValue::Float(v)) => Ok(Value::Float(*v)),
			ExprKind::Value(AstValue::Bool(v)) => Ok(Value::Bool(*v)),
			ExprKind::Value(AstValue::Str(s)) => Ok(Value::Str(s.clone())),
			ExprKind::Value(AstValue::Identifier(name)) => {
				let slot = self.lookup(name, line)?;
				Ok(self.vars.value(slot).clone())
			}
			ExprKind::Unary { op, operand } => self.eval_unary(*op, operand_of(operand), line),
			ExprKind::Binary { op, lhs, rhs } => {
				self.eval_binary(*op, operand_of(lhs), operand_of(rhs), line)
			}
			ExprKind::Call { name, args } => self.call_function(name, args, line),
			ExprKind::Subscript { .. } => Err(RuntimeError::new(line, RuntimeErrorKind::NotIndexable)),
		}
	}

	fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, line: usize) -> Result<Value, RuntimeError> {
		match op {
			UnaryOp::Plus | UnaryOp::Negate => {
				let negate = op == UnaryOp::Negate;
				match self.eval(operand)? {
					Value::Int(v) => Ok(Value::Int(if negate { v.wrapping_neg() } else { v })),
					Value::Float(v) => Ok(Value::Float(if negate { -v } else { v })),
					other => Err(RuntimeError::new(line, RuntimeErrorKind::CannotNegate(other.type_name()))),
				}
			}
			UnaryOp::Not => match self.eval(operand)? {
				Value::Bool(v) => Ok(Value::Bool(!v)),
				other => Err(RuntimeError::new(line, RuntimeErrorKind::NotOperandType(other.type_name()))),
			},
			UnaryOp::Reference => {
				// The operand has to *be* a name, not merely evaluate to one.
				let Some(name) = operand.identifier_name() else {
					return Err(RuntimeError::new(line, RuntimeErrorKind::ReferenceTarget));
				};
				let slot = self.lookup(name, line)?;
				Ok(Value::Reference { slot, generation: self.vars.generation_of(slot) })
			}
			UnaryOp::Dereference => {
				let slot = self.deref_slot(operand, line)?;
				Ok(self.vars.value(slot).clone())
			}
			UnaryOp::ParentScope => {
				let slot = self.parent_slot(operand, line)?;
				Ok(self.vars.value(slot).clone())
			}
		}
	}

	fn eval_binary(
		&mut self,
		op: BinaryOp,
		lhs: &Expr,
		rhs: &Expr,
		line: usize,
	) -> Result<Value, RuntimeError> {
		// Both operands always evaluate, `and`/`or` included: the language
		// has no short-circuiting.
		let lhs = self.eval(lhs)?;
		let rhs = self.eval(rhs)?;
		match op {
			BinaryOp::And | BinaryOp::Or => match (lhs, rhs) {
				(Value::Bool(l), Value::Bool(r)) => {
					Ok(Value::Bool(if op == BinaryOp::And { l && r } else { l || r }))
				}
				_ => Err(RuntimeError::new(line, RuntimeErrorKind::LogicalOperandType(op.symbol()))),
			},
			BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
				value::compare(op, &lhs, &rhs)
					.map(Value::Bool)
					.map_err(|kind| RuntimeError::new(line, kind))
			}
			_ => value::arithmetic(op, &lhs, &rhs).map_err(|kind| RuntimeError::new(line, kind)),
		}
	}

	/// Evaluate an expression in assignment position down to the variable
	/// slot it denotes.
	fn eval_place(&mut self, expression: &Expr) -> Result<usize, RuntimeError> {
		let line = expression.line;
		match &expression.kind {
			ExprKind::Value(AstValue::Identifier(name)) => self.lookup(name, line),
			ExprKind::Unary { op: UnaryOp::Dereference, operand } => {
				self.deref_slot(operand_of(operand), line)
			}
			ExprKind::Unary { op: UnaryOp::ParentScope, operand } => {
				self.parent_slot(operand_of(operand), line)
			}
			_ => Err(RuntimeError::new(line, RuntimeErrorKind::NotAssignable)),
		}
	}

	/// Evaluate the operand of `^` and resolve the reference it yields, with
	/// the dangling checks.
	fn deref_slot(&mut self, operand: &Expr, line: usize) -> Result<usize, RuntimeError> {
		match self.eval(operand)? {
			Value::Reference { slot, generation } => self
				.vars
				.resolve(slot, generation)
				.ok_or_else(|| RuntimeError::new(line, RuntimeErrorKind::DanglingReference)),
			other => Err(RuntimeError::new(line, RuntimeErrorKind::NotAReference(other.type_name()))),
		}
	}

	fn parent_slot(&self, operand: &Expr, line: usize) -> Result<usize, RuntimeError> {
		let Some(name) = operand.identifier_name() else {
			return Err(RuntimeError::new(line, RuntimeErrorKind::ParentScopeTarget));
		};
		self.vars
			.lookup_any(name)
			.ok_or_else(|| RuntimeError::new(line, RuntimeErrorKind::UnknownIdentifier(name.to_string())))
	}

	fn lookup(&self, name: &str, line: usize) -> Result<usize, RuntimeError> {
		self.vars
			.lookup(name)
			.ok_or_else(|| RuntimeError::new(line, RuntimeErrorKind::UnknownIdentifier(name.to_string())))
	}

	fn eval_bool(&mut self, condition: &Expr, line: usize) -> Result<bool, RuntimeError> {
		match self.eval(condition)? {
			Value::Bool(value) => Ok(value),
			other => Err(RuntimeError::new(line, RuntimeErrorKind::ConditionType(other.type_name()))),
		}
	}

	/// Dispatch a call: the variadic `print` first, then builtins by name,
	/// arity and parameter schema, then user functions by name and arity
	/// (latest definition wins).
	fn call_function(&mut self, name: &str, args: &[Expr], line: usize) -> Result<Value, RuntimeError> {
		if args.len() > MAX_CALL_ARGUMENTS {
			return Err(RuntimeError::new(line, RuntimeErrorKind::TooManyArguments));
		}
		let mut values = Vec::with_capacity(args.len());
		for arg in args {
			let value = self.eval(arg)?;
			if matches!(value, Value::Void) {
				return Err(RuntimeError::new(line, RuntimeErrorKind::VoidValue));
			}
			values.push(value);
		}

		if name == "print" {
			return self.print(&values, line);
		}

		let mut builtin_name_match = false;
		let mut candidate = None;
		for builtin in &self.builtins {
			if builtin.name != name {
				continue;
			}
			builtin_name_match = true;
			if builtin.params.len() == values.len() {
				candidate = Some(*builtin);
				break;
			}
		}
		if let Some(builtin) = candidate {
			builtin.check_args(&values, line)?;
			return builtin.invoke(self, line, &values);
		}

		let user = self
			.functions
			.iter()
			.rev()
			.find(|function| function.name == name && function.parameters.len() == values.len())
			.cloned();
		if let Some(function) = user {
			return self.call_user_function(&function, values);
		}

		if builtin_name_match || self.functions.iter().any(|function| function.name == name) {
			Err(RuntimeError::new(
				line,
				RuntimeErrorKind::WrongArity { name: name.to_string(), count: values.len() },
			))
		} else {
			Err(RuntimeError::new(line, RuntimeErrorKind::UnknownFunction(name.to_string())))
		}
	}

	/// Push one variable per parameter, move the window base on top of them,
	/// run the body, and restore everything on the way out.
	fn call_user_function(
		&mut self,
		function: &UserFunction,
		args: Vec<Value>,
	) -> Result<Value, RuntimeError> {
		let base = self.vars.len();
		for (parameter, value) in function.parameters.iter().zip(args) {
			self.vars.push(parameter.clone(), value);
		}
		let saved_base = self.vars.set_window_base(base);
		let funcs_len = self.functions.len();

		let result = self.exec_function_body(&function.body);

		self.functions.truncate(funcs_len);
		self.vars.truncate(base);
		self.vars.set_window_base(saved_base);
		result
	}

	fn exec_function_body(&mut self, body: &[Statement]) -> Result<Value, RuntimeError> {
		for statement in body {
			match self.exec(statement)? {
				Flow::Normal => {}
				Flow::Return(value) => return Ok(value),
				// The parser confines break/continue to loops inside the body.
				Flow::Break | Flow::Continue => unreachable!("loop flow escaped a function body"),
			}
		}
		Ok(Value::Void)
	}

	/// The only variadic call: `print(fmt, ...)`. Each `%` consumes one
	/// argument and the counts must match exactly.
	fn print(&mut self, args: &[Value], line: usize) -> Result<Value, RuntimeError> {
		use std::fmt::Write;

		let Some(Value::Str(format)) = args.first() else {
			return Err(RuntimeError::new(line, RuntimeErrorKind::PrintMissingFormat));
		};

		let mut output = String::new();
		let mut rest = args[1..].iter();
		for c in format.chars() {
			if c == '%' {
				match rest.next() {
					Some(value) => {
						let _ = write!(output, "{value}");
					}
					None => return Err(RuntimeError::new(line, RuntimeErrorKind::PrintArgumentCount)),
				}
			} else {
				output.push(c);
			}
		}
		if rest.next().is_some() {
			return Err(RuntimeError::new(line, RuntimeErrorKind::PrintArgumentCount));
		}

		self.write_output(&output);
		Ok(Value::Void)
	}

	fn write_output(&mut self, text: &str) {
		match &self.out {
			OutputSink::Stdout => print!("{OUTPUT_COLOR}{text}"),
			OutputSink::Buffer(buffer) => buffer.borrow_mut().extend_from_slice(text.as_bytes()),
		}
	}

	/// The canvas, or the error every drawing builtin shares before `init`.
	fn canvas_mut(&mut self, line: usize) -> Result<&mut Canvas, RuntimeError> {
		self.canvas
			.as_mut()
			.ok_or_else(|| RuntimeError::new(line, RuntimeErrorKind::CanvasNotInitialized))
	}

	fn install_canvas(&mut self, canvas: Canvas) {
		debug!("canvas initialized");
		self.canvas = Some(canvas);
	}
}

/// Turn a compound assignment into its arithmetic operator; `=` is `None`.
fn compound_operator(op: AssignOp) -> Option<BinaryOp> {
	match op {
		AssignOp::Assign => None,
		AssignOp::Add => Some(BinaryOp::Add),
		AssignOp::Sub => Some(BinaryOp::Sub),
		AssignOp::Mul => Some(BinaryOp::Mul),
		AssignOp::Div => Some(BinaryOp::Div),
		AssignOp::Rem => Some(BinaryOp::Rem),
		AssignOp::Pow => Some(BinaryOp::Pow),
	}
}

/// Children are optional only while the parser assembles the tree; a parsed
/// expression has every slot filled.
fn operand_of(slot: &Option<Box<Expr>>) -> &Expr {
	slot.as_deref().expect("expression slot filled by the parser")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{lexer::Lexer, parser::Parser};

	fn run(source: &str) -> Result<String, RuntimeError> {
		let tokens = Lexer::tokenize(source.as_bytes()).unwrap();
		let statements = Parser::new(tokens).parse().unwrap();
		let buffer = RcCell::new(Vec::new());
		let mut interpreter = Interpreter::with_output(buffer.clone());
		interpreter.run(&statements)?;
		let bytes = buffer.borrow().clone();
		Ok(String::from_utf8(bytes).unwrap())
	}

	fn output(source: &str) -> String { run(source).unwrap() }

	fn fails(source: &str) -> RuntimeError { run(source).unwrap_err() }

	#[test]
	fn arithmetic_and_precedence() {
		assert_eq!(output(r#"print("%\n", 1+2*3^2);"#), "19\n");
		assert_eq!(output(r#"print("%", 2^3^2);"#), "512");
		assert_eq!(output(r#"print("%", (1+2)*3);"#), "9");
		assert_eq!(output(r#"print("%", 7 % 3);"#), "1");
		assert_eq!(output(r#"print("%", -2^2);"#), "4");
	}

	#[test]
	fn numeric_promotion() {
		assert_eq!(output(r#"print("%", 1 + 0.5);"#), "1.5");
		assert_eq!(output(r#"print("%", 1 / 2);"#), "0");
		assert_eq!(output(r#"print("%", 1.0 / 2);"#), "0.5");
	}

	#[test]
	fn declarations_and_assignment() {
		assert_eq!(output(r#"let x = 1; x = x + 1; print("%", x);"#), "2");
		assert_eq!(output(r#"let x = 1; x += 0.5; print("%", x);"#), "1.5");
		assert_eq!(output(r#"let x = 2; x ^= 3; print("%", x);"#), "8");
		assert!(fails("let x = 1; let x = 2;").to_string().contains("already been declared"));
		assert!(fails("x = 1;").to_string().contains("unknown"));
		assert!(fails(r#"let s = "a"; s += "b";"#).to_string().contains("Cannot apply"));
	}

	#[test]
	fn declaration_window_spans_the_whole_function() {
		// Nested blocks share the function window, so re-declaring is an
		// error even inside a branch.
		assert!(fails("let x = 1; if true { let x = 2; }").to_string().contains("already been declared"));
		// A function frame opens a fresh window.
		assert_eq!(output(r#"let x = 1; func f() { let x = 9; return x; } print("%", f());"#), "9");
	}

	#[test]
	fn if_else_chains() {
		let source = r#"
			let x = 3;
			if x == 1 { print("one"); }
			else if x == 3 { print("three"); }
			else { print("other"); }
		"#;
		assert_eq!(output(source), "three");
		assert!(fails("if 1 { }").to_string().contains("must be a 'Bool'"));
	}

	#[test]
	fn while_loop_with_break_and_continue() {
		let source = r#"
			let s = 0;
			let i = 0;
			while true {
				i += 1;
				if i > 10 { break; }
				if i % 2 == 0 { continue; }
				s += i;
			}
			print("%", s);
		"#;
		assert_eq!(output(source), "25");
	}

	#[test]
	fn for_loop_counts_the_half_open_range() {
		assert_eq!(output(r#"let s = 0; for i : 0 -> 5 { s += i; } print("%", s);"#), "10");
		assert_eq!(output(r#"let n = 0; for i : 3 -> 3 { n += 1; } print("%", n);"#), "0");
		assert_eq!(output(r#"let n = 0; for i : 5 -> 3 { n += 1; } print("%", n);"#), "0");
		assert_eq!(output(r#"for i : 0 -> 3 { print("%", i); }"#), "012");
		assert!(fails("for i : 0.5 -> 2 { }").to_string().contains("'for' loop"));
		assert!(fails("for i : 0 -> 2 { i = true; }").to_string().contains("must stay an 'Int'"));
	}

	#[test]
	fn for_iterator_is_scoped_to_the_loop() {
		assert!(fails(r#"for i : 0 -> 2 { } print("%", i);"#).to_string().contains("unknown"));
		// And can shadow nothing: it is a fresh variable per loop statement.
		assert_eq!(output(r#"let i = 7; for i : 0 -> 2 { } print("%", i);"#), "7");
	}

	#[test]
	fn functions_return_and_recurse() {
		assert_eq!(output(r#"func add(a, b) { return a + b; } print("%", add(2, 3));"#), "5");
		assert_eq!(output(r#"func five() { return 5; } print("%", five());"#), "5");
		let factorial = r#"
			func fact(n) {
				if n <= 1 { return 1; }
				return n * fact(n - 1);
			}
			print("%", fact(6));
		"#;
		assert_eq!(output(factorial), "720");
	}

	#[test]
	fn function_without_return_yields_void() {
		assert!(matches!(
			fails("func noop(x) { x; } let y = noop(1);").kind(),
			RuntimeErrorKind::VoidValue
		));
	}

	#[test]
	fn functions_overload_by_arity() {
		let source = r#"
			func f(a) { return 1; }
			func f(a, b) { return 2; }
			print("%%", f(0), f(0, 0));
		"#;
		assert_eq!(output(source), "12");
	}

	#[test]
	fn function_definitions_are_scoped_to_their_block() {
		let source = r#"
			if true { func g() { return 1; } print("%", g()); }
			g();
		"#;
		assert!(fails(source).to_string().contains("has not been defined"));
	}

	#[test]
	fn latest_function_definition_wins() {
		let source = r#"
			func f() { return 1; }
			func f() { return 2; }
			print("%", f());
		"#;
		assert_eq!(output(source), "2");
	}

	#[test]
	fn functions_do_not_see_caller_locals() {
		assert!(fails("func f() { return x; } let x = 1; f();").to_string().contains("unknown"));
	}

	#[test]
	fn parent_scope_operator_reaches_the_whole_stack() {
		let source = r#"
			let g = 1;
			func bump() { 'g = 'g + 10; }
			bump();
			print("%", g);
		"#;
		assert_eq!(output(source), "11");
	}

	#[test]
	fn references_alias_variables() {
		assert_eq!(output(r#"let a = 7; let r = &a; ^r = 42; print("%", a);"#), "42");
		assert_eq!(output(r#"let a = 7; let r = &a; print("%", ^r);"#), "7");
		// Through a function boundary.
		let source = r#"
			func set(r) { ^r = 99; }
			let a = 1;
			set(&a);
			print("%", a);
		"#;
		assert_eq!(output(source), "99");
	}

	#[test]
	fn dangling_references_are_caught() {
		let source = r#"
			func make() { let x = 1; return &x; }
			let r = make();
			^r;
		"#;
		assert!(fails(source).to_string().contains("Dangling reference."));
	}

	#[test]
	fn reference_operator_wants_a_name() {
		assert!(matches!(fails("let r = &(1 + 2);").kind(), RuntimeErrorKind::ReferenceTarget));
		assert!(matches!(fails("let a = 1; ^a;").kind(), RuntimeErrorKind::NotAReference("Int")));
	}

	#[test]
	fn unary_type_rules() {
		assert_eq!(output(r#"print("%", -(3));"#), "-3");
		assert_eq!(output(r#"print("%", +5);"#), "5");
		assert_eq!(output(r#"print("%", not false);"#), "true");
		assert!(matches!(fails("-true;").kind(), RuntimeErrorKind::CannotNegate("Bool")));
		assert!(matches!(fails(r#"-"x";"#).kind(), RuntimeErrorKind::CannotNegate("String")));
		assert!(matches!(fails("not 1;").kind(), RuntimeErrorKind::NotOperandType("Int")));
	}

	#[test]
	fn logical_operators_do_not_short_circuit() {
		assert_eq!(output(r#"print("%", true and false);"#), "false");
		assert_eq!(output(r#"print("%", false or true);"#), "true");
		// The right side evaluates even when the left already decides.
		assert!(fails("let x = false and missing();").to_string().contains("has not been defined"));
		assert!(fails("let x = true or missing();").to_string().contains("has not been defined"));
	}

	#[test]
	fn comparisons() {
		assert_eq!(output(r#"print("%", 1 < 1.5);"#), "true");
		assert_eq!(output(r#"print("%", "a" == "a");"#), "true");
		assert_eq!(output(r#"print("%", "a" != "b");"#), "true");
		assert!(fails(r#""a" < "b";"#).to_string().contains("Cannot compare"));
	}

	#[test]
	fn print_formatting() {
		assert_eq!(output(r#"print("% + % = %\n", 1, 2, 3);"#), "1 + 2 = 3\n");
		assert_eq!(output(r#"print("hello\n");"#), "hello\n");
		assert_eq!(output(r#"print("%", "żółw");"#), "żółw");
		assert!(matches!(fails(r#"print("%");"#).kind(), RuntimeErrorKind::PrintArgumentCount));
		assert!(matches!(fails(r#"print("x", 1);"#).kind(), RuntimeErrorKind::PrintArgumentCount));
		assert!(matches!(fails("print(1);").kind(), RuntimeErrorKind::PrintMissingFormat));
	}

	#[test]
	fn void_is_not_a_value() {
		assert!(matches!(fails("func v() { return; } let x = v();").kind(), RuntimeErrorKind::VoidValue));
		assert!(matches!(fails("func v() { return; } sin(v());").kind(), RuntimeErrorKind::VoidValue));
	}

	#[test]
	fn subscripts_have_nothing_to_index() {
		assert!(matches!(fails("let a = 1; a[0];").kind(), RuntimeErrorKind::NotIndexable));
	}

	#[test]
	fn dispatch_errors_distinguish_arity_from_unknown() {
		assert!(matches!(fails("sin(1, 2);").kind(), RuntimeErrorKind::WrongArity { .. }));
		assert!(matches!(fails("nope();").kind(), RuntimeErrorKind::UnknownFunction(_)));
		assert!(matches!(
			fails("func f(a) { return a; } f(1, 2);").kind(),
			RuntimeErrorKind::WrongArity { .. }
		));
		assert!(matches!(fails(r#"sin("x");"#).kind(), RuntimeErrorKind::ArgumentType { .. }));
	}

	#[test]
	fn block_exit_restores_the_stack_on_error() {
		let source = "let a = 1; if true { let b = 2; nope(); }";
		let tokens = Lexer::tokenize(source.as_bytes()).unwrap();
		let statements = Parser::new(tokens).parse().unwrap();
		let mut interpreter = Interpreter::with_output(RcCell::new(Vec::new()));
		assert!(interpreter.run(&statements).is_err());
		assert_eq!(interpreter.vars.len(), 1);
	}
}
