/// A runtime error with the line it occurred on.
#[derive(thiserror::Error, Debug)]
#[error("[Runtime error] Line {line}: {kind}")]
pub struct RuntimeError {
	line: usize,
	kind: RuntimeErrorKind,
}

impl RuntimeError {
	pub(crate) fn new(line: usize, kind: RuntimeErrorKind) -> Self { Self { line, kind } }

	#[cfg(test)]
	pub(crate) fn kind(&self) -> &RuntimeErrorKind { &self.kind }
}

/// Ways evaluation can fail.
#[derive(Debug, PartialEq)]
pub enum RuntimeErrorKind {
	/// `+x`/`-x` applied to something other than a number.
	CannotNegate(&'static str),
	/// `not` applied to something other than a `Bool`.
	NotOperandType(&'static str),
	/// `and`/`or` with a non-`Bool` operand.
	LogicalOperandType(&'static str),
	/// Arithmetic on operand types it is not defined for.
	ArithmeticType { op: &'static str, lhs: &'static str, rhs: &'static str },
	/// A comparison on operand types it is not defined for.
	ComparisonType { op: &'static str, lhs: &'static str, rhs: &'static str },
	/// Integer division or remainder with a zero (or overflowing) divisor.
	DivisionByZero,
	/// An `if`/`while` condition that is not a `Bool`.
	ConditionType(&'static str),
	/// A `for` bound that is not an `Int`.
	ForBoundType(&'static str),
	/// A `for` iterator that no longer holds an `Int` at increment time.
	ForIteratorType(String),
	/// A name that resolves to no variable.
	UnknownIdentifier(String),
	/// A `let` name already taken in the active function window.
	DuplicateDeclaration(String),
	/// An assignment target that does not denote a variable slot.
	NotAssignable,
	/// `&` applied to something other than a variable name.
	ReferenceTarget,
	/// `'` applied to something other than a variable name.
	ParentScopeTarget,
	/// `^` applied to a value that is not a `Reference`.
	NotAReference(&'static str),
	/// A reference whose slot has since been repopulated.
	DanglingReference,
	/// `Void` used where a value is required.
	VoidValue,
	/// A call to a name no function has.
	UnknownFunction(String),
	/// A call with an argument count no overload accepts.
	WrongArity { name: String, count: usize },
	/// An argument whose type does not fit the builtin's schema.
	ArgumentType { name: &'static str, index: usize, expected: &'static str },
	/// More than 16 arguments in one call.
	TooManyArguments,
	/// `int`/`float` applied to an inconvertible value.
	CastType { target: &'static str, from: &'static str },
	/// `print` called without a format string.
	PrintMissingFormat,
	/// A `%` count that does not match the argument count.
	PrintArgumentCount,
	/// Subscript applied to a value; nothing is indexable.
	NotIndexable,
	/// `init` dimensions outside `1..=i32::MAX`.
	InvalidCanvasSize(i64, i64),
	/// A color component outside `0..=255`.
	ColorComponentOutOfRange(i64),
	/// A canvas operation before `init`.
	CanvasNotInitialized,
	/// The bitmap could not be written.
	SaveFailed(String),
}

impl std::fmt::Display for RuntimeErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use RuntimeErrorKind::*;
		match self {
			CannotNegate(type_name) => write!(f, "Cannot negate a value of type '{type_name}'."),
			NotOperandType(type_name) => {
				write!(f, "Operator 'not' requires a 'Bool', got '{type_name}'.")
			}
			LogicalOperandType(op) => write!(f, "Operator '{op}' needs both operands of type 'Bool'."),
			ArithmeticType { op, lhs, rhs } => {
				write!(f, "Cannot apply operator '{op}' to values of type '{lhs}' and '{rhs}'.")
			}
			ComparisonType { op, lhs, rhs } => {
				write!(f, "Cannot compare values of type '{lhs}' and '{rhs}' with '{op}'.")
			}
			DivisionByZero => write!(f, "Division by zero."),
			ConditionType(type_name) => {
				write!(f, "A condition must be a 'Bool', got '{type_name}'.")
			}
			ForBoundType(type_name) => {
				write!(f, "Bounds of a 'for' loop must be of type 'Int', got '{type_name}'.")
			}
			ForIteratorType(name) => {
				write!(f, "Iterator '{name}' of a 'for' loop must stay an 'Int'.")
			}
			UnknownIdentifier(name) => write!(f, "Identifier '{name}' is unknown."),
			DuplicateDeclaration(name) => {
				write!(f, "Variable '{name}' has already been declared in this scope.")
			}
			NotAssignable => write!(f, "Expression cannot be assigned to."),
			ReferenceTarget => write!(f, "Operator '&' requires a variable as its operand."),
			ParentScopeTarget => write!(f, "Operator '\'' requires a variable as its operand."),
			NotAReference(type_name) => {
				write!(f, "Cannot dereference a value of type '{type_name}'.")
			}
			DanglingReference => write!(f, "Dangling reference."),
			VoidValue => write!(f, "'Void' cannot be used as a value."),
			UnknownFunction(name) => write!(f, "Function '{name}' has not been defined."),
			WrongArity { name, count } => {
				write!(f, "Function '{name}' does not take {count} arguments.")
			}
			ArgumentType { name, index, expected } => {
				write!(f, "Argument {index} to function '{name}' must be {expected}.")
			}
			TooManyArguments => write!(f, "A function call cannot take more than 16 arguments."),
			CastType { target, from } => {
				write!(f, "Cannot convert a value of type '{from}' to '{target}'.")
			}
			PrintMissingFormat => {
				write!(f, "Function 'print' takes a format string as its first argument.")
			}
			PrintArgumentCount => {
				write!(f, "Format string of 'print' does not match the number of arguments.")
			}
			NotIndexable => write!(f, "This value cannot be subscripted."),
			InvalidCanvasSize(w, h) => {
				write!(f, "Canvas dimensions {w}x{h} are outside the permitted range.")
			}
			ColorComponentOutOfRange(v) => {
				write!(f, "Color component {v} is outside the range 0 to 255.")
			}
			CanvasNotInitialized => write!(f, "The canvas has not been initialized; call 'init' first."),
			SaveFailed(message) => write!(f, "Couldn't write the bitmap: {message}"),
		}
	}
}
