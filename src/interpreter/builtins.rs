//! The built-in function registry.
//!
//! Every entry carries a name, an ordered parameter schema and an
//! implementation. Overloading works across entries: dispatch matches name
//! first, then arity, then checks each argument against the schema. The
//! math builtins are rows in two data tables rather than hand-written
//! wrappers; only the builtins that touch interpreter state (canvas, RNG)
//! get a function of their own.

use std::path::Path;

use log::info;
use rand::Rng;

use super::{Interpreter, canvas::{Canvas, Color}, value::Value};
use crate::error::interpreter::{RuntimeError, RuntimeErrorKind};

/// What a builtin accepts in one parameter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamType {
	/// Anything except `Void`, which dispatch rejects before matching.
	Any,
	IntOrFloat,
	Int,
	Str,
}

impl ParamType {
	fn matches(self, value: &Value) -> bool {
		match self {
			ParamType::Any => true,
			ParamType::IntOrFloat => matches!(value, Value::Int(_) | Value::Float(_)),
			ParamType::Int => matches!(value, Value::Int(_)),
			ParamType::Str => matches!(value, Value::Str(_)),
		}
	}

	fn describe(self) -> &'static str {
		match self {
			ParamType::Any => "any value",
			ParamType::IntOrFloat => "a number",
			ParamType::Int => "an Int",
			ParamType::Str => "a String",
		}
	}
}

type NativeFn = fn(&mut Interpreter, usize, &[Value]) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
enum BuiltinImpl {
	UnaryMath(fn(f64) -> f64),
	BinaryMath(fn(f64, f64) -> f64),
	Native(NativeFn),
}

#[derive(Clone, Copy)]
pub(crate) struct Builtin {
	pub name:   &'static str,
	pub params: &'static [ParamType],
	imp:        BuiltinImpl,
}

impl Builtin {
	/// Check the (already arity-matched) arguments against the schema.
	pub fn check_args(&self, args: &[Value], line: usize) -> Result<(), RuntimeError> {
		for (index, (param, value)) in self.params.iter().zip(args).enumerate() {
			if !param.matches(value) {
				return Err(RuntimeError::new(line, RuntimeErrorKind::ArgumentType {
					name:     self.name,
					index:    index + 1,
					expected: param.describe(),
				}));
			}
		}
		Ok(())
	}

	pub fn invoke(
		&self,
		ctx: &mut Interpreter,
		line: usize,
		args: &[Value],
	) -> Result<Value, RuntimeError> {
		match self.imp {
			BuiltinImpl::UnaryMath(f) => Ok(Value::Float(f(number(&args[0])))),
			BuiltinImpl::BinaryMath(f) => Ok(Value::Float(f(number(&args[0]), number(&args[1])))),
			BuiltinImpl::Native(f) => f(ctx, line, args),
		}
	}
}

/// The unary math builtins, all `(IntOrFloat) -> Float`. `radians` and
/// `degrees` live here too; they are unit conversions of the argument.
const UNARY_MATH: &[(&str, fn(f64) -> f64)] = &[
	("sin", f64::sin),
	("cos", f64::cos),
	("tan", f64::tan),
	("asin", f64::asin),
	("acos", f64::acos),
	("atan", f64::atan),
	("sinh", f64::sinh),
	("cosh", f64::cosh),
	("tanh", f64::tanh),
	("asinh", f64::asinh),
	("acosh", f64::acosh),
	("atanh", f64::atanh),
	("abs", f64::abs),
	("sqrt", f64::sqrt),
	("cbrt", f64::cbrt),
	("gamma", gamma),
	("radians", f64::to_radians),
	("degrees", f64::to_degrees),
];

const BINARY_MATH: &[(&str, fn(f64, f64) -> f64)] = &[("min", f64::min), ("max", f64::max)];

/// Build the registry an evaluator starts with.
pub(crate) fn registry() -> Vec<Builtin> {
	let mut builtins = Vec::new();
	for &(name, f) in UNARY_MATH {
		builtins.push(Builtin {
			name,
			params: &[ParamType::IntOrFloat],
			imp: BuiltinImpl::UnaryMath(f),
		});
	}
	for &(name, f) in BINARY_MATH {
		builtins.push(Builtin {
			name,
			params: &[ParamType::IntOrFloat, ParamType::IntOrFloat],
			imp: BuiltinImpl::BinaryMath(f),
		});
	}

	let natives: &[(&str, &'static [ParamType], NativeFn)] = &[
		("typename", &[ParamType::Any], builtin_typename),
		("int", &[ParamType::Any], builtin_int),
		("float", &[ParamType::Any], builtin_float),
		("pi", &[], builtin_pi),
		("random", &[], builtin_random),
		("init", &[ParamType::Int, ParamType::Int], builtin_init),
		(
			"init",
			&[ParamType::Int, ParamType::Int, ParamType::Int, ParamType::Int, ParamType::Int],
			builtin_init_background,
		),
		("forward", &[ParamType::IntOrFloat], builtin_forward),
		("backward", &[ParamType::IntOrFloat], builtin_backward),
		("backwards", &[ParamType::IntOrFloat], builtin_backward),
		("right", &[ParamType::IntOrFloat], builtin_right),
		("left", &[ParamType::IntOrFloat], builtin_left),
		("setpos", &[ParamType::IntOrFloat, ParamType::IntOrFloat], builtin_setpos),
		("setrot", &[ParamType::IntOrFloat], builtin_setrot),
		("getposx", &[], builtin_getposx),
		("getposy", &[], builtin_getposy),
		("getrot", &[], builtin_getrot),
		("penup", &[], builtin_penup),
		("pendown", &[], builtin_pendown),
		("pencolor", &[ParamType::Int, ParamType::Int, ParamType::Int], builtin_pencolor),
		("save", &[ParamType::Str], builtin_save),
	];
	for &(name, params, f) in natives {
		builtins.push(Builtin { name, params, imp: BuiltinImpl::Native(f) });
	}
	builtins
}

/// Schema-checked argument as `f64`.
fn number(value: &Value) -> f64 {
	match value {
		Value::Int(v) => *v as f64,
		Value::Float(v) => *v,
		_ => f64::NAN,
	}
}

/// Schema-checked argument as `i64`.
fn int(value: &Value) -> i64 {
	match value {
		Value::Int(v) => *v,
		_ => 0,
	}
}

fn builtin_typename(_ctx: &mut Interpreter, _line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	Ok(Value::Str(args[0].type_name().to_string()))
}

fn builtin_int(_ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	match &args[0] {
		Value::Int(v) => Ok(Value::Int(*v)),
		Value::Float(v) => Ok(Value::Int(*v as i64)),
		Value::Bool(v) => Ok(Value::Int(i64::from(*v))),
		other => Err(RuntimeError::new(
			line,
			RuntimeErrorKind::CastType { target: "Int", from: other.type_name() },
		)),
	}
}

fn builtin_float(_ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	match &args[0] {
		Value::Int(v) => Ok(Value::Float(*v as f64)),
		Value::Float(v) => Ok(Value::Float(*v)),
		Value::Bool(v) => Ok(Value::Float(f64::from(u8::from(*v)))),
		other => Err(RuntimeError::new(
			line,
			RuntimeErrorKind::CastType { target: "Float", from: other.type_name() },
		)),
	}
}

fn builtin_pi(_ctx: &mut Interpreter, _line: usize, _args: &[Value]) -> Result<Value, RuntimeError> {
	Ok(Value::Float(std::f64::consts::PI))
}

fn builtin_random(ctx: &mut Interpreter, _line: usize, _args: &[Value]) -> Result<Value, RuntimeError> {
	Ok(Value::Float(ctx.rng.gen::<f64>()))
}

fn builtin_init(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let (width, height) = canvas_size(int(&args[0]), int(&args[1]), line)?;
	ctx.install_canvas(Canvas::new(width, height, Color::WHITE));
	Ok(Value::Void)
}

fn builtin_init_background(
	ctx: &mut Interpreter,
	line: usize,
	args: &[Value],
) -> Result<Value, RuntimeError> {
	let (width, height) = canvas_size(int(&args[0]), int(&args[1]), line)?;
	let background = color(&args[2..], line)?;
	ctx.install_canvas(Canvas::new(width, height, background));
	Ok(Value::Void)
}

fn canvas_size(width: i64, height: i64, line: usize) -> Result<(i32, i32), RuntimeError> {
	let limit = i64::from(i32::MAX);
	if width < 1 || width > limit || height < 1 || height > limit {
		return Err(RuntimeError::new(line, RuntimeErrorKind::InvalidCanvasSize(width, height)));
	}
	Ok((width as i32, height as i32))
}

fn color(components: &[Value], line: usize) -> Result<Color, RuntimeError> {
	let mut rgb = [0u8; 3];
	for (slot, value) in rgb.iter_mut().zip(components) {
		let component = int(value);
		if !(0..=255).contains(&component) {
			return Err(RuntimeError::new(line, RuntimeErrorKind::ColorComponentOutOfRange(component)));
		}
		*slot = component as u8;
	}
	Ok(Color { r: rgb[0], g: rgb[1], b: rgb[2] })
}

fn builtin_forward(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let distance = number(&args[0]);
	ctx.canvas_mut(line)?.move_forward(distance);
	Ok(Value::Void)
}

fn builtin_backward(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let distance = number(&args[0]);
	ctx.canvas_mut(line)?.move_forward(-distance);
	Ok(Value::Void)
}

fn builtin_right(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let angle = number(&args[0]);
	ctx.canvas_mut(line)?.rot -= angle;
	Ok(Value::Void)
}

fn builtin_left(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let angle = number(&args[0]);
	ctx.canvas_mut(line)?.rot += angle;
	Ok(Value::Void)
}

fn builtin_setpos(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let (x, y) = (number(&args[0]), number(&args[1]));
	let canvas = ctx.canvas_mut(line)?;
	canvas.pos_x = x;
	canvas.pos_y = y;
	Ok(Value::Void)
}

fn builtin_setrot(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let rotation = number(&args[0]);
	ctx.canvas_mut(line)?.rot = rotation;
	Ok(Value::Void)
}

fn builtin_getposx(ctx: &mut Interpreter, line: usize, _args: &[Value]) -> Result<Value, RuntimeError> {
	Ok(Value::Float(ctx.canvas_mut(line)?.pos_x))
}

fn builtin_getposy(ctx: &mut Interpreter, line: usize, _args: &[Value]) -> Result<Value, RuntimeError> {
	Ok(Value::Float(ctx.canvas_mut(line)?.pos_y))
}

fn builtin_getrot(ctx: &mut Interpreter, line: usize, _args: &[Value]) -> Result<Value, RuntimeError> {
	Ok(Value::Float(ctx.canvas_mut(line)?.rot))
}

fn builtin_penup(ctx: &mut Interpreter, line: usize, _args: &[Value]) -> Result<Value, RuntimeError> {
	ctx.canvas_mut(line)?.pen_down = false;
	Ok(Value::Void)
}

fn builtin_pendown(ctx: &mut Interpreter, line: usize, _args: &[Value]) -> Result<Value, RuntimeError> {
	ctx.canvas_mut(line)?.pen_down = true;
	Ok(Value::Void)
}

fn builtin_pencolor(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let pen_color = color(args, line)?;
	ctx.canvas_mut(line)?.pen_color = pen_color;
	Ok(Value::Void)
}

fn builtin_save(ctx: &mut Interpreter, line: usize, args: &[Value]) -> Result<Value, RuntimeError> {
	let path = match &args[0] {
		Value::Str(path) => path.clone(),
		_ => String::new(),
	};
	info!("saving canvas to {path}");
	ctx.canvas_mut(line)?
		.save_as_bitmap(Path::new(&path))
		.map_err(|error| RuntimeError::new(line, RuntimeErrorKind::SaveFailed(error.to_string())))?;
	Ok(Value::Void)
}

/// Lanczos approximation of the gamma function (g = 7, 9 coefficients);
/// stable Rust has no `f64::gamma`.
fn gamma(x: f64) -> f64 {
	use std::f64::consts::PI;
	const COEFFICIENTS: [f64; 9] = [
		0.99999999999980993,
		676.5203681218851,
		-1259.1392167224028,
		771.32342877765313,
		-176.61502916214059,
		12.507343278686905,
		-0.13857109526572012,
		9.9843695780195716e-6,
		1.5056327351493116e-7,
	];
	if x < 0.5 {
		// Reflection formula for the left half plane.
		PI / ((PI * x).sin() * gamma(1.0 - x))
	} else {
		let x = x - 1.0;
		let mut acc = COEFFICIENTS[0];
		for (i, coefficient) in COEFFICIENTS.iter().enumerate().skip(1) {
			acc += coefficient / (x + i as f64);
		}
		let t = x + 7.5;
		(2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::utils::RcCell;

	fn interpreter() -> Interpreter { Interpreter::with_output(RcCell::new(Vec::new())) }

	fn call(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
		call_on(&mut interpreter(), name, args)
	}

	fn call_on(ctx: &mut Interpreter, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
		let builtin = registry()
			.into_iter()
			.find(|builtin| builtin.name == name && builtin.params.len() == args.len())
			.unwrap_or_else(|| panic!("no builtin {name}/{}", args.len()));
		builtin.check_args(args, 1)?;
		builtin.invoke(ctx, 1, args)
	}

	fn as_float(value: Result<Value, RuntimeError>) -> f64 {
		match value.unwrap() {
			Value::Float(v) => v,
			other => panic!("expected a Float, got {other:?}"),
		}
	}

	#[test]
	fn math_builtins_return_float() {
		assert_eq!(as_float(call("sin", &[Value::Int(0)])), 0.0);
		assert_eq!(as_float(call("sqrt", &[Value::Float(2.25)])), 1.5);
		assert_eq!(as_float(call("abs", &[Value::Int(-3)])), 3.0);
		assert_eq!(as_float(call("cbrt", &[Value::Int(27)])), 3.0);
		assert!((as_float(call("radians", &[Value::Int(180)])) - std::f64::consts::PI).abs() < 1e-12);
		assert!((as_float(call("degrees", &[Value::Float(std::f64::consts::PI)])) - 180.0).abs() < 1e-12);
		assert_eq!(as_float(call("min", &[Value::Int(3), Value::Float(1.5)])), 1.5);
		assert_eq!(as_float(call("max", &[Value::Int(3), Value::Float(1.5)])), 3.0);
	}

	#[test]
	fn gamma_matches_known_values() {
		assert!((gamma(5.0) - 24.0).abs() < 1e-9);
		assert!((gamma(1.0) - 1.0).abs() < 1e-12);
		assert!((gamma(0.5) - std::f64::consts::PI.sqrt()).abs() < 1e-12);
	}

	#[test]
	fn typename_names_the_runtime_kind() {
		assert_eq!(call("typename", &[Value::Int(1)]).unwrap(), Value::Str("Int".to_string()));
		assert_eq!(
			call("typename", &[Value::Str("x".to_string())]).unwrap(),
			Value::Str("String".to_string())
		);
	}

	#[test]
	fn numeric_casts() {
		assert_eq!(call("int", &[Value::Float(3.9)]).unwrap(), Value::Int(3));
		assert_eq!(call("int", &[Value::Bool(true)]).unwrap(), Value::Int(1));
		assert_eq!(call("float", &[Value::Int(2)]).unwrap(), Value::Float(2.0));
		assert!(call("int", &[Value::Str("1".to_string())]).is_err());
		assert!(call("float", &[Value::Str("1".to_string())]).is_err());
	}

	#[test]
	fn pi_and_random() {
		assert_eq!(call("pi", &[]).unwrap(), Value::Float(std::f64::consts::PI));
		let mut ctx = interpreter();
		for _ in 0..100 {
			let draw = match call_on(&mut ctx, "random", &[]).unwrap() {
				Value::Float(v) => v,
				other => panic!("random returned {other:?}"),
			};
			assert!((0.0..1.0).contains(&draw));
		}
	}

	#[test]
	fn schema_rejects_wrong_argument_types() {
		assert!(call("sin", &[Value::Str("x".to_string())]).is_err());
		assert!(call("init", &[Value::Float(10.0), Value::Int(10)]).is_err());
		assert!(call("save", &[Value::Int(1)]).is_err());
	}

	#[test]
	fn init_validates_dimensions() {
		assert!(call("init", &[Value::Int(0), Value::Int(10)]).is_err());
		assert!(call("init", &[Value::Int(10), Value::Int(-1)]).is_err());
		assert!(call("init", &[Value::Int(i64::from(i32::MAX) + 1), Value::Int(10)]).is_err());
		assert!(call("init", &[Value::Int(10), Value::Int(10)]).is_ok());
	}

	#[test]
	fn canvas_builtins_require_init() {
		assert!(call("forward", &[Value::Int(10)]).is_err());
		assert!(call("getposx", &[]).is_err());
		assert!(call("penup", &[]).is_err());
	}

	#[test]
	fn turtle_state_flows_through_builtins() {
		let mut ctx = interpreter();
		call_on(&mut ctx, "init", &[Value::Int(100), Value::Int(100)]).unwrap();
		assert_eq!(call_on(&mut ctx, "getposx", &[]).unwrap(), Value::Float(50.0));
		assert_eq!(call_on(&mut ctx, "getposy", &[]).unwrap(), Value::Float(50.0));

		call_on(&mut ctx, "forward", &[Value::Int(20)]).unwrap();
		assert_eq!(call_on(&mut ctx, "getposx", &[]).unwrap(), Value::Float(70.0));

		call_on(&mut ctx, "setpos", &[Value::Int(10), Value::Int(20)]).unwrap();
		assert_eq!(call_on(&mut ctx, "getposx", &[]).unwrap(), Value::Float(10.0));
		assert_eq!(call_on(&mut ctx, "getposy", &[]).unwrap(), Value::Float(20.0));

		call_on(&mut ctx, "setrot", &[Value::Float(1.5)]).unwrap();
		call_on(&mut ctx, "left", &[Value::Float(0.5)]).unwrap();
		call_on(&mut ctx, "right", &[Value::Float(2.0)]).unwrap();
		assert_eq!(call_on(&mut ctx, "getrot", &[]).unwrap(), Value::Float(0.0));

		call_on(&mut ctx, "penup", &[]).unwrap();
		assert!(!ctx.canvas.as_ref().unwrap().pen_down);
		call_on(&mut ctx, "pendown", &[]).unwrap();
		assert!(ctx.canvas.as_ref().unwrap().pen_down);

		call_on(&mut ctx, "pencolor", &[Value::Int(255), Value::Int(0), Value::Int(0)]).unwrap();
		assert_eq!(ctx.canvas.as_ref().unwrap().pen_color, Color { r: 255, g: 0, b: 0 });
		assert!(call_on(&mut ctx, "pencolor", &[Value::Int(256), Value::Int(0), Value::Int(0)]).is_err());
	}

	#[test]
	fn backwards_is_an_alias() {
		let mut ctx = interpreter();
		call_on(&mut ctx, "init", &[Value::Int(100), Value::Int(100)]).unwrap();
		call_on(&mut ctx, "backwards", &[Value::Int(10)]).unwrap();
		assert_eq!(call_on(&mut ctx, "getposx", &[]).unwrap(), Value::Float(40.0));
		call_on(&mut ctx, "backward", &[Value::Int(10)]).unwrap();
		assert_eq!(call_on(&mut ctx, "getposx", &[]).unwrap(), Value::Float(30.0));
	}

	#[test]
	fn save_reports_write_failures() {
		let mut ctx = interpreter();
		call_on(&mut ctx, "init", &[Value::Int(4), Value::Int(4)]).unwrap();
		let missing_dir = std::env::temp_dir().join("tortuga-no-such-dir").join("out.bmp");
		let result = call_on(&mut ctx, "save", &[Value::Str(missing_dir.to_string_lossy().into_owned())]);
		assert!(result.unwrap_err().to_string().contains("Couldn't write the bitmap"));
	}
}
