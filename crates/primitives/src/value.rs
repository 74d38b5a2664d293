//! Scalar values that make up tuples.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An interned-by-value symbol, displayed as `:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
	/// Creates a symbol with the given name.
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	/// Returns the symbol name without the leading colon.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, ":{}", self.0)
	}
}

/// Shorthand for [`Value::Symbol`].
pub fn sym(name: impl AsRef<str>) -> Value {
	Value::Symbol(Symbol::new(name))
}

/// A single tuple element.
///
/// Equality is kind-strict: `Int(1)` and `Float(1.0)` are different values and
/// therefore address different cache slots. Floats compare by bit pattern with
/// `-0.0` folded into `0.0`, which makes every float (NaN included) usable as a
/// hash key.
#[derive(Debug, Clone)]
pub enum Value {
	/// The absent value.
	Nil,
	/// Boolean.
	Bool(bool),
	/// Signed integer.
	Int(i64),
	/// Double precision float.
	Float(f64),
	/// Immutable string.
	Str(Arc<str>),
	/// Symbol.
	Symbol(Symbol),
}

impl Value {
	/// Returns the kind of this value.
	pub fn kind(&self) -> ValueKind {
		match self {
			Value::Nil => ValueKind::Nil,
			Value::Bool(_) => ValueKind::Bool,
			Value::Int(_) => ValueKind::Int,
			Value::Float(_) => ValueKind::Float,
			Value::Str(_) => ValueKind::Str,
			Value::Symbol(_) => ValueKind::Symbol,
		}
	}

	/// Returns the integer if this is an `Int`.
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Value::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the float if this is a `Float`.
	pub fn as_float(&self) -> Option<f64> {
		match self {
			Value::Float(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the numeric value as a float for either numeric kind.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int(v) => Some(*v as f64),
			Value::Float(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the string contents if this is a `Str`.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the symbol if this is a `Symbol`.
	pub fn as_symbol(&self) -> Option<&Symbol> {
		match self {
			Value::Symbol(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the boolean if this is a `Bool`.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(v) => Some(*v),
			_ => None,
		}
	}

	fn float_bits(v: f64) -> u64 {
		if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() }
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Nil, Value::Nil) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => Value::float_bits(*a) == Value::float_bits(*b),
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::Symbol(a), Value::Symbol(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Value {}

impl Hash for Value {
	fn hash<H: Hasher>(&self, state: &mut H) {
		std::mem::discriminant(self).hash(state);
		match self {
			Value::Nil => {}
			Value::Bool(v) => v.hash(state),
			Value::Int(v) => v.hash(state),
			Value::Float(v) => Value::float_bits(*v).hash(state),
			Value::Str(v) => v.hash(state),
			Value::Symbol(v) => v.hash(state),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Nil => f.write_str("nil"),
			Value::Bool(v) => write!(f, "{v}"),
			Value::Int(v) => write!(f, "{v}"),
			Value::Float(v) => write!(f, "{v:?}"),
			Value::Str(v) => write!(f, "{v:?}"),
			Value::Symbol(v) => write!(f, "{v}"),
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Int(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Int(i64::from(v))
	}
}

impl From<u32> for Value {
	fn from(v: u32) -> Self {
		Value::Int(i64::from(v))
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Float(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Str(Arc::from(v))
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Str(Arc::from(v))
	}
}

impl From<Symbol> for Value {
	fn from(v: Symbol) -> Self {
		Value::Symbol(v)
	}
}

impl<V: Into<Value>> From<Option<V>> for Value {
	fn from(v: Option<V>) -> Self {
		v.map_or(Value::Nil, Into::into)
	}
}

/// The kind of a [`Value`], used as a type marker inside patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	/// Matches only `Nil`.
	Nil,
	/// Matches booleans.
	Bool,
	/// Matches integers.
	Int,
	/// Matches floats.
	Float,
	/// Matches integers and floats.
	Number,
	/// Matches strings.
	Str,
	/// Matches symbols.
	Symbol,
}

impl ValueKind {
	/// Returns true if `value` is an instance of this kind.
	#[inline]
	pub fn admits(self, value: &Value) -> bool {
		match (self, value.kind()) {
			(ValueKind::Number, ValueKind::Int | ValueKind::Float) => true,
			(expected, actual) => expected == actual,
		}
	}

	/// Returns the marker name used in textual patterns.
	pub fn name(self) -> &'static str {
		match self {
			ValueKind::Nil => "nil",
			ValueKind::Bool => "bool",
			ValueKind::Int => "int",
			ValueKind::Float => "float",
			ValueKind::Number => "number",
			ValueKind::Str => "string",
			ValueKind::Symbol => "symbol",
		}
	}

	/// Parses a marker name as produced by [`ValueKind::name`].
	pub fn from_name(name: &str) -> Option<Self> {
		Some(match name {
			"nil" => ValueKind::Nil,
			"bool" => ValueKind::Bool,
			"int" => ValueKind::Int,
			"float" => ValueKind::Float,
			"number" => ValueKind::Number,
			"string" => ValueKind::Str,
			"symbol" => ValueKind::Symbol,
			_ => return None,
		})
	}
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<{}>", self.name())
	}
}
