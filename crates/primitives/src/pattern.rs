//! Pattern templates and the structural tuple matcher.
//!
//! A [`Pattern`] is a template tuple. Each [`Element`] is either a literal
//! (must equal the tuple element), a kind marker (tuple element must be of that
//! kind), or the wildcard. Matching is a single left-to-right pass with no
//! backtracking; the first mismatch decides.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::{Symbol, Tuple, Value, ValueKind};

/// One position of a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
	/// Matches exactly this value.
	Literal(Value),
	/// Matches any value of this kind.
	Kind(ValueKind),
	/// Matches any value.
	Any,
}

impl Element {
	/// Returns true if `value` satisfies this element.
	#[inline]
	pub fn admits(&self, value: &Value) -> bool {
		match self {
			Element::Literal(expected) => expected == value,
			Element::Kind(kind) => kind.admits(value),
			Element::Any => true,
		}
	}

	/// Returns the literal value, if this element is one.
	pub fn as_literal(&self) -> Option<&Value> {
		match self {
			Element::Literal(v) => Some(v),
			_ => None,
		}
	}
}

macro_rules! literal_from {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Element {
				fn from(v: $ty) -> Self {
					Element::Literal(Value::from(v))
				}
			}
		)*
	};
}

literal_from!(bool, i64, i32, u32, f64, &str, String, Symbol);

impl From<Value> for Element {
	fn from(v: Value) -> Self {
		Element::Literal(v)
	}
}

impl From<ValueKind> for Element {
	fn from(kind: ValueKind) -> Self {
		Element::Kind(kind)
	}
}

impl fmt::Display for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Element::Literal(v) => write!(f, "{v}"),
			Element::Kind(k) => write!(f, "{k}"),
			Element::Any => f.write_str("*"),
		}
	}
}

/// Error produced when parsing the textual element syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseElementError {
	/// `<name>` did not name a known kind.
	#[error("unknown kind marker: <{0}>")]
	UnknownKind(String),
	/// `:` with nothing after it.
	#[error("empty symbol")]
	EmptySymbol,
}

/// Textual element syntax used by configuration files.
///
/// - `*` is the wildcard
/// - `<int>`, `<float>`, `<number>`, `<string>`, `<symbol>`, `<bool>`, `<nil>` are kind markers
/// - `:name` is a symbol literal, `::text` is the string literal `:text`
/// - anything else is a string literal
impl FromStr for Element {
	type Err = ParseElementError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == "*" {
			return Ok(Element::Any);
		}
		if let Some(inner) = s.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
			return ValueKind::from_name(inner)
				.map(Element::Kind)
				.ok_or_else(|| ParseElementError::UnknownKind(inner.to_string()));
		}
		if let Some(escaped) = s.strip_prefix("::") {
			return Ok(Element::Literal(Value::from(format!(":{escaped}"))));
		}
		if let Some(name) = s.strip_prefix(':') {
			if name.is_empty() {
				return Err(ParseElementError::EmptySymbol);
			}
			return Ok(Element::Literal(Value::Symbol(Symbol::new(name))));
		}
		Ok(Element::Literal(Value::from(s)))
	}
}

/// An immutable template tuple.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Pattern(Arc<[Element]>);

impl Pattern {
	/// Builds a pattern from any sequence of elements.
	pub fn new<I, E>(elements: I) -> Self
	where
		I: IntoIterator<Item = E>,
		E: Into<Element>,
	{
		Self(elements.into_iter().map(Into::into).collect())
	}

	/// Returns the elements as a slice.
	#[inline]
	pub fn elements(&self) -> &[Element] {
		&self.0
	}

	/// Returns the arity of tuples this pattern can match.
	#[inline]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true for the zero-arity pattern.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if `tuple` matches this pattern.
	#[inline]
	pub fn matches(&self, tuple: &Tuple) -> bool {
		matches(self, tuple)
	}
}

impl From<Vec<Element>> for Pattern {
	fn from(elements: Vec<Element>) -> Self {
		Self(Arc::from(elements))
	}
}

/// Every tuple is also the pattern that matches exactly itself.
impl From<&Tuple> for Pattern {
	fn from(tuple: &Tuple) -> Self {
		Self(tuple.iter().cloned().map(Element::Literal).collect())
	}
}

impl FromIterator<Element> for Pattern {
	fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl fmt::Debug for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[")?;
		for (i, element) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{element}")?;
		}
		f.write_str("]")
	}
}

/// Returns true if `tuple` matches `pattern`.
///
/// Fails fast on arity mismatch, then checks elements left to right.
pub fn matches(pattern: &Pattern, tuple: &Tuple) -> bool {
	pattern.len() == tuple.len() && pattern.0.iter().zip(tuple.iter()).all(|(element, value)| element.admits(value))
}

/// Builds a [`Pattern`] from expressions convertible into [`Element`].
///
/// ```
/// use idreg_primitives::{ValueKind, pattern, sym, tuple};
///
/// let p = pattern![sym("hello"), ValueKind::Int];
/// assert!(p.matches(&tuple![sym("hello"), 3]));
/// ```
#[macro_export]
macro_rules! pattern {
	($($element:expr),* $(,)?) => {
		$crate::Pattern::from(::std::vec![$($crate::Element::from($element)),*])
	};
}
