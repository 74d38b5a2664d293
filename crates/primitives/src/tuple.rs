//! Immutable fixed-arity tuples used as cache keys.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::Value;

/// An ordered, immutable sequence of values.
///
/// Cloning is cheap (shared storage), and the contents can never change once
/// built, so a tuple stays valid as a hash key for as long as it lives.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Tuple(Arc<[Value]>);

impl Tuple {
	/// Builds a tuple from any sequence of values.
	pub fn new<I, V>(values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Self(values.into_iter().map(Into::into).collect())
	}

	/// Returns the empty tuple.
	pub fn empty() -> Self {
		Self(Arc::from([]))
	}

	/// Returns the values as a slice.
	#[inline]
	pub fn as_slice(&self) -> &[Value] {
		&self.0
	}

	/// Returns a copy of this tuple with the value at `index` replaced.
	///
	/// Returns `None` if `index` is out of range.
	pub fn with(&self, index: usize, value: impl Into<Value>) -> Option<Self> {
		if index >= self.0.len() {
			return None;
		}
		let mut values = self.0.to_vec();
		values[index] = value.into();
		Some(Self(Arc::from(values)))
	}

	/// Extracts the values at `positions`, in order, into a new tuple.
	///
	/// Returns `None` if any position is out of range.
	pub fn project(&self, positions: &[usize]) -> Option<Self> {
		positions
			.iter()
			.map(|&i| self.0.get(i).cloned())
			.collect::<Option<Arc<[Value]>>>()
			.map(Self)
	}
}

impl Deref for Tuple {
	type Target = [Value];

	fn deref(&self) -> &[Value] {
		&self.0
	}
}

impl From<Vec<Value>> for Tuple {
	fn from(values: Vec<Value>) -> Self {
		Self(Arc::from(values))
	}
}

impl From<&[Value]> for Tuple {
	fn from(values: &[Value]) -> Self {
		Self(Arc::from(values))
	}
}

impl FromIterator<Value> for Tuple {
	fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl fmt::Debug for Tuple {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl fmt::Display for Tuple {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[")?;
		for (i, value) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{value}")?;
		}
		f.write_str("]")
	}
}

/// Builds a [`Tuple`] from a list of expressions convertible into [`Value`].
///
/// ```
/// use idreg_primitives::{sym, tuple};
///
/// let t = tuple![sym("hello"), 1, 2.5, "text"];
/// assert_eq!(t.len(), 4);
/// ```
#[macro_export]
macro_rules! tuple {
	($($value:expr),* $(,)?) => {
		$crate::Tuple::from(::std::vec![$($crate::Value::from($value)),*])
	};
}
