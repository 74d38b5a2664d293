use std::sync::Arc;

use idreg_primitives::Value;
use indexmap::IndexMap;

/// Caller-supplied options forwarded to object generators by [`crate::Registry::lookup_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupArgs(IndexMap<Arc<str>, Value>);

impl LookupArgs {
	/// Creates an empty argument set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an argument, builder style.
	pub fn with(mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Self {
		self.insert(key, value);
		self
	}

	/// Inserts or replaces an argument.
	pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(Arc::from(key.as_ref()), value.into())
	}

	/// Returns the argument stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Iterates arguments in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
		self.0.iter().map(|(k, v)| (&**k, v))
	}

	/// Number of arguments.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no arguments were given.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
