//! Chainable schema definition.

use idreg_primitives::Pattern;

use crate::{CacheObject, MethodSlots, PatternDef, Registry, RegistryError, Result, Schema};

/// Builder for a [`Registry`] and its [`Schema`].
///
/// Each step applies its schema mutation immediately; the first failure is
/// kept and reported by [`RegistryBuilder::build`], and later steps are skipped.
///
/// ```
/// use std::sync::Arc;
///
/// use idreg_primitives::{ValueKind, pattern, sym, tuple};
/// use idreg_registry::{MethodArgs, MethodSlots, PatternDef, Registry};
///
/// let registry = Registry::<i64>::builder()
/// 	.pattern(PatternDef::new(pattern![sym("n"), ValueKind::Int], |t| t[1].as_int().map(Arc::new)).object_type("n"))
/// 	.method("n", pattern![sym("n"), ValueKind::Int], MethodSlots::positional([1]))
/// 	.build()
/// 	.unwrap();
///
/// let five = registry.call("n", &MethodArgs::positional([5]), &Default::default()).unwrap();
/// assert_eq!(five.as_deref(), Some(&5));
/// assert!(registry.contains(&tuple![sym("n"), 5]));
/// ```
pub struct RegistryBuilder<T>
where
	T: ?Sized + CacheObject,
{
	schema: Schema<T>,
	error: Option<RegistryError>,
}

impl<T> Default for RegistryBuilder<T>
where
	T: ?Sized + CacheObject,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> RegistryBuilder<T>
where
	T: ?Sized + CacheObject,
{
	/// Starts from an empty schema.
	pub fn new() -> Self {
		Self::from_schema(Schema::new())
	}

	/// Continues defining an existing schema.
	pub fn from_schema(schema: Schema<T>) -> Self {
		Self { schema, error: None }
	}

	fn step(mut self, f: impl FnOnce(&Schema<T>) -> Result<()>) -> Self {
		if self.error.is_none() {
			self.error = f(&self.schema).err();
		}
		self
	}

	/// Adds a pattern.
	pub fn pattern(self, def: PatternDef<T>) -> Self {
		self.step(|schema| schema.add_pattern(def).map(drop))
	}

	/// Adds a category.
	pub fn category(self, name: impl AsRef<str>, pattern: impl Into<Pattern>, positions: impl IntoIterator<Item = usize>) -> Self {
		self.step(|schema| schema.add_category(name, pattern, positions))
	}

	/// Adds a convenience method.
	pub fn method(self, name: impl AsRef<str>, template: impl Into<Pattern>, slots: MethodSlots) -> Self {
		self.step(|schema| schema.add_convenience_method(name, template, slots))
	}

	/// Returns the schema without creating a registry.
	pub fn into_schema(self) -> Result<Schema<T>> {
		match self.error {
			Some(err) => Err(err),
			None => Ok(self.schema),
		}
	}

	/// Creates the registry, or returns the first definition error.
	pub fn build(self) -> Result<Registry<T>> {
		self.into_schema().map(Registry::with_schema)
	}
}
