//! Schema: the pattern, type, category, and convenience-method definitions a registry runs against.
//!
//! # Lifecycle
//!
//! A schema starts unlocked and accepts mutations. The owning registry locks it
//! on first use (lookup, add, category query), or callers lock it explicitly with
//! [`Schema::lock`]. Locking is permanent.
//!
//! # Concurrency
//!
//! - **Reads:** Wait-free. Definitions live in an [`ArcSwap`]; readers load the current
//!   [`SchemaDefs`] and keep it for as long as they need it.
//! - **Writes:** Serialized by a mutex. Each mutation clones the current definitions,
//!   applies the change, and publishes the result; a failed mutation publishes nothing.
//!
//! # Invariants
//!
//! - Once locked, the published [`SchemaDefs`] never changes again, so registries
//!   spawned from a locked schema share it by reference.
//! - Every pattern appears in exactly one type's pattern list, in registration order.

mod category;
mod method;
mod pattern;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
pub use category::CategoryDef;
use idreg_primitives::Pattern;
pub use method::{MethodArgs, MethodDef, MethodSlots};
use parking_lot::Mutex;
pub(crate) use pattern::PatternEntry;
pub use pattern::{ObjectGenerator, PatternDef, TupleGenerator};
use tracing::debug;

use crate::{CacheObject, FxIndexMap, ObjectType, Registry, RegistryError, Result};

/// Immutable definition tables.
///
/// Only reachable through [`Schema`]; there is no way to mutate a published value.
pub(crate) struct SchemaDefs<T>
where
	T: ?Sized + CacheObject,
{
	/// Patterns in registration order.
	pub(crate) patterns: FxIndexMap<Pattern, PatternEntry<T>>,
	/// Patterns of each type, in registration order.
	pub(crate) types: FxIndexMap<ObjectType, Vec<Pattern>>,
	pub(crate) categories: FxIndexMap<Arc<str>, CategoryDef>,
	pub(crate) methods: FxIndexMap<Arc<str>, MethodDef>,
}

impl<T> SchemaDefs<T>
where
	T: ?Sized + CacheObject,
{
	fn empty() -> Self {
		Self {
			patterns: FxIndexMap::default(),
			types: FxIndexMap::default(),
			categories: FxIndexMap::default(),
			methods: FxIndexMap::default(),
		}
	}

	/// Iterates the patterns of `object_type` with their stored entries.
	pub(crate) fn patterns_of<'a>(&'a self, object_type: &ObjectType) -> impl Iterator<Item = (&'a Pattern, &'a PatternEntry<T>)> + 'a {
		self.types
			.get(object_type)
			.into_iter()
			.flatten()
			.filter_map(|pattern| self.patterns.get_key_value(pattern))
	}
}

impl<T> Clone for SchemaDefs<T>
where
	T: ?Sized + CacheObject,
{
	fn clone(&self) -> Self {
		Self {
			patterns: self.patterns.clone(),
			types: self.types.clone(),
			categories: self.categories.clone(),
			methods: self.methods.clone(),
		}
	}
}

/// Lockable container of [`SchemaDefs`].
pub struct Schema<T>
where
	T: ?Sized + CacheObject,
{
	defs: ArcSwap<SchemaDefs<T>>,
	locked: AtomicBool,
	write: Mutex<()>,
}

impl<T> Default for Schema<T>
where
	T: ?Sized + CacheObject,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Schema<T>
where
	T: ?Sized + CacheObject,
{
	/// Creates an empty, unlocked schema.
	pub fn new() -> Self {
		Self::from_defs(Arc::new(SchemaDefs::empty()), false)
	}

	fn from_defs(defs: Arc<SchemaDefs<T>>, locked: bool) -> Self {
		Self {
			defs: ArcSwap::new(defs),
			locked: AtomicBool::new(locked),
			write: Mutex::new(()),
		}
	}

	/// Returns true once the schema has been locked.
	pub fn is_locked(&self) -> bool {
		self.locked.load(Ordering::Acquire)
	}

	/// Locks the schema against further mutation. Idempotent.
	pub fn lock(&self) -> &Self {
		if !self.is_locked() {
			let _guard = self.write.lock();
			if !self.locked.swap(true, Ordering::AcqRel) {
				debug!(patterns = self.defs.load().patterns.len(), "schema locked");
			}
		}
		self
	}

	/// Returns the current definitions.
	pub(crate) fn snapshot(&self) -> Arc<SchemaDefs<T>> {
		self.defs.load_full()
	}

	/// Locks the schema and returns its now-final definitions.
	pub(crate) fn lock_and_load(&self) -> Arc<SchemaDefs<T>> {
		self.lock();
		self.snapshot()
	}

	/// Applies `f` to a copy of the definitions and publishes it if `f` succeeds.
	fn update<R>(&self, f: impl FnOnce(&mut SchemaDefs<T>) -> Result<R>) -> Result<R> {
		let _guard = self.write.lock();
		if self.is_locked() {
			return Err(RegistryError::ConfigurationLocked);
		}
		let mut next = SchemaDefs::clone(&self.defs.load());
		let out = f(&mut next)?;
		self.defs.store(Arc::new(next));
		Ok(out)
	}

	/// Registers a pattern and returns it.
	///
	/// Patterns without an explicit type get a fresh anonymous one.
	pub fn add_pattern(&self, def: PatternDef<T>) -> Result<Pattern> {
		self.update(|defs| {
			if defs.patterns.contains_key(&def.pattern) {
				return Err(RegistryError::DuplicatePattern(def.pattern));
			}
			let object_type = def.object_type.unwrap_or_else(ObjectType::anonymous);
			defs.types.entry(object_type.clone()).or_default().push(def.pattern.clone());
			defs.patterns.insert(
				def.pattern.clone(),
				PatternEntry {
					object_type,
					generate_object: def.generate_object,
					generate_tuple: def.generate_tuple,
				},
			);
			Ok(def.pattern)
		})
	}

	/// Removes a pattern, and its type if that was the type's last pattern.
	///
	/// Returns whether the pattern was registered.
	pub fn delete_pattern(&self, pattern: &Pattern) -> Result<bool> {
		self.update(|defs| {
			let Some(entry) = defs.patterns.shift_remove(pattern) else {
				return Ok(false);
			};
			if let Some(patterns) = defs.types.get_mut(&entry.object_type) {
				patterns.retain(|p| p != pattern);
				if patterns.is_empty() {
					defs.types.shift_remove(&entry.object_type);
				}
			}
			Ok(true)
		})
	}

	/// Removes a type together with all of its patterns.
	pub fn delete_type(&self, object_type: &ObjectType) -> Result<bool> {
		self.update(|defs| {
			let Some(patterns) = defs.types.shift_remove(object_type) else {
				return Ok(false);
			};
			for pattern in &patterns {
				defs.patterns.shift_remove(pattern);
			}
			Ok(true)
		})
	}

	/// Registers a category keyed by the tuple values at `positions`.
	pub fn add_category(&self, name: impl AsRef<str>, pattern: impl Into<Pattern>, positions: impl IntoIterator<Item = usize>) -> Result<()> {
		let name: Arc<str> = Arc::from(name.as_ref());
		let category = CategoryDef::new(pattern.into(), positions);
		check_positions(&name, category.pattern(), category.positions().iter().copied())?;
		self.update(|defs| {
			if defs.categories.contains_key(&name) {
				return Err(RegistryError::DuplicateCategory(name));
			}
			defs.categories.insert(name, category);
			Ok(())
		})
	}

	/// Removes a category definition.
	pub fn delete_category(&self, name: &str) -> Result<bool> {
		self.update(|defs| Ok(defs.categories.shift_remove(name).is_some()))
	}

	/// Registers a convenience method that fills `template` from call arguments and looks it up.
	pub fn add_convenience_method(&self, name: impl AsRef<str>, template: impl Into<Pattern>, slots: MethodSlots) -> Result<()> {
		let name: Arc<str> = Arc::from(name.as_ref());
		let method = MethodDef::new(template.into(), slots);
		check_positions(&name, method.template(), method.slots().positions())?;
		self.update(|defs| {
			if defs.methods.contains_key(&name) {
				return Err(RegistryError::DuplicateMethod(name));
			}
			defs.methods.insert(name, method);
			Ok(())
		})
	}

	/// Removes a convenience method.
	pub fn delete_convenience_method(&self, name: &str) -> Result<bool> {
		self.update(|defs| Ok(defs.methods.shift_remove(name).is_some()))
	}

	/// Removes every pattern, type, category, and convenience method.
	pub fn clear(&self) -> Result<()> {
		self.update(|defs| {
			*defs = SchemaDefs::empty();
			Ok(())
		})
	}

	/// All registered patterns, in registration order.
	pub fn all_patterns(&self) -> Vec<Pattern> {
		self.defs.load().patterns.keys().cloned().collect()
	}

	/// All named types. Anonymous types are not listed.
	pub fn all_types(&self) -> Vec<ObjectType> {
		self.defs.load().types.keys().filter(|t| !t.is_anonymous()).cloned().collect()
	}

	/// All category names.
	pub fn all_categories(&self) -> Vec<String> {
		self.defs.load().categories.keys().map(|k| k.to_string()).collect()
	}

	/// All convenience method names.
	pub fn all_convenience_methods(&self) -> Vec<String> {
		self.defs.load().methods.keys().map(|k| k.to_string()).collect()
	}

	pub fn has_pattern(&self, pattern: &Pattern) -> bool {
		self.defs.load().patterns.contains_key(pattern)
	}

	pub fn has_type(&self, object_type: &ObjectType) -> bool {
		self.defs.load().types.contains_key(object_type)
	}

	pub fn has_category(&self, name: &str) -> bool {
		self.defs.load().categories.contains_key(name)
	}

	pub fn has_convenience_method(&self, name: &str) -> bool {
		self.defs.load().methods.contains_key(name)
	}

	/// Type a pattern belongs to.
	pub fn type_for_pattern(&self, pattern: &Pattern) -> Option<ObjectType> {
		self.defs.load().patterns.get(pattern).map(|entry| entry.object_type.clone())
	}

	/// Patterns of a type; empty for unknown types.
	pub fn patterns_for_type(&self, object_type: &ObjectType) -> Vec<Pattern> {
		self.defs.load().types.get(object_type).cloned().unwrap_or_default()
	}

	/// A copy of a category definition.
	pub fn category(&self, name: &str) -> Option<CategoryDef> {
		self.defs.load().categories.get(name).cloned()
	}

	/// A copy of a convenience method definition.
	pub fn convenience_method(&self, name: &str) -> Option<MethodDef> {
		self.defs.load().methods.get(name).cloned()
	}

	/// Creates an empty registry with a copy of these definitions.
	///
	/// The new registry's schema is locked unless `unlocked` is set. A locked
	/// copy of a locked schema shares the definitions instead of copying them.
	pub fn spawn_registry(&self, unlocked: bool) -> Registry<T> {
		let schema = if self.is_locked() && !unlocked {
			Schema::from_defs(self.snapshot(), true)
		} else {
			let copy = SchemaDefs::clone(&self.snapshot());
			Schema::from_defs(Arc::new(copy), !unlocked)
		};
		debug!(unlocked, shared = self.is_locked() && !unlocked, "spawned registry");
		Registry::with_schema(schema)
	}
}

fn check_positions(name: &Arc<str>, pattern: &Pattern, positions: impl IntoIterator<Item = usize>) -> Result<()> {
	match positions.into_iter().find(|&p| p >= pattern.len()) {
		Some(position) => Err(RegistryError::PositionOutOfRange {
			name: name.clone(),
			position,
			arity: pattern.len(),
		}),
		None => Ok(()),
	}
}
