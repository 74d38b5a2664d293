#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! The cache engine.
//!
//! # Mental Model
//!
//! 1. **Lookup:** A tuple is looked up. A hit returns the cached object; a miss runs
//!    the generators of matching patterns (registration order) until one produces an object.
//! 2. **Insertion:** The new object is cached under the looked-up tuple plus every tuple its
//!    type's reverse generators produce, and each tuple joins the categories it matches.
//! 3. **Maintenance:** [`Registry::delete`], [`Registry::delete_pattern`], [`Registry::rekey`],
//!    and [`Registry::clear`] shrink or reshape the indexes.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Registry`] | Live indexes plus the [`Schema`] they are built against. |
//! | [`ObjectId`] | Opaque handle issued to each cached object. |
//! | [`Target`] | Tuple, object, or handle argument of the resolving operations. |
//!
//! # Concurrency
//!
//! - **Reads:** Shared read lock over all indexes.
//! - **Writes:** One exclusive lock guards every index; all index bookkeeping for one
//!   operation happens inside a single critical section.
//! - **User code:** Object and tuple generators always run with no lock held. They may be
//!   slow and may read from the registry.
//!
//! # Invariants
//!
//! - Every cached tuple matches at least one pattern of its object's type.
//!   - Enforced in: [`Registry::generate_tuples`], [`Registry::lookup_with`].
//!   - Tested by: [`invariants::test_tuples_match_their_type`]
//!   - Failure symptom: [`Registry::rekey`] drops tuples it cannot regenerate.
//!
//! - An object's tuple set is exactly the set of tuples mapping to it.
//!   - Enforced in: [`RegistryState::add_tuple`], [`RegistryState::remove_tuple`], [`RegistryState::remove_object`].
//!   - Tested by: [`invariants::test_tuple_sets_partition_the_index`]
//!   - Failure symptom: [`Registry::get`] returns an object whose [`Registry::tuples_for`] omits the tuple.
//!
//! - A tuple is in a category key iff it matches the category pattern and the key is its projection.
//!   - Enforced in: [`RegistryState::add_tuple`].
//!   - Tested by: [`invariants::test_category_index_is_derived`]
//!   - Failure symptom: [`Registry::objects_in_category`] returns deleted or missing objects.
//!
//! - No two objects share a tuple, even under concurrent misses for the same tuple.
//!   - Enforced in: [`Registry::lookup_with`] (re-check under the write lock), [`RegistryState::check_free`].
//!   - Tested by: [`invariants::test_first_inserter_wins`], `tests/threads.rs`
//!   - Failure symptom: Two callers hold different objects for the same key.

mod state;
mod target;
mod write;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod invariants;

use std::collections::BTreeMap;
use std::sync::Arc;

use idreg_primitives::Tuple;
use parking_lot::RwLock;
pub use state::ObjectId;
use state::RegistryState;
pub use target::Target;

use crate::schema::{Schema, SchemaDefs};
use crate::{CacheObject, KeyConflict, ObjectType, RegistryBuilder, RegistryError, Result};

/// A pattern-indexed object cache.
pub struct Registry<T>
where
	T: ?Sized + CacheObject,
{
	schema: Schema<T>,
	state: RwLock<RegistryState<T>>,
}

impl<T> Default for Registry<T>
where
	T: ?Sized + CacheObject,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Registry<T>
where
	T: ?Sized + CacheObject,
{
	/// Creates a registry with an empty, unlocked schema.
	pub fn new() -> Self {
		Self::with_schema(Schema::new())
	}

	/// Creates an empty registry over `schema`.
	pub fn with_schema(schema: Schema<T>) -> Self {
		Self {
			schema,
			state: RwLock::new(RegistryState::new()),
		}
	}

	/// Starts a chainable schema definition.
	pub fn builder() -> RegistryBuilder<T> {
		RegistryBuilder::new()
	}

	/// The schema this registry runs against.
	pub fn schema(&self) -> &Schema<T> {
		&self.schema
	}

	/// Creates an empty registry with a copy of this registry's schema.
	///
	/// See [`Schema::spawn_registry`].
	pub fn spawn(&self, unlocked: bool) -> Registry<T> {
		self.schema.spawn_registry(unlocked)
	}

	/// Number of cached objects.
	pub fn len(&self) -> usize {
		self.state.read().objects.len()
	}

	/// Returns true if no object is cached.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the object cached under `tuple`, without generating one.
	pub fn get(&self, tuple: &Tuple) -> Option<Arc<T>> {
		let state = self.state.read();
		let id = state.tuples.get(tuple)?;
		state.entry(*id).map(|entry| entry.object.clone())
	}

	/// All tuples mapping to the resolved object, in insertion order.
	pub fn tuples_for<'a>(&self, target: impl Into<Target<'a, T>>) -> Option<Vec<Tuple>> {
		let state = self.state.read();
		let id = state.resolve(&target.into())?;
		state.entry(id).map(|entry| entry.tuples.keys().cloned().collect())
	}

	/// Returns true if the tuple or object is cached.
	pub fn contains<'a>(&self, target: impl Into<Target<'a, T>>) -> bool {
		self.state.read().resolve(&target.into()).is_some()
	}

	/// Handle of a cached object.
	pub fn object_id<'a>(&self, target: impl Into<Target<'a, T>>) -> Option<ObjectId> {
		self.state.read().resolve(&target.into())
	}

	/// Type a cached object was inserted under.
	pub fn object_type<'a>(&self, target: impl Into<Target<'a, T>>) -> Option<ObjectType> {
		let state = self.state.read();
		let id = state.resolve(&target.into())?;
		state.entry(id).map(|entry| entry.object_type.clone())
	}

	/// Category memberships of the resolved object: category name to category key.
	///
	/// When several of the object's tuples fall in the same category, the most
	/// recently inserted tuple's key is reported.
	pub fn categories<'a>(&self, target: impl Into<Target<'a, T>>) -> Option<BTreeMap<String, Tuple>> {
		self.schema.lock();
		let state = self.state.read();
		let id = state.resolve(&target.into())?;
		let entry = state.entry(id)?;
		let mut out = BTreeMap::new();
		for (name, key) in entry.tuples.values().flatten() {
			out.insert(name.to_string(), key.clone());
		}
		Some(out)
	}

	/// Objects having at least one tuple in category `name` under `key`.
	///
	/// Returns `None` if no such category is defined, and an empty list if the key has no members.
	pub fn objects_in_category(&self, name: &str, key: &Tuple) -> Option<Vec<Arc<T>>> {
		let defs = self.schema.lock_and_load();
		if !defs.categories.contains_key(name) {
			return None;
		}
		let state = self.state.read();
		let objects = state
			.category_members(name, key)
			.into_iter()
			.filter_map(|id| state.entry(id).map(|entry| entry.object.clone()))
			.collect();
		Some(objects)
	}

	/// Tuples in category `name` under `key`, in insertion order.
	///
	/// Returns `None` if no such category is defined.
	pub fn tuples_in_category(&self, name: &str, key: &Tuple) -> Option<Vec<Tuple>> {
		let defs = self.schema.lock_and_load();
		if !defs.categories.contains_key(name) {
			return None;
		}
		let state = self.state.read();
		let tuples = state
			.categories
			.get(name)
			.and_then(|keys| keys.get(key))
			.map(|members| members.keys().cloned().collect())
			.unwrap_or_default();
		Some(tuples)
	}

	/// Runs every reverse generator of `object_type` against `object`.
	///
	/// With `require_all`, a pattern without a reverse generator fails the whole
	/// computation with [`RegistryError::NotRekeyable`]; otherwise it is skipped.
	/// Duplicates are dropped and first-seen order is kept.
	fn generate_tuples(defs: &SchemaDefs<T>, object_type: &ObjectType, object: &T, require_all: bool) -> Result<Vec<Tuple>> {
		let mut tuples: Vec<Tuple> = Vec::new();
		for (_, entry) in defs.patterns_of(object_type) {
			let Some(generate) = &entry.generate_tuple else {
				if require_all {
					return Err(RegistryError::NotRekeyable(object_type.clone()));
				}
				continue;
			};
			let Some(tuple) = generate(object) else {
				continue;
			};
			if !defs.patterns_of(object_type).any(|(pattern, _)| pattern.matches(&tuple)) {
				return Err(RegistryError::MismatchedTuple {
					object_type: object_type.clone(),
					tuple,
				});
			}
			if !tuples.contains(&tuple) {
				tuples.push(tuple);
			}
		}
		Ok(tuples)
	}

	/// Fails if `id` is cached under a type other than `requested`.
	fn check_type(state: &RegistryState<T>, id: ObjectId, requested: &ObjectType) -> Result<()> {
		match state.entry(id) {
			Some(entry) if &entry.object_type != requested => Err(RegistryError::ObjectKeyConflict(KeyConflict::Type {
				existing: entry.object_type.clone(),
				requested: requested.clone(),
			})),
			_ => Ok(()),
		}
	}

	#[cfg(test)]
	pub(crate) fn assert_consistent(&self) {
		let defs = self.schema.snapshot();
		self.state.read().assert_consistent(&defs);
	}
}
