//! Registry operations that populate or shrink the indexes.

use std::sync::Arc;

use idreg_primitives::{Pattern, Tuple};
use tracing::{debug, trace, warn};

use super::{ObjectId, Registry, RegistryState, Target};
use crate::schema::{MethodArgs, SchemaDefs};
use crate::{CacheObject, LookupArgs, ObjectType, RegistryError, Result};

impl<T> Registry<T>
where
	T: ?Sized + CacheObject,
{
	/// Returns the object for `tuple`, generating and caching it on a miss.
	///
	/// Equivalent to [`Registry::lookup_with`] with no lookup arguments.
	pub fn lookup(&self, tuple: impl Into<Tuple>) -> Result<Option<Arc<T>>> {
		self.lookup_with(tuple, &LookupArgs::default())
	}

	/// Returns the object for `tuple`, generating and caching it on a miss.
	///
	/// Patterns matching `tuple` are tried in registration order; the first
	/// generator returning an object wins. Generators run with no lock held. If
	/// another caller cached `tuple` in the meantime, the freshly generated object
	/// is discarded and the cached one returned.
	///
	/// Returns `Ok(None)` if no pattern matches or every matching generator declines.
	pub fn lookup_with(&self, tuple: impl Into<Tuple>, args: &LookupArgs) -> Result<Option<Arc<T>>> {
		let tuple = tuple.into();
		let defs = self.schema.lock_and_load();

		if let Some(object) = self.get(&tuple) {
			trace!(%tuple, "lookup hit");
			return Ok(Some(object));
		}

		for (pattern, entry) in defs.patterns.iter().filter(|(pattern, _)| pattern.matches(&tuple)) {
			let Some(object) = entry.generate_object.generate(&tuple, self, args) else {
				trace!(%tuple, %pattern, "generator declined");
				continue;
			};
			let mut tuples = Self::generate_tuples(&defs, &entry.object_type, &object, false)?;
			if !tuples.contains(&tuple) {
				tuples.insert(0, tuple.clone());
			}
			return self.insert_generated(&defs, &tuple, object, &entry.object_type, tuples).map(Some);
		}
		Ok(None)
	}

	/// Caches a freshly generated object, unless `tuple` was cached concurrently.
	fn insert_generated(&self, defs: &SchemaDefs<T>, tuple: &Tuple, object: Arc<T>, object_type: &ObjectType, tuples: Vec<Tuple>) -> Result<Arc<T>> {
		let mut state = self.state.write();

		// Final race check: a concurrent lookup may have cached the tuple while our generator ran.
		if let Some(winner) = state.tuples.get(tuple).and_then(|id| state.entry(*id)) {
			debug!(%tuple, "lookup race lost, discarding generated object");
			return Ok(winner.object.clone());
		}

		if let Some(id) = state.identity_of(&object) {
			Self::check_type(&state, id, object_type)?;
			state.check_free(&tuples, Some(id))?;
			for t in tuples {
				state.add_tuple(id, t, defs);
			}
			debug!(%tuple, %id, "attached tuple to existing object");
			return Ok(object);
		}

		if let Err(err) = state.check_free(&tuples, None) {
			warn!(%tuple, %object_type, error = %err, "generated object could not be cached");
			return Err(err);
		}
		let id = Self::insert_new(&mut state, defs, object.clone(), object_type, tuples);
		debug!(%tuple, %id, %object_type, "generated object");
		Ok(object)
	}

	fn insert_new(state: &mut RegistryState<T>, defs: &SchemaDefs<T>, object: Arc<T>, object_type: &ObjectType, tuples: Vec<Tuple>) -> ObjectId {
		let id = state.insert_object(object, object_type.clone());
		for tuple in tuples {
			state.add_tuple(id, tuple, defs);
		}
		id
	}

	/// Caches `object` under every tuple its type's reverse generators produce.
	///
	/// Returns `Ok(true)` once the object is cached (including when it already was,
	/// under the same type) and `Ok(false)` when no generator produced a tuple.
	/// Nothing is inserted if any tuple already belongs to another object.
	pub fn add(&self, object_type: impl Into<ObjectType>, object: Arc<T>) -> Result<bool> {
		let object_type = object_type.into();
		let defs = self.schema.lock_and_load();
		if !defs.types.contains_key(&object_type) {
			return Err(RegistryError::UnknownType(object_type));
		}

		{
			let state = self.state.read();
			if let Some(id) = state.identity_of(&object) {
				Self::check_type(&state, id, &object_type)?;
				return Ok(true);
			}
		}

		let tuples = Self::generate_tuples(&defs, &object_type, &object, false)?;

		let mut state = self.state.write();
		if let Some(id) = state.identity_of(&object) {
			Self::check_type(&state, id, &object_type)?;
			return Ok(true);
		}
		if tuples.is_empty() {
			debug!(%object_type, "added object produced no tuples");
			return Ok(false);
		}
		state.check_free(&tuples, None)?;
		let count = tuples.len();
		let id = Self::insert_new(&mut state, &defs, object, &object_type, tuples);
		debug!(%id, %object_type, tuples = count, "added object");
		Ok(true)
	}

	/// Removes the resolved object with all of its tuples and category memberships.
	///
	/// Returns the removed object.
	pub fn delete<'a>(&self, target: impl Into<Target<'a, T>>) -> Option<Arc<T>> {
		self.schema.lock();
		let mut state = self.state.write();
		let id = state.resolve(&target.into())?;
		let entry = state.remove_object(id)?;
		debug!(%id, tuples = entry.tuples.len(), "deleted object");
		Some(entry.object)
	}

	/// Removes every object owning a cached tuple that matches `pattern`.
	///
	/// Matches structurally, so `pattern` need not be registered. Returns the number of objects removed.
	pub fn delete_pattern(&self, pattern: &Pattern) -> usize {
		self.schema.lock();
		let mut state = self.state.write();
		let mut ids: Vec<ObjectId> = state
			.tuples
			.iter()
			.filter(|(tuple, _)| pattern.matches(tuple))
			.map(|(_, id)| *id)
			.collect();
		ids.sort_unstable();
		ids.dedup();
		for id in &ids {
			state.remove_object(*id);
		}
		debug!(%pattern, removed = ids.len(), "deleted by pattern");
		ids.len()
	}

	/// Removes every object having a tuple in category `name` under `key`.
	///
	/// Returns the number of objects removed.
	pub fn delete_category(&self, name: &str, key: &Tuple) -> Result<usize> {
		let defs = self.schema.lock_and_load();
		if !defs.categories.contains_key(name) {
			return Err(RegistryError::UnknownCategory(name.to_string()));
		}
		let mut state = self.state.write();
		let ids = state.category_members(name, key);
		for id in &ids {
			state.remove_object(*id);
		}
		debug!(category = name, %key, removed = ids.len(), "deleted category");
		Ok(ids.len())
	}

	/// Recomputes the tuples of an object whose value changed.
	///
	/// Every pattern of the object's type must have a reverse generator. Tuples
	/// the object no longer produces are dropped and new ones added; an object
	/// left with no tuples is removed. Returns `Ok(false)` if the object is not cached.
	pub fn rekey<'a>(&self, target: impl Into<Target<'a, T>>) -> Result<bool> {
		let defs = self.schema.lock_and_load();
		let (id, object, object_type) = {
			let state = self.state.read();
			let Some(entry) = state.resolve(&target.into()).and_then(|id| state.entry(id).map(|e| (id, e))) else {
				return Ok(false);
			};
			(entry.0, entry.1.object.clone(), entry.1.object_type.clone())
		};

		let tuples = Self::generate_tuples(&defs, &object_type, &object, true)?;

		let mut state = self.state.write();
		let Some(entry) = state.entry(id) else {
			debug!(%id, "rekey target deleted concurrently");
			return Ok(false);
		};
		let stale: Vec<Tuple> = entry.tuples.keys().filter(|t| !tuples.contains(t)).cloned().collect();
		state.check_free(&tuples, Some(id))?;

		if tuples.is_empty() {
			state.remove_object(id);
			debug!(%id, "rekey left no tuples, object removed");
			return Ok(true);
		}
		for tuple in &stale {
			state.remove_tuple(id, tuple);
		}
		let added = tuples.len();
		for tuple in tuples {
			state.add_tuple(id, tuple, &defs);
		}
		debug!(%id, removed = stale.len(), tuples = added, "rekeyed object");
		Ok(true)
	}

	/// Removes every cached object. The schema is untouched.
	pub fn clear(&self) {
		let mut state = self.state.write();
		let objects = state.objects.len();
		state.clear();
		debug!(objects, "cleared registry");
	}

	/// Calls the convenience method `name`: fills its template from `args` and looks the tuple up.
	pub fn call(&self, name: &str, args: &MethodArgs, lookup_args: &LookupArgs) -> Result<Option<Arc<T>>> {
		let defs = self.schema.lock_and_load();
		let method = defs.methods.get(name).ok_or_else(|| RegistryError::UnknownMethod(name.to_string()))?;
		let tuple = method.fill(name, args)?;
		self.lookup_with(tuple, lookup_args)
	}
}
