use std::fmt;
use std::sync::Arc;

use idreg_primitives::Tuple;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::Target;
use crate::schema::SchemaDefs;
use crate::{CacheObject, FxIndexMap, KeyConflict, ObjectType, RegistryError, Result};

/// Opaque handle issued to a cached object when it is first inserted.
///
/// Handles are never reused within one registry, so a stale handle resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Category memberships a tuple activated on insertion: category name and key.
pub(super) type Memberships = SmallVec<[(Arc<str>, Tuple); 2]>;

/// Stored record for one cached object.
pub(super) struct ObjectEntry<T>
where
	T: ?Sized + CacheObject,
{
	pub(super) object: Arc<T>,
	pub(super) object_type: ObjectType,
	/// Tuples mapping to this object, in insertion order, with their category memberships.
	pub(super) tuples: FxIndexMap<Tuple, Memberships>,
}

/// Live indexes, guarded as one unit by the registry lock.
///
/// The category index is derived from `tuples` plus the category definitions
/// in effect when each tuple was inserted. Each object entry records the
/// memberships it activated so removal never needs the definitions.
pub(super) struct RegistryState<T>
where
	T: ?Sized + CacheObject,
{
	/// Tuple -> owning object.
	pub(super) tuples: FxHashMap<Tuple, ObjectId>,
	pub(super) objects: FxHashMap<ObjectId, ObjectEntry<T>>,
	/// `Arc` data pointer -> object.
	pub(super) identity: FxHashMap<usize, ObjectId>,
	/// Category name -> key -> member tuples (insertion ordered) and their owners.
	pub(super) categories: FxHashMap<Arc<str>, FxHashMap<Tuple, FxIndexMap<Tuple, ObjectId>>>,
	next_id: u64,
}

/// Identity of an `Arc` allocation, independent of `T`'s metadata.
pub(super) fn identity_key<T: ?Sized>(object: &Arc<T>) -> usize {
	Arc::as_ptr(object).cast::<()>() as usize
}

impl<T> RegistryState<T>
where
	T: ?Sized + CacheObject,
{
	pub(super) fn new() -> Self {
		Self {
			tuples: FxHashMap::default(),
			objects: FxHashMap::default(),
			identity: FxHashMap::default(),
			categories: FxHashMap::default(),
			next_id: 0,
		}
	}

	pub(super) fn resolve(&self, target: &Target<'_, T>) -> Option<ObjectId> {
		match target {
			Target::Tuple(tuple) => self.tuples.get(*tuple).copied(),
			Target::Object(object) => self.identity_of(object),
			Target::Id(id) => self.objects.contains_key(id).then_some(*id),
		}
	}

	pub(super) fn identity_of(&self, object: &Arc<T>) -> Option<ObjectId> {
		self.identity.get(&identity_key(object)).copied()
	}

	pub(super) fn entry(&self, id: ObjectId) -> Option<&ObjectEntry<T>> {
		self.objects.get(&id)
	}

	/// Fails if any of `tuples` is owned by an object other than `owner`.
	pub(super) fn check_free<'a>(&self, tuples: impl IntoIterator<Item = &'a Tuple>, owner: Option<ObjectId>) -> Result<()> {
		for tuple in tuples {
			match self.tuples.get(tuple) {
				Some(id) if Some(*id) != owner => {
					return Err(RegistryError::ObjectKeyConflict(KeyConflict::Tuple(tuple.clone())));
				}
				_ => {}
			}
		}
		Ok(())
	}

	/// Inserts a new object with no tuples yet.
	pub(super) fn insert_object(&mut self, object: Arc<T>, object_type: ObjectType) -> ObjectId {
		let id = ObjectId(self.next_id);
		self.next_id += 1;
		self.identity.insert(identity_key(&object), id);
		self.objects.insert(
			id,
			ObjectEntry {
				object,
				object_type,
				tuples: FxIndexMap::default(),
			},
		);
		id
	}

	/// Maps `tuple` to `id` and records its category memberships.
	///
	/// Callers check ownership first; a tuple already owned by `id` is left alone.
	pub(super) fn add_tuple(&mut self, id: ObjectId, tuple: Tuple, defs: &SchemaDefs<T>) {
		let Some(entry) = self.objects.get_mut(&id) else {
			return;
		};
		if entry.tuples.contains_key(&tuple) {
			return;
		}
		let memberships: Memberships = defs
			.categories
			.iter()
			.filter_map(|(name, category)| category.key_for(&tuple).map(|key| (name.clone(), key)))
			.collect();
		for (name, key) in &memberships {
			self.categories
				.entry(name.clone())
				.or_default()
				.entry(key.clone())
				.or_default()
				.insert(tuple.clone(), id);
		}
		self.tuples.insert(tuple.clone(), id);
		entry.tuples.insert(tuple, memberships);
	}

	/// Unmaps `tuple` from `id` and from every category it joined.
	pub(super) fn remove_tuple(&mut self, id: ObjectId, tuple: &Tuple) {
		let Some(entry) = self.objects.get_mut(&id) else {
			return;
		};
		let Some(memberships) = entry.tuples.shift_remove(tuple) else {
			return;
		};
		self.tuples.remove(tuple);
		for (name, key) in memberships {
			self.unindex_category(&name, &key, tuple);
		}
	}

	fn unindex_category(&mut self, name: &Arc<str>, key: &Tuple, tuple: &Tuple) {
		let Some(keys) = self.categories.get_mut(name) else {
			return;
		};
		if let Some(members) = keys.get_mut(key) {
			members.shift_remove(tuple);
			if members.is_empty() {
				keys.remove(key);
			}
		}
		if keys.is_empty() {
			self.categories.remove(name);
		}
	}

	/// Removes an object with all its tuples and category memberships.
	pub(super) fn remove_object(&mut self, id: ObjectId) -> Option<ObjectEntry<T>> {
		let entry = self.objects.remove(&id)?;
		self.identity.remove(&identity_key(&entry.object));
		for (tuple, memberships) in &entry.tuples {
			self.tuples.remove(tuple);
			for (name, key) in memberships {
				self.unindex_category(name, key, tuple);
			}
		}
		Some(entry)
	}

	pub(super) fn clear(&mut self) {
		self.tuples.clear();
		self.objects.clear();
		self.identity.clear();
		self.categories.clear();
	}

	/// Distinct owners of the tuples in one category key, in membership order.
	pub(super) fn category_members(&self, name: &str, key: &Tuple) -> Vec<ObjectId> {
		let mut ids: Vec<ObjectId> = Vec::new();
		if let Some(members) = self.categories.get(name).and_then(|keys| keys.get(key)) {
			for id in members.values() {
				if !ids.contains(id) {
					ids.push(*id);
				}
			}
		}
		ids
	}

	/// Panics if any cross-index invariant is broken.
	#[cfg(test)]
	pub(super) fn assert_consistent(&self, defs: &SchemaDefs<T>) {
		assert_eq!(self.identity.len(), self.objects.len(), "identity index size");
		let owned: usize = self.objects.values().map(|e| e.tuples.len()).sum();
		assert_eq!(owned, self.tuples.len(), "object tuple sets partition the tuple index");

		for (id, entry) in &self.objects {
			assert_eq!(self.identity.get(&identity_key(&entry.object)), Some(id), "identity of {id}");
			assert!(!entry.tuples.is_empty(), "{id} has no tuples");
			for (tuple, memberships) in &entry.tuples {
				assert_eq!(self.tuples.get(tuple), Some(id), "{tuple} owner");
				assert!(
					defs.patterns_of(&entry.object_type).any(|(p, _)| p.matches(tuple)),
					"{tuple} matches no pattern of {}",
					entry.object_type
				);
				let expected: Memberships = defs
					.categories
					.iter()
					.filter_map(|(name, category)| category.key_for(tuple).map(|key| (name.clone(), key)))
					.collect();
				assert_eq!(memberships, &expected, "{tuple} categories");
				for (name, key) in memberships {
					let owner = self.categories.get(name).and_then(|keys| keys.get(key)).and_then(|m| m.get(tuple));
					assert_eq!(owner, Some(id), "{tuple} in {name}{key}");
				}
			}
		}

		for (name, keys) in &self.categories {
			for (key, members) in keys {
				assert!(!members.is_empty(), "empty member set left in {name}{key}");
				for (tuple, id) in members {
					let entry = self.objects.get(id).expect("category member has an owner");
					let memberships = entry.tuples.get(tuple).expect("category member is owned");
					assert!(memberships.iter().any(|(n, k)| n == name && k == key), "{tuple} stray in {name}{key}");
				}
			}
		}
	}
}
