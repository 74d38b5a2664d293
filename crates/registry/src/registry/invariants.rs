use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use idreg_primitives::{ValueKind, pattern, sym, tuple};

use super::fixtures::{Generated, Item, registry};
use crate::{PatternDef, Registry, RegistryError};

/// Must keep every cached tuple matching a pattern of its object's type.
///
/// * Enforced in: `Registry::generate_tuples`, `Registry::lookup_with`
/// * Failure symptom: `rekey` silently drops tuples it cannot regenerate.
#[cfg_attr(test, test)]
pub(crate) fn test_tuples_match_their_type() {
	let registry: Registry<Item> = Registry::new();
	registry
		.schema()
		.add_pattern(
			PatternDef::new(pattern![sym("hello"), ValueKind::Int], |t| Some(Item::new(t.clone())))
				.object_type("hello")
				.reverse(|_| Some(tuple![sym("goodbye"), 1])),
		)
		.unwrap();

	let err = registry.lookup(tuple![sym("hello"), 1]).unwrap_err();
	assert!(matches!(err, RegistryError::MismatchedTuple { .. }));
	assert!(registry.is_empty());

	let err = registry.add("hello", Item::new(tuple![sym("hello"), 2])).unwrap_err();
	assert!(matches!(err, RegistryError::MismatchedTuple { .. }));
	registry.assert_consistent();
}

/// Must keep each object's tuple set equal to the tuples mapping to it.
///
/// * Enforced in: `RegistryState::add_tuple`, `RegistryState::remove_tuple`, `RegistryState::remove_object`
/// * Failure symptom: `get` returns an object whose `tuples_for` omits the tuple.
#[cfg_attr(test, test)]
pub(crate) fn test_tuple_sets_partition_the_index() {
	let generated = Generated::default();
	let registry = registry(&generated);

	let one = registry.lookup(tuple![sym("hello"), 1]).unwrap().unwrap();
	let half = registry.lookup(tuple![sym("hello"), 1.5]).unwrap().unwrap();
	registry.assert_consistent();

	for tuple in registry.tuples_for(&one).unwrap() {
		assert!(Arc::ptr_eq(&registry.get(&tuple).unwrap(), &one));
	}
	assert_eq!(registry.tuples_for(&half).unwrap(), vec![tuple![sym("hello"), 1.5]]);

	one.set_key(tuple![sym("hello"), 2.0]);
	registry.rekey(&one).unwrap();
	registry.assert_consistent();

	registry.delete(&half);
	registry.assert_consistent();
	assert_eq!(registry.len(), 1);
}

/// Must derive category membership from the category pattern and positions alone.
///
/// * Enforced in: `RegistryState::add_tuple`
/// * Failure symptom: `objects_in_category` returns deleted or missing objects.
#[cfg_attr(test, test)]
pub(crate) fn test_category_index_is_derived() {
	let generated = Generated::default();
	let registry = registry(&generated);

	let a = registry.lookup(tuple![sym("world"), 1.0, "hello"]).unwrap().unwrap();
	registry.lookup(tuple![sym("world"), 2.0, "bye"]).unwrap().unwrap();
	registry.lookup(tuple![sym("hello"), 3]).unwrap().unwrap();
	registry.assert_consistent();

	a.set_key(tuple![sym("world"), 1.0, "bye"]);
	registry.rekey(&a).unwrap();
	registry.assert_consistent();
	assert_eq!(registry.objects_in_category("world_string", &tuple!["hello"]).unwrap().len(), 0);
	assert_eq!(registry.objects_in_category("world_string", &tuple!["bye"]).unwrap().len(), 2);

	registry.delete_pattern(&pattern![sym("world"), ValueKind::Float, "bye"]);
	registry.assert_consistent();
	assert!(registry.state.read().categories.is_empty(), "emptied keys are pruned");
}

/// Must never let two objects share a tuple when misses race.
///
/// * Enforced in: `Registry::insert_generated`, `RegistryState::check_free`
/// * Failure symptom: Two callers hold different objects for the same key.
#[cfg_attr(test, test)]
pub(crate) fn test_first_inserter_wins() {
	let barrier = Arc::new(Barrier::new(2));
	let registry: Arc<Registry<Item>> = Arc::new(Registry::new());
	let gate = barrier.clone();
	registry
		.schema()
		.add_pattern(PatternDef::new(pattern![sym("slow"), ValueKind::Int], move |t| {
			gate.wait();
			thread::sleep(Duration::from_millis(5));
			Some(Item::new(t.clone()))
		}))
		.unwrap();

	let handles: Vec<_> = (0..2)
		.map(|_| {
			let registry = registry.clone();
			thread::spawn(move || registry.lookup(tuple![sym("slow"), 1]).unwrap().unwrap())
		})
		.collect();
	let results: Vec<Arc<Item>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

	assert!(Arc::ptr_eq(&results[0], &results[1]));
	assert_eq!(registry.len(), 1);
	registry.assert_consistent();
}
