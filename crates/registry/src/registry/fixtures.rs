use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use idreg_primitives::{ValueKind, pattern, sym, tuple};
use parking_lot::Mutex;

use crate::{PatternDef, Registry, Tuple};

/// Cached test object identified by a mutable key tuple.
#[derive(Debug)]
pub(crate) struct Item {
	key: Mutex<Tuple>,
}

impl Item {
	pub(crate) fn new(key: Tuple) -> Arc<Self> {
		Arc::new(Self { key: Mutex::new(key) })
	}

	pub(crate) fn key(&self) -> Tuple {
		self.key.lock().clone()
	}

	pub(crate) fn set_key(&self, key: Tuple) {
		*self.key.lock() = key;
	}
}

/// Number of times the fixture generators produced an object.
#[derive(Debug, Default, Clone)]
pub(crate) struct Generated(Arc<AtomicUsize>);

impl Generated {
	pub(crate) fn count(&self) -> usize {
		self.0.load(Ordering::SeqCst)
	}

	fn bump(&self) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}

/// `hello_numbers`: `[:hello, <int>]` and `[:hello, <float>]` address the same number.
///
/// Items store the float form; the int form exists only for integral values.
pub(crate) fn hello_numbers(generated: &Generated) -> [PatternDef<Item>; 2] {
	let g1 = generated.clone();
	let g2 = generated.clone();
	[
		PatternDef::new(pattern![sym("hello"), ValueKind::Int], move |t| {
			g1.bump();
			t[1].as_f64().map(|v| Item::new(tuple![sym("hello"), v]))
		})
		.object_type("hello_numbers")
		.reverse(|item| {
			let v = item.key()[1].as_float()?;
			(v.fract() == 0.0).then(|| tuple![sym("hello"), v as i64])
		}),
		PatternDef::new(pattern![sym("hello"), ValueKind::Float], move |t| {
			g2.bump();
			t[1].as_f64().map(|v| Item::new(tuple![sym("hello"), v]))
		})
		.object_type("hello_numbers")
		.reverse(|item| Some(item.key())),
	]
}

/// `world`: `[:world, <float>, <string>]`, keyed by the item itself.
pub(crate) fn world(generated: &Generated) -> PatternDef<Item> {
	let generated = generated.clone();
	PatternDef::new(pattern![sym("world"), ValueKind::Float, ValueKind::Str], move |t| {
		generated.bump();
		Some(Item::new(t.clone()))
	})
	.object_type("world")
	.reverse(|item| Some(item.key()))
}

/// Registry with `hello_numbers`, `world`, and the `world_string` category over position 2.
pub(crate) fn registry(generated: &Generated) -> Registry<Item> {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	let [int, float] = hello_numbers(generated);
	let registry = Registry::new();
	registry.schema().add_pattern(int).unwrap();
	registry.schema().add_pattern(float).unwrap();
	registry.schema().add_pattern(world(generated)).unwrap();
	registry
		.schema()
		.add_category("world_string", pattern![sym("world"), ValueKind::Float, ValueKind::Str], [2])
		.unwrap();
	registry
}
