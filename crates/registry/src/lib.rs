//! Pattern-indexed object cache.
//!
//! A [`Registry`] maps [`Tuple`] keys to lazily generated objects. The
//! [`Schema`] it runs against declares which tuple shapes ([`Pattern`]s)
//! produce objects, how objects map back to tuples, and which secondary
//! category indexes to maintain.
//!
//! ```
//! use std::sync::Arc;
//!
//! use idreg_primitives::{ValueKind, pattern, sym, tuple};
//! use idreg_registry::{PatternDef, Registry};
//!
//! #[derive(Debug)]
//! struct Number(f64);
//!
//! let registry = Registry::<Number>::builder()
//! 	.pattern(
//! 		PatternDef::new(pattern![sym("hello"), ValueKind::Int], |t| Some(Arc::new(Number(t[1].as_f64()?))))
//! 			.object_type("hello_numbers")
//! 			.reverse(|n| Some(tuple![sym("hello"), n.0 as i64])),
//! 	)
//! 	.pattern(
//! 		PatternDef::new(pattern![sym("hello"), ValueKind::Float], |t| Some(Arc::new(Number(t[1].as_f64()?))))
//! 			.object_type("hello_numbers")
//! 			.reverse(|n| Some(tuple![sym("hello"), n.0])),
//! 	)
//! 	.build()
//! 	.unwrap();
//!
//! let a = registry.lookup(tuple![sym("hello"), 1]).unwrap().unwrap();
//! let b = registry.lookup(tuple![sym("hello"), 1.0]).unwrap().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(registry.len(), 1);
//! ```
//!
//! # Modules
//!
//! - [`schema`] - Pattern, type, category, and convenience-method definitions
//! - [`registry`] - The cache engine
//! - `config` - TOML schema configuration (feature `config-toml`)
//! - [`builder`] - Chainable schema definition

mod args;
pub mod builder;
#[cfg(feature = "config-toml")]
pub mod config;
mod error;
mod object_type;
pub mod registry;
pub mod schema;

pub use args::LookupArgs;
pub use builder::RegistryBuilder;
#[cfg(feature = "config-toml")]
pub use config::{ConfigError, SchemaConfig};
pub use error::{KeyConflict, RegistryError, Result};
pub use idreg_primitives::{Element, Pattern, Tuple, Value, ValueKind};
pub use object_type::ObjectType;
pub use registry::{ObjectId, Registry, Target};
pub use schema::{CategoryDef, MethodArgs, MethodDef, MethodSlots, ObjectGenerator, PatternDef, Schema, TupleGenerator};

/// Insertion-ordered map with the Fx hasher.
pub(crate) type FxIndexMap<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;

/// Marker for types a [`Registry`] can cache.
///
/// Objects are shared as `Arc<T>` across threads and generators.
pub trait CacheObject: Send + Sync + 'static {}

impl<T> CacheObject for T where T: ?Sized + Send + Sync + 'static {}
