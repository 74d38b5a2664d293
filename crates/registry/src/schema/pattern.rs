use std::fmt;
use std::sync::Arc;

use idreg_primitives::{Pattern, Tuple};

use crate::{CacheObject, LookupArgs, ObjectType, Registry};

type TupleFn<T> = dyn Fn(&Tuple) -> Option<Arc<T>> + Send + Sync;
type RegistryFn<T> = dyn Fn(&Tuple, &Registry<T>) -> Option<Arc<T>> + Send + Sync;
type ArgsFn<T> = dyn Fn(&Tuple, &Registry<T>, &LookupArgs) -> Option<Arc<T>> + Send + Sync;

/// Produces the tuple under which an object is reachable through one pattern.
pub type TupleGenerator<T> = Arc<dyn Fn(&T) -> Option<Tuple> + Send + Sync>;

/// Builds an object for a tuple that missed the cache.
///
/// Tagged by how much context the generator wants. Returning `None` declines
/// the tuple and lets the next matching pattern try.
pub enum ObjectGenerator<T>
where
	T: ?Sized + CacheObject,
{
	/// Receives only the tuple.
	Tuple(Arc<TupleFn<T>>),
	/// Receives the tuple and the registry doing the lookup.
	WithRegistry(Arc<RegistryFn<T>>),
	/// Receives the tuple, the registry, and the caller's lookup arguments.
	WithArgs(Arc<ArgsFn<T>>),
}

impl<T> ObjectGenerator<T>
where
	T: ?Sized + CacheObject,
{
	pub(crate) fn generate(&self, tuple: &Tuple, registry: &Registry<T>, args: &LookupArgs) -> Option<Arc<T>> {
		match self {
			ObjectGenerator::Tuple(f) => f(tuple),
			ObjectGenerator::WithRegistry(f) => f(tuple, registry),
			ObjectGenerator::WithArgs(f) => f(tuple, registry, args),
		}
	}
}

impl<T> Clone for ObjectGenerator<T>
where
	T: ?Sized + CacheObject,
{
	fn clone(&self) -> Self {
		match self {
			ObjectGenerator::Tuple(f) => ObjectGenerator::Tuple(f.clone()),
			ObjectGenerator::WithRegistry(f) => ObjectGenerator::WithRegistry(f.clone()),
			ObjectGenerator::WithArgs(f) => ObjectGenerator::WithArgs(f.clone()),
		}
	}
}

impl<T> fmt::Debug for ObjectGenerator<T>
where
	T: ?Sized + CacheObject,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ObjectGenerator::Tuple(_) => f.write_str("ObjectGenerator::Tuple(..)"),
			ObjectGenerator::WithRegistry(_) => f.write_str("ObjectGenerator::WithRegistry(..)"),
			ObjectGenerator::WithArgs(_) => f.write_str("ObjectGenerator::WithArgs(..)"),
		}
	}
}

/// A pattern definition ready to be added to a [`crate::Schema`].
///
/// ```
/// use std::sync::Arc;
///
/// use idreg_primitives::{ValueKind, pattern, sym, tuple};
/// use idreg_registry::PatternDef;
///
/// let def = PatternDef::<i64>::new(pattern![sym("hello"), ValueKind::Int], |t| t[1].as_int().map(Arc::new))
/// 	.object_type("hello_numbers")
/// 	.reverse(|v| Some(tuple![sym("hello"), *v]));
/// assert_eq!(def.pattern().len(), 2);
/// ```
pub struct PatternDef<T>
where
	T: ?Sized + CacheObject,
{
	pub(crate) pattern: Pattern,
	pub(crate) object_type: Option<ObjectType>,
	pub(crate) generate_object: ObjectGenerator<T>,
	pub(crate) generate_tuple: Option<TupleGenerator<T>>,
}

impl<T> PatternDef<T>
where
	T: ?Sized + CacheObject,
{
	/// Defines a pattern whose generator needs only the tuple.
	pub fn new<F>(pattern: impl Into<Pattern>, generate: F) -> Self
	where
		F: Fn(&Tuple) -> Option<Arc<T>> + Send + Sync + 'static,
	{
		Self::from_generator(pattern, ObjectGenerator::Tuple(Arc::new(generate)))
	}

	/// Defines a pattern whose generator also receives the registry.
	pub fn with_registry<F>(pattern: impl Into<Pattern>, generate: F) -> Self
	where
		F: Fn(&Tuple, &Registry<T>) -> Option<Arc<T>> + Send + Sync + 'static,
	{
		Self::from_generator(pattern, ObjectGenerator::WithRegistry(Arc::new(generate)))
	}

	/// Defines a pattern whose generator also receives the registry and lookup arguments.
	pub fn with_args<F>(pattern: impl Into<Pattern>, generate: F) -> Self
	where
		F: Fn(&Tuple, &Registry<T>, &LookupArgs) -> Option<Arc<T>> + Send + Sync + 'static,
	{
		Self::from_generator(pattern, ObjectGenerator::WithArgs(Arc::new(generate)))
	}

	/// Defines a pattern from an already tagged generator.
	pub fn from_generator(pattern: impl Into<Pattern>, generate_object: ObjectGenerator<T>) -> Self {
		Self {
			pattern: pattern.into(),
			object_type: None,
			generate_object,
			generate_tuple: None,
		}
	}

	/// Sets the object type. Without one, an anonymous type is synthesized on registration.
	pub fn object_type(mut self, object_type: impl Into<ObjectType>) -> Self {
		self.object_type = Some(object_type.into());
		self
	}

	/// Sets the reverse generator mapping an object back to its tuple for this pattern.
	pub fn reverse<F>(mut self, generate: F) -> Self
	where
		F: Fn(&T) -> Option<Tuple> + Send + Sync + 'static,
	{
		self.generate_tuple = Some(Arc::new(generate));
		self
	}

	/// Returns the pattern template.
	pub fn pattern(&self) -> &Pattern {
		&self.pattern
	}
}

/// Stored form of a registered pattern.
pub(crate) struct PatternEntry<T>
where
	T: ?Sized + CacheObject,
{
	pub(crate) object_type: ObjectType,
	pub(crate) generate_object: ObjectGenerator<T>,
	pub(crate) generate_tuple: Option<TupleGenerator<T>>,
}

impl<T> Clone for PatternEntry<T>
where
	T: ?Sized + CacheObject,
{
	fn clone(&self) -> Self {
		Self {
			object_type: self.object_type.clone(),
			generate_object: self.generate_object.clone(),
			generate_tuple: self.generate_tuple.clone(),
		}
	}
}
