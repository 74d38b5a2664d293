use std::sync::Arc;

use idreg_primitives::Tuple;

use super::ObjectId;
use crate::CacheObject;

/// Argument of the operations that accept either a tuple or an object.
///
/// Tuples resolve through the tuple index. Objects resolve by `Arc` identity,
/// so two value-equal objects in separate allocations are distinct entries.
pub enum Target<'a, T>
where
	T: ?Sized + CacheObject,
{
	Tuple(&'a Tuple),
	Object(&'a Arc<T>),
	Id(ObjectId),
}

impl<'a, T> From<&'a Tuple> for Target<'a, T>
where
	T: ?Sized + CacheObject,
{
	fn from(tuple: &'a Tuple) -> Self {
		Target::Tuple(tuple)
	}
}

impl<'a, T> From<&'a Arc<T>> for Target<'a, T>
where
	T: ?Sized + CacheObject,
{
	fn from(object: &'a Arc<T>) -> Self {
		Target::Object(object)
	}
}

impl<T> From<ObjectId> for Target<'_, T>
where
	T: ?Sized + CacheObject,
{
	fn from(id: ObjectId) -> Self {
		Target::Id(id)
	}
}
