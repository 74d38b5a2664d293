//! Error taxonomy for schema mutations and registry writes.
//!
//! Reads never fail on "not found"; they return `None` or an empty list.
//! Only invalid configuration and conflicting writes produce a [`RegistryError`].

use std::sync::Arc;

use idreg_primitives::{Pattern, Tuple};

use crate::ObjectType;

/// Registry and schema errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// A schema mutation was attempted after the schema was locked.
	#[error("configuration is locked")]
	ConfigurationLocked,

	/// The pattern is already registered.
	#[error("pattern already registered: {0}")]
	DuplicatePattern(Pattern),

	/// A category with this name is already registered.
	#[error("category already registered: {0}")]
	DuplicateCategory(Arc<str>),

	/// A convenience method with this name is already registered.
	#[error("convenience method already registered: {0}")]
	DuplicateMethod(Arc<str>),

	/// A category or method position lies outside its pattern.
	#[error("{name}: position {position} is out of range for arity {arity}")]
	PositionOutOfRange {
		/// Category or method name.
		name: Arc<str>,
		/// The offending position.
		position: usize,
		/// Arity of the pattern the position indexes into.
		arity: usize,
	},

	/// The object type is not registered in the schema.
	#[error("unrecognized object type: {0}")]
	UnknownType(ObjectType),

	/// The write would make one tuple address two objects, or re-add an object under another type.
	#[error("object key conflict: {0}")]
	ObjectKeyConflict(KeyConflict),

	/// A tuple generator produced a tuple no pattern of the object's type matches.
	#[error("tuple {tuple} generated for {object_type} matches none of its patterns")]
	MismatchedTuple {
		/// Type whose generator produced the tuple.
		object_type: ObjectType,
		/// The generated tuple.
		tuple: Tuple,
	},

	/// Some pattern of the object's type has no tuple generator.
	#[error("not every pattern of {0} can generate tuples")]
	NotRekeyable(ObjectType),

	/// No convenience method with this name exists.
	#[error("unknown convenience method: {0}")]
	UnknownMethod(String),

	/// No category with this name exists.
	#[error("unknown category: {0}")]
	UnknownCategory(String),

	/// Convenience method called with arguments that do not fit its slots.
	#[error("convenience method {name}: {reason}")]
	MethodArguments {
		/// Method name.
		name: Arc<str>,
		/// What was wrong with the call.
		reason: String,
	},
}

/// Details of an [`RegistryError::ObjectKeyConflict`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyConflict {
	/// The tuple already belongs to a different object.
	#[error("tuple {0} already maps to a different object")]
	Tuple(Tuple),
	/// The object is already present under another type.
	#[error("object is already present with type {existing} (requested {requested})")]
	Type {
		/// Type the object is cached under.
		existing: ObjectType,
		/// Type the caller asked for.
		requested: ObjectType,
	},
}

/// Result alias for registry operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
