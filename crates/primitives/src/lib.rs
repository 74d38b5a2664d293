//! Core value types for the identity registry: values, tuples, and pattern templates.
//!
//! - [`Value`]: a single tuple element (kind-strict equality)
//! - [`Tuple`]: an immutable cache key
//! - [`Pattern`]: a template of literals, kind markers, and wildcards
//! - [`matches`]: the structural matcher deciding whether a tuple fits a pattern

/// Pattern templates and the matcher.
pub mod pattern;
/// Immutable tuples.
pub mod tuple;
/// Scalar values and kind markers.
pub mod value;

pub use pattern::{Element, ParseElementError, Pattern, matches};
pub use tuple::Tuple;
pub use value::{Symbol, Value, ValueKind, sym};

#[cfg(test)]
mod tests;
