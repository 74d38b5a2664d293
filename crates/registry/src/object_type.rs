use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ANONYMOUS: AtomicU64 = AtomicU64::new(1);

/// Groups the patterns that describe one kind of cached object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
	/// A user-named type.
	Named(Arc<str>),
	/// Synthesized for patterns registered without a type; unique per process.
	Anonymous(u64),
}

impl ObjectType {
	/// Creates a named type.
	pub fn named(name: impl AsRef<str>) -> Self {
		ObjectType::Named(Arc::from(name.as_ref()))
	}

	/// Synthesizes a fresh anonymous type.
	pub fn anonymous() -> Self {
		ObjectType::Anonymous(NEXT_ANONYMOUS.fetch_add(1, Ordering::Relaxed))
	}

	/// Returns true for synthesized types.
	pub fn is_anonymous(&self) -> bool {
		matches!(self, ObjectType::Anonymous(_))
	}

	/// Returns the name of a named type.
	pub fn name(&self) -> Option<&str> {
		match self {
			ObjectType::Named(name) => Some(name),
			ObjectType::Anonymous(_) => None,
		}
	}
}

impl fmt::Display for ObjectType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ObjectType::Named(name) => f.write_str(name),
			ObjectType::Anonymous(n) => write!(f, "<anonymous #{n}>"),
		}
	}
}

impl From<&str> for ObjectType {
	fn from(name: &str) -> Self {
		ObjectType::named(name)
	}
}

impl From<String> for ObjectType {
	fn from(name: String) -> Self {
		ObjectType::Named(Arc::from(name))
	}
}
