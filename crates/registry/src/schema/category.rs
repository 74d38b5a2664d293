use idreg_primitives::{Pattern, Tuple};
use smallvec::SmallVec;

/// A secondary index over cached tuples.
///
/// A tuple belongs to the category when it matches `pattern`; its category key
/// is the tuple of values found at `positions`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDef {
	pattern: Pattern,
	positions: SmallVec<[usize; 4]>,
}

impl CategoryDef {
	pub(crate) fn new(pattern: Pattern, positions: impl IntoIterator<Item = usize>) -> Self {
		Self {
			pattern,
			positions: positions.into_iter().collect(),
		}
	}

	/// Membership pattern.
	pub fn pattern(&self) -> &Pattern {
		&self.pattern
	}

	/// Tuple positions that form the category key.
	pub fn positions(&self) -> &[usize] {
		&self.positions
	}

	/// Returns the category key for `tuple`, or `None` if the tuple is not a member.
	pub fn key_for(&self, tuple: &Tuple) -> Option<Tuple> {
		if self.pattern.matches(tuple) { tuple.project(&self.positions) } else { None }
	}
}
