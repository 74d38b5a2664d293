use std::collections::BTreeMap;
use std::sync::Arc;

use idreg_primitives::{Element, Pattern, Tuple, Value};
use smallvec::SmallVec;

use crate::{RegistryError, Result};

/// Where each argument of a convenience method lands in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSlots {
	/// The i-th argument goes to position `slots[i]`; `None` discards the argument.
	Positional(SmallVec<[Option<usize>; 4]>),
	/// Keyword arguments go to the mapped position; unknown keywords are ignored.
	Named(BTreeMap<Arc<str>, usize>),
}

impl MethodSlots {
	/// Positional slots, one target position per argument.
	pub fn positional(positions: impl IntoIterator<Item = usize>) -> Self {
		MethodSlots::Positional(positions.into_iter().map(Some).collect())
	}

	/// Keyword slots.
	pub fn named<K: AsRef<str>>(slots: impl IntoIterator<Item = (K, usize)>) -> Self {
		MethodSlots::Named(slots.into_iter().map(|(k, v)| (Arc::from(k.as_ref()), v)).collect())
	}

	pub(crate) fn positions(&self) -> Vec<usize> {
		match self {
			MethodSlots::Positional(slots) => slots.iter().flatten().copied().collect(),
			MethodSlots::Named(slots) => slots.values().copied().collect(),
		}
	}
}

/// Arguments for [`crate::Registry::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum MethodArgs {
	/// Arguments matched to [`MethodSlots::Positional`] by index.
	Positional(Vec<Value>),
	/// Arguments matched to [`MethodSlots::Named`] by keyword.
	Named(Vec<(String, Value)>),
}

impl MethodArgs {
	/// Positional arguments.
	pub fn positional<V: Into<Value>>(args: impl IntoIterator<Item = V>) -> Self {
		MethodArgs::Positional(args.into_iter().map(Into::into).collect())
	}

	/// Keyword arguments.
	pub fn named<K: Into<String>, V: Into<Value>>(args: impl IntoIterator<Item = (K, V)>) -> Self {
		MethodArgs::Named(args.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// A named lookup shortcut: a template whose slots are filled from call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
	template: Pattern,
	slots: MethodSlots,
}

impl MethodDef {
	pub(crate) fn new(template: Pattern, slots: MethodSlots) -> Self {
		Self { template, slots }
	}

	/// Template the arguments are written into.
	pub fn template(&self) -> &Pattern {
		&self.template
	}

	/// Argument slot layout.
	pub fn slots(&self) -> &MethodSlots {
		&self.slots
	}

	/// Fills the template from `args`.
	///
	/// Every template position that is not a literal must receive an argument.
	pub fn fill(&self, name: &str, args: &MethodArgs) -> Result<Tuple> {
		let mut values: Vec<Option<Value>> = self.template.elements().iter().map(|e| e.as_literal().cloned()).collect();

		match (&self.slots, args) {
			(MethodSlots::Positional(slots), MethodArgs::Positional(args)) => {
				if slots.len() != args.len() {
					return Err(arguments(name, format!("expected {} arguments, got {}", slots.len(), args.len())));
				}
				for (slot, value) in slots.iter().zip(args) {
					if let Some(position) = *slot {
						values[position] = Some(value.clone());
					}
				}
			}
			(MethodSlots::Named(slots), MethodArgs::Named(args)) => {
				for (key, value) in args {
					if let Some(&position) = slots.get(key.as_str()) {
						values[position] = Some(value.clone());
					}
				}
			}
			(MethodSlots::Positional(_), MethodArgs::Named(_)) => {
				return Err(arguments(name, "takes positional arguments".to_string()));
			}
			(MethodSlots::Named(_), MethodArgs::Positional(_)) => {
				return Err(arguments(name, "takes keyword arguments".to_string()));
			}
		}

		values
			.into_iter()
			.enumerate()
			.map(|(i, value)| {
				value.ok_or_else(|| match &self.template.elements()[i] {
					Element::Kind(kind) => arguments(name, format!("no argument for {kind} at position {i}")),
					_ => arguments(name, format!("no argument for position {i}")),
				})
			})
			.collect::<Result<Vec<_>>>()
			.map(Tuple::from)
	}
}

fn arguments(name: &str, reason: String) -> RegistryError {
	RegistryError::MethodArguments {
		name: Arc::from(name),
		reason,
	}
}
