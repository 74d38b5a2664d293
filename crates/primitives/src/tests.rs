use std::collections::HashSet;

use proptest::prelude::*;
use rstest::rstest;

use crate::{Element, ParseElementError, Pattern, Tuple, Value, ValueKind, matches, pattern, sym, tuple};

#[rstest]
#[case::basic(pattern![sym("foo"), ValueKind::Int], tuple![sym("foo"), 1], true)]
#[case::wrong_kind(pattern![sym("foo"), ValueKind::Int], tuple![sym("foo"), "bar"], false)]
#[case::extra_items(pattern![sym("foo"), ValueKind::Int], tuple![sym("foo"), 1, 2], false)]
#[case::missing_items(pattern![sym("foo"), ValueKind::Int], tuple![sym("foo")], false)]
#[case::multiple_kinds(pattern![sym("foo"), ValueKind::Int, ValueKind::Int], tuple![sym("foo"), 3, 4], true)]
#[case::multiple_kinds_missing(pattern![sym("foo"), ValueKind::Int, ValueKind::Int], tuple![sym("foo"), 1], false)]
#[case::multiple_kinds_extra(pattern![sym("foo"), ValueKind::Int, ValueKind::Int], tuple![sym("foo"), 1, 2, 3], false)]
#[case::wrong_literal(pattern![sym("foo"), ValueKind::Int, ValueKind::Int], tuple![sym("bar"), 2, 3], false)]
#[case::different_kinds(pattern![sym("foo"), ValueKind::Int, ValueKind::Str], tuple![sym("foo"), 2, "bar"], true)]
#[case::multiple_literals(pattern![sym("foo"), sym("bar"), ValueKind::Str], tuple![sym("foo"), sym("bar"), "bar"], true)]
#[case::multiple_literals_wrong(pattern![sym("foo"), sym("bar"), ValueKind::Str], tuple![sym("foo"), sym("baz"), "bar"], false)]
#[case::symbol_kind(pattern![ValueKind::Symbol, 1, 3, ValueKind::Str], tuple![sym("foo"), 1, 3, "bar"], true)]
#[case::string_is_not_symbol(pattern![ValueKind::Symbol, 1, 3, ValueKind::Str], tuple!["foo", 1, 3, "bar"], false)]
#[case::int_is_not_float(pattern![sym("hello"), ValueKind::Float], tuple![sym("hello"), 1], false)]
#[case::number_admits_both(pattern![ValueKind::Number, ValueKind::Number], tuple![1, 1.5], true)]
#[case::wildcard(pattern![sym("any"), Element::Any], tuple![sym("any"), Value::Nil], true)]
#[case::empty(Pattern::new(Vec::<Element>::new()), Tuple::empty(), true)]
fn matcher_cases(#[case] pattern: Pattern, #[case] tuple: Tuple, #[case] expected: bool) {
	assert_eq!(matches(&pattern, &tuple), expected, "{pattern} vs {tuple}");
}

#[test]
fn int_and_float_are_distinct_keys() {
	let a = tuple![sym("hello"), 1];
	let b = tuple![sym("hello"), 1.0];
	assert_ne!(a, b);

	let set: HashSet<Tuple> = [a.clone(), b, a].into_iter().collect();
	assert_eq!(set.len(), 2);
}

#[test]
fn negative_zero_folds_into_zero() {
	assert_eq!(Value::Float(-0.0), Value::Float(0.0));
	let set: HashSet<Value> = [Value::Float(-0.0), Value::Float(0.0)].into_iter().collect();
	assert_eq!(set.len(), 1);
}

#[test]
fn nan_is_a_usable_key() {
	let nan = Value::Float(f64::NAN);
	assert_eq!(nan, nan.clone());
}

#[test]
fn tuple_with_and_project() {
	let t = tuple![sym("world"), 1.0, "hello"];
	assert_eq!(t.project(&[2]), Some(tuple!["hello"]));
	assert_eq!(t.project(&[1, 2]), Some(tuple![1.0, "hello"]));
	assert_eq!(t.project(&[3]), None);

	let replaced = t.with(1, 2.0).unwrap();
	assert_eq!(replaced, tuple![sym("world"), 2.0, "hello"]);
	assert_eq!(t, tuple![sym("world"), 1.0, "hello"], "original is untouched");
	assert!(t.with(5, 0).is_none());
}

#[test]
fn display_forms() {
	assert_eq!(tuple![sym("hello"), 1, 1.0, "s"].to_string(), r#"[:hello, 1, 1.0, "s"]"#);
	assert_eq!(pattern![sym("hello"), ValueKind::Float, Element::Any].to_string(), "[:hello, <float>, *]");
}

#[rstest]
#[case::wildcard("*", Ok(Element::Any))]
#[case::kind("<float>", Ok(Element::Kind(ValueKind::Float)))]
#[case::symbol(":world", Ok(Element::Literal(sym("world"))))]
#[case::escaped("::world", Ok(Element::Literal(Value::from(":world"))))]
#[case::string("hello", Ok(Element::Literal(Value::from("hello"))))]
#[case::unknown_kind("<widget>", Err(ParseElementError::UnknownKind("widget".into())))]
#[case::empty_symbol(":", Err(ParseElementError::EmptySymbol))]
fn element_syntax(#[case] input: &str, #[case] expected: Result<Element, ParseElementError>) {
	assert_eq!(input.parse::<Element>(), expected);
}

fn value_strategy() -> impl Strategy<Value = Value> {
	prop_oneof![
		Just(Value::Nil),
		any::<bool>().prop_map(Value::Bool),
		(-50i64..50).prop_map(Value::Int),
		(-50i64..50).prop_map(|v| Value::Float(v as f64 / 2.0)),
		"[a-c]{0,2}".prop_map(Value::from),
		"[a-c]{1,2}".prop_map(sym),
	]
}

proptest! {
	#[test]
	fn literal_pattern_matches_only_itself(values in prop::collection::vec(value_strategy(), 0..5), other in prop::collection::vec(value_strategy(), 0..5)) {
		let tuple = Tuple::from(values);
		let other = Tuple::from(other);
		let pattern = Pattern::from(&tuple);
		prop_assert!(pattern.matches(&tuple));
		prop_assert_eq!(pattern.matches(&other), tuple == other);
	}

	#[test]
	fn kind_pattern_matches_any_tuple_of_same_kinds(values in prop::collection::vec(value_strategy(), 0..5)) {
		let tuple = Tuple::from(values);
		let pattern: Pattern = tuple.iter().map(|v| Element::Kind(v.kind())).collect();
		prop_assert!(pattern.matches(&tuple));

		let wildcard: Pattern = tuple.iter().map(|_| Element::Any).collect();
		prop_assert!(wildcard.matches(&tuple));
	}
}
