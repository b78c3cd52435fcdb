//! Property-based tests for the validation engine.
//!
//! ## Test Categories
//!
//! - Full passes are deterministic over an unchanged snapshot.
//! - Length bounds are inclusive.
//! - Duplicate reports are symmetric between the rows involved.
//! - Empty values only ever trigger `not-empty`.

use proptest::prelude::*;
use std::sync::Arc;
use table_guard::config::{Constraints, Field, FieldType, RuleConfiguration};
use table_guard::core::result::{MAX_LENGTH, MIN_LENGTH, NOT_EMPTY, UNIQUE, UNIQUE_MULTIPLE};
use table_guard::core::{TableSnapshot, Validator};

fn mixed_config() -> RuleConfiguration {
    RuleConfiguration::new(vec![
        Field::new("code").with_constraints(Constraints::unique().with_max_length(3)),
        Field::new("qty").with_type(FieldType::Integer),
        Field::new("kind")
            .with_constraints(Constraints::required().with_enumeration(["a", "b", "c"])),
    ])
}

fn small_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-c]{1,2}",
        "[0-9]{1,3}",
        "[a-z0-9]{4,6}",
    ]
}

fn mixed_table() -> impl Strategy<Value = TableSnapshot> {
    prop::collection::vec((small_value(), small_value(), small_value()), 0..25).prop_map(
        |rows| {
            TableSnapshot::from_records(
                ["code", "qty", "kind"],
                rows.into_iter().map(|(a, b, c)| [a, b, c]),
            )
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_full_pass_is_idempotent(table in mixed_table()) {
        let validator = Validator::builder(mixed_config()).build().unwrap();
        let first = validator.validate_table(&table).unwrap();
        let second = validator.validate_table(&table).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_errors_are_ordered_and_non_empty(table in mixed_table()) {
        let validator = Validator::builder(mixed_config()).build().unwrap();
        let errors = validator.validate_table(&table).unwrap();

        let header = ["code", "qty", "kind"];
        let positions: Vec<(usize, usize)> = errors
            .iter()
            .map(|e| {
                let column = e.column.as_deref().unwrap();
                (e.row.unwrap(), header.iter().position(|h| *h == column).unwrap())
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        prop_assert_eq!(positions, sorted);
        prop_assert!(errors.iter().all(|e| !e.messages.is_empty()));
    }

    #[test]
    fn test_length_bounds_are_inclusive(bound in 1usize..20, value in "[a-zA-Z0-9äöü]{0,25}") {
        let config = RuleConfiguration::new(vec![Field::new("text").with_constraints(
            Constraints::default().with_min_length(bound).with_max_length(bound),
        )]);
        let validator = Validator::builder(config).build().unwrap();
        let length = value.chars().count();

        let error = validator.is_valid(0, "text", Some(&value));
        if length == 0 || length == bound {
            prop_assert!(error.is_none());
        } else {
            let error = error.unwrap();
            prop_assert_eq!(error.messages.len(), 1);
            let expected = if length < bound { MIN_LENGTH } else { MAX_LENGTH };
            prop_assert_eq!(error.messages[0].key.as_str(), expected);
            prop_assert_eq!(error.messages[0].params[0].clone(), bound.to_string());
        }
    }

    #[test]
    fn test_uniqueness_is_symmetric(values in prop::collection::vec("[xyz]", 1..20)) {
        let config = RuleConfiguration::new(vec![
            Field::new("v").with_constraints(Constraints::unique()),
        ]);
        let table = Arc::new(TableSnapshot::from_records(
            ["v"],
            values.iter().map(|v| [v.as_str()]),
        ));
        let validator = Validator::build(config, table).unwrap();

        for (i, a) in values.iter().enumerate() {
            for (j, b) in values.iter().enumerate() {
                if i == j || a != b {
                    continue;
                }
                let from_i = validator.is_valid(i, "v", Some(a)).unwrap();
                let from_j = validator.is_valid(j, "v", Some(b)).unwrap();
                let key = from_i.messages[0].key.as_str();
                prop_assert!(key == UNIQUE || key == UNIQUE_MULTIPLE);

                let lines_i: Vec<&str> = from_i.messages[0].params[1].split(", ").collect();
                let lines_j: Vec<&str> = from_j.messages[0].params[1].split(", ").collect();
                let line_i = (i + 1).to_string();
                let line_j = (j + 1).to_string();
                prop_assert!(lines_i.contains(&line_j.as_str()));
                prop_assert!(lines_j.contains(&line_i.as_str()));
                prop_assert!(!lines_i.contains(&line_i.as_str()));
            }
        }
    }

    #[test]
    fn test_empty_values_only_fail_not_empty(required in any::<bool>(), empty in prop_oneof![Just(None), Just(Some(""))]) {
        let constraints = Constraints::default()
            .with_required(required)
            .with_unique(true)
            .with_min_length(2)
            .with_pattern("[0-9]+")
            .with_enumeration(["1", "2"]);
        let config = RuleConfiguration::new(vec![Field::new("f")
            .with_type(FieldType::Integer)
            .with_constraints(constraints)
            .with_script("value == 1")]);
        let validator = Validator::builder(config).build().unwrap();

        match validator.is_valid(3, "f", empty) {
            None => prop_assert!(!required),
            Some(error) => {
                prop_assert!(required);
                prop_assert_eq!(error.messages.len(), 1);
                prop_assert_eq!(error.messages[0].key.as_str(), NOT_EMPTY);
            }
        }
    }
}
