//! Property-based tests for prefix namespacing.
//!
//! These tests verify the behavioral contracts of the namespacer:
//! - Idempotence: namespacing twice equals namespacing once
//! - Containment: the prefix is the only top-level key left
//! - No data loss: every foreign entry is found under the prefix

use proptest::prelude::*;
use secretcfg_secrets::{ConfigMap, Parser, PrefixJsonParser, namespace};
use serde_json::Value;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Generate key names (may collide with the prefix on purpose)
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("stripe".to_string()),
        Just("api_key".to_string()),
        "[a-z][a-z0-9_]{0,12}".prop_map(String::from),
    ]
}

/// Generate arbitrary JSON values up to a small depth
fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate a flat secret object whose prefix entry, if any, is an object
fn object_strategy() -> impl Strategy<Value = ConfigMap> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..8).prop_map(|m| {
        let mut object: ConfigMap = m.into_iter().collect();
        if let Some(existing) = object.get_mut("stripe")
            && !existing.is_object()
        {
            *existing = Value::Object(ConfigMap::new());
        }
        object
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Contract: a second pass finds nothing left to move
    #[test]
    fn namespacing_is_idempotent(object in object_strategy()) {
        let once = namespace(object, "stripe").unwrap();
        let twice = namespace(once.clone(), "stripe").unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Contract: only the prefix survives at the top level
    #[test]
    fn only_prefix_remains_at_top_level(object in object_strategy()) {
        let out = namespace(object, "stripe").unwrap();
        prop_assert!(out.keys().all(|k| k == "stripe"));
    }

    /// Contract: every foreign entry is recoverable under the prefix
    #[test]
    fn no_foreign_entry_is_lost(object in object_strategy()) {
        let out = namespace(object.clone(), "stripe").unwrap();
        for (key, value) in object.iter().filter(|(k, _)| k.as_str() != "stripe") {
            let nested = out.get("stripe").and_then(Value::as_object);
            prop_assert_eq!(nested.and_then(|m| m.get(key)), Some(value));
        }
    }

    /// Contract: entries already under the prefix survive unless overridden
    #[test]
    fn existing_prefix_entries_survive(object in object_strategy()) {
        let out = namespace(object.clone(), "stripe").unwrap();
        if let Some(Value::Object(existing)) = object.get("stripe") {
            let nested = out.get("stripe").and_then(Value::as_object).unwrap();
            for (key, value) in existing {
                let expected = object.get(key).filter(|_| key != "stripe").unwrap_or(value);
                prop_assert_eq!(nested.get(key), Some(expected));
            }
        }
    }

    /// Contract: the parser's byte path matches the in-memory transform
    #[test]
    fn unmarshal_matches_namespace(object in object_strategy()) {
        let bytes = serde_json::to_vec(&object).unwrap();
        let parsed = PrefixJsonParser::new("stripe").unmarshal(&bytes).unwrap();
        prop_assert_eq!(parsed, namespace(object, "stripe").unwrap());
    }
}
