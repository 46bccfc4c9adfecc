//! Property-based test generators using proptest.
//!
//! Provides strategies for generating scenes that maintain the element
//! invariants the engine relies on.

use proptest::prelude::*;
use scenesync_codec::Element;
use serde_json::Value;
use std::collections::BTreeMap;

/// Strategy for generating element ids.
pub fn element_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_-]{1,12}").expect("Invalid regex")
}

/// Strategy for generating opaque schema fields.
///
/// Names carry an `x_` prefix so they never shadow bookkeeping fields.
pub fn extra_fields_strategy() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::btree_map(
        prop::string::string_regex("x_[a-z]{1,6}").expect("Invalid regex"),
        prop_oneof![
            any::<i32>().prop_map(Value::from),
            "[ -~]{0,16}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ],
        0..4,
    )
}

/// Strategy for generating a live element.
pub fn element_strategy() -> impl Strategy<Value = Element> {
    (
        element_id_strategy(),
        1..1_000u64,
        any::<u32>(),
        extra_fields_strategy(),
    )
        .prop_map(|(id, version, nonce, fields)| {
            fields.into_iter().fold(
                Element::new(id, version).with_nonce(nonce),
                |element, (name, value)| element.with_field(name, value),
            )
        })
}

/// Strategy for generating a scene with unique ids.
pub fn scene_strategy(max_len: usize) -> impl Strategy<Value = Vec<Element>> {
    prop::collection::vec(element_strategy(), 0..=max_len).prop_map(|elements| {
        let mut seen = std::collections::HashSet::new();
        elements
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect()
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn scene_ids_are_unique(elements in scene_strategy(16)) {
            let ids: HashSet<_> = elements.iter().map(|e| e.id.as_str()).collect();
            prop_assert_eq!(ids.len(), elements.len());
        }

        #[test]
        fn elements_are_live_and_versioned(element in element_strategy()) {
            prop_assert!(!element.is_deleted);
            prop_assert!(element.version >= 1);
            prop_assert!(element.extra.keys().all(|k| k.starts_with("x_")));
        }
    }
}
