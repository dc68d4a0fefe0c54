//! Property-based test generators using proptest.
//!
//! Keys never collide with the reserved sync timestamp key, and generated
//! values never contain NaN so they compare equal to themselves.

use proptest::prelude::*;
use std::collections::BTreeMap;
use tandem_store::{Snapshot, SyncTimestamp, Value};

/// Strategy for generating user keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating scalar values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9..1.0e9f64).prop_map(Value::Float),
        "[ -~]{0,24}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
        timestamp_strategy().prop_map(Value::Timestamp),
    ]
}

/// Strategy for generating values, including nested arrays and maps.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for generating store contents without a sync timestamp.
pub fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..8)
}

/// Strategy for generating sync timestamps.
pub fn timestamp_strategy() -> impl Strategy<Value = SyncTimestamp> {
    (0u64..1_000_000_000).prop_map(SyncTimestamp::from_millis)
}

/// Strategy for generating an optional sync timestamp.
pub fn optional_timestamp_strategy() -> impl Strategy<Value = Option<SyncTimestamp>> {
    prop::option::of(timestamp_strategy())
}

/// Strategy for generating a batch of local edits: `Some` writes, `None` deletes.
pub fn edit_batch_strategy() -> impl Strategy<Value = BTreeMap<String, Option<Value>>> {
    prop::collection::btree_map(
        key_strategy(),
        prop::option::of(scalar_value_strategy()),
        1..6,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_store::SYNC_TIMESTAMP_KEY;

    proptest! {
        #[test]
        fn keys_are_never_reserved(key in key_strategy()) {
            prop_assert!(!key.is_empty());
            prop_assert_ne!(key.as_str(), SYNC_TIMESTAMP_KEY);
        }

        #[test]
        fn values_equal_themselves(value in value_strategy()) {
            prop_assert_eq!(&value, &value.clone());
        }
    }
}
