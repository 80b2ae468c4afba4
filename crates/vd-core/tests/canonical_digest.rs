//! Property tests for the fingerprint pipeline: canonicalization must be
//! deterministic and independent of object key order.

use proptest::prelude::*;
use serde_json::{Map, Value};
use vd_core::{sha256_digest, CanonicalBytes};

fn flat_object() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec(("[a-z]{1,8}", any::<i64>()), 0..12)
}

fn build(entries: &[(String, i64)]) -> Value {
    let mut map = Map::new();
    for (k, v) in entries {
        map.insert(k.clone(), Value::from(*v));
    }
    Value::Object(map)
}

proptest! {
    #[test]
    fn insertion_order_does_not_affect_digest(entries in flat_object()) {
        let forward = build(&entries);
        let mut reversed_entries = entries.clone();
        reversed_entries.reverse();
        // Duplicate keys resolve last-write-wins, so only compare when unique.
        let mut keys: Vec<_> = entries.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        keys.dedup();
        prop_assume!(keys.len() == entries.len());
        let reversed = build(&reversed_entries);

        let a = CanonicalBytes::new(&forward).unwrap();
        let b = CanonicalBytes::new(&reversed).unwrap();
        prop_assert_eq!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn canonicalization_is_idempotent(entries in flat_object(), name in "[A-Za-z ]{0,20}") {
        let mut value = build(&entries);
        if let Value::Object(map) = &mut value {
            map.insert("name".into(), Value::String(name));
        }
        let once = CanonicalBytes::new(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(once.as_bytes()).unwrap();
        let twice = CanonicalBytes::new(&reparsed).unwrap();
        prop_assert_eq!(once, twice);
    }
}
