//! Property-based test generators.

use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Generates a non-empty key or bucket name.
///
/// Names avoid `/`, which is the nested-bucket path separator.
pub fn key() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.-]{1,32}"
}

/// Generates an arbitrary byte-string value, empty included.
pub fn value() -> impl Strategy<Value = Vec<u8>> {
    vec(any::<u8>(), 0..128)
}

/// Generates a set of distinct key-value entries.
pub fn entries(max: usize) -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    btree_map(key(), value(), 1..max)
}
