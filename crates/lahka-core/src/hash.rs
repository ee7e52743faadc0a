//! Canonical JSON hashing shared by `Transaction` and `Block`.
//!
//! `serde_json::Value`'s object type is `BTreeMap`-backed unless the
//! `preserve_order` feature is enabled (it isn't, here), so serializing a
//! `serde_json::Value::Object` already yields lexicographically sorted
//! keys — exactly the canonicalization SPEC_FULL.md §6 requires, with no
//! custom canonicalizer needed.

use serde_json::Value;
use sha2::{Digest, Sha256};

pub fn hash_value(value: &Value) -> String {
    let bytes = serde_json::to_vec(value).expect("Value always serializes");
    hex::encode(Sha256::digest(&bytes))
}
