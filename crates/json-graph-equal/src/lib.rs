//! json-graph-equal - Tree equality for JSON values.
//!
//! Serializing a decoded object graph does not always reproduce the exact
//! number representation of the input (an integral float is written as a
//! real, `1` may come back as `1.0`). [`tree_equal`] compares two
//! [`serde_json::Value`] trees structurally and treats numbers as equal when
//! they denote the same value. [`first_difference`] reports where two trees
//! diverge, which makes failing round-trip assertions readable.

mod tree_equal;

pub use tree_equal::{first_difference, numbers_equal, tree_equal};
