//! json-graph - Schema-driven codec between JSON trees and object graphs.
//!
//! A [`Schema`](json_graph_schema::Schema) describes classes (identified
//! instances kept in per-class registries), embeds (nested structures without
//! identity) and the graph's own properties. [`parse_graph`] and
//! [`graph_from`] turn a [`serde_json::Value`] into an [`ObjectGraph`] whose
//! references are resolved to [`InstanceRef`] handles, collecting every
//! problem into a bounded [`Errors`] list. [`to_json`] walks the graph back
//! into a tree.

mod errors;
mod graph;
mod load;
mod node;
mod resolve;
mod serialize;

pub use errors::{
    ErrorEntry, ErrorKind, Errors, FatalError, GraphCorruption, SizeLimit, DEFAULT_MAX_ERRORS,
};
pub use graph::{FieldValue, Fields, Instance, InstanceRef, ObjectGraph, Registry};
pub use load::{graph_from, parse_graph, LoadOptions};
pub use node::NodeKind;
pub use serialize::to_json;
