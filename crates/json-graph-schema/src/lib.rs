//! Schema model for json-graph object graphs.
//!
//! A [`Schema`] names the classes (identified, registry-tracked instances),
//! the embeds (nested structures without identity) and the graph's own
//! properties. Schemas are built programmatically with [`SchemaBuilder`] or
//! read from their JSON form with [`schema_from_json`]; both paths end in
//! [`validate_schema`].

mod builder;
mod error;
pub mod naming;
mod parse;
mod types;
mod validate;

pub use builder::SchemaBuilder;
pub use error::{SchemaError, SchemaErrors};
pub use parse::schema_from_json;
pub use types::*;
pub use validate::validate_schema;

pub use json_graph_temporal::{StrftimeFormat, TemporalKind};
