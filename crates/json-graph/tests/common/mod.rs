//! Shared fixtures for the json-graph integration matrices.

#![allow(dead_code)]

use json_graph::{parse_graph, LoadOptions, ObjectGraph};
use json_graph_schema::{schema_from_json, Schema};
use serde_json::{json, Value};

pub fn schema(value: Value) -> Schema {
    schema_from_json(&value, "#").unwrap_or_else(|errs| panic!("invalid schema:\n{errs}"))
}

/// Load with default options, rendering errors as `path: message` lines.
pub fn load(schema: &Schema, tree: &Value) -> Result<ObjectGraph, Vec<String>> {
    load_with(schema, tree, &LoadOptions::default())
}

pub fn load_with(
    schema: &Schema,
    tree: &Value,
    options: &LoadOptions,
) -> Result<ObjectGraph, Vec<String>> {
    parse_graph(schema, tree, options)
        .map_err(|errors| errors.iter().map(ToString::to_string).collect())
}

pub fn load_errors(schema: &Schema, tree: Value) -> Vec<String> {
    match load(schema, &tree) {
        Ok(_) => panic!("expected errors for {tree}"),
        Err(errors) => errors,
    }
}

pub fn load_ok(schema: &Schema, tree: Value) -> ObjectGraph {
    load(schema, &tree).unwrap_or_else(|errors| panic!("unexpected errors:\n{}", errors.join("\n")))
}

/// The two-class graph of the registry examples.
pub fn empties_schema() -> Schema {
    schema(json!({
        "name": "Some_graph",
        "description": "defines some object graph.",
        "classes": [{"name": "Empty", "description": "defines an empty class."}],
        "properties": {
            "global_reference_to_an_empty": {
                "type": "Empty",
                "description": "refers to an empty instance."
            }
        }
    }))
}

/// People referring to each other directly, through containers and through
/// embedded addresses.
pub fn social_schema() -> Schema {
    schema(json!({
        "name": "Social",
        "classes": [
            {
                "name": "Person",
                "plural": "People",
                "id_pattern": "[a-z][a-z0-9_]*",
                "properties": {
                    "name": {"type": "string"},
                    "friend": {"type": "Person", "optional": true},
                    "birthday": {"type": "date", "optional": true},
                    "home": {"type": "Address", "optional": true}
                }
            },
            {"name": "Empty"}
        ],
        "embeds": [
            {
                "name": "Address",
                "properties": {
                    "street": {"type": "string"},
                    "owner": {"type": "Person", "optional": true}
                }
            }
        ],
        "properties": {
            "team": {"type": "array", "values": {"type": "Person"}, "optional": true},
            "by_role": {"type": "map", "values": {"type": "Person"}, "optional": true},
            "headquarters": {"type": "Address", "optional": true}
        }
    }))
}

/// One optional property per scalar type.
pub fn scalars_schema() -> Schema {
    schema(json!({
        "name": "Scalars",
        "properties": {
            "flag": {"type": "boolean", "optional": true},
            "count": {
                "type": "integer",
                "minimum": 0,
                "maximum": 10,
                "exclusive_maximum": true,
                "optional": true
            },
            "ratio": {"type": "float", "minimum": 0, "maximum": 1, "optional": true},
            "code": {"type": "string", "pattern": "[A-Z]+", "optional": true},
            "file": {"type": "path", "optional": true},
            "day": {"type": "date", "optional": true},
            "clock": {"type": "time", "format": "%I:%M %p", "optional": true},
            "moment": {"type": "datetime", "optional": true},
            "zone": {"type": "time_zone", "optional": true},
            "timeout": {"type": "duration", "optional": true},
            "sizes": {
                "type": "array",
                "values": {"type": "integer"},
                "minimum_size": 1,
                "maximum_size": 3,
                "optional": true
            }
        }
    }))
}
