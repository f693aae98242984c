//! Schema integrity checks.
//!
//! Everything that can be checked without input data is checked here, so the
//! loader and the serializer can rely on a consistent schema.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SchemaError;
use crate::types::{Property, Schema, Type};

const COMPOSITE_NAME: &str = r"^[A-Z]([a-zA-Z0-9_]*[a-zA-Z0-9])?$";
const PROPERTY_NAME: &str = r"^[a-zA-Z]([a-zA-Z0-9_]*[a-zA-Z0-9])?$";
const JSON_KEY: &str = r"^[A-Za-z][A-Za-z_0-9]*$";

static COMPOSITE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMPOSITE_NAME).expect("valid composite name regex"));
static PROPERTY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROPERTY_NAME).expect("valid property name regex"));
static JSON_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(JSON_KEY).expect("valid json key regex"));

/// Validate a schema, returning every problem found (empty if valid).
pub fn validate_schema(schema: &Schema, ref_: &str) -> Vec<SchemaError> {
    let mut errs = Vec::new();

    validate_names(schema, ref_, &mut errs);

    for (i, cls) in schema.classes.iter().enumerate() {
        let cls_ref = format!("{ref_}/classes/{i}");
        if cls.properties.iter().any(|p| p.name == "id" || p.json == "id") {
            errs.push(SchemaError::new(
                format!("{cls_ref}/properties"),
                "'id' is a reserved property of the class. \
                 If you want a pattern for class identifiers, use 'id_pattern'.",
            ));
        }
        validate_properties(schema, &cls.properties, &cls_ref, &mut errs);
    }

    for (i, embed) in schema.embeds.iter().enumerate() {
        let embed_ref = format!("{ref_}/embeds/{i}");
        validate_properties(schema, &embed.properties, &embed_ref, &mut errs);
    }

    validate_properties(schema, &schema.properties, ref_, &mut errs);
    validate_registry_keys(schema, ref_, &mut errs);

    errs
}

fn validate_names(schema: &Schema, ref_: &str, errs: &mut Vec<SchemaError>) {
    let mut seen: Vec<&str> = vec![schema.name.as_str()];

    if !COMPOSITE_NAME_RE.is_match(&schema.name) {
        errs.push(SchemaError::new(
            format!("{ref_}/name"),
            format!(
                "Invalid name, expected {COMPOSITE_NAME}, got {:?}",
                schema.name
            ),
        ));
    }

    let names = schema
        .classes
        .iter()
        .enumerate()
        .map(|(i, c)| (format!("{ref_}/classes/{i}/name"), c.name.as_str()))
        .chain(
            schema
                .embeds
                .iter()
                .enumerate()
                .map(|(i, e)| (format!("{ref_}/embeds/{i}/name"), e.name.as_str())),
        );

    for (name_ref, name) in names {
        if !COMPOSITE_NAME_RE.is_match(name) {
            errs.push(SchemaError::new(
                name_ref.clone(),
                format!("Invalid name, expected {COMPOSITE_NAME}, got {name:?}"),
            ));
        }
        if seen.contains(&name) {
            errs.push(SchemaError::new(
                name_ref,
                format!("Duplicate names: {name:?}"),
            ));
        }
        seen.push(name);
    }
}

fn validate_properties(
    schema: &Schema,
    properties: &[Property],
    ref_: &str,
    errs: &mut Vec<SchemaError>,
) {
    let mut names: HashSet<&str> = HashSet::new();
    let mut json_keys: HashMap<&str, &str> = HashMap::new();

    for prop in properties {
        let prop_ref = format!("{ref_}/properties/{}", prop.name);

        if !PROPERTY_NAME_RE.is_match(&prop.name) {
            errs.push(SchemaError::new(
                format!("{ref_}/properties"),
                format!(
                    "Property name invalid, expected {PROPERTY_NAME}, got {}",
                    prop.name
                ),
            ));
        }
        if !names.insert(&prop.name) {
            errs.push(SchemaError::new(
                prop_ref.clone(),
                format!("Duplicate property: {:?}", prop.name),
            ));
        }

        if !JSON_KEY_RE.is_match(&prop.json) {
            errs.push(SchemaError::new(
                format!("{prop_ref}/json"),
                format!("Invalid JSON key, expected {JSON_KEY}, got {:?}", prop.json),
            ));
        }
        if let Some(other) = json_keys.insert(&prop.json, &prop.name) {
            errs.push(SchemaError::new(
                format!("{prop_ref}/json"),
                format!(
                    "JSON key {:?} is already used by the property {other:?}",
                    prop.json
                ),
            ));
        }

        if let Some(err) = validate_type(schema, &prop.type_, &prop_ref) {
            errs.push(err);
        }
    }
}

fn validate_type(schema: &Schema, type_: &Type, ref_: &str) -> Option<SchemaError> {
    match type_ {
        Type::Integer(t) => {
            if let (Some(min), Some(max)) = (t.minimum, t.maximum) {
                let empty = if t.exclusive_minimum || t.exclusive_maximum {
                    min >= max
                } else {
                    min > max
                };
                if empty {
                    return Some(SchemaError::new(
                        format!("{ref_}/minimum"),
                        format!("Minimum and maximum leave no valid value: {min}, {max}"),
                    ));
                }
            }
            None
        }
        Type::Float(t) => {
            for bound in [t.minimum, t.maximum].into_iter().flatten() {
                if !bound.is_finite() {
                    return Some(SchemaError::new(
                        ref_,
                        format!("Expected finite bounds, but got: {bound}"),
                    ));
                }
            }
            if let (Some(min), Some(max)) = (t.minimum, t.maximum) {
                let empty = if t.exclusive_minimum || t.exclusive_maximum {
                    min >= max
                } else {
                    min > max
                };
                if empty {
                    return Some(SchemaError::new(
                        format!("{ref_}/minimum"),
                        format!("Minimum and maximum leave no valid value: {min}, {max}"),
                    ));
                }
            }
            None
        }
        Type::Array(t) => {
            if let (Some(min), Some(max)) = (t.minimum_size, t.maximum_size) {
                if min > max {
                    return Some(SchemaError::new(
                        format!("{ref_}/minimum_size"),
                        format!("Minimum size is larger than the maximum size: {min} > {max}"),
                    ));
                }
            }
            validate_type(schema, &t.values, &format!("{ref_}/values"))
        }
        Type::Map(values) => validate_type(schema, values, &format!("{ref_}/values")),
        Type::ClassRef(id) if id.0 >= schema.classes.len() => Some(SchemaError::new(
            ref_,
            format!("Reference to an undeclared class: #{}", id.0),
        )),
        Type::Embed(id) if id.0 >= schema.embeds.len() => Some(SchemaError::new(
            ref_,
            format!("Reference to an undeclared embed: #{}", id.0),
        )),
        _ => None,
    }
}

fn validate_registry_keys(schema: &Schema, ref_: &str, errs: &mut Vec<SchemaError>) {
    let mut registries: HashMap<String, &str> = HashMap::new();
    for (i, cls) in schema.classes.iter().enumerate() {
        let key = cls.registry_key();
        match registries.get(&key) {
            Some(other) if *other != cls.name => errs.push(SchemaError::new(
                format!("{ref_}/classes/{i}/plural"),
                format!(
                    "Registry {key:?} of class {:?} conflicts with class {other:?}",
                    cls.name
                ),
            )),
            _ => {
                registries.insert(key, &cls.name);
            }
        }
    }

    for prop in &schema.properties {
        if let Some(class_name) = registries.get(&prop.json) {
            errs.push(SchemaError::new(
                format!("{ref_}/properties/{}", prop.name),
                format!(
                    "Graph property {:?} conflicts with the plural necessary \
                     for the registry of class {class_name:?}",
                    prop.json
                ),
            ));
        }
    }
}
