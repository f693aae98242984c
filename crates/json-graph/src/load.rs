//! Loading an object graph from a JSON tree.
//!
//! Loading runs in two phases so that references may point forward or form
//! cycles:
//!
//! 1. **Pre-allocation.** Every registry member of every class gets an
//!    instance without fields. Keys rejected by the class's ID pattern are
//!    reported and skipped. If anything was reported, loading stops here.
//! 2. **Population.** Instances are filled in registry order, then the
//!    graph's own properties. A reference is resolved against the registries
//!    built in phase 1, whether or not its target has been populated yet.
//!
//! Problems are collected in an [`Errors`] instead of aborting the load. Once
//! the collector is full the current structure is abandoned.

use std::fmt::Display;
use std::path::PathBuf;

use indexmap::IndexMap;
use json_graph_schema::{ClassId, Property, Schema, Type};
use json_graph_temporal::{Duration, TemporalError};
use serde_json::{Map, Value};

use crate::errors::{ErrorKind, Errors, FatalError, SizeLimit, DEFAULT_MAX_ERRORS};
use crate::graph::{FieldValue, Fields, ObjectGraph};
use crate::node::NodeKind;

/// Options of [`parse_graph`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Capacity of the error collector.
    pub max_errors: usize,
    /// Path of the root node in error messages.
    pub root: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            root: "#".to_string(),
        }
    }
}

/// Load a graph, owning the error collector.
///
/// ```
/// use json_graph::{parse_graph, LoadOptions};
/// use json_graph_schema::{Property, SchemaBuilder, Type};
/// use serde_json::json;
///
/// let mut b = SchemaBuilder::new("Some_graph");
/// let empty = b.class("Empty");
/// b.property(Property::new("global_reference_to_an_empty", Type::ClassRef(empty)));
/// let schema = b.build().unwrap();
///
/// let tree = json!({
///     "empties": {"a": {}, "b": {}},
///     "global_reference_to_an_empty": "a"
/// });
/// let graph = parse_graph(&schema, &tree, &LoadOptions::default()).unwrap();
/// assert_eq!(graph.registry(empty).len(), 2);
///
/// let errors = parse_graph(&schema, &json!({"empties": {}}), &LoadOptions::default())
///     .unwrap_err();
/// assert_eq!(errors.to_string(), "#: Property is missing: global_reference_to_an_empty");
/// ```
pub fn parse_graph(
    schema: &Schema,
    value: &Value,
    options: &LoadOptions,
) -> Result<ObjectGraph, Errors> {
    let mut errors = Errors::new(options.max_errors);
    let graph = load(schema, value, &options.root, &mut errors);
    if errors.is_empty() {
        Ok(graph)
    } else {
        Err(errors)
    }
}

/// Load a graph from `value`, collecting problems into `errors`.
///
/// `path` locates `value` in error messages. The returned graph must not be
/// used unless `errors` is still empty afterwards.
pub fn graph_from(
    schema: &Schema,
    value: &Value,
    path: &str,
    errors: &mut Errors,
) -> Result<ObjectGraph, FatalError> {
    if !errors.is_empty() {
        return Err(FatalError::NonEmptyErrors(errors.len()));
    }
    Ok(load(schema, value, path, errors))
}

fn load(schema: &Schema, value: &Value, path: &str, errors: &mut Errors) -> ObjectGraph {
    let mut graph = ObjectGraph::new(schema);
    if errors.is_full() {
        return graph;
    }

    let Value::Object(root) = value else {
        errors.add(path, mismatch("an object", value));
        return graph;
    };

    preallocate(schema, root, path, &mut graph, errors);
    let instances: usize = graph.registries().iter().map(|r| r.len()).sum();
    if !errors.is_empty() {
        tracing::debug!(
            instances,
            errors = errors.len(),
            "pre-allocation failed, skipping population"
        );
        return graph;
    }
    tracing::debug!(
        graph = %schema.name,
        registries = graph.registries().len(),
        instances,
        "pre-allocation done"
    );

    populate(schema, root, path, &mut graph, errors);
    tracing::debug!(errors = errors.len(), "population done");
    graph
}

// ── Phase 1 ──────────────────────────────────────────────────────────────

fn preallocate(
    schema: &Schema,
    root: &Map<String, Value>,
    path: &str,
    graph: &mut ObjectGraph,
    errors: &mut Errors,
) {
    for class_id in schema.class_ids() {
        let cls = schema.class(class_id);
        let key = cls.registry_key();
        let Some(node) = root.get(&key) else {
            continue;
        };
        let registry_path = format!("{path}/{key}");

        let Value::Object(members) = node else {
            errors.add(registry_path, mismatch("an object", node));
            if errors.is_full() {
                return;
            }
            continue;
        };

        let registry = graph.registry_mut(class_id);
        for id in members.keys() {
            if let Some(pattern) = &cls.id_pattern {
                if !pattern.is_match(id) {
                    errors.add(
                        &registry_path,
                        ErrorKind::IdPatternMismatch {
                            pattern: pattern.source().to_string(),
                            id: id.clone(),
                        },
                    );
                    if errors.is_full() {
                        return;
                    }
                    continue;
                }
            }
            registry.allocate(id);
        }
        tracing::trace!(class = %cls.name, instances = registry.len(), "registry allocated");
    }
}

// ── Phase 2 ──────────────────────────────────────────────────────────────

fn populate(
    schema: &Schema,
    root: &Map<String, Value>,
    path: &str,
    graph: &mut ObjectGraph,
    errors: &mut Errors,
) {
    for class_id in schema.class_ids() {
        let cls = schema.class(class_id);
        let key = cls.registry_key();
        let Some(Value::Object(members)) = root.get(&key) else {
            continue;
        };

        for index in 0..graph.registry(class_id).len() {
            let Some((id, _)) = graph.registry(class_id).get_index(index) else {
                continue;
            };
            let instance_path = format!("{path}/{key}/{id}");
            let Some(node) = members.get(id) else {
                continue;
            };

            let fields = match node {
                Value::Object(map) => {
                    let decoder = Decoder {
                        schema,
                        graph: &*graph,
                    };
                    Some(decoder.composite(&cls.properties, map, &instance_path, errors))
                }
                other => {
                    errors.add(instance_path, mismatch("an object", other));
                    None
                }
            };
            if let Some(fields) = fields {
                if let Some(instance) = graph.registry_mut(class_id).get_index_mut(index) {
                    instance.fields = fields;
                }
            }
            if errors.is_full() {
                return;
            }
        }
    }

    let decoder = Decoder {
        schema,
        graph: &*graph,
    };
    let fields = decoder.composite(&schema.properties, root, path, errors);
    graph.fields = fields;
}

/// Whether `name` is an identifier of the IANA time zone database, e.g.
/// `America/Argentina/Salta`, `Etc/GMT+3` or `UTC`.
fn is_time_zone(name: &str) -> bool {
    name.parse::<chrono_tz::Tz>().is_ok()
}

fn mismatch(expected: &'static str, node: &Value) -> ErrorKind {
    ErrorKind::TypeMismatch {
        expected,
        actual: NodeKind::of(node),
    }
}

/// Check `value` against optional bounds, reporting each violated one.
fn check_bounds<T: PartialOrd + Display>(
    value: T,
    minimum: Option<T>,
    exclusive_minimum: bool,
    maximum: Option<T>,
    exclusive_maximum: bool,
    path: &str,
    errors: &mut Errors,
) -> bool {
    let mut ok = true;
    if let Some(min) = minimum {
        let (op, pass) = if exclusive_minimum {
            (">", value > min)
        } else {
            (">=", value >= min)
        };
        if !pass {
            errors.add(
                path,
                ErrorKind::RangeViolation {
                    bound: format!("{op} {min}"),
                    actual: value.to_string(),
                },
            );
            ok = false;
        }
    }
    if let Some(max) = maximum {
        let (op, pass) = if exclusive_maximum {
            ("<", value < max)
        } else {
            ("<=", value <= max)
        };
        if !pass {
            errors.add(
                path,
                ErrorKind::RangeViolation {
                    bound: format!("{op} {max}"),
                    actual: value.to_string(),
                },
            );
            ok = false;
        }
    }
    ok
}

/// Read access to the schema and the pre-allocated registries.
struct Decoder<'a> {
    schema: &'a Schema,
    graph: &'a ObjectGraph,
}

impl Decoder<'_> {
    /// Decode the properties of a class instance, an embed or the graph.
    fn composite(
        &self,
        properties: &[Property],
        map: &Map<String, Value>,
        path: &str,
        errors: &mut Errors,
    ) -> Fields {
        let mut fields = Fields::with_capacity(properties.len());
        for prop in properties {
            match map.get(&prop.json) {
                None if prop.optional => {}
                None => errors.add(path, ErrorKind::MissingProperty(prop.json.clone())),
                Some(node) => {
                    let prop_path = format!("{path}/{}", prop.json);
                    if let Some(value) = self.value(&prop.type_, node, &prop_path, errors) {
                        fields.insert(prop.name.clone(), value);
                    }
                }
            }
            if errors.is_full() {
                break;
            }
        }
        fields
    }

    fn string<'v>(&self, node: &'v Value, path: &str, errors: &mut Errors) -> Option<&'v str> {
        match node {
            Value::String(s) => Some(s),
            other => {
                errors.add(path, mismatch("a string", other));
                None
            }
        }
    }

    fn value(
        &self,
        type_: &Type,
        node: &Value,
        path: &str,
        errors: &mut Errors,
    ) -> Option<FieldValue> {
        match type_ {
            Type::Boolean => match node {
                Value::Bool(b) => Some(FieldValue::Bool(*b)),
                other => {
                    errors.add(path, mismatch("a bool", other));
                    None
                }
            },

            Type::Integer(t) => {
                let Some(n) = node.as_i64() else {
                    errors.add(path, mismatch("an int64", node));
                    return None;
                };
                check_bounds(
                    n,
                    t.minimum,
                    t.exclusive_minimum,
                    t.maximum,
                    t.exclusive_maximum,
                    path,
                    errors,
                )
                .then_some(FieldValue::Integer(n))
            }

            Type::Float(t) => {
                let Some(x) = node.as_f64() else {
                    errors.add(path, mismatch("a double", node));
                    return None;
                };
                check_bounds(
                    x,
                    t.minimum,
                    t.exclusive_minimum,
                    t.maximum,
                    t.exclusive_maximum,
                    path,
                    errors,
                )
                .then_some(FieldValue::Float(x))
            }

            Type::String(pattern) | Type::Path(pattern) => {
                let s = self.string(node, path, errors)?;
                if let Some(pattern) = pattern {
                    if !pattern.is_match(s) {
                        errors.add(
                            path,
                            ErrorKind::PatternMismatch {
                                pattern: pattern.source().to_string(),
                                actual: s.to_string(),
                            },
                        );
                        return None;
                    }
                }
                Some(match type_ {
                    Type::Path(_) => FieldValue::Path(PathBuf::from(s)),
                    _ => FieldValue::String(s.to_string()),
                })
            }

            Type::Date(format) => {
                let s = self.string(node, path, errors)?;
                temporal(format.parse_date(s).map(FieldValue::Date), path, errors)
            }
            Type::Time(format) => {
                let s = self.string(node, path, errors)?;
                temporal(format.parse_time(s).map(FieldValue::Time), path, errors)
            }
            Type::Datetime(format) => {
                let s = self.string(node, path, errors)?;
                let parsed = if format.has_offset() {
                    format
                        .parse_offset_datetime(s)
                        .map(FieldValue::OffsetDatetime)
                } else {
                    format.parse_datetime(s).map(FieldValue::Datetime)
                };
                temporal(parsed, path, errors)
            }

            Type::TimeZone => {
                let s = self.string(node, path, errors)?;
                if is_time_zone(s) {
                    Some(FieldValue::TimeZone(s.to_string()))
                } else {
                    errors.add(path, ErrorKind::InvalidTimeZone(s.to_string()));
                    None
                }
            }

            Type::Duration => {
                let s = self.string(node, path, errors)?;
                match Duration::parse(s) {
                    Ok(d) => Some(FieldValue::Duration(d)),
                    Err(err) => {
                        errors.add(path, err.into());
                        None
                    }
                }
            }

            Type::Array(t) => {
                let Value::Array(items) = node else {
                    errors.add(path, mismatch("an array", node));
                    return None;
                };
                if let Some(min) = t.minimum_size.filter(|min| items.len() < *min) {
                    errors.add(
                        path,
                        ErrorKind::SizeViolation {
                            limit: SizeLimit::Minimum(min),
                            actual: items.len(),
                        },
                    );
                    return None;
                }
                if let Some(max) = t.maximum_size.filter(|max| items.len() > *max) {
                    errors.add(
                        path,
                        ErrorKind::SizeViolation {
                            limit: SizeLimit::Maximum(max),
                            actual: items.len(),
                        },
                    );
                    return None;
                }
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}/{i}");
                    if let Some(value) = self.value(&t.values, item, &item_path, errors) {
                        values.push(value);
                    }
                    if errors.is_full() {
                        break;
                    }
                }
                Some(FieldValue::Array(values))
            }

            Type::Map(values_type) => {
                let Value::Object(members) = node else {
                    errors.add(path, mismatch("an object", node));
                    return None;
                };
                let mut values = IndexMap::with_capacity(members.len());
                for (key, item) in members {
                    let item_path = format!("{path}/{key}");
                    if let Some(value) = self.value(values_type, item, &item_path, errors) {
                        values.insert(key.clone(), value);
                    }
                    if errors.is_full() {
                        break;
                    }
                }
                Some(FieldValue::Map(values))
            }

            Type::ClassRef(class_id) => {
                let id = self.string(node, path, errors)?;
                self.reference(*class_id, id, path, errors)
            }

            Type::Embed(embed_id) => {
                let Value::Object(map) = node else {
                    errors.add(path, mismatch("an object", node));
                    return None;
                };
                let embed = self.schema.embed(*embed_id);
                Some(FieldValue::Embed(self.composite(
                    &embed.properties,
                    map,
                    path,
                    errors,
                )))
            }
        }
    }

    fn reference(
        &self,
        class_id: ClassId,
        id: &str,
        path: &str,
        errors: &mut Errors,
    ) -> Option<FieldValue> {
        match self.graph.resolve(class_id, id) {
            Some(handle) => Some(FieldValue::Ref(handle)),
            None => {
                errors.add(
                    path,
                    ErrorKind::ReferenceNotFound {
                        class: self.schema.class(class_id).name.clone(),
                        id: id.to_string(),
                    },
                );
                None
            }
        }
    }
}

fn temporal(
    parsed: Result<FieldValue, TemporalError>,
    path: &str,
    errors: &mut Errors,
) -> Option<FieldValue> {
    match parsed {
        Ok(value) => Some(value),
        Err(err) => {
            errors.add(
                path,
                ErrorKind::TemporalParseFailure {
                    pattern: err.pattern,
                    actual: err.text,
                },
            );
            None
        }
    }
}
