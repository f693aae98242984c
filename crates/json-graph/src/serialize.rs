//! Serializing an object graph back into a JSON tree.
//!
//! The output object lists the graph's own properties first (schema order),
//! then one member per non-empty registry keyed by the class's JSON plural.
//! References become the ID of their target; unset optional properties are
//! left out.

use json_graph_schema::{ClassId, Property, Schema, Type};
use serde_json::{Map, Number, Value};

use crate::errors::GraphCorruption;
use crate::graph::{FieldValue, Fields, InstanceRef, ObjectGraph};

const ROOT: &str = "#";

/// Serialize `graph` according to `schema`.
///
/// Fails only if the graph violates its own invariants, e.g. an instance
/// stored under a key other than its ID or a handle to a missing instance.
pub fn to_json(schema: &Schema, graph: &ObjectGraph) -> Result<Value, GraphCorruption> {
    if graph.registries().len() != schema.classes.len() {
        return Err(GraphCorruption::RegistryCount {
            expected: schema.classes.len(),
            actual: graph.registries().len(),
        });
    }

    let encoder = Encoder { schema, graph };
    let mut root = encoder.composite(&schema.properties, &graph.fields, ROOT)?;

    let mut instances = 0usize;
    for class_id in schema.class_ids() {
        let cls = schema.class(class_id);
        let registry = graph.registry(class_id);
        if registry.is_empty() {
            continue;
        }
        let key = cls.registry_key();
        let mut members = Map::with_capacity(registry.len());
        for (id, instance) in registry.iter() {
            if instance.id() != id {
                return Err(GraphCorruption::IdMismatch {
                    class: cls.name.clone(),
                    key: id.to_string(),
                    id: instance.id().to_string(),
                });
            }
            let path = format!("{ROOT}/{key}/{id}");
            let fields = encoder.composite(&cls.properties, &instance.fields, &path)?;
            members.insert(id.to_string(), Value::Object(fields));
        }
        instances += registry.len();
        root.insert(key, Value::Object(members));
    }

    tracing::debug!(graph = %schema.name, instances, "graph serialized");
    Ok(Value::Object(root))
}

struct Encoder<'a> {
    schema: &'a Schema,
    graph: &'a ObjectGraph,
}

impl Encoder<'_> {
    fn composite(
        &self,
        properties: &[Property],
        fields: &Fields,
        path: &str,
    ) -> Result<Map<String, Value>, GraphCorruption> {
        let mut map = Map::with_capacity(properties.len());
        for prop in properties {
            match fields.get(&prop.name) {
                Some(value) => {
                    let prop_path = format!("{path}/{}", prop.json);
                    map.insert(prop.json.clone(), self.value(&prop.type_, value, &prop_path)?);
                }
                None if prop.optional => {}
                None => {
                    return Err(GraphCorruption::MissingProperty {
                        path: path.to_string(),
                        name: prop.name.clone(),
                    })
                }
            }
        }
        Ok(map)
    }

    fn value(&self, type_: &Type, value: &FieldValue, path: &str) -> Result<Value, GraphCorruption> {
        let unexpected = || GraphCorruption::UnexpectedValue {
            path: path.to_string(),
            expected: type_.kind(),
        };
        let render = |source| GraphCorruption::Render {
            path: path.to_string(),
            source,
        };

        let out = match (type_, value) {
            (Type::Boolean, FieldValue::Bool(b)) => Value::Bool(*b),
            (Type::Integer(_), FieldValue::Integer(n)) => Value::from(*n),
            (Type::Float(_), FieldValue::Float(x)) => {
                Value::Number(Number::from_f64(*x).ok_or_else(unexpected)?)
            }
            (Type::String(_), FieldValue::String(s)) => Value::String(s.clone()),
            (Type::Path(_), FieldValue::Path(p)) => {
                Value::String(p.to_str().ok_or_else(unexpected)?.to_string())
            }
            (Type::Date(format), FieldValue::Date(d)) => {
                Value::String(format.format_date(d).map_err(render)?)
            }
            (Type::Time(format), FieldValue::Time(t)) => {
                Value::String(format.format_time(t).map_err(render)?)
            }
            (Type::Datetime(format), FieldValue::Datetime(dt)) => {
                Value::String(format.format_datetime(dt).map_err(render)?)
            }
            (Type::Datetime(format), FieldValue::OffsetDatetime(dt)) => {
                Value::String(format.format_offset_datetime(dt).map_err(render)?)
            }
            (Type::TimeZone, FieldValue::TimeZone(tz)) => Value::String(tz.clone()),
            (Type::Duration, FieldValue::Duration(d)) => Value::String(d.to_string()),
            (Type::Array(t), FieldValue::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.value(&t.values, item, &format!("{path}/{i}"))?);
                }
                Value::Array(out)
            }
            (Type::Map(values_type), FieldValue::Map(members)) => {
                let mut out = Map::with_capacity(members.len());
                for (key, item) in members {
                    out.insert(
                        key.clone(),
                        self.value(values_type, item, &format!("{path}/{key}"))?,
                    );
                }
                Value::Object(out)
            }
            (Type::ClassRef(class_id), FieldValue::Ref(handle)) => {
                Value::String(self.reference(*class_id, *handle, path)?)
            }
            (Type::Embed(embed_id), FieldValue::Embed(fields)) => {
                let embed = self.schema.embed(*embed_id);
                Value::Object(self.composite(&embed.properties, fields, path)?)
            }
            _ => return Err(unexpected()),
        };
        Ok(out)
    }

    fn reference(
        &self,
        class_id: ClassId,
        handle: InstanceRef,
        path: &str,
    ) -> Result<String, GraphCorruption> {
        if handle.class() != class_id {
            return Err(GraphCorruption::UnexpectedValue {
                path: path.to_string(),
                expected: "class reference",
            });
        }
        self.graph
            .id_of(handle)
            .map(str::to_string)
            .ok_or_else(|| GraphCorruption::DanglingReference {
                path: path.to_string(),
                class: self.schema.class(class_id).name.clone(),
                index: handle.index(),
            })
    }
}
