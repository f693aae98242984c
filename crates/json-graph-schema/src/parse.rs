//! Reading a schema from its JSON form.
//!
//! ```json
//! {
//!   "name": "Some_graph",
//!   "description": "defines some object graph.",
//!   "classes": [{"name": "Empty", "description": "defines an empty class."}],
//!   "properties": {
//!     "global_reference_to_an_empty": {
//!       "type": "Empty",
//!       "description": "refers to an empty instance."
//!     }
//!   }
//! }
//! ```
//!
//! Classes and embeds are declared before any property is read, so a property
//! may name a composite defined anywhere in the document.

use std::collections::HashMap;

use json_graph_temporal::{StrftimeFormat, TemporalKind};
use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaErrors};
use crate::types::{
    ArrayType, Class, ClassId, Embed, EmbedId, FloatType, IntegerType, Pattern, Property, Schema,
    Type,
};
use crate::validate::validate_schema;

const GRAPH_KEYS: &[&str] = &["name", "description", "classes", "embeds", "properties"];
// Per-language generator settings are tolerated and ignored.
const GENERATOR_KEYS: &[&str] = &["cpp", "go", "py"];
const CLASS_KEYS: &[&str] = &["name", "plural", "description", "id_pattern", "properties"];
const EMBED_KEYS: &[&str] = &["name", "description", "properties"];
const PROPERTY_KEYS: &[&str] = &["description", "json", "optional"];
const TYPE_KEYS: &[&str] = &["type"];
const BOUND_KEYS: &[&str] = &[
    "minimum",
    "exclusive_minimum",
    "maximum",
    "exclusive_maximum",
];

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Composite names visible to type definitions.
struct Names {
    classes: HashMap<String, ClassId>,
    embeds: HashMap<String, EmbedId>,
}

struct Parser {
    errs: Vec<SchemaError>,
}

impl Parser {
    fn error(&mut self, ref_: impl Into<String>, message: impl Into<String>) {
        self.errs.push(SchemaError::new(ref_, message));
    }

    // ── Primitive readers ────────────────────────────────────────────────

    fn object<'a>(&mut self, value: &'a Value, ref_: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.error(
                    ref_,
                    format!("Expected an object, but got: {}", json_kind(other)),
                );
                None
            }
        }
    }

    fn array<'a>(&mut self, value: &'a Value, ref_: &str) -> Option<&'a Vec<Value>> {
        match value {
            Value::Array(items) => Some(items),
            other => {
                self.error(
                    ref_,
                    format!("Expected an array, but got: {}", json_kind(other)),
                );
                None
            }
        }
    }

    fn string(&mut self, map: &Map<String, Value>, key: &str, ref_: &str) -> Option<String> {
        match map.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.error(
                    format!("{ref_}/{key}"),
                    format!("Expected a string, but got: {}", json_kind(other)),
                );
                None
            }
        }
    }

    fn required_string(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        ref_: &str,
    ) -> Option<String> {
        if !map.contains_key(key) {
            self.error(ref_, format!("Property is missing: {key}"));
            return None;
        }
        self.string(map, key, ref_)
    }

    fn boolean(&mut self, map: &Map<String, Value>, key: &str, ref_: &str) -> bool {
        match map.get(key) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.error(
                    format!("{ref_}/{key}"),
                    format!("Expected a boolean, but got: {}", json_kind(other)),
                );
                false
            }
        }
    }

    fn integer(&mut self, map: &Map<String, Value>, key: &str, ref_: &str) -> Option<i64> {
        let value = map.get(key)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                self.error(
                    format!("{ref_}/{key}"),
                    format!("Expected a 64-bit integer, but got: {value}"),
                );
                None
            }
        }
    }

    fn size(&mut self, map: &Map<String, Value>, key: &str, ref_: &str) -> Option<usize> {
        let value = map.get(key)?;
        match value.as_u64().and_then(|n| usize::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                self.error(
                    format!("{ref_}/{key}"),
                    format!("Expected a non-negative integer, but got: {value}"),
                );
                None
            }
        }
    }

    fn float(&mut self, map: &Map<String, Value>, key: &str, ref_: &str) -> Option<f64> {
        let value = map.get(key)?;
        match value.as_f64() {
            Some(n) => Some(n),
            None => {
                self.error(
                    format!("{ref_}/{key}"),
                    format!("Expected a number, but got: {}", json_kind(value)),
                );
                None
            }
        }
    }

    fn pattern(&mut self, map: &Map<String, Value>, key: &str, ref_: &str) -> Option<Pattern> {
        let source = self.string(map, key, ref_)?;
        match Pattern::new(source) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                self.error(
                    format!("{ref_}/{key}"),
                    format!("Invalid regular expression: {err}"),
                );
                None
            }
        }
    }

    fn format(
        &mut self,
        map: &Map<String, Value>,
        kind: TemporalKind,
        ref_: &str,
    ) -> Option<StrftimeFormat> {
        if !map.contains_key("format") {
            return Some(StrftimeFormat::default_for(kind));
        }
        let pattern = self.string(map, "format", ref_)?;
        match StrftimeFormat::new(kind, pattern) {
            Ok(format) => Some(format),
            Err(err) => {
                self.error(format!("{ref_}/format"), err.to_string());
                None
            }
        }
    }

    fn unexpected_keys(&mut self, map: &Map<String, Value>, allowed: &[&[&str]], ref_: &str) {
        for key in map.keys() {
            if !allowed.iter().any(|keys| keys.contains(&key.as_str())) {
                self.error(
                    ref_,
                    format!("Additional properties are not allowed ({key:?} was unexpected)"),
                );
            }
        }
    }

    // ── Types and properties ─────────────────────────────────────────────

    fn type_def(
        &mut self,
        map: &Map<String, Value>,
        names: &Names,
        ref_: &str,
        extra: &[&str],
    ) -> Option<Type> {
        let type_name = self.required_string(map, "type", ref_)?;
        let specific: &[&str] = match type_name.as_str() {
            "integer" | "float" => BOUND_KEYS,
            "string" | "path" => &["pattern"],
            "date" | "time" | "datetime" => &["format"],
            "array" => &["values", "minimum_size", "maximum_size"],
            "map" => &["values"],
            _ => &[],
        };
        self.unexpected_keys(map, &[TYPE_KEYS, specific, extra], ref_);

        match type_name.as_str() {
            "boolean" => Some(Type::Boolean),
            "integer" => Some(Type::Integer(IntegerType {
                minimum: self.integer(map, "minimum", ref_),
                exclusive_minimum: self.boolean(map, "exclusive_minimum", ref_),
                maximum: self.integer(map, "maximum", ref_),
                exclusive_maximum: self.boolean(map, "exclusive_maximum", ref_),
            })),
            "float" => Some(Type::Float(FloatType {
                minimum: self.float(map, "minimum", ref_),
                exclusive_minimum: self.boolean(map, "exclusive_minimum", ref_),
                maximum: self.float(map, "maximum", ref_),
                exclusive_maximum: self.boolean(map, "exclusive_maximum", ref_),
            })),
            "string" => Some(Type::String(self.pattern(map, "pattern", ref_))),
            "path" => Some(Type::Path(self.pattern(map, "pattern", ref_))),
            "date" => self.format(map, TemporalKind::Date, ref_).map(Type::Date),
            "time" => self.format(map, TemporalKind::Time, ref_).map(Type::Time),
            "datetime" => self
                .format(map, TemporalKind::Datetime, ref_)
                .map(Type::Datetime),
            "time_zone" => Some(Type::TimeZone),
            "duration" => Some(Type::Duration),
            "array" => {
                let minimum_size = self.size(map, "minimum_size", ref_);
                let maximum_size = self.size(map, "maximum_size", ref_);
                let values = self.values(map, names, ref_)?;
                Some(Type::Array(ArrayType {
                    values: Box::new(values),
                    minimum_size,
                    maximum_size,
                }))
            }
            "map" => self.values(map, names, ref_).map(Type::map),
            other => {
                if let Some(id) = names.classes.get(other) {
                    Some(Type::ClassRef(*id))
                } else if let Some(id) = names.embeds.get(other) {
                    Some(Type::Embed(*id))
                } else {
                    self.error(format!("{ref_}/type"), format!("Unknown type: {other:?}"));
                    None
                }
            }
        }
    }

    fn values(&mut self, map: &Map<String, Value>, names: &Names, ref_: &str) -> Option<Type> {
        let values_ref = format!("{ref_}/values");
        let Some(value) = map.get("values") else {
            self.error(ref_, "Property is missing: values");
            return None;
        };
        let values = self.object(value, &values_ref)?;
        self.type_def(values, names, &values_ref, &[])
    }

    fn property(
        &mut self,
        name: &str,
        value: &Value,
        names: &Names,
        ref_: &str,
    ) -> Option<Property> {
        let map = self.object(value, ref_)?;
        let description = self.string(map, "description", ref_).unwrap_or_default();
        let json = self.string(map, "json", ref_).unwrap_or_else(|| name.to_string());
        let optional = self.boolean(map, "optional", ref_);
        let type_ = self.type_def(map, names, ref_, PROPERTY_KEYS)?;
        Some(Property {
            name: name.to_string(),
            json,
            description,
            optional,
            type_,
        })
    }

    fn properties(
        &mut self,
        map: &Map<String, Value>,
        names: &Names,
        ref_: &str,
    ) -> Vec<Property> {
        let Some(value) = map.get("properties") else {
            return Vec::new();
        };
        let props_ref = format!("{ref_}/properties");
        let Some(props) = self.object(value, &props_ref) else {
            return Vec::new();
        };
        props
            .iter()
            .filter_map(|(name, def)| {
                self.property(name, def, names, &format!("{props_ref}/{name}"))
            })
            .collect()
    }

    // ── Composites ───────────────────────────────────────────────────────

    fn class(&mut self, map: &Map<String, Value>, ref_: &str) -> Option<Class> {
        self.unexpected_keys(map, &[CLASS_KEYS], ref_);
        let name = self.required_string(map, "name", ref_)?;
        let mut cls = Class::new(name);
        if let Some(plural) = self.string(map, "plural", ref_) {
            cls.plural = plural;
        }
        cls.description = self.string(map, "description", ref_).unwrap_or_default();
        cls.id_pattern = self.pattern(map, "id_pattern", ref_);
        Some(cls)
    }

    fn embed(&mut self, map: &Map<String, Value>, ref_: &str) -> Option<Embed> {
        self.unexpected_keys(map, &[EMBED_KEYS], ref_);
        let name = self.required_string(map, "name", ref_)?;
        let mut embed = Embed::new(name);
        embed.description = self.string(map, "description", ref_).unwrap_or_default();
        Some(embed)
    }

    /// Object members of a `classes` / `embeds` array, with their refs.
    fn composites<'a>(
        &mut self,
        root: &'a Map<String, Value>,
        key: &str,
        ref_: &str,
    ) -> Vec<(String, &'a Map<String, Value>)> {
        let Some(value) = root.get(key) else {
            return Vec::new();
        };
        let list_ref = format!("{ref_}/{key}");
        let Some(items) = self.array(value, &list_ref) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let item_ref = format!("{list_ref}/{i}");
            if let Some(map) = self.object(item, &item_ref) {
                out.push((item_ref, map));
            }
        }
        out
    }
}

/// Parse and validate a schema given in its JSON form.
///
/// `ref_` prefixes every error location, e.g. `"#"` or `"schema.json#"`.
pub fn schema_from_json(value: &Value, ref_: &str) -> Result<Schema, SchemaErrors> {
    let mut p = Parser { errs: Vec::new() };

    let Some(root) = p.object(value, ref_) else {
        return Err(SchemaErrors(p.errs));
    };
    p.unexpected_keys(root, &[GRAPH_KEYS, GENERATOR_KEYS], ref_);

    let name = p.required_string(root, "name", ref_).unwrap_or_default();
    let description = p.string(root, "description", ref_).unwrap_or_default();

    // Declare composites first so that properties can refer to any of them.
    let class_maps = p.composites(root, "classes", ref_);
    let embed_maps = p.composites(root, "embeds", ref_);

    let mut classes = Vec::with_capacity(class_maps.len());
    let mut embeds = Vec::with_capacity(embed_maps.len());
    let mut names = Names {
        classes: HashMap::new(),
        embeds: HashMap::new(),
    };
    for (cls_ref, map) in &class_maps {
        if let Some(cls) = p.class(map, cls_ref) {
            names
                .classes
                .entry(cls.name.clone())
                .or_insert(ClassId(classes.len()));
            classes.push((cls, *map, cls_ref.as_str()));
        }
    }
    for (embed_ref, map) in &embed_maps {
        if let Some(embed) = p.embed(map, embed_ref) {
            names
                .embeds
                .entry(embed.name.clone())
                .or_insert(EmbedId(embeds.len()));
            embeds.push((embed, *map, embed_ref.as_str()));
        }
    }

    let properties = p.properties(root, &names, ref_);
    let classes: Vec<Class> = classes
        .into_iter()
        .map(|(mut cls, map, cls_ref)| {
            cls.properties = p.properties(map, &names, cls_ref);
            cls
        })
        .collect();
    let embeds: Vec<Embed> = embeds
        .into_iter()
        .map(|(mut embed, map, embed_ref)| {
            embed.properties = p.properties(map, &names, embed_ref);
            embed
        })
        .collect();

    if !p.errs.is_empty() {
        tracing::debug!(errors = p.errs.len(), "schema definition rejected");
        return Err(SchemaErrors(p.errs));
    }

    let schema = Schema {
        name,
        description,
        classes,
        embeds,
        properties,
    };
    let errs = validate_schema(&schema, ref_);
    if !errs.is_empty() {
        tracing::debug!(errors = errs.len(), "schema validation failed");
        return Err(SchemaErrors(errs));
    }

    tracing::debug!(
        graph = %schema.name,
        classes = schema.classes.len(),
        embeds = schema.embeds.len(),
        properties = schema.properties.len(),
        "schema parsed"
    );
    Ok(schema)
}
