//! Schema data model: graph, classes, embeds, properties and value types.

use std::fmt;

use json_graph_temporal::{StrftimeFormat, TemporalKind};
use regex::Regex;

use crate::naming;

/// Index of a class inside [`Schema::classes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

/// Index of an embed inside [`Schema::embeds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmbedId(pub usize);

/// A regular expression that has to match a whole string.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { source, regex })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Bounds on an integer value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntegerType {
    pub minimum: Option<i64>,
    pub exclusive_minimum: bool,
    pub maximum: Option<i64>,
    pub exclusive_maximum: bool,
}

/// Bounds on a floating-point value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatType {
    pub minimum: Option<f64>,
    pub exclusive_minimum: bool,
    pub maximum: Option<f64>,
    pub exclusive_maximum: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub values: Box<Type>,
    pub minimum_size: Option<usize>,
    pub maximum_size: Option<usize>,
}

/// Type of a property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Boolean,
    Integer(IntegerType),
    Float(FloatType),
    String(Option<Pattern>),
    Path(Option<Pattern>),
    Date(StrftimeFormat),
    Time(StrftimeFormat),
    Datetime(StrftimeFormat),
    TimeZone,
    Duration,
    Array(ArrayType),
    Map(Box<Type>),
    ClassRef(ClassId),
    Embed(EmbedId),
}

impl Type {
    pub fn integer() -> Self {
        Self::Integer(IntegerType::default())
    }

    pub fn float() -> Self {
        Self::Float(FloatType::default())
    }

    pub fn string() -> Self {
        Self::String(None)
    }

    pub fn path() -> Self {
        Self::Path(None)
    }

    pub fn date() -> Self {
        Self::Date(StrftimeFormat::default_for(TemporalKind::Date))
    }

    pub fn time() -> Self {
        Self::Time(StrftimeFormat::default_for(TemporalKind::Time))
    }

    pub fn datetime() -> Self {
        Self::Datetime(StrftimeFormat::default_for(TemporalKind::Datetime))
    }

    pub fn array(values: Type) -> Self {
        Self::Array(ArrayType {
            values: Box::new(values),
            minimum_size: None,
            maximum_size: None,
        })
    }

    pub fn map(values: Type) -> Self {
        Self::Map(Box::new(values))
    }

    /// Name used for the type in the JSON form of a schema.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Path(_) => "path",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Datetime(_) => "datetime",
            Self::TimeZone => "time_zone",
            Self::Duration => "duration",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::ClassRef(_) => "class reference",
            Self::Embed(_) => "embed",
        }
    }
}

/// A named, typed member of a class, an embed or the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    /// Member key in the JSON tree.
    pub json: String,
    pub description: String,
    pub optional: bool,
    pub type_: Type,
}

impl Property {
    pub fn new(name: impl Into<String>, type_: Type) -> Self {
        let name = name.into();
        Self {
            json: name.clone(),
            name,
            description: String::new(),
            optional: false,
            type_,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_json(mut self, json: impl Into<String>) -> Self {
        self.json = json.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An identified structure whose instances live in a registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub plural: String,
    pub description: String,
    pub id_pattern: Option<Pattern>,
    pub properties: Vec<Property>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            plural: naming::plural(&name),
            name,
            description: String::new(),
            id_pattern: None,
            properties: Vec::new(),
        }
    }

    /// Member key of the class registry in the graph's JSON object.
    pub fn registry_key(&self) -> String {
        naming::json_plural(&self.plural)
    }
}

/// A nested structure without identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub name: String,
    pub description: String,
    pub properties: Vec<Property>,
}

impl Embed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            properties: Vec::new(),
        }
    }
}

/// Definition of an object graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub description: String,
    pub classes: Vec<Class>,
    pub embeds: Vec<Embed>,
    pub properties: Vec<Property>,
}

impl Schema {
    /// # Panics
    ///
    /// Panics if `id` does not come from this schema.
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` does not come from this schema.
    pub fn embed(&self, id: EmbedId) -> &Embed {
        &self.embeds[id.0]
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.classes.iter().position(|c| c.name == name).map(ClassId)
    }

    pub fn embed_id(&self, name: &str) -> Option<EmbedId> {
        self.embeds.iter().position(|e| e.name == name).map(EmbedId)
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_matches_whole_string() {
        let p = Pattern::new("[a-z]+").unwrap();
        assert!(p.is_match("abc"));
        assert!(!p.is_match("abc1"));
        assert!(!p.is_match("1abc"));
        assert_eq!(p.to_string(), "[a-z]+");
    }

    #[test]
    fn pattern_with_alternation_is_anchored_as_a_group() {
        let p = Pattern::new("a|b").unwrap();
        assert!(p.is_match("a"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn class_registry_key_follows_plural() {
        assert_eq!(Class::new("Empty").registry_key(), "empties");
        let mut cls = Class::new("Person");
        cls.plural = "People".into();
        assert_eq!(cls.registry_key(), "people");
    }

    #[test]
    fn property_defaults() {
        let p = Property::new("some_int", Type::integer());
        assert_eq!(p.json, "some_int");
        assert!(!p.optional);
        let p = p.optional().with_json("someInt");
        assert!(p.optional);
        assert_eq!(p.json, "someInt");
    }
}
