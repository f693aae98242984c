//! Typed object graph: one registry per class plus the graph's own fields.
//!
//! Instances are owned by their registry; references between instances are
//! [`InstanceRef`] handles (class and position in the registry), never
//! pointers, so cycles need no special treatment.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use json_graph_schema::{ClassId, Schema};
use json_graph_temporal::Duration;

/// Non-owning handle to an instance in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceRef {
    class: ClassId,
    index: usize,
}

impl InstanceRef {
    pub fn new(class: ClassId, index: usize) -> Self {
        Self { class, index }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Position of the instance in its registry.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Property values keyed by property name, in schema order.
pub type Fields = IndexMap<String, FieldValue>;

/// Decoded value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Path(PathBuf),
    Date(NaiveDate),
    Time(NaiveTime),
    Datetime(NaiveDateTime),
    /// Datetime read with a `%z` pattern.
    OffsetDatetime(DateTime<FixedOffset>),
    /// IANA identifier, e.g. `Europe/Zurich`.
    TimeZone(String),
    Duration(Duration),
    Array(Vec<FieldValue>),
    Map(IndexMap<String, FieldValue>),
    Ref(InstanceRef),
    Embed(Fields),
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Text of a string or time zone value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::TimeZone(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<InstanceRef> {
        match self {
            Self::Ref(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_embed(&self) -> Option<&Fields> {
        match self {
            Self::Embed(fields) => Some(fields),
            _ => None,
        }
    }
}

/// An identified instance of a class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instance {
    id: String,
    pub fields: Fields,
}

impl Instance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Fields::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Instances of one class keyed by ID, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    class: ClassId,
    instances: IndexMap<String, Instance>,
}

impl Registry {
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            instances: IndexMap::new(),
        }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Add an instance without fields under `id`, keeping the existing one
    /// if the ID is already taken.
    pub fn allocate(&mut self, id: &str) -> InstanceRef {
        let entry = self.instances.entry(id.to_string());
        let index = entry.index();
        entry.or_insert_with(|| Instance::new(id));
        InstanceRef::new(self.class, index)
    }

    /// Store `instance` under `key`, replacing any instance with that key in
    /// place.
    ///
    /// The key is expected to equal the instance's ID; the serializer rejects
    /// a registry where it does not.
    pub fn insert(&mut self, key: impl Into<String>, instance: Instance) -> InstanceRef {
        let (index, _) = self.instances.insert_full(key.into(), instance);
        InstanceRef::new(self.class, index)
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.instances.get_index_of(id)
    }

    pub fn get(&self, id: &str) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.instances.get_mut(id)
    }

    /// Key and instance at a registry position.
    pub fn get_index(&self, index: usize) -> Option<(&str, &Instance)> {
        self.instances
            .get_index(index)
            .map(|(key, instance)| (key.as_str(), instance))
    }

    pub(crate) fn get_index_mut(&mut self, index: usize) -> Option<&mut Instance> {
        self.instances
            .get_index_mut(index)
            .map(|(_, instance)| instance)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.instances
            .iter()
            .map(|(key, instance)| (key.as_str(), instance))
    }
}

/// Root aggregate produced by the loader and consumed by the serializer.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGraph {
    registries: Vec<Registry>,
    /// Properties of the graph itself.
    pub fields: Fields,
}

impl ObjectGraph {
    /// An empty graph with one registry per class of `schema`.
    pub fn new(schema: &Schema) -> Self {
        Self {
            registries: schema.class_ids().map(Registry::new).collect(),
            fields: Fields::new(),
        }
    }

    pub fn registries(&self) -> &[Registry] {
        &self.registries
    }

    /// # Panics
    ///
    /// Panics if `class` does not belong to the schema the graph was made for.
    pub fn registry(&self, class: ClassId) -> &Registry {
        &self.registries[class.0]
    }

    /// # Panics
    ///
    /// Panics if `class` does not belong to the schema the graph was made for.
    pub fn registry_mut(&mut self, class: ClassId) -> &mut Registry {
        &mut self.registries[class.0]
    }
}
