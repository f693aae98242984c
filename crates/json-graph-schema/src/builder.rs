//! Programmatic schema construction.

use crate::error::SchemaErrors;
use crate::types::{Class, ClassId, Embed, EmbedId, Pattern, Property, Schema};
use crate::validate::validate_schema;

/// Builds a [`Schema`] step by step.
///
/// Classes and embeds are declared first so that properties can refer to
/// them (including to a class that is declared later, or to itself).
///
/// ```
/// use json_graph_schema::{Property, SchemaBuilder, Type};
///
/// let mut b = SchemaBuilder::new("Some_graph");
/// let empty = b.class("Empty");
/// b.property(Property::new("global_reference_to_an_empty", Type::ClassRef(empty)));
/// let schema = b.build().unwrap();
/// assert_eq!(schema.class(empty).registry_key(), "empties");
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema {
                name: name.into(),
                description: String::new(),
                classes: Vec::new(),
                embeds: Vec::new(),
                properties: Vec::new(),
            },
        }
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.schema.description = description.into();
        self
    }

    /// Declare a class with the default plural and no ID pattern.
    pub fn class(&mut self, name: impl Into<String>) -> ClassId {
        self.add_class(Class::new(name))
    }

    pub fn add_class(&mut self, class: Class) -> ClassId {
        self.schema.classes.push(class);
        ClassId(self.schema.classes.len() - 1)
    }

    pub fn embed(&mut self, name: impl Into<String>) -> EmbedId {
        self.add_embed(Embed::new(name))
    }

    pub fn add_embed(&mut self, embed: Embed) -> EmbedId {
        self.schema.embeds.push(embed);
        EmbedId(self.schema.embeds.len() - 1)
    }

    pub fn id_pattern(&mut self, class: ClassId, pattern: Pattern) -> &mut Self {
        self.schema.classes[class.0].id_pattern = Some(pattern);
        self
    }

    pub fn plural(&mut self, class: ClassId, plural: impl Into<String>) -> &mut Self {
        self.schema.classes[class.0].plural = plural.into();
        self
    }

    pub fn class_property(&mut self, class: ClassId, property: Property) -> &mut Self {
        self.schema.classes[class.0].properties.push(property);
        self
    }

    pub fn embed_property(&mut self, embed: EmbedId, property: Property) -> &mut Self {
        self.schema.embeds[embed.0].properties.push(property);
        self
    }

    /// Add a property of the graph itself.
    pub fn property(&mut self, property: Property) -> &mut Self {
        self.schema.properties.push(property);
        self
    }

    /// Validate and return the schema.
    pub fn build(self) -> Result<Schema, SchemaErrors> {
        let errors = validate_schema(&self.schema, "#");
        if errors.is_empty() {
            Ok(self.schema)
        } else {
            Err(SchemaErrors(errors))
        }
    }
}
