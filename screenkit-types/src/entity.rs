use crate::value::{Value, ValueMap};

/// A record returned by the entity layer: an entity name plus its field values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityValue {
    entity_name: String,
    fields: ValueMap,
}

impl EntityValue {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            fields: ValueMap::new(),
        }
    }

    pub fn from_fields(entity_name: impl Into<String>, fields: ValueMap) -> Self {
        Self {
            entity_name: entity_name.into(),
            fields,
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    pub fn into_fields(self) -> ValueMap {
        self.fields
    }
}
