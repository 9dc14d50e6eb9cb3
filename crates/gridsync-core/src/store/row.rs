use crate::key::{AttributeKey, ProductKey};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

///
/// EntityRef
///
/// A parsed relationship pointer: the target's wire type and canonical id.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityRef {
    pub kind: String,
    pub key: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }
}

///
/// Row
///
/// One product entity in the cache: a scalar field bag (nested or flat per
/// the session's access mode), the ordered attribute association list, the
/// row-local value overlay, and parsed relationship pointers.
///
/// The row-local overlay holds the most recently known value for this row's
/// attributes and takes priority over the shared overlay, so the grid
/// reflects an edit before any confirmation arrives.
///

#[derive(Clone, Debug)]
pub struct Row {
    key: ProductKey,
    fields: Value,
    attribute_ids: Vec<AttributeKey>,
    local_values: BTreeMap<AttributeKey, String>,
    relationships: BTreeMap<String, Vec<EntityRef>>,
}

impl Row {
    #[must_use]
    pub fn new(key: ProductKey, fields: Value) -> Self {
        Self {
            key,
            fields: if fields.is_object() {
                fields
            } else {
                Value::Object(Map::new())
            },
            attribute_ids: Vec::new(),
            local_values: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &ProductKey {
        &self.key
    }

    #[must_use]
    pub const fn fields(&self) -> &Value {
        &self.fields
    }

    pub const fn fields_mut(&mut self) -> &mut Value {
        &mut self.fields
    }

    // ======================================================================
    // Attribute associations
    // ======================================================================

    #[must_use]
    pub fn attribute_ids(&self) -> &[AttributeKey] {
        &self.attribute_ids
    }

    pub fn set_attribute_ids(&mut self, ids: Vec<AttributeKey>) {
        self.attribute_ids = ids;
    }

    #[must_use]
    pub fn has_attribute(&self, attribute: &AttributeKey) -> bool {
        self.attribute_ids.contains(attribute)
    }

    // ======================================================================
    // Row-local value overlay
    // ======================================================================

    #[must_use]
    pub fn local_value(&self, attribute: &AttributeKey) -> Option<&str> {
        self.local_values.get(attribute).map(String::as_str)
    }

    pub fn set_local_value(&mut self, attribute: AttributeKey, value: impl Into<String>) {
        self.local_values.insert(attribute, value.into());
    }

    /// Remove a row-local entry; no-op when absent.
    pub fn clear_local_value(&mut self, attribute: &AttributeKey) {
        self.local_values.remove(attribute);
    }

    // ======================================================================
    // Relationship pointers
    // ======================================================================

    #[must_use]
    pub fn relationship(&self, field: &str) -> &[EntityRef] {
        self.relationships
            .get(field)
            .map_or(&[], Vec::as_slice)
    }

    pub fn set_relationship(&mut self, field: impl Into<String>, refs: Vec<EntityRef>) {
        self.relationships.insert(field.into(), refs);
    }
}

///
/// TESTS
///
