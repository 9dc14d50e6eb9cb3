mod attribute;
#[cfg(test)]
mod property;
mod relation;
mod row;

pub use attribute::{AttributeDefinition, DisplayValue, InputKind};
pub use relation::RelatedEntity;
pub use row::{EntityRef, Row};

use crate::{
    access::AccessMode,
    error::InternalError,
    key::{AttributeKey, ProductKey},
    wire::{self, IncludedEntity, Pagination, ProductPage},
};
use serde_json::Value;

///
/// CacheStore
///
/// The in-memory denormalized dataset for one grid page: product rows in
/// page order, the shared attribute definitions with their per-row value
/// overlays, and the related-entity side table.
///
/// Every mutation is scoped to a `(attribute, row)` pair or a single row;
/// a shared definition is never swapped wholesale. That scoping is what
/// lets an in-flight edit and a push event interleave in any order without
/// corrupting sibling rows.
///
/// All lookups are total; the store only errs on structurally invalid
/// input, which signals a collaborator contract violation.
///

#[derive(Debug)]
pub struct CacheStore {
    mode: AccessMode,
    rows: Vec<Row>,
    attributes: Vec<AttributeDefinition>,
    related: Vec<RelatedEntity>,
    pagination: Pagination,
}

impl CacheStore {
    #[must_use]
    pub const fn new(mode: AccessMode) -> Self {
        Self {
            mode,
            rows: Vec::new(),
            attributes: Vec::new(),
            related: Vec::new(),
            pagination: Pagination {
                page: 0,
                per_page: 0,
                total: 0,
                total_pages: 0,
            },
        }
    }

    #[must_use]
    pub const fn mode(&self) -> AccessMode {
        self.mode
    }

    #[must_use]
    pub const fn pagination(&self) -> Pagination {
        self.pagination
    }

    // ======================================================================
    // Dataset lifecycle
    // ======================================================================

    /// Full replace from a page fetch: clears rows, definitions, overlays
    /// and the side table, then rebuilds from scratch.
    pub fn replace_dataset(&mut self, page: ProductPage) -> Result<(), InternalError> {
        let mut attributes: Vec<AttributeDefinition> = Vec::new();
        let mut related = Vec::new();

        for entry in &page.included {
            match wire::parse_included(entry) {
                Some(IncludedEntity::Attribute(parsed)) => {
                    // The side channel may repeat a definition across rows;
                    // definitions are shared, never duplicated.
                    if let Some(existing) = attributes.iter_mut().find(|a| a.key() == parsed.key())
                    {
                        existing.enrich(&parsed);
                        existing.merge_values(&parsed);
                    } else {
                        attributes.push(parsed);
                    }
                }
                Some(IncludedEntity::Related(entity)) => related.push(entity),
                None => {}
            }
        }

        let mut rows = Vec::with_capacity(page.data.len());
        let mut seeds = Vec::new();
        for entry in &page.data {
            let parsed = wire::parse_row(entry)?;
            seeds.push((parsed.row.key().clone(), parsed.attribute_values));
            rows.push(parsed.row);
        }

        self.rows = rows;
        self.attributes = attributes;
        self.related = related;
        self.pagination = page.meta.pagination;

        for (row_key, values) in seeds {
            for (attribute, value) in values {
                self.upsert_attribute_value(&attribute, &row_key, &value);
                if let Some(row) = self.row_mut(&row_key) {
                    row.set_local_value(attribute, value);
                }
            }
        }

        Ok(())
    }

    // ======================================================================
    // Row access
    // ======================================================================

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row(&self, key: &ProductKey) -> Option<&Row> {
        self.rows.iter().find(|row| row.key() == key)
    }

    pub fn row_mut(&mut self, key: &ProductKey) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.key() == key)
    }

    /// Page-order position of a row; paste anchoring is positional.
    #[must_use]
    pub fn row_index(&self, key: &ProductKey) -> Option<usize> {
        self.rows.iter().position(|row| row.key() == key)
    }

    /// Remove a row; total, `None` when the row is not loaded locally.
    pub fn remove_row(&mut self, key: &ProductKey) -> Option<Row> {
        let index = self.row_index(key)?;
        Some(self.rows.remove(index))
    }

    /// Read a scalar field through the session's access mode.
    #[must_use]
    pub fn field(&self, key: &ProductKey, field: &str) -> Option<Value> {
        let row = self.row(key)?;
        self.mode.get_value(row.fields(), field).cloned()
    }

    /// Write a scalar field through the session's access mode.
    /// Returns `false` when the row is not loaded locally.
    pub fn set_field(&mut self, key: &ProductKey, field: &str, value: Value) -> bool {
        let mode = self.mode;
        match self.row_mut(key) {
            Some(row) => {
                mode.set_value(row.fields_mut(), field, value);
                true
            }
            None => false,
        }
    }

    // ======================================================================
    // Attribute definitions and the shared overlay
    // ======================================================================

    #[must_use]
    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, key: &AttributeKey) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|attr| attr.key() == key)
    }

    fn attribute_mut(&mut self, key: &AttributeKey) -> Option<&mut AttributeDefinition> {
        self.attributes.iter_mut().find(|attr| attr.key() == key)
    }

    /// Write one row's value into a definition's overlay.
    ///
    /// A missing definition gets a minimal placeholder carrying only the
    /// overlay, so a later full fetch can enrich it in place. The
    /// definition object is never replaced; only its row-keyed entry moves.
    pub fn upsert_attribute_value(
        &mut self,
        attribute: &AttributeKey,
        row: &ProductKey,
        value: &str,
    ) {
        if let Some(existing) = self.attribute_mut(attribute) {
            existing.set_value(row.clone(), value);
            return;
        }
        let mut placeholder = AttributeDefinition::placeholder(attribute.clone());
        placeholder.set_value(row.clone(), value);
        self.attributes.push(placeholder);
    }

    /// Merge a freshly fetched definition: enrich the existing object and
    /// fold in its overlay entries key by key. Sibling rows' entries are
    /// untouched by construction.
    pub fn merge_attribute_definition(&mut self, incoming: &AttributeDefinition) {
        if let Some(existing) = self.attribute_mut(incoming.key()) {
            existing.enrich(incoming);
            existing.merge_values(incoming);
            return;
        }
        self.attributes.push(incoming.clone());
    }

    /// Clear one row's overlay entry when the attribute is no longer in the
    /// row's association list. Represents "attribute detached from this
    /// row" without touching any other row's entry.
    pub fn clear_attribute_value_if_absent(
        &mut self,
        attribute: &AttributeKey,
        row: &ProductKey,
        present: &[AttributeKey],
    ) {
        if present.contains(attribute) {
            return;
        }
        if let Some(existing) = self.attribute_mut(attribute) {
            existing.clear_value(row);
        }
    }

    /// Display resolution order: row-local overlay, association check,
    /// shared overlay, unset sentinel.
    #[must_use]
    pub fn resolve_display_value(&self, row: &Row, attribute: &AttributeKey) -> DisplayValue {
        if let Some(local) = row.local_value(attribute) {
            return DisplayValue::Text(local.to_string());
        }
        if !row.has_attribute(attribute) {
            return DisplayValue::Unset;
        }
        self.attribute(attribute)
            .and_then(|attr| attr.value(row.key()))
            .map_or(DisplayValue::Unset, |value| {
                DisplayValue::Text(value.to_string())
            })
    }

    // ======================================================================
    // Row-local overlay
    // ======================================================================

    pub fn upsert_local_value(&mut self, key: &ProductKey, attribute: AttributeKey, value: &str) {
        if let Some(row) = self.row_mut(key) {
            row.set_local_value(attribute, value);
        }
    }

    pub fn clear_local_value(&mut self, key: &ProductKey, attribute: &AttributeKey) {
        if let Some(row) = self.row_mut(key) {
            row.clear_local_value(attribute);
        }
    }

    // ======================================================================
    // Related-entity side table
    // ======================================================================

    #[must_use]
    pub fn related_entities(&self) -> &[RelatedEntity] {
        &self.related
    }

    /// Look up the relation target for `(row, kind, relation_field)` by
    /// scanning the side table for the row's first pointer of that field.
    /// Total: `None` when the pointer or the entity is absent.
    #[must_use]
    pub fn related_entity(
        &self,
        row: &Row,
        kind: &str,
        relation_field: &str,
    ) -> Option<&RelatedEntity> {
        let pointer = row.relationship(relation_field).first()?;
        self.related
            .iter()
            .find(|entity| entity.matches(kind, &pointer.key))
    }

    /// Find a related entity by kind and id, independent of any row.
    #[must_use]
    pub fn related_by_key(&self, kind: &str, key: &str) -> Option<&RelatedEntity> {
        self.related.iter().find(|entity| entity.matches(kind, key))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded_store() -> CacheStore {
        let mut store = CacheStore::new(AccessMode::Flat);
        let page = ProductPage::from_value(json!({
            "data": [
                {
                    "id": "7",
                    "name": "Widget",
                    "relationships": {
                        "attributes": { "data": [
                            { "type": "attribute", "id": 3 },
                            { "type": "attribute", "id": 4 }
                        ] },
                        "category": { "data": { "type": "category", "id": "12" } }
                    },
                    "attribute_values": { "3": "X" }
                },
                {
                    "id": 8,
                    "name": "Gadget",
                    "relationships": {
                        "attributes": { "data": [ { "type": "attribute", "id": 3 } ] }
                    },
                    "attribute_values": { "3": "X" }
                }
            ],
            "included": [
                {
                    "type": "attribute",
                    "id": 3,
                    "attributes": {
                        "name": "Color", "code": "color",
                        "input_kind": "select", "options": ["Red", "Blue"],
                        "group_name": "General"
                    }
                },
                {
                    "type": "attribute",
                    "id": 4,
                    "attributes": { "name": "Note", "code": "note", "input_kind": "text" }
                },
                { "type": "category", "id": "12", "attributes": { "name": "Shoes" } }
            ],
            "meta": { "pagination": { "page": 1, "per_page": 25, "total": 2, "total_pages": 1 } }
        }))
        .unwrap();
        store.replace_dataset(page).unwrap();
        store
    }

    #[test]
    fn replace_dataset_rebuilds_rows_attributes_and_pagination() {
        let store = loaded_store();
        assert_eq!(store.len(), 2);
        assert_eq!(store.attributes().len(), 2);
        assert_eq!(store.pagination().total, 2);
        assert_eq!(
            store.field(&ProductKey::from("7"), "name"),
            Some(json!("Widget"))
        );
    }

    #[test]
    fn overlay_isolation_between_rows() {
        let mut store = loaded_store();
        let attr = AttributeKey::from("3");
        let row7 = ProductKey::from("7");
        let row8 = ProductKey::from("8");

        store.upsert_attribute_value(&attr, &row7, "Y");

        let definition = store.attribute(&attr).unwrap();
        assert_eq!(definition.value(&row7), Some("Y"));
        assert_eq!(definition.value(&row8), Some("X"));
    }

    #[test]
    fn upsert_for_unknown_attribute_creates_placeholder() {
        let mut store = loaded_store();
        let attr = AttributeKey::from("99");
        store.upsert_attribute_value(&attr, &ProductKey::from("7"), "late");

        let definition = store.attribute(&attr).unwrap();
        assert!(definition.is_placeholder());
        assert_eq!(definition.value(&ProductKey::from("7")), Some("late"));
    }

    #[test]
    fn merge_definition_enriches_placeholder_in_place() {
        let mut store = loaded_store();
        let attr = AttributeKey::from("99");
        store.upsert_attribute_value(&attr, &ProductKey::from("7"), "late");

        let full = AttributeDefinition::new(
            attr.clone(),
            "Weight",
            "weight",
            InputKind::FreeText,
            Vec::new(),
            "Shipping",
        );
        store.merge_attribute_definition(&full);

        let merged = store.attribute(&attr).unwrap();
        assert!(!merged.is_placeholder());
        assert_eq!(merged.name, "Weight");
        assert_eq!(merged.value(&ProductKey::from("7")), Some("late"));
    }

    #[test]
    fn clear_if_absent_only_touches_detached_rows_entry() {
        let mut store = loaded_store();
        let attr = AttributeKey::from("3");
        let row7 = ProductKey::from("7");
        let row8 = ProductKey::from("8");

        // Row 7's new association list no longer carries attribute 3.
        store.clear_attribute_value_if_absent(&attr, &row7, &[AttributeKey::from("4")]);

        let definition = store.attribute(&attr).unwrap();
        assert_eq!(definition.value(&row7), None);
        assert_eq!(definition.value(&row8), Some("X"));

        // Still present in the list: nothing is cleared.
        store.clear_attribute_value_if_absent(&attr, &row8, &[attr.clone()]);
        assert_eq!(store.attribute(&attr).unwrap().value(&row8), Some("X"));
    }

    #[test]
    fn display_resolution_prefers_local_then_shared_then_unset() {
        let mut store = loaded_store();
        let attr = AttributeKey::from("3");
        let row7 = ProductKey::from("7");

        // Seeded locally and shared from page load.
        let row = store.row(&row7).unwrap();
        assert_eq!(
            store.resolve_display_value(row, &attr),
            DisplayValue::Text("X".into())
        );

        // Without the local entry the shared overlay answers.
        store.clear_local_value(&row7, &attr);
        store.upsert_attribute_value(&attr, &row7, "shared");
        let row = store.row(&row7).unwrap();
        assert_eq!(
            store.resolve_display_value(row, &attr),
            DisplayValue::Text("shared".into())
        );

        // Unassociated attribute resolves to the sentinel even with a
        // stale shared entry present.
        store.clear_local_value(&row7, &AttributeKey::from("5"));
        let row = store.row(&row7).unwrap();
        assert!(
            store
                .resolve_display_value(row, &AttributeKey::from("5"))
                .is_unset()
        );
    }

    #[test]
    fn related_entity_lookup_follows_the_rows_pointer() {
        let store = loaded_store();
        let row = store.row(&ProductKey::from("7")).unwrap();

        let related = store.related_entity(row, "category", "category").unwrap();
        assert_eq!(related.name, "Shoes");

        assert!(store.related_entity(row, "brand", "brand").is_none());
        let row8 = store.row(&ProductKey::from("8")).unwrap();
        assert!(store.related_entity(row8, "category", "category").is_none());
    }

    #[test]
    fn remove_row_is_total() {
        let mut store = loaded_store();
        assert!(store.remove_row(&ProductKey::from("8")).is_some());
        assert!(store.remove_row(&ProductKey::from("8")).is_none());
        assert_eq!(store.len(), 1);
    }
}
