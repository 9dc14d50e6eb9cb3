use crate::{
    backend::{AttributeUpdateResponse, BackendError, FieldUpdateResponse},
    projection::{AttributeBinding, SELECT_PLACEHOLDER},
    sink::{Severity, UiEvent, UiSink},
};
use gridsync_core::{
    key::{AttributeKey, ProductKey},
    store::{CacheStore, DisplayValue},
    wire::{self, IncludedEntity},
};
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// Delimiter for serialized relationship id lists.
const ID_LIST_DELIMITER: char = ',';

///
/// EditTarget
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum EditTarget {
    Field(String),
    Attribute(AttributeKey),
    Relation(String),
}

impl EditTarget {
    /// Column identifier used for redraw marks.
    #[must_use]
    pub fn column(&self) -> String {
        match self {
            Self::Field(field) | Self::Relation(field) => field.clone(),
            Self::Attribute(attribute) => attribute.to_string(),
        }
    }
}

///
/// PendingEdit
///
/// Transient record of one in-flight optimistic edit: what was there
/// before, and what was submitted. Exists only between the optimistic
/// write and the backend's response; always cleared on commit or rollback.
///

#[derive(Clone, Debug)]
pub struct PendingEdit {
    /// Value before the edit; `None` when the target had no value.
    pub prior: Option<Value>,
    /// The optimistically applied value.
    pub submitted: Value,
}

///
/// EditOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EditOutcome {
    /// New value equals the old value; the backend was never called.
    Noop,
    Committed,
    RolledBack,
}

///
/// EditPipeline
///
/// Per-cell optimistic edit state machine: `Idle → Pending → {Committed |
/// RolledBack}`. Edits to distinct `(row, target)` pairs are independent;
/// a second edit to the same pair supersedes the first instead of queueing.
///
/// Known limitation, preserved deliberately: a superseded edit's response
/// is still applied when it arrives, so out-of-order responses can land
/// stale data over newer optimistic input (last network response wins).
///

#[derive(Debug, Default)]
pub struct EditPipeline {
    pending: BTreeMap<(ProductKey, EditTarget), PendingEdit>,
}

impl EditPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending_edit(&self, row: &ProductKey, target: &EditTarget) -> Option<&PendingEdit> {
        self.pending.get(&(row.clone(), target.clone()))
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    // ======================================================================
    // Idle -> Pending
    // ======================================================================

    /// Begin a plain-field edit: optimistic write plus a pending record.
    /// Returns `false` without touching anything when the value is
    /// unchanged or the row is not loaded.
    pub fn begin_field(
        &mut self,
        store: &mut CacheStore,
        row: &ProductKey,
        field: &str,
        new_value: Value,
    ) -> bool {
        let prior = store.field(row, field);
        if store.row(row).is_none() || prior.as_ref() == Some(&new_value) {
            return false;
        }

        debug!("edit begin: row={row} field={field}");
        store.set_field(row, field, new_value.clone());
        self.record(
            row,
            EditTarget::Field(field.to_string()),
            prior,
            new_value,
        );
        true
    }

    /// Begin an attribute edit through the column binding's `apply_edit`.
    /// Returns the committed value to submit, or `None` for a no-op.
    pub fn begin_attribute(
        &mut self,
        store: &mut CacheStore,
        binding: &AttributeBinding,
        row: &ProductKey,
        raw: &str,
    ) -> Option<String> {
        let row_ref = store.row(row)?;
        let prior = row_ref
            .local_value(binding.attribute())
            .map(|v| Value::String(v.to_string()));

        // Compare in committed form: the unset sentinel and the clear
        // placeholder both normalize to the empty value.
        let current = match store.resolve_display_value(row_ref, binding.attribute()) {
            DisplayValue::Text(value) => value,
            DisplayValue::Unset => String::new(),
        };
        let incoming = if raw == SELECT_PLACEHOLDER { "" } else { raw };
        if incoming == current {
            return None;
        }

        let committed = binding.apply_edit(store, row, raw);
        debug!("edit begin: row={row} attribute={}", binding.attribute());
        self.record(
            row,
            EditTarget::Attribute(binding.attribute().clone()),
            prior,
            Value::String(committed.clone()),
        );
        Some(committed)
    }

    /// Begin a relationship edit. The new value is a delimited id list; an
    /// unchanged id set is a no-op even when the serialized ordering
    /// differs. Returns the parsed id list to submit.
    pub fn begin_relation(
        &mut self,
        store: &mut CacheStore,
        row: &ProductKey,
        field: &str,
        new_value: &str,
    ) -> Option<Vec<String>> {
        store.row(row)?;
        let prior = store.field(row, field);
        let old_ids = prior
            .as_ref()
            .and_then(Value::as_str)
            .map(parse_id_list)
            .unwrap_or_default();
        let new_ids = parse_id_list(new_value);

        if id_sets_equal(&old_ids, &new_ids) {
            return None;
        }

        debug!("edit begin: row={row} relation={field}");
        store.set_field(row, field, Value::String(new_value.to_string()));
        self.record(
            row,
            EditTarget::Relation(field.to_string()),
            prior,
            Value::String(new_value.to_string()),
        );
        Some(new_ids)
    }

    // ======================================================================
    // Pending -> Committed
    // ======================================================================

    /// Merge an authoritative field-update response. Every key of the
    /// response's bag is written through the accessor; included attribute
    /// payloads are folded into the shared overlay.
    pub fn commit_field(
        &mut self,
        store: &mut CacheStore,
        sink: &dyn UiSink,
        row: &ProductKey,
        field: &str,
        response: &FieldUpdateResponse,
    ) {
        let target = EditTarget::Field(field.to_string());
        self.pending.remove(&(row.clone(), target.clone()));

        for (key, value) in &response.data {
            store.set_field(row, key, value.clone());
        }
        merge_included(store, &response.included);

        sink.emit(UiEvent::RedrawCell {
            row: row.clone(),
            column: target.column(),
        });
    }

    /// Merge an authoritative attribute-update response, using the saved
    /// value the backend reports rather than the submitted one.
    pub fn commit_attribute(
        &mut self,
        store: &mut CacheStore,
        sink: &dyn UiSink,
        row: &ProductKey,
        attribute: &AttributeKey,
        response: &AttributeUpdateResponse,
    ) {
        let target = EditTarget::Attribute(attribute.clone());
        self.pending.remove(&(row.clone(), target.clone()));

        store.upsert_attribute_value(attribute, row, &response.value);
        store.upsert_local_value(row, attribute.clone(), &response.value);

        if let Some(relationships) = &response.relationships {
            let parsed = wire::parse_relationships(relationships);
            let ids = wire::attribute_ids(&parsed);
            if let Some(row_mut) = store.row_mut(row)
                && !ids.is_empty()
            {
                row_mut.set_attribute_ids(ids);
            }
        }
        merge_included(store, &response.included);

        sink.emit(UiEvent::RedrawCell {
            row: row.clone(),
            column: target.column(),
        });
    }

    /// Commit a relationship edit: apply the response bag, then re-derive
    /// the human-readable grouped label from the side table instead of
    /// trusting the raw backend echo.
    pub fn commit_relation(
        &mut self,
        store: &mut CacheStore,
        sink: &dyn UiSink,
        row: &ProductKey,
        field: &str,
        kind: &str,
        ids: &[String],
        response: &FieldUpdateResponse,
    ) {
        let target = EditTarget::Relation(field.to_string());
        self.pending.remove(&(row.clone(), target.clone()));

        for (key, value) in &response.data {
            store.set_field(row, key, value.clone());
        }
        merge_included(store, &response.included);

        let label = grouped_label(store, kind, ids);
        store.set_field(row, &format!("{field}_label"), Value::String(label));

        sink.emit(UiEvent::RedrawCell {
            row: row.clone(),
            column: target.column(),
        });
    }

    // ======================================================================
    // Pending -> RolledBack
    // ======================================================================

    /// Restore the pre-edit value after a failed backend call and surface
    /// the failure. Only this one cell is affected; other pending edits
    /// and the rest of the cache are untouched.
    pub fn rollback(
        &mut self,
        store: &mut CacheStore,
        sink: &dyn UiSink,
        row: &ProductKey,
        target: &EditTarget,
        error: &BackendError,
    ) {
        warn!("edit rollback: row={row} column={} ({error})", target.column());

        if let Some(pending) = self.pending.remove(&(row.clone(), target.clone())) {
            match target {
                EditTarget::Field(field) | EditTarget::Relation(field) => {
                    let restored = pending.prior.unwrap_or(Value::Null);
                    store.set_field(row, field, restored);
                }
                EditTarget::Attribute(attribute) => match pending.prior {
                    Some(Value::String(prior)) => {
                        store.upsert_local_value(row, attribute.clone(), &prior);
                    }
                    _ => store.clear_local_value(row, attribute),
                },
            }
        }

        sink.emit(UiEvent::Notify {
            severity: Severity::Warning,
            message: error.message.clone(),
        });
        sink.emit(UiEvent::RedrawCell {
            row: row.clone(),
            column: target.column(),
        });
    }

    fn record(
        &mut self,
        row: &ProductKey,
        target: EditTarget,
        prior: Option<Value>,
        submitted: Value,
    ) {
        // A second edit before the first resolves supersedes it; no queue.
        self.pending
            .insert((row.clone(), target), PendingEdit { prior, submitted });
    }
}

/// Parse a delimited identifier list, dropping empty segments.
#[must_use]
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(ID_LIST_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn id_sets_equal(a: &[String], b: &[String]) -> bool {
    use std::collections::BTreeSet;
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

/// Derive a grouped display label for a selected id set: children listed
/// under their parent's name, top-level entities by name, unknown ids kept
/// verbatim so nothing silently disappears.
#[must_use]
pub fn grouped_label(store: &CacheStore, kind: &str, ids: &[String]) -> String {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut top_level: Vec<String> = Vec::new();

    for id in ids {
        match store.related_by_key(kind, id) {
            Some(entity) => {
                let parent_name = entity
                    .parent
                    .as_deref()
                    .and_then(|p| store.related_by_key(kind, p))
                    .map(|p| p.name.clone());
                match parent_name {
                    Some(parent) => groups.entry(parent).or_default().push(entity.name.clone()),
                    None => top_level.push(entity.name.clone()),
                }
            }
            None => top_level.push(id.clone()),
        }
    }

    let mut parts = top_level;
    for (parent, children) in groups {
        parts.push(format!("{parent}: {}", children.join(", ")));
    }
    parts.join("; ")
}

fn merge_included(store: &mut CacheStore, included: &[Value]) {
    for entry in included {
        if let Some(IncludedEntity::Attribute(attribute)) = wire::parse_included(entry) {
            store.merge_attribute_definition(&attribute);
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use gridsync_core::{access::AccessMode, wire::ProductPage};
    use serde_json::json;

    fn store() -> CacheStore {
        let mut store = CacheStore::new(AccessMode::Flat);
        let page = ProductPage::from_value(json!({
            "data": [
                { "id": "7", "name": "Widget", "price": "5.00" },
                { "id": "8", "name": "Gadget" }
            ],
            "included": [
                { "type": "category", "id": "1", "attributes": { "name": "Apparel" } },
                { "type": "category", "id": "2",
                  "attributes": { "name": "Shoes", "parent": "1" } },
                { "type": "category", "id": "3",
                  "attributes": { "name": "Boots", "parent": "1" } }
            ]
        }))
        .unwrap();
        store.replace_dataset(page).unwrap();
        store
    }

    #[test]
    fn equal_value_edit_never_starts() {
        let mut cache = store();
        let mut pipeline = EditPipeline::new();

        let started =
            pipeline.begin_field(&mut cache, &"7".into(), "price", json!("5.00"));
        assert!(!started);
        assert!(!pipeline.has_pending());
    }

    #[test]
    fn begin_applies_optimistic_value_and_records_pending() {
        let mut cache = store();
        let mut pipeline = EditPipeline::new();

        assert!(pipeline.begin_field(&mut cache, &"7".into(), "price", json!("6.00")));
        assert_eq!(cache.field(&"7".into(), "price"), Some(json!("6.00")));

        let pending = pipeline
            .pending_edit(&"7".into(), &EditTarget::Field("price".into()))
            .unwrap();
        assert_eq!(pending.prior, Some(json!("5.00")));
    }

    #[test]
    fn commit_merges_authoritative_bag_and_clears_pending() {
        let mut cache = store();
        let mut pipeline = EditPipeline::new();
        let sink = RecordingSink::default();

        pipeline.begin_field(&mut cache, &"7".into(), "price", json!("6.00"));
        let response = FieldUpdateResponse {
            data: serde_json::from_value(json!({ "price": "6.50", "updated_at": "now" }))
                .unwrap(),
            included: Vec::new(),
        };
        pipeline.commit_field(&mut cache, &sink, &"7".into(), "price", &response);

        // Backend normalization wins over the submitted value.
        assert_eq!(cache.field(&"7".into(), "price"), Some(json!("6.50")));
        assert_eq!(cache.field(&"7".into(), "updated_at"), Some(json!("now")));
        assert!(!pipeline.has_pending());
        assert_eq!(
            sink.events(),
            vec![UiEvent::RedrawCell {
                row: "7".into(),
                column: "price".into()
            }]
        );
    }

    #[test]
    fn rollback_restores_prior_value_and_notifies() {
        let mut cache = store();
        let mut pipeline = EditPipeline::new();
        let sink = RecordingSink::default();

        pipeline.begin_field(&mut cache, &"7".into(), "price", json!("6.00"));
        pipeline.rollback(
            &mut cache,
            &sink,
            &"7".into(),
            &EditTarget::Field("price".into()),
            &BackendError::new("500"),
        );

        assert_eq!(cache.field(&"7".into(), "price"), Some(json!("5.00")));
        assert!(!pipeline.has_pending());
        assert_eq!(sink.notifications().len(), 1);
    }

    #[test]
    fn relation_reorder_is_a_noop() {
        let mut cache = store();
        cache.set_field(&"7".into(), "categories", json!("2,3"));
        let mut pipeline = EditPipeline::new();

        assert!(
            pipeline
                .begin_relation(&mut cache, &"7".into(), "categories", "3, 2")
                .is_none()
        );
        assert!(!pipeline.has_pending());
    }

    #[test]
    fn relation_commit_derives_grouped_label() {
        let mut cache = store();
        let mut pipeline = EditPipeline::new();
        let sink = RecordingSink::default();

        let ids = pipeline
            .begin_relation(&mut cache, &"7".into(), "categories", "2,3")
            .unwrap();
        pipeline.commit_relation(
            &mut cache,
            &sink,
            &"7".into(),
            "categories",
            "category",
            &ids,
            &FieldUpdateResponse::default(),
        );

        assert_eq!(
            cache.field(&"7".into(), "categories_label"),
            Some(json!("Apparel: Shoes, Boots"))
        );
    }

    #[test]
    fn second_edit_supersedes_first_pending_record() {
        let mut cache = store();
        let mut pipeline = EditPipeline::new();

        pipeline.begin_field(&mut cache, &"7".into(), "price", json!("6.00"));
        pipeline.begin_field(&mut cache, &"7".into(), "price", json!("7.00"));

        let pending = pipeline
            .pending_edit(&"7".into(), &EditTarget::Field("price".into()))
            .unwrap();
        // The superseding record's prior is the first edit's optimistic value.
        assert_eq!(pending.prior, Some(json!("6.00")));
        assert_eq!(pending.submitted, json!("7.00"));
    }
}
