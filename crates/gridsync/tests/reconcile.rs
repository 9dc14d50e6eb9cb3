//! End-to-end reconciliation scenarios through the session facade:
//! optimistic edits against a scripted backend, push interleaving, and the
//! failure paths that must stay contained to a single cell.

use gridsync::{
    backend::{
        AttributeUpdateResponse, Backend, BackendError, BatchOperation, BatchSummary,
        FieldUpdateResponse, PageRequest,
    },
    prelude::*,
    sink::RecordingSink,
};
use serde_json::{Value, json};
use std::cell::RefCell;

///
/// ScriptedBackend
///

#[derive(Default)]
struct ScriptedBackend {
    fail_field_updates: RefCell<bool>,
    field_update_calls: RefCell<u32>,
    saved_attribute_value: RefCell<Option<String>>,
}

impl ScriptedBackend {
    fn page() -> Value {
        json!({
            "data": [
                {
                    "id": "7",
                    "name": "Widget",
                    "price": "5.00",
                    "relationships": {
                        "attributes": { "data": [
                            { "type": "attribute", "id": "3" },
                            { "type": "attribute", "id": "4" }
                        ] }
                    },
                    "attribute_values": { "4": "a note" }
                },
                {
                    "id": 8,
                    "name": "Gadget",
                    "price": "2.00",
                    "relationships": {
                        "attributes": { "data": [ { "type": "attribute", "id": "3" } ] }
                    },
                    "attribute_values": { "3": "X" }
                }
            ],
            "included": [
                { "type": "attribute", "id": "3", "attributes": {
                    "name": "Color", "code": "color",
                    "input_kind": "select", "options": ["Red", "Blue"],
                    "group_name": "General"
                } },
                { "type": "attribute", "id": "4", "attributes": {
                    "name": "Note", "code": "note", "input_kind": "text"
                } }
            ],
            "meta": { "pagination": { "page": 1, "per_page": 25, "total": 2, "total_pages": 1 } }
        })
    }
}

impl Backend for ScriptedBackend {
    fn fetch_page(
        &self,
        _request: PageRequest,
    ) -> Result<gridsync::core::wire::ProductPage, BackendError> {
        gridsync::core::wire::ProductPage::from_value(Self::page())
            .map_err(|err| BackendError::new(err.to_string()))
    }

    fn update_field(
        &self,
        _row: &ProductKey,
        field: &str,
        value: &Value,
    ) -> Result<FieldUpdateResponse, BackendError> {
        *self.field_update_calls.borrow_mut() += 1;
        if *self.fail_field_updates.borrow() {
            return Err(BackendError::new("503 service unavailable"));
        }
        // Echo with server-side normalization: prices gain a currency tag.
        let normalized = if field == "price" {
            Value::String(format!("{} USD", value.as_str().unwrap_or_default()))
        } else {
            value.clone()
        };
        let mut data = serde_json::Map::new();
        data.insert(field.to_string(), normalized);
        Ok(FieldUpdateResponse {
            data,
            included: Vec::new(),
        })
    }

    fn update_attribute(
        &self,
        _row: &ProductKey,
        _attribute: &AttributeKey,
        value: &str,
    ) -> Result<AttributeUpdateResponse, BackendError> {
        // The server lowercases attribute values; the response, not the
        // submission, must end up in the cache.
        let saved = value.to_lowercase();
        *self.saved_attribute_value.borrow_mut() = Some(saved.clone());
        Ok(AttributeUpdateResponse {
            value: saved,
            relationships: None,
            included: Vec::new(),
        })
    }

    fn update_relation(
        &self,
        _row: &ProductKey,
        field: &str,
        ids: &[String],
    ) -> Result<FieldUpdateResponse, BackendError> {
        let mut data = serde_json::Map::new();
        data.insert(field.to_string(), Value::String(ids.join(",")));
        Ok(FieldUpdateResponse {
            data,
            included: Vec::new(),
        })
    }

    fn batch_update(&self, operations: &[BatchOperation]) -> Result<BatchSummary, BackendError> {
        Ok(BatchSummary {
            success_count: operations.len() as u32,
            error_count: 0,
            errors: Vec::new(),
        })
    }

    fn delete(&self, _row: &ProductKey) -> Result<(), BackendError> {
        Ok(())
    }
}

fn session() -> GridSession<ScriptedBackend, RecordingSink> {
    let fields = vec![
        FieldColumn::new("name", true),
        FieldColumn::new("price", true),
    ];
    let mut session = GridSession::new(
        AccessMode::Flat,
        fields,
        ScriptedBackend::default(),
        RecordingSink::default(),
    );
    session.load_page(PageRequest { page: 1, per_page: 25 }).unwrap();
    session
}

#[test]
fn load_derives_field_and_attribute_columns() {
    let session = session();
    let columns = session.columns();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns.position("color"), Some(2));
    assert_eq!(session.store().pagination().total, 2);
}

#[test]
fn unset_select_with_options_shows_the_placeholder() {
    let session = session();
    let binding = session.columns().binding(&AttributeKey::from("3")).unwrap();
    let row = session.store().row(&"7".into()).unwrap();

    // Row 7 has attribute 3 assigned but no value recorded yet.
    assert_eq!(binding.display(session.store(), row), SELECT_PLACEHOLDER);
}

#[test]
fn committed_field_edit_takes_the_servers_normalized_value() {
    let mut session = session();

    let outcome = session.handle_field_change(&"7".into(), "price", json!("6.00"));
    assert_eq!(outcome, EditOutcome::Committed);
    assert_eq!(
        session.store().field(&"7".into(), "price"),
        Some(json!("6.00 USD"))
    );
}

#[test]
fn equal_value_edit_never_reaches_the_backend() {
    let mut session = session();

    let outcome = session.handle_field_change(&"7".into(), "price", json!("5.00"));
    assert_eq!(outcome, EditOutcome::Noop);
    assert_eq!(*session.backend().field_update_calls.borrow(), 0);
}

#[test]
fn failed_field_edit_rolls_back_and_notifies() {
    let mut session = session();
    *session.backend().fail_field_updates.borrow_mut() = true;

    let outcome = session.handle_field_change(&"7".into(), "price", json!("6.00"));
    assert_eq!(outcome, EditOutcome::RolledBack);
    assert_eq!(
        session.store().field(&"7".into(), "price"),
        Some(json!("5.00"))
    );

    let notices = session.sink().notifications();
    assert_eq!(notices.len(), 1);
    assert!(matches!(
        &notices[0],
        UiEvent::Notify { severity: Severity::Warning, message } if message.contains("503")
    ));
}

#[test]
fn attribute_edit_round_trips_the_saved_value() {
    let mut session = session();

    let outcome = session.handle_attribute_change(&"7".into(), &"3".into(), "Red");
    assert_eq!(outcome, EditOutcome::Committed);

    // The backend lowercased the value; the cache holds the saved form.
    let binding = session.columns().binding(&AttributeKey::from("3")).unwrap();
    let row = session.store().row(&"7".into()).unwrap();
    assert_eq!(binding.display(session.store(), row), "red");

    // Row 8's value for the same attribute is untouched.
    let row8 = session.store().row(&"8".into()).unwrap();
    assert_eq!(binding.display(session.store(), row8), "X");
}

#[test]
fn push_update_interleaves_without_touching_other_rows() {
    let mut session = session();

    // A local edit on row 7 is committed, then a push resync arrives for
    // row 8 detaching attribute 3 there.
    session.handle_attribute_change(&"7".into(), &"3".into(), "Red");

    let event = PushEvent::parse(
        "product.updated",
        &json!({ "id": 8, "attribute_values": {} }),
    )
    .unwrap();
    let outcome = session.apply_push(&event);
    assert_eq!(outcome, PushOutcome::RowUpdated("8".into()));

    let binding = session.columns().binding(&AttributeKey::from("3")).unwrap();
    let row8 = session.store().row(&"8".into()).unwrap();
    assert_eq!(binding.display(session.store(), row8), SELECT_PLACEHOLDER);

    // Row 7's committed local edit survives the neighbor's resync.
    let row7 = session.store().row(&"7".into()).unwrap();
    assert_eq!(binding.display(session.store(), row7), "red");
}

#[test]
fn push_delete_then_edit_is_a_contained_noop() {
    let mut session = session();

    let event = PushEvent::parse("product.deleted", &json!({ "id": "7" })).unwrap();
    assert_eq!(session.apply_push(&event), PushOutcome::RowRemoved("7".into()));

    // The grid may still hold a stale cell reference; the edit must not
    // resurrect the row or fail loudly.
    let outcome = session.handle_field_change(&"7".into(), "price", json!("6.00"));
    assert_eq!(outcome, EditOutcome::Noop);
    assert!(session.store().row(&"7".into()).is_none());
}

#[test]
fn paste_runs_through_the_batch_call() {
    let mut session = session();

    let block = PasteBlock {
        anchor_row: "7".into(),
        anchor_column: "name".into(),
        values: vec![
            vec!["Widget II".into(), "9.00".into()],
            vec!["Gadget II".into(), "8.00".into()],
        ],
    };
    let summary = session.paste(&block).unwrap();

    assert_eq!(summary.success_count, 4);
    assert_eq!(
        session.store().field(&"8".into(), "name"),
        Some(json!("Gadget II"))
    );
}

#[test]
fn delete_row_confirms_then_removes_locally() {
    let mut session = session();
    session.delete_row(&"8".into()).unwrap();
    assert!(session.store().row(&"8".into()).is_none());
    assert_eq!(session.store().len(), 1);
}
