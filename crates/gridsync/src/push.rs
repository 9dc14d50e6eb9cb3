//! Push-channel reconciliation.
//!
//! The transport delivers named events with JSON payloads; reconnects may
//! replay events, so every handler is idempotent. Handlers never create a
//! phantom row: an event for a row that is not loaded locally is ignored
//! (it may live on another page or already be removed).

use crate::sink::{UiEvent, UiSink};
use gridsync_core::{
    key::{AttributeKey, ProductKey},
    store::CacheStore,
};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// PushParseError
///

#[derive(Clone, Debug, ThisError)]
pub enum PushParseError {
    #[error("unknown push event: {name}")]
    UnknownEvent { name: String },

    #[error("push payload is missing a usable product id")]
    MissingId,

    #[error("malformed push payload: {message}")]
    Malformed { message: String },
}

///
/// PushPayload
/// Wire shape of a row-scoped push event body.
///

#[derive(Clone, Debug, Default, Deserialize)]
struct PushPayload {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    attribute_values: Option<BTreeMap<String, String>>,
}

///
/// PushEvent
///

#[derive(Clone, Debug)]
pub enum PushEvent {
    /// A row was created elsewhere. Its full relational context is not
    /// reconstructed incrementally; a full reload is requested instead.
    Created { row: ProductKey },

    /// A row changed elsewhere. With an attribute bag this is an
    /// authoritative resync of the row's associations and values.
    Updated {
        row: ProductKey,
        fields: Map<String, Value>,
        attribute_values: Option<BTreeMap<AttributeKey, String>>,
    },

    Deleted { row: ProductKey },

    BulkUpdated,

    Imported,
}

impl PushEvent {
    /// Parse a named channel event and its payload.
    pub fn parse(name: &str, payload: &Value) -> Result<Self, PushParseError> {
        match name {
            "products.bulk.updated" => return Ok(Self::BulkUpdated),
            "product.imported" => return Ok(Self::Imported),
            _ => {}
        }

        let body: PushPayload = serde_json::from_value(payload.clone()).map_err(|err| {
            PushParseError::Malformed {
                message: err.to_string(),
            }
        })?;
        let row = ProductKey::from_json(&body.id).ok_or(PushParseError::MissingId)?;

        match name {
            "product.created" => Ok(Self::Created { row }),
            "product.deleted" => Ok(Self::Deleted { row }),
            "product.updated" => Ok(Self::Updated {
                row,
                fields: body.data,
                attribute_values: body.attribute_values.map(|values| {
                    values
                        .into_iter()
                        .map(|(id, value)| (AttributeKey::new(id), value))
                        .collect()
                }),
            }),
            other => Err(PushParseError::UnknownEvent {
                name: other.to_string(),
            }),
        }
    }
}

///
/// PushOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PushOutcome {
    /// The event cannot be merged incrementally; reload the dataset.
    ReloadRequired,
    RowUpdated(ProductKey),
    RowRemoved(ProductKey),
    /// Target row is not loaded locally; nothing to do.
    Ignored,
}

/// Apply one push event to the cache.
///
/// Row-scoped merges are keyed per `(attribute, row)` and therefore cannot
/// disturb concurrent local edits to other rows or fields; applying the
/// same event twice yields the same state as applying it once.
pub fn apply(store: &mut CacheStore, sink: &dyn UiSink, event: &PushEvent) -> PushOutcome {
    match event {
        PushEvent::Created { row } => {
            debug!("push created: row={row}, requesting reload");
            PushOutcome::ReloadRequired
        }

        PushEvent::BulkUpdated | PushEvent::Imported => {
            debug!("push bulk/import, requesting reload");
            PushOutcome::ReloadRequired
        }

        PushEvent::Deleted { row } => match store.remove_row(row) {
            Some(_) => {
                sink.emit(UiEvent::RedrawRow { row: row.clone() });
                PushOutcome::RowRemoved(row.clone())
            }
            None => PushOutcome::Ignored,
        },

        PushEvent::Updated {
            row,
            fields,
            attribute_values,
        } => {
            if store.row(row).is_none() {
                debug!("push update for unloaded row={row}, ignored");
                return PushOutcome::Ignored;
            }

            for (field, value) in fields {
                store.set_field(row, field, value.clone());
            }

            if let Some(values) = attribute_values {
                resync_attribute_values(store, row, values);
            }

            sink.emit(UiEvent::RedrawRow { row: row.clone() });
            PushOutcome::RowUpdated(row.clone())
        }
    }
}

/// Authoritative two-pass resync of one row's attribute associations and
/// values. The backend wholesale-replaces attribute lists, so the sweep
/// first clears entries for attributes missing from the payload (detached
/// elsewhere), then writes every present value. Both passes are scoped to
/// this row's overlay entries and both are idempotent.
fn resync_attribute_values(
    store: &mut CacheStore,
    row: &ProductKey,
    values: &BTreeMap<AttributeKey, String>,
) {
    let present: Vec<AttributeKey> = values.keys().cloned().collect();

    let previous: Vec<AttributeKey> = store
        .row(row)
        .map(|r| r.attribute_ids().to_vec())
        .unwrap_or_default();

    for attribute in &previous {
        if !present.contains(attribute) {
            store.clear_local_value(row, attribute);
            store.clear_attribute_value_if_absent(attribute, row, &present);
        }
    }

    for (attribute, value) in values {
        store.upsert_local_value(row, attribute.clone(), value);
        store.upsert_attribute_value(attribute, row, value);
    }

    if let Some(row_mut) = store.row_mut(row) {
        row_mut.set_attribute_ids(present);
    }
}

///
/// TESTS
///
