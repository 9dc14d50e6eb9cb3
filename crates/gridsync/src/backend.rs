//! Backend collaborator boundary.
//!
//! The transport (HTTP, websocket RPC, in-process fake) lives behind the
//! `Backend` trait; the engine only sees the typed response shapes. Timeouts
//! and retries are the transport's concern.

use gridsync_core::{
    key::{AttributeKey, ProductKey},
    wire::ProductPage,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error as ThisError;

///
/// BackendError
///
/// Transient failure of a single backend call. Caught at the pipeline
/// boundary, converted to a rollback plus a user notification; never
/// propagated as an unhandled failure.
///

#[derive(Clone, Debug, ThisError)]
#[error("backend call failed: {message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// PageRequest
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

///
/// FieldUpdateResponse
///
/// Single-field (or relationship) update response: the authoritative
/// field bag plus any attribute definitions the backend chose to include.
///

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FieldUpdateResponse {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub included: Vec<Value>,
}

///
/// AttributeUpdateResponse
///
/// Attribute-value update response. `value` is the saved value after any
/// server-side normalization; it, not the submitted value, is merged back.
/// `relationships` may carry the row's refreshed association bag.
///

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AttributeUpdateResponse {
    pub value: String,
    #[serde(default)]
    pub relationships: Option<Value>,
    #[serde(default)]
    pub included: Vec<Value>,
}

///
/// BatchTarget
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BatchTarget {
    Field(String),
    Attribute(AttributeKey),
}

///
/// BatchOperation
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchOperation {
    pub row: ProductKey,
    pub target: BatchTarget,
    pub value: String,
}

///
/// BatchOperationError
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct BatchOperationError {
    pub row: ProductKey,
    pub message: String,
}

///
/// BatchSummary
///
/// Aggregate outcome of a batch update. The summary, not per-cell
/// rollback, is the unit of failure reporting for bulk paste.
///

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BatchSummary {
    pub success_count: u32,
    pub error_count: u32,
    #[serde(default)]
    pub errors: Vec<BatchOperationError>,
}

///
/// Backend
///

pub trait Backend {
    /// Paginated product fetch.
    fn fetch_page(&self, request: PageRequest) -> Result<ProductPage, BackendError>;

    /// Single scalar field update.
    fn update_field(
        &self,
        row: &ProductKey,
        field: &str,
        value: &Value,
    ) -> Result<FieldUpdateResponse, BackendError>;

    /// Single attribute-value update.
    fn update_attribute(
        &self,
        row: &ProductKey,
        attribute: &AttributeKey,
        value: &str,
    ) -> Result<AttributeUpdateResponse, BackendError>;

    /// Multi-valued relationship update (category-like id list).
    fn update_relation(
        &self,
        row: &ProductKey,
        field: &str,
        ids: &[String],
    ) -> Result<FieldUpdateResponse, BackendError>;

    /// Batch update for bulk paste.
    fn batch_update(&self, operations: &[BatchOperation]) -> Result<BatchSummary, BackendError>;

    /// Row delete; soft-delete semantics are server-side.
    fn delete(&self, row: &ProductKey) -> Result<(), BackendError>;
}
