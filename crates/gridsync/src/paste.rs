use crate::{
    backend::{Backend, BackendError, BatchOperation, BatchSummary, BatchTarget},
    projection::{GridColumn, GridColumns},
    sink::{Severity, UiEvent, UiSink},
};
use gridsync_core::{key::ProductKey, store::CacheStore};
use log::debug;
use serde_json::Value;
use thiserror::Error as ThisError;

///
/// PasteError
///

#[derive(Clone, Debug, ThisError)]
pub enum PasteError {
    #[error("paste anchor cell is not resolvable: row={row} column={column}")]
    AnchorNotFound { row: ProductKey, column: String },

    #[error("paste block spans {width} columns but only {available} editable columns remain")]
    SpanExceedsEditable { width: usize, available: usize },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

///
/// PasteBlock
///
/// A rectangular clipboard block anchored at `(row, column)`. Values are
/// row-major; ragged input rows are allowed and shorter rows simply
/// produce fewer operations.
///

#[derive(Clone, Debug)]
pub struct PasteBlock {
    pub anchor_row: ProductKey,
    pub anchor_column: String,
    pub values: Vec<Vec<String>>,
}

impl PasteBlock {
    /// Widest input row; the unit of span validation.
    #[must_use]
    pub fn width(&self) -> usize {
        self.values.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Plan a paste block into batch operations, one per editable target cell.
///
/// Non-editable columns are skipped, not filled; rows past the end of the
/// loaded page are dropped. Validation is up front: an unresolvable anchor
/// or a block wider than the editable span from the anchor rejects the
/// whole paste before anything is touched.
pub fn plan(
    store: &CacheStore,
    columns: &GridColumns,
    block: &PasteBlock,
) -> Result<Vec<BatchOperation>, PasteError> {
    let anchor_index =
        store
            .row_index(&block.anchor_row)
            .ok_or_else(|| PasteError::AnchorNotFound {
                row: block.anchor_row.clone(),
                column: block.anchor_column.clone(),
            })?;
    let column_start =
        columns
            .position(&block.anchor_column)
            .ok_or_else(|| PasteError::AnchorNotFound {
                row: block.anchor_row.clone(),
                column: block.anchor_column.clone(),
            })?;

    let editable = columns.editable_from(column_start);
    let width = block.width();
    if width > editable.len() {
        return Err(PasteError::SpanExceedsEditable {
            width,
            available: editable.len(),
        });
    }

    let mut operations = Vec::new();
    for (row_offset, values) in block.values.iter().enumerate() {
        let Some(row) = store.rows().get(anchor_index + row_offset) else {
            break;
        };
        // Block columns map positionally from the anchor; a value landing
        // on a non-editable column is dropped, not shifted sideways.
        for (column_offset, value) in values.iter().enumerate() {
            let Some(column) = columns.get(column_start + column_offset) else {
                break;
            };
            if !column.editable() {
                continue;
            }
            let target = match column {
                GridColumn::Field(field) => BatchTarget::Field(field.name.clone()),
                GridColumn::Attribute(binding) => {
                    BatchTarget::Attribute(binding.attribute().clone())
                }
            };
            operations.push(BatchOperation {
                row: row.key().clone(),
                target,
                value: value.clone(),
            });
        }
    }

    Ok(operations)
}

/// Apply planned operations optimistically, before the batch call resolves.
/// No pending records are kept: partial batch failure is reported in
/// aggregate, not rolled back per cell.
fn apply_optimistic(
    store: &mut CacheStore,
    columns: &GridColumns,
    sink: &dyn UiSink,
    operations: &[BatchOperation],
) {
    for operation in operations {
        let column = match &operation.target {
            BatchTarget::Field(field) => {
                store.set_field(
                    &operation.row,
                    field,
                    Value::String(operation.value.clone()),
                );
                field.clone()
            }
            BatchTarget::Attribute(attribute) => {
                if let Some(binding) = columns.binding(attribute) {
                    binding.apply_edit(store, &operation.row, &operation.value);
                }
                attribute.to_string()
            }
        };
        sink.emit(UiEvent::RedrawCell {
            row: operation.row.clone(),
            column,
        });
    }
}

/// Plan, optimistically apply, and submit a paste block as one batch call.
///
/// The summary is the unit of failure reporting: successfully applied
/// cells stay committed, failed ones keep their optimistic value.
pub fn run<B: Backend>(
    store: &mut CacheStore,
    columns: &GridColumns,
    backend: &B,
    sink: &dyn UiSink,
    block: &PasteBlock,
) -> Result<BatchSummary, PasteError> {
    let operations = plan(store, columns, block)?;
    debug!(
        "paste: {} operations from anchor row={} column={}",
        operations.len(),
        block.anchor_row,
        block.anchor_column
    );

    apply_optimistic(store, columns, sink, &operations);
    let summary = backend.batch_update(&operations)?;

    let severity = if summary.error_count > 0 {
        Severity::Warning
    } else {
        Severity::Info
    };
    sink.emit(UiEvent::Notify {
        severity,
        message: format!(
            "{} cells updated, {} failed",
            summary.success_count, summary.error_count
        ),
    });

    Ok(summary)
}

///
/// TESTS
///
