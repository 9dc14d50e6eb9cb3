use crate::{
    backend::{Backend, BatchSummary, PageRequest},
    edit::{EditOutcome, EditPipeline, EditTarget},
    error::Error,
    paste::{self, PasteBlock},
    projection::{FieldColumn, GridColumns},
    push::{PushEvent, PushOutcome, apply as apply_push_event},
    sink::{UiEvent, UiSink},
};
use gridsync_core::{
    access::AccessMode,
    key::{AttributeKey, ProductKey},
    store::CacheStore,
};
use log::{debug, warn};
use serde_json::Value;

///
/// GridSession
///
/// Entry point for one grid page's lifetime: owns the cache store, the
/// derived column set, and the edit pipeline; borrows nothing global. The
/// backend and the UI sink are injected collaborators (the store is never
/// a process-wide singleton).
///
/// All backend failures on edit paths are absorbed here: converted to a
/// rollback plus a notification, returned as an `EditOutcome`, never
/// propagated.
///

pub struct GridSession<B, S> {
    store: CacheStore,
    columns: GridColumns,
    field_columns: Vec<FieldColumn>,
    pipeline: EditPipeline,
    backend: B,
    sink: S,
}

impl<B: Backend, S: UiSink> GridSession<B, S> {
    #[must_use]
    pub fn new(mode: AccessMode, field_columns: Vec<FieldColumn>, backend: B, sink: S) -> Self {
        Self {
            store: CacheStore::new(mode),
            columns: GridColumns::default(),
            field_columns,
            pipeline: EditPipeline::new(),
            backend,
            sink,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &CacheStore {
        &self.store
    }

    #[must_use]
    pub const fn columns(&self) -> &GridColumns {
        &self.columns
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    // ======================================================================
    // Dataset lifecycle
    // ======================================================================

    /// Fetch a page and rebuild the cache and column set from scratch.
    pub fn load_page(&mut self, request: PageRequest) -> Result<(), Error> {
        let page = self.backend.fetch_page(request)?;
        self.store.replace_dataset(page)?;
        self.columns = GridColumns::derive(&self.store, &self.field_columns);
        debug!(
            "page loaded: {} rows, {} attribute columns",
            self.store.len(),
            self.store.attributes().len()
        );
        Ok(())
    }

    // ======================================================================
    // Edit entry points
    // ======================================================================

    /// Single entry point for a plain-field cell change.
    pub fn handle_field_change(
        &mut self,
        row: &ProductKey,
        field: &str,
        new_value: Value,
    ) -> EditOutcome {
        if !self
            .pipeline
            .begin_field(&mut self.store, row, field, new_value.clone())
        {
            return EditOutcome::Noop;
        }

        match self.backend.update_field(row, field, &new_value) {
            Ok(response) => {
                self.pipeline
                    .commit_field(&mut self.store, &self.sink, row, field, &response);
                EditOutcome::Committed
            }
            Err(error) => {
                self.pipeline.rollback(
                    &mut self.store,
                    &self.sink,
                    row,
                    &EditTarget::Field(field.to_string()),
                    &error,
                );
                EditOutcome::RolledBack
            }
        }
    }

    /// Single entry point for an attribute cell change.
    pub fn handle_attribute_change(
        &mut self,
        row: &ProductKey,
        attribute: &AttributeKey,
        raw: &str,
    ) -> EditOutcome {
        let Some(binding) = self.columns.binding(attribute) else {
            warn!("attribute change for unknown column: {attribute}");
            return EditOutcome::Noop;
        };
        if !binding.editable {
            return EditOutcome::Noop;
        }
        let binding = binding.clone();

        let Some(committed) = self
            .pipeline
            .begin_attribute(&mut self.store, &binding, row, raw)
        else {
            return EditOutcome::Noop;
        };

        match self.backend.update_attribute(row, attribute, &committed) {
            Ok(response) => {
                self.pipeline.commit_attribute(
                    &mut self.store,
                    &self.sink,
                    row,
                    attribute,
                    &response,
                );
                EditOutcome::Committed
            }
            Err(error) => {
                self.pipeline.rollback(
                    &mut self.store,
                    &self.sink,
                    row,
                    &EditTarget::Attribute(attribute.clone()),
                    &error,
                );
                EditOutcome::RolledBack
            }
        }
    }

    /// Single entry point for a relationship (category-like) change.
    /// `kind` names the related-entity type used for label derivation.
    pub fn handle_relation_change(
        &mut self,
        row: &ProductKey,
        field: &str,
        kind: &str,
        new_value: &str,
    ) -> EditOutcome {
        let Some(ids) = self
            .pipeline
            .begin_relation(&mut self.store, row, field, new_value)
        else {
            return EditOutcome::Noop;
        };

        match self.backend.update_relation(row, field, &ids) {
            Ok(response) => {
                self.pipeline.commit_relation(
                    &mut self.store,
                    &self.sink,
                    row,
                    field,
                    kind,
                    &ids,
                    &response,
                );
                EditOutcome::Committed
            }
            Err(error) => {
                self.pipeline.rollback(
                    &mut self.store,
                    &self.sink,
                    row,
                    &EditTarget::Relation(field.to_string()),
                    &error,
                );
                EditOutcome::RolledBack
            }
        }
    }

    // ======================================================================
    // Bulk paste
    // ======================================================================

    pub fn paste(&mut self, block: &PasteBlock) -> Result<BatchSummary, Error> {
        let summary = paste::run(
            &mut self.store,
            &self.columns,
            &self.backend,
            &self.sink,
            block,
        )?;
        Ok(summary)
    }

    // ======================================================================
    // Push reconciliation
    // ======================================================================

    /// Merge one push-channel event. `ReloadRequired` outcomes are
    /// returned to the caller, which decides when to call `load_page`;
    /// the engine does not fetch behind the caller's back.
    pub fn apply_push(&mut self, event: &PushEvent) -> PushOutcome {
        apply_push_event(&mut self.store, &self.sink, event)
    }

    // ======================================================================
    // Row deletion
    // ======================================================================

    /// Delete a row via the backend, removing it locally on confirmation.
    pub fn delete_row(&mut self, row: &ProductKey) -> Result<(), Error> {
        self.backend.delete(row)?;
        if self.store.remove_row(row).is_some() {
            self.sink.emit(UiEvent::RedrawRow { row: row.clone() });
        }
        Ok(())
    }
}
