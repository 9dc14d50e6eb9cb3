//! ## Crate layout
//! - `backend`: the injected transport collaborator trait and its typed
//!   response shapes.
//! - `edit`: the optimistic edit pipeline (begin / commit / rollback).
//! - `error`: public error taxonomy wrapping the core's internal errors.
//! - `paste`: rectangular bulk paste over the batch backend call.
//! - `projection`: the derived grid column set and per-attribute bindings.
//! - `push`: push-channel event parsing and cache reconciliation.
//! - `session`: the per-page session facade tying the pieces together.
//! - `sink`: the injected UI event boundary (redraw marks, notices).
//!
//! The `prelude` mirrors the surface a grid embedder touches.

pub use gridsync_core as core;

pub mod backend;
pub mod edit;
pub mod error;
pub mod paste;
pub mod projection;
pub mod push;
pub mod session;
pub mod sink;

pub use error::Error;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        backend::{Backend, BackendError, PageRequest},
        core::{
            access::AccessMode,
            key::{AttributeKey, ProductKey},
            store::{CacheStore, DisplayValue, InputKind},
        },
        edit::EditOutcome,
        error::Error,
        paste::PasteBlock,
        projection::{FieldColumn, GridColumns, NO_OPTIONS_LABEL, SELECT_PLACEHOLDER},
        push::{PushEvent, PushOutcome},
        session::GridSession,
        sink::{NullSink, Severity, UiEvent, UiSink},
    };
}
