//! UI notification boundary.
//!
//! Pipeline logic MUST NOT talk to the grid widget directly.
//! All redraw marks and user-visible notices flow through `UiEvent`
//! and an injected `UiSink`.

use gridsync_core::key::ProductKey;

///
/// Severity
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

///
/// UiEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UiEvent {
    /// One cell must be redrawn after a confirmed or rolled-back edit.
    RedrawCell { row: ProductKey, column: String },

    /// A whole row must be redrawn without diffing: attribute display can
    /// change even when the row's primitive fields did not.
    RedrawRow { row: ProductKey },

    /// Transient user-visible notice (rollbacks, batch summaries).
    Notify { severity: Severity, message: String },
}

///
/// UiSink
///

pub trait UiSink {
    fn emit(&self, event: UiEvent);
}

///
/// NullSink
/// Drops every event; the default for headless use and tests that do not
/// assert on UI traffic.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl UiSink for NullSink {
    fn emit(&self, _event: UiEvent) {}
}

///
/// RecordingSink
/// Sink capturing emitted events in order; used by the test suites and
/// useful to embedders asserting on UI traffic.
///

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: std::cell::RefCell<Vec<UiEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<UiEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, UiEvent::Notify { .. }))
            .cloned()
            .collect()
    }
}

impl UiSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        self.events.borrow_mut().push(event);
    }
}
