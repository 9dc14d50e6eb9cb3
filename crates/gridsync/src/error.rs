use crate::{backend::BackendError, paste::PasteError, push::PushParseError};
use derive_more::Display;
use gridsync_core::error::{ErrorOrigin as CoreErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///
/// Only structural failures and whole-operation transport failures surface
/// here. Single-edit transport failures never do; those are absorbed by
/// the pipeline as rollbacks and notifications.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(ErrorKind::Internal, err.origin.into(), err.message)
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        Self::new(ErrorKind::Backend, ErrorOrigin::Backend, err.message)
    }
}

impl From<PasteError> for Error {
    fn from(err: PasteError) -> Self {
        match err {
            PasteError::AnchorNotFound { .. } => Self::new(
                ErrorKind::Paste(PasteErrorKind::AnchorNotFound),
                ErrorOrigin::Paste,
                err.to_string(),
            ),
            PasteError::SpanExceedsEditable { .. } => Self::new(
                ErrorKind::Paste(PasteErrorKind::SpanExceedsEditable),
                ErrorOrigin::Paste,
                err.to_string(),
            ),
            PasteError::Backend(inner) => inner.into(),
        }
    }
}

impl From<PushParseError> for Error {
    fn from(err: PushParseError) -> Self {
        Self::new(ErrorKind::Push, ErrorOrigin::Push, err.to_string())
    }
}

///
/// ErrorKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A whole-operation backend failure (page load, batch call).
    Backend,

    Paste(PasteErrorKind),

    /// A malformed push-channel event.
    Push,

    /// A collaborator contract violation; the caller cannot remediate this.
    Internal,
}

///
/// PasteErrorKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PasteErrorKind {
    AnchorNotFound,
    SpanExceedsEditable,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    Access,
    Backend,
    Ingest,
    Paste,
    Push,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Access => Self::Access,
            CoreErrorOrigin::Ingest => Self::Ingest,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}
