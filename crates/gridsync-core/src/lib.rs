//! Core data layer for GridSync: canonical typed keys, the denormalized
//! cache store with its per-row attribute value overlays, the field
//! accessor strategy, and the typed backend wire shapes.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod access;
pub mod error;
pub mod key;
pub mod store;
pub mod wire;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, parsers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        access::AccessMode,
        key::{AttributeKey, ProductKey},
        store::{AttributeDefinition, CacheStore, DisplayValue, InputKind, RelatedEntity, Row},
    };
}
