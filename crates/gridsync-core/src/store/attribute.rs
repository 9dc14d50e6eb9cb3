use crate::key::{AttributeKey, ProductKey};
use std::collections::BTreeMap;

///
/// InputKind
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InputKind {
    /// Free-text entry.
    #[default]
    FreeText,

    /// Enumerated options; editable only when at least one option exists.
    Select,
}

///
/// DisplayValue
///
/// Resolution result for a row/attribute pair. `Unset` is deliberately
/// distinct from `Text(String::new())`: the grid renders a clear-placeholder
/// for `Unset` and a genuinely blank cell for an empty string.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DisplayValue {
    Unset,
    Text(String),
}

impl DisplayValue {
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

///
/// AttributeDefinition
///
/// A shared, cross-row definition of a dynamic field, carrying the
/// per-row value overlay.
///
/// The overlay is the invariant-bearing structure: a value write for one
/// row touches exactly that row's entry. The definition object itself is
/// never swapped out when a value changes; sibling rows' entries survive
/// every update.
///

#[derive(Clone, Debug)]
pub struct AttributeDefinition {
    key: AttributeKey,
    pub name: String,
    pub code: String,
    pub kind: InputKind,
    pub options: Vec<String>,
    pub group_name: String,
    placeholder: bool,
    values: BTreeMap<ProductKey, String>,
}

impl AttributeDefinition {
    #[must_use]
    pub fn new(
        key: AttributeKey,
        name: impl Into<String>,
        code: impl Into<String>,
        kind: InputKind,
        options: Vec<String>,
        group_name: impl Into<String>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            code: code.into(),
            kind,
            options,
            group_name: group_name.into(),
            placeholder: false,
            values: BTreeMap::new(),
        }
    }

    /// Minimal definition created when a value arrives before the full
    /// definition has been fetched. Carries only the overlay; a later
    /// `enrich` fills in the metadata.
    #[must_use]
    pub fn placeholder(key: AttributeKey) -> Self {
        let code = key.as_str().to_string();
        Self {
            key,
            name: String::new(),
            code,
            kind: InputKind::FreeText,
            options: Vec::new(),
            group_name: String::new(),
            placeholder: true,
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &AttributeKey {
        &self.key
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Adopt metadata from a freshly fetched definition, keeping the
    /// existing overlay entries intact.
    pub fn enrich(&mut self, other: &Self) {
        self.name = other.name.clone();
        self.code = other.code.clone();
        self.kind = other.kind;
        self.options = other.options.clone();
        self.group_name = other.group_name.clone();
        self.placeholder = false;
    }

    // ======================================================================
    // Shared value overlay
    // ======================================================================

    #[must_use]
    pub fn value(&self, row: &ProductKey) -> Option<&str> {
        self.values.get(row).map(String::as_str)
    }

    /// Upsert one row's overlay entry. Never touches sibling entries.
    pub fn set_value(&mut self, row: ProductKey, value: impl Into<String>) {
        self.values.insert(row, value.into());
    }

    /// Remove one row's overlay entry; no-op when absent.
    pub fn clear_value(&mut self, row: &ProductKey) {
        self.values.remove(row);
    }

    /// Replace overlay entries from another definition, key by key.
    pub(crate) fn merge_values(&mut self, other: &Self) {
        for (row, value) in &other.values {
            self.values.insert(row.clone(), value.clone());
        }
    }

    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}

///
/// TESTS
///
