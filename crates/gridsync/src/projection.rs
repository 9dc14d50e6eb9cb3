use derive_more::Deref;
use gridsync_core::{
    key::{AttributeKey, ProductKey},
    store::{CacheStore, DisplayValue, InputKind, Row},
};

/// Placeholder label shown for an unset enumerated attribute that has
/// options to choose from. Also the "clear" input: submitting it maps back
/// to an empty value.
pub const SELECT_PLACEHOLDER: &str = "Select a value";

/// Label shown for an enumerated attribute with no configured options.
/// Such a column is not editable.
pub const NO_OPTIONS_LABEL: &str = "No options available";

///
/// FieldColumn
///
/// A static (non-attribute) grid column, declared by the embedder.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldColumn {
    pub name: String,
    pub editable: bool,
}

impl FieldColumn {
    #[must_use]
    pub fn new(name: impl Into<String>, editable: bool) -> Self {
        Self {
            name: name.into(),
            editable,
        }
    }
}

///
/// AttributeBinding
///
/// Read/write binding for one attribute column. Holds only the attribute
/// identity; display re-reads the store live, so overlay writes need no
/// projection recompute.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeBinding {
    attribute: AttributeKey,
    pub label: String,
    pub code: String,
    pub group: String,
    pub kind: InputKind,
    pub editable: bool,
}

impl AttributeBinding {
    #[must_use]
    pub const fn attribute(&self) -> &AttributeKey {
        &self.attribute
    }

    /// Display value for a row's cell, with sentinel labeling per kind.
    #[must_use]
    pub fn display(&self, store: &CacheStore, row: &Row) -> String {
        match store.resolve_display_value(row, &self.attribute) {
            DisplayValue::Text(value) => value,
            DisplayValue::Unset => match self.kind {
                InputKind::FreeText => String::new(),
                InputKind::Select => {
                    let has_options = store
                        .attribute(&self.attribute)
                        .is_some_and(|attr| !attr.options.is_empty());
                    if has_options {
                        SELECT_PLACEHOLDER.to_string()
                    } else {
                        NO_OPTIONS_LABEL.to_string()
                    }
                }
            },
        }
    }

    /// Commit a raw grid input into the row-local overlay, mapping the
    /// clear-placeholder back to an empty value. Synchronous, so the grid
    /// reflects the pending value before the network round trip completes.
    /// Returns the committed value for the pipeline to persist.
    pub fn apply_edit(&self, store: &mut CacheStore, row: &ProductKey, raw: &str) -> String {
        let committed = if raw == SELECT_PLACEHOLDER {
            String::new()
        } else {
            raw.to_string()
        };
        store.upsert_local_value(row, self.attribute.clone(), &committed);
        committed
    }
}

///
/// GridColumn
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GridColumn {
    Field(FieldColumn),
    Attribute(AttributeBinding),
}

impl GridColumn {
    /// Stable column identifier: the field name or the attribute code.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Field(column) => &column.name,
            Self::Attribute(binding) => &binding.code,
        }
    }

    #[must_use]
    pub const fn editable(&self) -> bool {
        match self {
            Self::Field(column) => column.editable,
            Self::Attribute(binding) => binding.editable,
        }
    }
}

///
/// GridColumns
///
/// The derived column set: the embedder's static field columns followed by
/// one binding per loaded attribute definition, in definition order.
/// Re-derived whenever the dataset is replaced.
///

#[derive(Clone, Debug, Default, Deref)]
pub struct GridColumns {
    columns: Vec<GridColumn>,
}

impl GridColumns {
    #[must_use]
    pub fn derive(store: &CacheStore, fields: &[FieldColumn]) -> Self {
        let mut columns: Vec<GridColumn> =
            fields.iter().cloned().map(GridColumn::Field).collect();

        for attribute in store.attributes() {
            let editable =
                !(attribute.kind == InputKind::Select && attribute.options.is_empty());
            columns.push(GridColumn::Attribute(AttributeBinding {
                attribute: attribute.key().clone(),
                label: attribute.name.clone(),
                code: attribute.code.clone(),
                group: attribute.group_name.clone(),
                kind: attribute.kind,
                editable,
            }));
        }

        Self { columns }
    }

    #[must_use]
    pub fn position(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id() == column_id)
    }

    #[must_use]
    pub fn binding(&self, attribute: &AttributeKey) -> Option<&AttributeBinding> {
        self.columns.iter().find_map(|column| match column {
            GridColumn::Attribute(binding) if binding.attribute() == attribute => Some(binding),
            _ => None,
        })
    }

    /// Editable columns from a starting position, in grid order.
    #[must_use]
    pub fn editable_from(&self, start: usize) -> Vec<&GridColumn> {
        self.columns
            .iter()
            .skip(start)
            .filter(|column| column.editable())
            .collect()
    }
}

///
/// TESTS
///
