///
/// RelatedEntity
///
/// A side-channel entity loaded alongside the page (category, brand,
/// supplier, ...) and retained for relation lookups and label derivation.
/// `parent` holds the parent entity's id within the same kind, when the
/// collaborator models a hierarchy.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelatedEntity {
    pub kind: String,
    pub key: String,
    pub name: String,
    pub parent: Option<String>,
}

impl RelatedEntity {
    #[must_use]
    pub fn new(kind: impl Into<String>, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
            name: name.into(),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn matches(&self, kind: &str, key: &str) -> bool {
        self.kind == kind && self.key == key
    }
}
