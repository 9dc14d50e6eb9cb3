use serde_json::{Map, Value};

///
/// AccessMode
///
/// Strategy for locating a logical field inside a row's JSON bag.
///
/// The backend serves two wire shapes: a relationship-based shape that nests
/// primitive fields under an `attributes` container, and a flat shape that
/// keeps them at the top level. The mode is resolved once at session
/// construction and injected; accessors are pure functions of
/// `(mode, bag, field)`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessMode {
    Nested,
    Flat,
}

impl AccessMode {
    /// Storage path for a logical field under this mode.
    #[must_use]
    pub fn field_path(self, field: &str) -> String {
        match self {
            Self::Nested => format!("attributes.{field}"),
            Self::Flat => field.to_string(),
        }
    }

    /// Resolve a field against a row bag. Total: absent segments yield `None`.
    #[must_use]
    pub fn get_value<'a>(self, bag: &'a Value, field: &str) -> Option<&'a Value> {
        let path = self.field_path(field);
        let mut current = bag;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Write a field through the mode's path, creating intermediate objects
    /// as needed. A non-object intermediate is replaced by an empty object.
    pub fn set_value(self, bag: &mut Value, field: &str, value: Value) {
        let path = self.field_path(field);
        let mut segments = path.split('.').peekable();
        let mut current = bag;

        while let Some(segment) = segments.next() {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Some(map) = current.as_object_mut() else {
                return;
            };
            if segments.peek().is_none() {
                map.insert(segment.to_string(), value);
                return;
            }
            current = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }
}

///
/// TESTS
///
