//! Typed views of the backend wire shapes and their ingestion parsing.
//!
//! The backend serves open field bags; parsing here is deliberately lenient
//! about optional pieces (absent `included`, absent `meta`) and loud about
//! structural violations (a non-list `data`, a row without an id).

use crate::{
    error::InternalError,
    key::{AttributeKey, ProductKey, canonical_id},
    store::{AttributeDefinition, EntityRef, InputKind, RelatedEntity, Row},
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Wire `type` discriminator for attribute definitions in `included`.
const ATTRIBUTE_KIND: &str = "attribute";

/// Relationship field carrying a row's attribute associations.
const ATTRIBUTES_RELATION: &str = "attributes";

///
/// ProductPage
///
/// Paginated product fetch response: `{ data, included, meta }`.
///

#[derive(Clone, Debug, Deserialize)]
pub struct ProductPage {
    pub data: Vec<Value>,
    #[serde(default)]
    pub included: Vec<Value>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl ProductPage {
    /// Parse a raw response body, failing loudly on a malformed shape.
    pub fn from_value(value: Value) -> Result<Self, InternalError> {
        serde_json::from_value(value)
            .map_err(|err| InternalError::ingest_invalid(format!("malformed page response: {err}")))
    }
}

///
/// PageMeta
///

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub pagination: Pagination,
}

///
/// Pagination
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Pagination {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u64,
}

///
/// IncludedEntity
///
/// One entry of the `included` side channel, discriminated by its wire type.
///

#[derive(Clone, Debug)]
pub enum IncludedEntity {
    Attribute(AttributeDefinition),
    Related(RelatedEntity),
}

/// The attribute bag of a wire entity: its `attributes` sub-object when the
/// nested shape is in use, otherwise the entity object itself.
fn entity_bag(value: &Value) -> &Value {
    value.get("attributes").filter(|b| b.is_object()).unwrap_or(value)
}

fn bag_str(bag: &Value, field: &str) -> String {
    bag.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Parse one `included` entry. Returns `None` for entries without a usable
/// `(type, id)` pair; unknown kinds become `Related` so relation lookups
/// stay generic over category-like collaborator types.
#[must_use]
pub fn parse_included(value: &Value) -> Option<IncludedEntity> {
    let kind = value.get("type").and_then(Value::as_str)?;
    let id = canonical_id(value.get("id")?)?;
    let bag = entity_bag(value);

    if kind == ATTRIBUTE_KIND {
        let input_kind = match bag.get("input_kind").and_then(Value::as_str) {
            Some("select") => InputKind::Select,
            _ => InputKind::FreeText,
        };
        let options = bag
            .get("options")
            .and_then(Value::as_array)
            .map(|opts| {
                opts.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut attribute = AttributeDefinition::new(
            AttributeKey::new(id),
            bag_str(bag, "name"),
            bag_str(bag, "code"),
            input_kind,
            options,
            bag_str(bag, "group_name"),
        );
        if let Some(values) = value.get("values").or_else(|| bag.get("values"))
            && let Some(values) = values.as_object()
        {
            for (row_id, val) in values {
                if let Some(val) = val.as_str() {
                    attribute.set_value(ProductKey::new(row_id.as_str()), val);
                }
            }
        }
        return Some(IncludedEntity::Attribute(attribute));
    }

    let mut related = RelatedEntity::new(kind, id, bag_str(bag, "name"));
    if let Some(parent) = bag.get("parent").and_then(canonical_id) {
        related = related.with_parent(parent);
    }
    Some(IncludedEntity::Related(related))
}

/// Parse a `relationships` bag into pointer lists. To-one pointers become
/// single-element lists; empty `data` yields an empty list.
#[must_use]
pub fn parse_relationships(value: &Value) -> BTreeMap<String, Vec<EntityRef>> {
    let mut out = BTreeMap::new();
    let Some(map) = value.as_object() else {
        return out;
    };

    for (field, relation) in map {
        let refs = match relation.get("data") {
            Some(Value::Array(items)) => items.iter().filter_map(parse_entity_ref).collect(),
            Some(item) => parse_entity_ref(item).into_iter().collect(),
            None => Vec::new(),
        };
        out.insert(field.clone(), refs);
    }

    out
}

fn parse_entity_ref(value: &Value) -> Option<EntityRef> {
    let kind = value.get("type").and_then(Value::as_str)?;
    let key = canonical_id(value.get("id")?)?;
    Some(EntityRef::new(kind, key))
}

/// Extract the attribute association id list from parsed relationships.
#[must_use]
pub fn attribute_ids(relationships: &BTreeMap<String, Vec<EntityRef>>) -> Vec<AttributeKey> {
    relationships
        .get(ATTRIBUTES_RELATION)
        .map(|refs| {
            refs.iter()
                .map(|r| AttributeKey::new(r.key.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

///
/// ParsedRow
///
/// A page row split into its cache pieces: the row proper and the
/// attribute-value seed bag destined for the overlays.
///

#[derive(Debug)]
pub struct ParsedRow {
    pub row: Row,
    pub attribute_values: BTreeMap<AttributeKey, String>,
}

/// Parse one entry of a page's `data` list.
///
/// The row id is structural: a row the cache cannot address is a contract
/// violation, not a skippable entry.
pub fn parse_row(value: &Value) -> Result<ParsedRow, InternalError> {
    let key = value
        .get("id")
        .and_then(ProductKey::from_json)
        .ok_or_else(|| InternalError::ingest_invalid("page row is missing a usable id"))?;

    let mut bag = value.clone();
    let relationships = bag
        .as_object_mut()
        .and_then(|map| map.remove("relationships"))
        .map(|rels| parse_relationships(&rels))
        .unwrap_or_default();

    let mut attribute_values = BTreeMap::new();
    if let Some(values) = bag
        .as_object_mut()
        .and_then(|map| map.remove("attribute_values"))
        && let Some(values) = values.as_object()
    {
        for (attr_id, val) in values {
            if let Some(val) = val.as_str() {
                attribute_values.insert(AttributeKey::new(attr_id.as_str()), val.to_string());
            }
        }
    }

    let mut row = Row::new(key, bag);
    row.set_attribute_ids(attribute_ids(&relationships));
    for (field, refs) in relationships {
        row.set_relationship(field, refs);
    }

    Ok(ParsedRow {
        row,
        attribute_values,
    })
}

///
/// TESTS
///
