//! Catalog items and their identifiers
//!
//! Catalog documents are loosely schematized: every semantic attribute can be
//! stored under a legacy capitalized key (`Brand`) or the current lowercase key
//! (`brand`). [`CatalogItem`] resolves those variants in one place so the query
//! path can speak in terms of [`Attribute`]s only.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Name of the identifier field in stored documents.
pub const ID_FIELD: &str = "_id";

/// Semantic attribute of a catalog item understood by the query path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Brand,
    Model,
    Category,
    Displacement,
    Power,
    Year,
}

impl Attribute {
    /// Current lowercase field name.
    pub fn field(self) -> &'static str {
        match self {
            Attribute::Brand => "brand",
            Attribute::Model => "model",
            Attribute::Category => "category",
            Attribute::Displacement => "displacement",
            Attribute::Power => "power",
            Attribute::Year => "year",
        }
    }

    /// Legacy capitalized field name.
    pub fn legacy_field(self) -> &'static str {
        match self {
            Attribute::Brand => "Brand",
            Attribute::Model => "Model",
            Attribute::Category => "Category",
            Attribute::Displacement => "Displacement",
            Attribute::Power => "Power",
            Attribute::Year => "Year",
        }
    }

    /// Both field names, preferred (lowercase) first.
    pub fn fields(self) -> [&'static str; 2] {
        [self.field(), self.legacy_field()]
    }
}

/// Error returned when a string is not a well-formed [`ItemId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid item id")]
pub struct InvalidItemId(pub String);

/// Store-assigned identifier of a catalog item
///
/// A 12-byte object id, written as 24 hexadecimal characters. The canonical
/// textual form is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId([u8; 12]);

impl ItemId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        bytes.copy_from_slice(&Uuid::new_v4().as_bytes()[..12]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parse an identifier, accepting either case of hex digits.
    pub fn parse(value: &str) -> Result<Self, InvalidItemId> {
        let raw = value.as_bytes();
        if raw.len() != 24 {
            return Err(InvalidItemId(value.to_string()));
        }

        let mut bytes = [0u8; 12];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_value(pair[0]).ok_or_else(|| InvalidItemId(value.to_string()))?;
            let lo = hex_value(pair[1]).ok_or_else(|| InvalidItemId(value.to_string()))?;
            bytes[i] = (hi << 4) | lo;
        }

        Ok(Self(bytes))
    }

    /// Extract an identifier from a stored `_id` value.
    ///
    /// Accepts a plain hex string or the extended-JSON form `{"$oid": "..."}`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s).ok(),
            Value::Object(map) => map.get("$oid").and_then(Value::as_str).and_then(|s| Self::parse(s).ok()),
            _ => None,
        }
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for ItemId {
    type Err = InvalidItemId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One motorcycle record
///
/// Wraps the raw document. Attributes not interpreted by the query path are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CatalogItem(Map<String, Value>);

impl CatalogItem {
    pub fn new(document: Map<String, Value>) -> Self {
        Self(document)
    }

    /// Build an item from a JSON value; non-objects are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<ItemId> {
        self.0.get(ID_FIELD).and_then(ItemId::from_value)
    }

    pub fn set_id(&mut self, id: ItemId) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }

    /// Resolved value of an attribute, preferring the lowercase variant.
    ///
    /// A `null` stored under the preferred name falls through to the legacy one.
    pub fn attribute(&self, attribute: Attribute) -> Option<&Value> {
        attribute
            .fields()
            .into_iter()
            .filter_map(|field| self.0.get(field))
            .find(|value| !value.is_null())
    }

    /// Every populated variant of an attribute.
    pub fn attribute_variants(&self, attribute: Attribute) -> impl Iterator<Item = &Value> {
        attribute
            .fields()
            .into_iter()
            .filter_map(|field| self.0.get(field))
            .filter(|value| !value.is_null())
    }

    /// Textual representation of an attribute, if it has one.
    pub fn text(&self, attribute: Attribute) -> Option<String> {
        self.attribute(attribute).and_then(value_text)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Textual representation of a scalar JSON value.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> CatalogItem {
        CatalogItem::from_value(value).unwrap()
    }

    #[test]
    fn test_item_id_parse_and_display() {
        let id = ItemId::parse("65A1B2C3D4E5F60718293A4B").unwrap();
        assert_eq!(id.to_string(), "65a1b2c3d4e5f60718293a4b");
        assert_eq!(ItemId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_item_id_rejects_malformed() {
        assert!(ItemId::parse("not-an-id").is_err());
        assert!(ItemId::parse("65a1b2c3d4e5f60718293a4").is_err());
        assert!(ItemId::parse("65a1b2c3d4e5f60718293a4g").is_err());
        assert!(ItemId::parse("").is_err());
    }

    #[test]
    fn test_item_id_from_extended_json() {
        let id = ItemId::from_value(&json!({"$oid": "65a1b2c3d4e5f60718293a4b"})).unwrap();
        assert_eq!(id.to_string(), "65a1b2c3d4e5f60718293a4b");
        assert!(ItemId::from_value(&json!(42)).is_none());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        assert_ne!(ItemId::generate(), ItemId::generate());
    }

    #[test]
    fn test_attribute_resolves_legacy_variant() {
        let bike = item(json!({"Brand": "Honda", "model": "CBR"}));
        assert_eq!(bike.text(Attribute::Brand).as_deref(), Some("Honda"));
        assert_eq!(bike.text(Attribute::Model).as_deref(), Some("CBR"));
        assert_eq!(bike.text(Attribute::Year), None);
    }

    #[test]
    fn test_attribute_prefers_lowercase_variant() {
        let bike = item(json!({"Year": "1999", "year": 2021}));
        assert_eq!(bike.text(Attribute::Year).as_deref(), Some("2021"));
        assert_eq!(bike.attribute_variants(Attribute::Year).count(), 2);
    }

    #[test]
    fn test_null_preferred_variant_falls_through() {
        let bike = item(json!({"power": null, "Power": "150 HP"}));
        assert_eq!(bike.text(Attribute::Power).as_deref(), Some("150 HP"));
    }
}
