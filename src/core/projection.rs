//! Output shaping of catalog items

use crate::core::item::{CatalogItem, ID_FIELD, ItemId};
use crate::core::sort::SYNTHETIC_FIELDS;
use serde_json::Value;

/// Strips computed sort keys and canonicalizes identifiers
pub struct ResultProjector;

impl ResultProjector {
    pub fn project(mut item: CatalogItem) -> CatalogItem {
        for field in SYNTHETIC_FIELDS {
            item.remove(field);
        }

        if let Some(raw) = item.get(ID_FIELD) {
            let canonical = match ItemId::from_value(raw) {
                Some(id) => id.to_string(),
                None => match raw {
                    Value::String(s) => s.clone(),
                    Value::Object(map) => map
                        .get("$oid")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| raw.to_string()),
                    other => other.to_string(),
                },
            };
            item.insert(ID_FIELD, Value::String(canonical));
        }

        item
    }

    pub fn project_all(items: Vec<CatalogItem>) -> Vec<CatalogItem> {
        items.into_iter().map(Self::project).collect()
    }
}
