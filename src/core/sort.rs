//! Sort specifications
//!
//! [`SortKeyResolver`] maps a [`SortMode`] to a [`SortSpec`]. Numeric modes
//! sort on a synthetic key pulled out of free text (`"650cc"` → 650), and every
//! spec ends with the brand/model tie-break followed by the identifier, so the
//! ordering is total and page boundaries are stable.

use crate::core::criteria::SortMode;
use crate::core::item::{Attribute, CatalogItem};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// First run of ASCII digits, with an optional fractional part.
///
/// Spelled with `[0-9]` so the in-process regex and the server-side one
/// agree on what a digit is.
pub const NUMBER_PATTERN: &str = r"[0-9]+(?:\.[0-9]+)?";

/// Synthetic fields a store may inject while sorting; never part of a response.
pub const SYNTHETIC_FIELDS: [&str; 5] = ["_sortYear", "_sortCc", "_sortHp", "_sortBrand", "_sortModel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// MongoDB sort value
    pub fn as_i32(self) -> i32 {
        match self {
            Direction::Asc => 1,
            Direction::Desc => -1,
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// What a sort key orders by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Number extracted from the attribute's text, `0` when there is none
    Numeric(Attribute),
    /// The attribute's text as stored
    Text(Attribute),
    /// The store identifier
    Id,
}

impl SortField {
    /// Name of the computed field a store uses for this key, if any
    pub fn synthetic_name(self) -> Option<&'static str> {
        match self {
            SortField::Numeric(Attribute::Year) => Some("_sortYear"),
            SortField::Numeric(Attribute::Displacement) => Some("_sortCc"),
            SortField::Numeric(Attribute::Power) => Some("_sortHp"),
            SortField::Text(Attribute::Brand) => Some("_sortBrand"),
            SortField::Text(Attribute::Model) => Some("_sortModel"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

/// A resolved sort value of one item for one key
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    /// Missing text orders before any present text
    Text(Option<String>),
    Id(Option<String>),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Id(a), SortValue::Id(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Ordered list of sort keys ending in a deterministic tie-break
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Sort values of an item, one per key
    pub fn values(&self, item: &CatalogItem) -> Vec<SortValue> {
        self.keys
            .iter()
            .map(|key| match key.field {
                SortField::Numeric(attribute) => SortValue::Number(numeric_key(item, attribute)),
                SortField::Text(attribute) => SortValue::Text(item.text(attribute)),
                SortField::Id => SortValue::Id(item.id().map(|id| id.to_string())),
            })
            .collect()
    }

    /// Compare two value lists produced by [`SortSpec::values`]
    pub fn compare_values(&self, a: &[SortValue], b: &[SortValue]) -> Ordering {
        self.keys
            .iter()
            .zip(a.iter().zip(b))
            .map(|(key, (x, y))| key.direction.apply(x.compare(y)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Sort items in place
    pub fn sort(&self, items: &mut Vec<CatalogItem>) {
        let mut keyed: Vec<(Vec<SortValue>, CatalogItem)> = items
            .drain(..)
            .map(|item| (self.values(&item), item))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| self.compare_values(a, b));
        items.extend(keyed.into_iter().map(|(_, item)| item));
    }
}

/// Maps sort modes to sort specifications
pub struct SortKeyResolver;

impl SortKeyResolver {
    pub fn resolve(mode: SortMode) -> SortSpec {
        let numeric = |attribute, direction| SortKey {
            field: SortField::Numeric(attribute),
            direction,
        };

        let mut keys = match mode {
            SortMode::YearAsc => vec![numeric(Attribute::Year, Direction::Asc)],
            SortMode::YearDesc => vec![numeric(Attribute::Year, Direction::Desc)],
            SortMode::CcAsc => vec![numeric(Attribute::Displacement, Direction::Asc)],
            SortMode::CcDesc => vec![numeric(Attribute::Displacement, Direction::Desc)],
            SortMode::HpAsc => vec![numeric(Attribute::Power, Direction::Asc)],
            SortMode::HpDesc => vec![numeric(Attribute::Power, Direction::Desc)],
            SortMode::NameAsc | SortMode::NameDesc => Vec::new(),
        };

        if mode == SortMode::NameDesc {
            keys.push(SortKey::desc(SortField::Text(Attribute::Brand)));
            keys.push(SortKey::desc(SortField::Text(Attribute::Model)));
        } else {
            keys.push(SortKey::asc(SortField::Text(Attribute::Brand)));
            keys.push(SortKey::asc(SortField::Text(Attribute::Model)));
        }
        keys.push(SortKey::asc(SortField::Id));

        SortSpec { keys }
    }
}

fn number_regex() -> &'static Regex {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    NUMBER_REGEX.get_or_init(|| Regex::new(NUMBER_PATTERN).expect("number pattern is valid"))
}

/// Extract the first number from free text; `0` when there is none.
pub fn extract_number(text: &str) -> f64 {
    number_regex()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Synthetic numeric key of an attribute
pub fn numeric_key(item: &CatalogItem, attribute: Attribute) -> f64 {
    item.text(attribute)
        .map(|text| extract_number(&text))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: serde_json::Value) -> CatalogItem {
        CatalogItem::from_value(value).unwrap()
    }

    fn names(items: &[CatalogItem]) -> Vec<String> {
        items
            .iter()
            .map(|i| {
                format!(
                    "{} {}",
                    i.text(Attribute::Brand).unwrap_or_default(),
                    i.text(Attribute::Model).unwrap_or_default()
                )
            })
            .collect()
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number("650cc"), 650.0);
        assert_eq!(extract_number("150 HP"), 150.0);
        assert_eq!(extract_number("Approx. 14.5 kW"), 14.5);
        assert_eq!(extract_number("N/A"), 0.0);
        assert_eq!(extract_number(""), 0.0);
        assert_eq!(extract_number("v2.0 from 1999"), 2.0);
    }

    #[test]
    fn test_extract_number_skips_non_ascii_digits() {
        assert_eq!(extract_number("\u{0663} / 150 HP"), 150.0);
        assert_eq!(extract_number("\u{0967}\u{0968}"), 0.0);
    }

    #[test]
    fn test_numeric_key_handles_numbers_and_absence() {
        assert_eq!(numeric_key(&item(json!({"Year": 2020})), Attribute::Year), 2020.0);
        assert_eq!(numeric_key(&item(json!({"displacement": "649 ccm"})), Attribute::Displacement), 649.0);
        assert_eq!(numeric_key(&item(json!({})), Attribute::Power), 0.0);
        assert_eq!(numeric_key(&item(json!({"year": "n/a"})), Attribute::Year), 0.0);
    }

    #[test]
    fn test_every_spec_ends_with_tie_break() {
        for mode in SortMode::ALL {
            let spec = SortKeyResolver::resolve(mode);
            let keys = spec.keys();
            let n = keys.len();
            assert_eq!(keys[n - 1], SortKey::asc(SortField::Id));
            assert_eq!(keys[n - 3].field, SortField::Text(Attribute::Brand));
            assert_eq!(keys[n - 2].field, SortField::Text(Attribute::Model));
        }
    }

    #[test]
    fn test_name_desc_reverses_tie_break() {
        let spec = SortKeyResolver::resolve(SortMode::NameDesc);
        assert_eq!(spec.keys()[0], SortKey::desc(SortField::Text(Attribute::Brand)));
        assert_eq!(spec.keys()[1], SortKey::desc(SortField::Text(Attribute::Model)));
    }

    #[test]
    fn test_year_asc_scenario() {
        let mut items = vec![
            item(json!({"Brand": "Honda", "Model": "CBR", "Year": "2020"})),
            item(json!({"Brand": "Yamaha", "Model": "R1", "Year": "n/a"})),
        ];
        SortKeyResolver::resolve(SortMode::YearAsc).sort(&mut items);
        assert_eq!(names(&items), ["Yamaha R1", "Honda CBR"]);
    }

    #[test]
    fn test_ties_broken_by_brand_then_model() {
        let mut items = vec![
            item(json!({"brand": "Yamaha", "model": "MT-07", "displacement": "689cc"})),
            item(json!({"Brand": "Honda", "Model": "NC750", "Displacement": "745cc"})),
            item(json!({"brand": "Honda", "model": "CB650R", "displacement": "649cc"})),
            item(json!({"Brand": "Honda", "Model": "CBR650R", "Displacement": "649cc"})),
        ];
        SortKeyResolver::resolve(SortMode::CcDesc).sort(&mut items);
        assert_eq!(
            names(&items),
            ["Honda NC750", "Yamaha MT-07", "Honda CB650R", "Honda CBR650R"]
        );
    }

    #[test]
    fn test_identical_names_ordered_by_id() {
        let mut items = vec![
            item(json!({"_id": "bbbbbbbbbbbbbbbbbbbbbbbb", "Brand": "KTM", "Model": "Duke"})),
            item(json!({"_id": "aaaaaaaaaaaaaaaaaaaaaaaa", "Brand": "KTM", "Model": "Duke"})),
        ];
        SortKeyResolver::resolve(SortMode::NameAsc).sort(&mut items);
        assert_eq!(items[0].id().unwrap().to_string(), "aaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn test_missing_brand_sorts_first_ascending() {
        let mut items = vec![
            item(json!({"Brand": "Aprilia", "Model": "RS 660"})),
            item(json!({"Model": "Mystery"})),
        ];
        SortKeyResolver::resolve(SortMode::NameAsc).sort(&mut items);
        assert_eq!(items[0].text(Attribute::Model).as_deref(), Some("Mystery"));
    }

    #[test]
    fn test_synthetic_names() {
        assert_eq!(SortField::Numeric(Attribute::Year).synthetic_name(), Some("_sortYear"));
        assert_eq!(SortField::Id.synthetic_name(), None);
        for mode in SortMode::ALL {
            for key in SortKeyResolver::resolve(mode).keys() {
                if let Some(name) = key.field.synthetic_name() {
                    assert!(SYNTHETIC_FIELDS.contains(&name));
                }
            }
        }
    }
}
