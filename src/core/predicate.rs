//! Predicate trees over catalog attributes
//!
//! [`PredicateCompiler`] builds a [`Predicate`] from [`FilterCriteria`]:
//! active dimensions are ANDed, values inside a dimension are ORed, and every
//! leaf is a case-insensitive literal match on one [`Attribute`]. Backends
//! expand a leaf to both field-name variants of its attribute.

use crate::core::criteria::FilterCriteria;
use crate::core::item::{Attribute, CatalogItem, value_text};
use regex::{Regex, RegexBuilder};

/// How a leaf compares the attribute with its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole value, case-insensitive
    Exact,
    /// Substring, case-insensitive
    Contains,
}

/// A single case-insensitive test of one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub attribute: Attribute,
    pub mode: MatchMode,
    /// User-supplied literal, unescaped
    pub value: String,
}

impl FieldMatch {
    pub fn exact(attribute: Attribute, value: impl Into<String>) -> Self {
        Self {
            attribute,
            mode: MatchMode::Exact,
            value: value.into(),
        }
    }

    pub fn contains(attribute: Attribute, value: impl Into<String>) -> Self {
        Self {
            attribute,
            mode: MatchMode::Contains,
            value: value.into(),
        }
    }

    /// Regular expression source with the literal escaped
    ///
    /// Case-insensitivity is not part of the pattern; callers set it as a
    /// flag (`$options: "i"` or [`RegexBuilder::case_insensitive`]).
    pub fn pattern(&self) -> String {
        let literal = regex::escape(&self.value);
        match self.mode {
            MatchMode::Exact => format!("^{}$", literal),
            MatchMode::Contains => literal,
        }
    }

    /// Compile the leaf for in-process evaluation
    pub fn regex(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.pattern())
            .case_insensitive(true)
            .build()
    }
}

/// Boolean tree of field matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every record
    All,
    Match(FieldMatch),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn matches_all(&self) -> bool {
        matches!(self, Predicate::All)
    }

    /// Every leaf of the tree, depth first
    pub fn leaves(&self) -> Vec<&FieldMatch> {
        match self {
            Predicate::All => Vec::new(),
            Predicate::Match(leaf) => vec![leaf],
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().flat_map(Predicate::leaves).collect()
            }
        }
    }

    /// Compile into an evaluator that can be applied to many items
    pub fn compile(&self) -> Result<CompiledPredicate, regex::Error> {
        Ok(match self {
            Predicate::All => CompiledPredicate::All,
            Predicate::Match(leaf) => CompiledPredicate::Match(leaf.attribute, leaf.regex()?),
            Predicate::And(children) => CompiledPredicate::And(
                children.iter().map(Predicate::compile).collect::<Result<_, _>>()?,
            ),
            Predicate::Or(children) => CompiledPredicate::Or(
                children.iter().map(Predicate::compile).collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// A [`Predicate`] with its regular expressions built
#[derive(Debug, Clone)]
pub enum CompiledPredicate {
    All,
    Match(Attribute, Regex),
    And(Vec<CompiledPredicate>),
    Or(Vec<CompiledPredicate>),
}

impl CompiledPredicate {
    /// Evaluate against an item; a leaf holds when any field-name variant matches
    pub fn matches(&self, item: &CatalogItem) -> bool {
        match self {
            CompiledPredicate::All => true,
            CompiledPredicate::Match(attribute, regex) => item
                .attribute_variants(*attribute)
                .filter_map(value_text)
                .any(|text| regex.is_match(&text)),
            CompiledPredicate::And(children) => children.iter().all(|c| c.matches(item)),
            CompiledPredicate::Or(children) => children.iter().any(|c| c.matches(item)),
        }
    }
}

/// Builds predicate trees from criteria
pub struct PredicateCompiler;

impl PredicateCompiler {
    pub fn compile(criteria: &FilterCriteria) -> Predicate {
        let mut dimensions = Vec::new();

        if let Some(p) = any_of(Attribute::Brand, MatchMode::Exact, criteria.brands()) {
            dimensions.push(p);
        }
        if let Some(model) = criteria.model() {
            dimensions.push(Predicate::Match(FieldMatch::contains(Attribute::Model, model)));
        }
        if let Some(p) = any_of(Attribute::Category, MatchMode::Exact, criteria.categories()) {
            dimensions.push(p);
        }
        if let Some(term) = criteria.search() {
            dimensions.push(Predicate::Or(vec![
                Predicate::Match(FieldMatch::contains(Attribute::Brand, term)),
                Predicate::Match(FieldMatch::contains(Attribute::Model, term)),
            ]));
        }

        match dimensions.len() {
            0 => Predicate::All,
            1 => dimensions.remove(0),
            _ => Predicate::And(dimensions),
        }
    }
}

fn any_of(attribute: Attribute, mode: MatchMode, values: &[String]) -> Option<Predicate> {
    let mut leaves: Vec<Predicate> = values
        .iter()
        .map(|value| {
            Predicate::Match(FieldMatch {
                attribute,
                mode,
                value: value.clone(),
            })
        })
        .collect();

    match leaves.len() {
        0 => None,
        1 => leaves.pop(),
        _ => Some(Predicate::Or(leaves)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::criteria::FilterNormalizer;
    use crate::core::validation::BikeQueryParams;
    use serde_json::json;

    fn criteria(query: &str) -> FilterCriteria {
        let params: BikeQueryParams = serde_urlencoded::from_str(query).unwrap();
        FilterNormalizer::normalize(&params).unwrap()
    }

    fn compiled(query: &str) -> CompiledPredicate {
        PredicateCompiler::compile(&criteria(query)).compile().unwrap()
    }

    fn item(value: serde_json::Value) -> CatalogItem {
        CatalogItem::from_value(value).unwrap()
    }

    #[test]
    fn test_no_filters_match_everything() {
        let predicate = PredicateCompiler::compile(&criteria(""));
        assert!(predicate.matches_all());
        assert!(predicate.compile().unwrap().matches(&item(json!({}))));
    }

    #[test]
    fn test_single_brand_is_a_leaf() {
        let predicate = PredicateCompiler::compile(&criteria("brand=Honda"));
        assert_eq!(
            predicate,
            Predicate::Match(FieldMatch::exact(Attribute::Brand, "Honda"))
        );
    }

    #[test]
    fn test_dimensions_are_anded_and_values_ored() {
        let predicate = PredicateCompiler::compile(&criteria("brand=Honda,Yamaha&search=r"));
        let Predicate::And(dimensions) = predicate else {
            panic!("expected AND of dimensions");
        };
        assert_eq!(dimensions.len(), 2);
        assert!(matches!(&dimensions[0], Predicate::Or(values) if values.len() == 2));
        assert!(matches!(&dimensions[1], Predicate::Or(values) if values.len() == 2));
    }

    #[test]
    fn test_brand_exact_match_either_variant() {
        let p = compiled("brand=honda,YAMAHA");
        assert!(p.matches(&item(json!({"Brand": "Honda"}))));
        assert!(p.matches(&item(json!({"brand": "yamaha"}))));
        assert!(!p.matches(&item(json!({"Brand": "Hondaa"}))));
        assert!(!p.matches(&item(json!({"brand": "Kawasaki"}))));
    }

    #[test]
    fn test_model_is_substring_match() {
        let p = compiled("model=domi");
        assert!(p.matches(&item(json!({"Model": "Dominar 400"}))));
        assert!(!p.matches(&item(json!({"Model": "Pulsar"}))));
    }

    #[test]
    fn test_search_combines_with_other_filters() {
        let p = compiled("category=Sport&search=hon");
        assert!(p.matches(&item(json!({"Brand": "Honda", "Category": "sport"}))));
        assert!(!p.matches(&item(json!({"Brand": "Honda", "Category": "Touring"}))));
        assert!(!p.matches(&item(json!({"Brand": "Yamaha", "Category": "Sport"}))));
    }

    #[test]
    fn test_search_matches_model_too() {
        let p = compiled("search=cbr");
        assert!(p.matches(&item(json!({"brand": "Honda", "model": "CBR650R"}))));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let p = compiled("model=R1.*");
        assert!(!p.matches(&item(json!({"Model": "R1 2020"}))));
        assert!(p.matches(&item(json!({"Model": "YZF-R1.* special"}))));

        // Would be an invalid pattern if not escaped.
        let p = compiled("search=(%5B");
        assert!(p.matches(&item(json!({"Model": "odd ([ name"}))));
    }

    #[test]
    fn test_pattern_escapes_and_anchors() {
        assert_eq!(FieldMatch::exact(Attribute::Brand, "a.b").pattern(), r"^a\.b$");
        assert_eq!(FieldMatch::contains(Attribute::Model, "x+").pattern(), r"x\+");
    }

    #[test]
    fn test_numeric_attribute_values_match_as_text() {
        let p = Predicate::Match(FieldMatch::exact(Attribute::Year, "2020"))
            .compile()
            .unwrap();
        assert!(p.matches(&item(json!({"Year": 2020}))));
    }
}
