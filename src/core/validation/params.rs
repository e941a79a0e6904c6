//! Raw listing parameters and their validation rules
//!
//! Every parameter arrives as optional text. Strings are trimmed while being
//! deserialized, then checked by the `validator` rules below before anything
//! else looks at them.

use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::num::IntErrorKind;
use validator::{Validate, ValidationError as RuleViolation};

pub const MIN_PAGE: i64 = 1;
pub const MAX_PAGE: i64 = 1_000_000;

/// Query string of `GET /bikes`
///
/// # Example
/// ```text
/// GET /bikes?brand=Honda,Yamaha&sort=cc-desc&page=2&limit=20
/// GET /bikes?search=dominar
/// ```
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct BikeQueryParams {
    /// Comma-separated brand names
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 512, message = "must be at most 512 characters"))]
    pub brand: Option<String>,

    /// Model substring
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 128, message = "must be at most 128 characters"))]
    pub model: Option<String>,

    /// Comma-separated category names
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 512, message = "must be at most 512 characters"))]
    pub category: Option<String>,

    /// Free-text term matched against brand and model
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub search: Option<String>,

    /// Page number (starts at 1)
    #[serde(deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_page"))]
    pub page: Option<String>,

    /// Number of items per page
    #[serde(deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: Option<String>,

    /// Sort mode, e.g. `year-desc`
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(max = 64, message = "must be at most 64 characters"))]
    pub sort: Option<String>,
}

fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()))
}

fn violation(code: &'static str, message: &'static str) -> RuleViolation {
    let mut err = RuleViolation::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn validate_page(page: &str) -> Result<(), RuleViolation> {
    if page.is_empty() {
        return Ok(());
    }
    match page.parse::<i64>() {
        Ok(n) if (MIN_PAGE..=MAX_PAGE).contains(&n) => Ok(()),
        Ok(_) => Err(violation("range", "must be between 1 and 1000000")),
        Err(_) => Err(violation("integer", "must be an integer")),
    }
}

fn validate_limit(limit: &str) -> Result<(), RuleViolation> {
    if limit.is_empty() {
        return Ok(());
    }
    parse_saturating(limit)
        .map(|_| ())
        .ok_or_else(|| violation("integer", "must be an integer"))
}

/// Parse an integer, saturating at the `i64` bounds instead of failing on
/// overflow. `None` when the text is not an integer at all.
pub fn parse_saturating(raw: &str) -> Option<i64> {
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}
