//! Normalized listing criteria
//!
//! [`FilterNormalizer`] turns validated [`BikeQueryParams`] into an immutable
//! [`FilterCriteria`]: multi-value filters split on commas, empty values
//! dropped, pagination defaulted and bounded, sort mode resolved.

use crate::core::error::{FieldValidationError, ValidationError};
use crate::core::validation::{BikeQueryParams, parse_saturating};
use validator::Validate;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 50;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 1000;

/// Supported orderings of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortMode {
    YearAsc,
    YearDesc,
    CcAsc,
    CcDesc,
    HpAsc,
    HpDesc,
    #[default]
    NameAsc,
    NameDesc,
}

impl SortMode {
    pub const ALL: [SortMode; 8] = [
        SortMode::YearAsc,
        SortMode::YearDesc,
        SortMode::CcAsc,
        SortMode::CcDesc,
        SortMode::HpAsc,
        SortMode::HpDesc,
        SortMode::NameAsc,
        SortMode::NameDesc,
    ];

    /// Parse a sort token; anything outside the enumeration is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == token)
    }

    /// Resolve an optional token, falling back to `name-asc`.
    pub fn resolve(token: Option<&str>) -> Self {
        token.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::YearAsc => "year-asc",
            SortMode::YearDesc => "year-desc",
            SortMode::CcAsc => "cc-asc",
            SortMode::CcDesc => "cc-desc",
            SortMode::HpAsc => "hp-asc",
            SortMode::HpDesc => "hp-desc",
            SortMode::NameAsc => "name-asc",
            SortMode::NameDesc => "name-desc",
        }
    }
}

/// Filters, sort and pagination of one listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    brands: Vec<String>,
    model: Option<String>,
    categories: Vec<String>,
    search: Option<String>,
    sort: SortMode,
    page: u32,
    limit: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            brands: Vec::new(),
            model: None,
            categories: Vec::new(),
            search: None,
            sort: SortMode::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FilterCriteria {
    /// Brands to match, any of them (OR)
    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    /// Model substring
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Categories to match, any of them (OR)
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Term matched against brand or model
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether no filter dimension is active
    pub fn is_unfiltered(&self) -> bool {
        self.brands.is_empty()
            && self.model.is_none()
            && self.categories.is_empty()
            && self.search.is_none()
    }
}

/// Validates and canonicalizes raw listing parameters
pub struct FilterNormalizer;

impl FilterNormalizer {
    /// Build criteria from raw parameters
    ///
    /// Every field problem is reported at once. An unknown sort token is not
    /// a problem: it silently resolves to the default ordering.
    pub fn normalize(params: &BikeQueryParams) -> Result<FilterCriteria, ValidationError> {
        if let Err(errors) = params.validate() {
            let mut fields: Vec<FieldValidationError> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, violations)| {
                    violations.iter().map(move |v| {
                        let message = v
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| v.code.to_string());
                        FieldValidationError::new(field.to_string(), message)
                    })
                })
                .collect();
            fields.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(ValidationError::FieldErrors(fields));
        }

        let page = match non_empty(params.page.as_deref()) {
            Some(raw) => parse_page(raw)?,
            None => DEFAULT_PAGE,
        };
        let limit = match non_empty(params.limit.as_deref()) {
            Some(raw) => parse_limit(raw)?,
            None => DEFAULT_LIMIT,
        };

        Ok(FilterCriteria {
            brands: split_values(params.brand.as_deref()),
            model: non_empty(params.model.as_deref()).map(str::to_string),
            categories: split_values(params.category.as_deref()),
            search: non_empty(params.search.as_deref()).map(str::to_string),
            sort: SortMode::resolve(non_empty(params.sort.as_deref())),
            page,
            limit,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Split a comma-separated list, trimming and discarding empty tokens.
pub fn split_values(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_page(raw: &str) -> Result<u32, ValidationError> {
    raw.parse::<u32>().map_err(|_| ValidationError::FieldError {
        field: "page".to_string(),
        message: "must be an integer".to_string(),
    })
}

fn parse_limit(raw: &str) -> Result<u32, ValidationError> {
    let limit = parse_saturating(raw).ok_or_else(|| ValidationError::FieldError {
        field: "limit".to_string(),
        message: "must be an integer".to_string(),
    })?;
    // Bounded to 1..=1000, so the cast cannot truncate.
    Ok(limit.clamp(MIN_LIMIT, MAX_LIMIT) as u32)
}
