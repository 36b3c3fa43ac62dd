//! Field-level validation rules shared by all entities.
//!
//! # Responsibility
//! - Define the validation error reported for bad create/update input.
//! - Provide slug, email and numeric helpers used by entity `validate()`.

use crate::model::content::{ContentType, EntityId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});
static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator regex"));

const MAX_SLUG_CHARS: usize = 96;

/// Input rejected by create/update/query validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is absent or null.
    MissingField(String),
    /// A field is present but violates its constraint.
    InvalidField { field: String, reason: String },
    /// Input could not be decoded into the entity shape (wrong type, bad enum).
    Malformed(String),
    /// Another record in the same collection already uses this slug.
    DuplicateSlug { collection: ContentType, slug: String },
    /// Query envelope references an invalid field, operator or collection.
    InvalidQuery(String),
}

impl ValidationError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidField { field, reason } => write!(f, "invalid `{field}`: {reason}"),
            Self::Malformed(message) => write!(f, "malformed input: {message}"),
            Self::DuplicateSlug { collection, slug } => {
                write!(f, "{collection} slug `{slug}` is already in use")
            }
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
        }
    }
}

impl Error for ValidationError {}

/// Returns whether `value` is a lowercase, hyphen-separated URL segment.
pub fn is_url_safe_slug(value: &str) -> bool {
    value.len() <= MAX_SLUG_CHARS && SLUG_RE.is_match(value)
}

/// Derives a URL-safe slug from free text.
///
/// Returns an empty string when the input has no ASCII alphanumerics.
pub fn slugify(value: &str) -> String {
    let lowered = value.trim().to_ascii_lowercase();
    let joined = SLUG_SEPARATOR_RE.replace_all(&lowered, "-");
    let trimmed = joined.trim_matches('-');
    let mut slug = trimmed.chars().take(MAX_SLUG_CHARS).collect::<String>();
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Like [`slugify`], but falls back to `{prefix}-{first 8 hex digits of id}`
/// when the text has nothing to slug, e.g. a title in a non-Latin script.
pub fn slug_or_fallback(text: &str, prefix: &str, id: EntityId) -> String {
    let slug = slugify(text);
    if !slug.is_empty() {
        return slug;
    }
    let simple = id.simple().to_string();
    format!("{prefix}-{}", &simple[..8])
}

pub fn is_plausible_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::invalid(field, "must not be blank"));
    }
    Ok(())
}

pub(crate) fn require_slug(field: &str, value: &str) -> Result<(), ValidationError> {
    if !is_url_safe_slug(value) {
        return Err(ValidationError::invalid(
            field,
            format!("`{value}` is not a lowercase URL-safe slug"),
        ));
    }
    Ok(())
}

pub(crate) fn require_email(field: &str, value: &str) -> Result<(), ValidationError> {
    if !is_plausible_email(value) {
        return Err(ValidationError::invalid(
            field,
            format!("`{value}` is not an email address"),
        ));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::invalid(
            field,
            "must be a finite, non-negative number",
        ));
    }
    Ok(())
}

pub(crate) fn require_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::invalid(
            field,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{is_plausible_email, is_url_safe_slug, slug_or_fallback, slugify};
    use uuid::Uuid;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Modern Downtown Loft! "), "modern-downtown-loft");
        assert_eq!(slugify("Bay View -- Condo #2"), "bay-view-condo-2");
        assert_eq!(slugify("###"), "");
    }

    #[test]
    fn fallback_slug_uses_id_prefix() {
        let id = Uuid::parse_str("0f3a9c2e-1111-4222-8333-444455556666").unwrap();
        assert_eq!(slug_or_fallback("東京のロフト", "listing", id), "listing-0f3a9c2e");
        assert_eq!(slug_or_fallback("Tokyo Loft", "listing", id), "tokyo-loft");
        assert!(is_url_safe_slug(&slug_or_fallback("李 明", "agent", id)));
    }

    #[test]
    fn slug_rules_reject_uppercase_and_edges() {
        assert!(is_url_safe_slug("loft-1"));
        assert!(!is_url_safe_slug("Loft-1"));
        assert!(!is_url_safe_slug("-loft"));
        assert!(!is_url_safe_slug("loft--1"));
        assert!(!is_url_safe_slug("loft 1"));
        assert!(!is_url_safe_slug(""));
    }

    #[test]
    fn email_check_is_shape_only() {
        assert!(is_plausible_email("john@example.com"));
        assert!(!is_plausible_email("john.example.com"));
        assert!(!is_plausible_email("john@localhost"));
    }
}
