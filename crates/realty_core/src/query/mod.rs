//! Query and collection envelopes shared by every list operation.
//!
//! # Responsibility
//! - Describe filtering, sorting, pagination, projection and free-text
//!   search for list calls, independent of any backend.
//! - Describe the paginated result wrapper.
//!
//! # Invariants
//! - Field paths are camelCase wire names, dot-separated for nested fields.
//! - `Collection::total` counts all matches, not just the returned page.

use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static FIELD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid field path regex")
});

/// Returns whether `path` is a well-formed (possibly nested) field path.
pub fn is_valid_field_path(path: &str) -> bool {
    FIELD_PATH_RE.is_match(path)
}

/// Comparison applied to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// Field equals any of the listed values.
    In(Vec<Value>),
    /// Array field contains the value, or string field contains the substring.
    Contains(Value),
    /// `true` matches null/absent fields, `false` matches present ones.
    Null(bool),
}

/// Filter entry: either a bare value (equality) or an explicit operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterCondition {
    Op(FilterOp),
    Value(Value),
}

impl FilterCondition {
    /// Normalizes bare values into `FilterOp::Eq`.
    pub fn as_op(&self) -> FilterOp {
        match self {
            Self::Op(op) => op.clone(),
            Self::Value(value) => FilterOp::Eq(value.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort key; `-field` means descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses a comma-separated sort list such as `-price,title`.
    pub fn parse_list(value: &str) -> Result<Vec<SortKey>, ValidationError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(SortKey::from_str)
            .collect()
    }
}

impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (field, direction) = match value.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (value.strip_prefix('+').unwrap_or(value), SortDirection::Asc),
        };
        if !is_valid_field_path(field) {
            return Err(ValidationError::InvalidQuery(format!(
                "invalid sort field `{value}`"
            )));
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

impl TryFrom<String> for SortKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(value: SortKey) -> Self {
        value.to_string()
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "{}", self.field),
            SortDirection::Desc => write!(f, "-{}", self.field),
        }
    }
}

/// Query envelope accepted by every list operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryOptions {
    /// Field path -> condition; all conditions must hold.
    pub filter: BTreeMap<String, FilterCondition>,
    /// Ordered sort keys. Empty means backend default order.
    pub sort: Vec<SortKey>,
    pub limit: Option<u32>,
    pub offset: u32,
    /// Projection for raw document listing. Typed lists return full records.
    pub fields: Vec<String>,
    /// Free-text match over the record's searchable text.
    pub search: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter
            .insert(field.into(), FilterCondition::Value(value.into()));
        self
    }

    pub fn filter_op(mut self, field: impl Into<String>, op: FilterOp) -> Self {
        self.filter.insert(field.into(), FilterCondition::Op(op));
        self
    }

    pub fn sort_key(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    /// Appends keys parsed from a comma-separated list like `-price,title`.
    pub fn sort_by(mut self, spec: &str) -> Result<Self, ValidationError> {
        self.sort.extend(SortKey::parse_list(spec)?);
        Ok(self)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Checks field paths and operator operands.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, condition) in &self.filter {
            if !is_valid_field_path(field) {
                return Err(ValidationError::InvalidQuery(format!(
                    "invalid filter field `{field}`"
                )));
            }
            validate_op(field, &condition.as_op())?;
        }
        for key in &self.sort {
            if !is_valid_field_path(&key.field) {
                return Err(ValidationError::InvalidQuery(format!(
                    "invalid sort field `{}`",
                    key.field
                )));
            }
        }
        for field in &self.fields {
            if !is_valid_field_path(field) {
                return Err(ValidationError::InvalidQuery(format!(
                    "invalid projection field `{field}`"
                )));
            }
        }
        Ok(())
    }

    /// Page number (1-based) when a limit is set.
    pub fn page(&self) -> Option<u32> {
        match self.limit {
            Some(limit) if limit > 0 => Some(self.offset / limit + 1),
            Some(_) => Some(1),
            None => None,
        }
    }
}

fn validate_op(field: &str, op: &FilterOp) -> Result<(), ValidationError> {
    let scalar = |value: &Value| -> Result<(), ValidationError> {
        if value.is_array() || value.is_object() {
            return Err(ValidationError::InvalidQuery(format!(
                "filter on `{field}` must compare against a scalar value"
            )));
        }
        Ok(())
    };
    match op {
        FilterOp::Eq(value) | FilterOp::Ne(value) | FilterOp::Contains(value) => scalar(value),
        FilterOp::Gt(value) | FilterOp::Gte(value) | FilterOp::Lt(value) | FilterOp::Lte(value) => {
            if value.is_null() {
                return Err(ValidationError::InvalidQuery(format!(
                    "range filter on `{field}` cannot compare against null"
                )));
            }
            scalar(value)
        }
        FilterOp::In(values) => values.iter().try_for_each(scalar),
        FilterOp::Null(_) => Ok(()),
    }
}

/// Paginated list result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    pub items: Vec<T>,
    /// Size of the full matching set, ignoring pagination.
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl<T> Collection<T> {
    /// Wraps one page of results for the given query.
    pub fn page_of(items: Vec<T>, total: u64, options: &QueryOptions) -> Self {
        Self {
            items,
            total,
            page: options.page(),
            page_size: options.limit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Collection<U> {
        Collection {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Keeps only the requested field paths of a JSON record.
///
/// `id` is always kept. Missing paths are skipped rather than written as null.
pub fn project(record: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return record.clone();
    }

    let mut projected = Map::new();
    if let Some(id) = record.get("id") {
        projected.insert("id".to_string(), id.clone());
    }
    for path in fields {
        let segments = path.split('.').collect::<Vec<_>>();
        if let Some(value) = lookup(record, &segments) {
            insert_path(&mut projected, &segments, value.clone());
        }
    }
    Value::Object(projected)
}

fn lookup<'a>(record: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(record, |current, segment| current.get(*segment))
}

fn insert_path(target: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            target.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = target
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{project, Collection, FilterCondition, FilterOp, QueryOptions, SortDirection, SortKey};
    use serde_json::json;

    #[test]
    fn sort_list_parses_direction_prefixes() {
        let keys = SortKey::parse_list("-price, title,+bedrooms").unwrap();
        assert_eq!(keys[0], SortKey::desc("price"));
        assert_eq!(keys[1].direction, SortDirection::Asc);
        assert_eq!(keys[2], SortKey::asc("bedrooms"));
        assert!(SortKey::parse_list("price;drop").is_err());
    }

    #[test]
    fn filter_deserializes_bare_values_and_operators() {
        let options: QueryOptions = serde_json::from_value(json!({
            "filter": {
                "status": "published",
                "price": { "gte": 100000 },
                "propertyType": { "in": ["land", "commercial"] }
            },
            "sort": ["-price"],
            "limit": 10
        }))
        .unwrap();

        assert_eq!(
            options.filter["status"],
            FilterCondition::Value(json!("published"))
        );
        assert_eq!(
            options.filter["price"],
            FilterCondition::Op(FilterOp::Gte(json!(100000)))
        );
        assert_eq!(options.sort, vec![SortKey::desc("price")]);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validate_rejects_injection_shaped_paths() {
        let options = QueryOptions::new().filter_eq("price') OR 1=1 --", 1);
        assert!(options.validate().is_err());
        let options = QueryOptions::new().filter_op("tags", FilterOp::Contains(json!(["a"])));
        assert!(options.validate().is_err());
    }

    #[test]
    fn page_is_derived_from_offset_and_limit() {
        let options = QueryOptions::new().limit(10).offset(20);
        let page = Collection::page_of(vec![1, 2], 42, &options);
        assert_eq!(page.page, Some(3));
        assert_eq!(page.page_size, Some(10));
        assert_eq!(page.total, 42);
        assert_eq!(QueryOptions::new().page(), None);
    }

    #[test]
    fn projection_keeps_id_and_nested_paths() {
        let record = json!({
            "id": "p-1",
            "title": "Loft",
            "price": 10,
            "address": { "city": "Oakland", "street": "1 Main" }
        });
        let projected = project(&record, &["title".to_string(), "address.city".to_string()]);
        assert_eq!(
            projected,
            json!({ "id": "p-1", "title": "Loft", "address": { "city": "Oakland" } })
        );
    }
}
