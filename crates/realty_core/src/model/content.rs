//! Shared content primitives.
//!
//! # Responsibility
//! - Define identity, timestamps and lifecycle status shared by all entities.
//! - Name the document collections addressable through the repository.
//!
//! # Invariants
//! - `status` is one of `draft|published|archived`; nothing else deserializes.
//! - Timestamps are Unix epoch milliseconds.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for every stored content record.
pub type EntityId = Uuid;

/// Unix epoch milliseconds.
pub type EpochMillis = i64;

/// Returns the current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> EpochMillis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Editorial lifecycle of a content record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    /// Not visible on the public site.
    #[default]
    Draft,
    /// Visible on the public site.
    Published,
    /// Retired but kept for reference.
    Archived,
}

impl ContentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Base fields carried by every entity except site settings.
///
/// Entities embed this with `#[serde(flatten)]`, so on the wire the fields
/// sit next to the entity's own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMeta {
    /// Assigned by the backend on create.
    pub id: EntityId,
    pub created_at: EpochMillis,
    /// Refreshed on every successful update.
    pub updated_at: EpochMillis,
    #[serde(default)]
    pub published_at: Option<EpochMillis>,
    #[serde(default)]
    pub status: ContentStatus,
}

impl ContentMeta {
    /// Creates metadata for a fresh draft record.
    pub fn new(id: EntityId, now: EpochMillis) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
            published_at: None,
            status: ContentStatus::Draft,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// Image or file reference attached to content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaAsset {
    pub id: String,
    pub url: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
}

impl MediaAsset {
    /// Builds an asset reference from an uploaded file URL.
    pub fn from_url(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Document collections managed by the content repository.
///
/// Site settings are a singleton and intentionally not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Property,
    Agent,
    Client,
    Inquiry,
    Article,
    Testimonial,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        Self::Property,
        Self::Agent,
        Self::Client,
        Self::Inquiry,
        Self::Article,
        Self::Testimonial,
    ];

    /// Storage/wire name of the collection.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Agent => "agent",
            Self::Client => "client",
            Self::Inquiry => "inquiry",
            Self::Article => "article",
            Self::Testimonial => "testimonial",
        }
    }

    /// Parses singular or plural collection names, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "property" | "properties" => Some(Self::Property),
            "agent" | "agents" => Some(Self::Agent),
            "client" | "clients" => Some(Self::Client),
            "inquiry" | "inquiries" => Some(Self::Inquiry),
            "article" | "articles" => Some(Self::Article),
            "testimonial" | "testimonials" => Some(Self::Testimonial),
            _ => None,
        }
    }

    /// Parses a list of collection names, rejecting unknown ones.
    pub fn parse_list<S: AsRef<str>>(values: &[S]) -> Result<Vec<Self>, ValidationError> {
        let mut parsed = Vec::with_capacity(values.len());
        for value in values {
            let value = value.as_ref();
            let kind = Self::parse(value).ok_or_else(|| {
                ValidationError::InvalidQuery(format!("unknown collection `{}`", value.trim()))
            })?;
            if !parsed.contains(&kind) {
                parsed.push(kind);
            }
        }
        Ok(parsed)
    }

    /// Whether records of this collection are addressable by slug.
    pub fn has_slug(self) -> bool {
        matches!(self, Self::Property | Self::Agent | Self::Article)
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentStatus, ContentType};

    #[test]
    fn status_rejects_unknown_values() {
        assert_eq!(ContentStatus::parse("published"), Some(ContentStatus::Published));
        assert!(ContentStatus::parse("deleted").is_none());
        assert!(serde_json::from_str::<ContentStatus>("\"deleted\"").is_err());
    }

    #[test]
    fn content_type_accepts_plural_names() {
        assert_eq!(ContentType::parse("Properties"), Some(ContentType::Property));
        assert_eq!(ContentType::parse(" inquiry "), Some(ContentType::Inquiry));
        assert!(ContentType::parse("settings").is_none());
    }

    #[test]
    fn parse_list_deduplicates_and_rejects_unknown() {
        let parsed = ContentType::parse_list(&["agents", "agent", "article"]).unwrap();
        assert_eq!(parsed, vec![ContentType::Agent, ContentType::Article]);
        assert!(ContentType::parse_list(&["listings"]).is_err());
    }
}
