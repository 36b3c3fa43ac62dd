//! Marketing article and client testimonial models.

use crate::model::content::{ContentMeta, ContentStatus, ContentType, EntityId, EpochMillis, MediaAsset};
use crate::model::entity::Entity;
use crate::model::patch::double_option;
use crate::model::property::join_text;
use crate::model::validation::{require_non_blank, require_slug, slug_or_fallback, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<MediaAsset>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Weak reference to the authoring agent.
    #[serde(default)]
    pub author_id: Option<EntityId>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub views: u64,
}

impl Entity for Article {
    type Patch = ArticlePatch;

    const CONTENT_TYPE: ContentType = ContentType::Article;
    const REQUIRED_FIELDS: &'static [&'static str] = &["title", "content"];

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn normalize(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slug_or_fallback(&self.title, "article", self.meta.id);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("title", &self.title)?;
        require_slug("slug", &self.slug)?;
        require_non_blank("content", &self.content)
    }

    fn display_title(&self) -> String {
        self.title.clone()
    }

    fn search_text(&self) -> String {
        let mut parts = vec![self.content.clone()];
        parts.extend(self.excerpt.iter().cloned());
        parts.extend(self.category.iter().cloned());
        parts.extend(self.tags.iter().cloned());
        join_text(parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub published_at: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub excerpt: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub featured_image: Option<Option<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub author_id: Option<Option<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub seo_title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub seo_description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

/// Client quote shown on marketing pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub client_name: String,
    #[serde(default)]
    pub client_title: Option<String>,
    #[serde(default)]
    pub client_avatar: Option<MediaAsset>,
    pub quote: String,
    /// 1 to 5 stars.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub property_id: Option<EntityId>,
    #[serde(default)]
    pub agent_id: Option<EntityId>,
    #[serde(default)]
    pub featured: bool,
}

impl Entity for Testimonial {
    type Patch = TestimonialPatch;

    const CONTENT_TYPE: ContentType = ContentType::Testimonial;
    const REQUIRED_FIELDS: &'static [&'static str] = &["clientName", "quote"];

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("clientName", &self.client_name)?;
        require_non_blank("quote", &self.quote)?;
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(ValidationError::invalid("rating", "must be between 1 and 5"));
            }
        }
        Ok(())
    }

    fn display_title(&self) -> String {
        self.client_name.clone()
    }

    fn search_text(&self) -> String {
        let mut parts = vec![self.client_name.clone(), self.quote.clone()];
        parts.extend(self.client_title.iter().cloned());
        join_text(parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestimonialPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub published_at: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub client_title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub client_avatar: Option<Option<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub rating: Option<Option<u8>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub property_id: Option<Option<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub agent_id: Option<Option<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::{Article, ArticlePatch, Testimonial, TestimonialPatch};
    use crate::model::entity::build_entity;
    use uuid::Uuid;

    #[test]
    fn article_slug_is_derived_from_title() {
        let patch = ArticlePatch {
            title: Some("Buying Your First Home".to_string()),
            content: Some("Start with a budget.".to_string()),
            ..ArticlePatch::default()
        };
        let article: Article = build_entity(&patch, Uuid::new_v4(), 1).unwrap();
        assert_eq!(article.slug, "buying-your-first-home");
    }

    #[test]
    fn testimonial_rating_is_bounded() {
        let patch = TestimonialPatch {
            client_name: Some("Ana".to_string()),
            quote: Some("Smooth closing.".to_string()),
            rating: Some(Some(6)),
            ..TestimonialPatch::default()
        };
        assert!(build_entity::<Testimonial>(&patch, Uuid::new_v4(), 1).is_err());
    }
}
