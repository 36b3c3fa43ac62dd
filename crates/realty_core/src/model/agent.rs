//! Realtor profile model.

use crate::model::content::{ContentMeta, ContentStatus, ContentType, EpochMillis, MediaAsset};
use crate::model::entity::Entity;
use crate::model::patch::double_option;
use crate::model::property::join_text;
use crate::model::validation::{
    require_email, require_range, require_slug, slug_or_fallback, ValidationError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSocial {
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(flatten)]
    pub meta: ContentMeta,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Derived from first/last name when blank.
    #[serde(default)]
    pub full_name: String,
    /// Derived from the full name when blank.
    #[serde(default)]
    pub slug: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub avatar: Option<MediaAsset>,
    #[serde(default)]
    pub profile_image: Option<MediaAsset>,
    #[serde(default)]
    pub social: AgentSocial,
    #[serde(default)]
    pub properties_sold: Option<u32>,
    #[serde(default)]
    pub years_experience: Option<u32>,
    /// Average review score, 0 to 5.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
}

impl Entity for Agent {
    type Patch = AgentPatch;

    const CONTENT_TYPE: ContentType = ContentType::Agent;
    const REQUIRED_FIELDS: &'static [&'static str] = &["email"];

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
        if self.full_name.trim().is_empty() {
            self.full_name = compose_full_name(&self.first_name, &self.last_name);
        }
        if self.slug.trim().is_empty() {
            self.slug = slug_or_fallback(&self.full_name, "agent", self.meta.id);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_person_name(&self.first_name, &self.last_name)?;
        require_slug("slug", &self.slug)?;
        require_email("email", &self.email)?;
        if let Some(rating) = self.rating {
            require_range("rating", rating, 0.0, 5.0)?;
        }
        Ok(())
    }

    fn display_title(&self) -> String {
        self.full_name.clone()
    }

    fn search_text(&self) -> String {
        let mut parts = vec![self.full_name.clone(), self.email.clone()];
        parts.extend(self.title.iter().cloned());
        parts.extend(self.bio.iter().cloned());
        parts.extend(self.specializations.iter().cloned());
        parts.extend(self.languages.iter().cloned());
        join_text(parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub published_at: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub license_number: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specializations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub avatar: Option<Option<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub profile_image: Option<Option<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<AgentSocial>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub properties_sold: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub years_experience: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub rating: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub review_count: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub seo_title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub seo_description: Option<Option<String>>,
}

pub(crate) fn compose_full_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn require_person_name(first: &str, last: &str) -> Result<(), ValidationError> {
    if first.trim().is_empty() && last.trim().is_empty() {
        return Err(ValidationError::invalid(
            "firstName",
            "first or last name is required",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Agent, AgentPatch};
    use crate::model::entity::{apply_patch, build_entity};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn jane() -> AgentPatch {
        AgentPatch {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            ..AgentPatch::default()
        }
    }

    #[test]
    fn derives_full_name_and_slug() {
        let agent: Agent = build_entity(&jane(), Uuid::new_v4(), 1).unwrap();
        assert_eq!(agent.full_name, "Jane Doe");
        assert_eq!(agent.slug, "jane-doe");
    }

    #[test]
    fn rejects_nameless_agent_and_bad_rating() {
        let patch = AgentPatch {
            email: Some("nobody@example.com".to_string()),
            ..AgentPatch::default()
        };
        assert!(matches!(
            build_entity::<Agent>(&patch, Uuid::new_v4(), 1),
            Err(ValidationError::InvalidField { .. })
        ));

        let agent: Agent = build_entity(&jane(), Uuid::new_v4(), 1).unwrap();
        let patch = AgentPatch {
            rating: Some(Some(7.5)),
            ..AgentPatch::default()
        };
        assert!(apply_patch(&agent, &patch, 2).is_err());
    }

    #[test]
    fn renaming_keeps_existing_slug() {
        let agent: Agent = build_entity(&jane(), Uuid::new_v4(), 1).unwrap();
        let patch = AgentPatch {
            last_name: Some("Smith".to_string()),
            full_name: Some(String::new()),
            ..AgentPatch::default()
        };
        let renamed = apply_patch(&agent, &patch, 2).unwrap();
        assert_eq!(renamed.full_name, "Jane Smith");
        assert_eq!(renamed.slug, "jane-doe");
    }
}
