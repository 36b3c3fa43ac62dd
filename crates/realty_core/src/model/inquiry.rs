//! Contact-form inquiry model.
//!
//! # Invariants
//! - `resolved == true` requires both `resolved_at` and `resolved_by`.

use crate::model::content::{ContentMeta, ContentStatus, ContentType, EntityId, EpochMillis};
use crate::model::entity::Entity;
use crate::model::patch::double_option;
use crate::model::property::join_text;
use crate::model::validation::{require_email, require_non_blank, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InquiryType {
    PropertyViewing,
    #[default]
    GeneralInfo,
    AgentContact,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub inquiry_type: InquiryType,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub property_id: Option<EntityId>,
    #[serde(default)]
    pub agent_id: Option<EntityId>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<EpochMillis>,
    /// Identifier of the user who resolved the inquiry.
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl Entity for Inquiry {
    type Patch = InquiryPatch;

    const CONTENT_TYPE: ContentType = ContentType::Inquiry;
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "email", "message"];

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_email("email", &self.email)?;
        require_non_blank("message", &self.message)?;
        if self.resolved {
            if self.resolved_at.is_none() {
                return Err(ValidationError::invalid(
                    "resolvedAt",
                    "required when resolved is true",
                ));
            }
            match self.resolved_by.as_deref() {
                Some(resolver) if !resolver.trim().is_empty() => {}
                _ => {
                    return Err(ValidationError::invalid(
                        "resolvedBy",
                        "required when resolved is true",
                    ))
                }
            }
        }
        Ok(())
    }

    fn display_title(&self) -> String {
        match self.subject.as_deref().filter(|subject| !subject.trim().is_empty()) {
            Some(subject) => subject.to_string(),
            None => format!("Inquiry from {}", self.name),
        }
    }

    fn search_text(&self) -> String {
        let mut parts = vec![self.name.clone(), self.email.clone(), self.message.clone()];
        parts.extend(self.subject.iter().cloned());
        parts.extend(self.response.iter().cloned());
        join_text(parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InquiryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub published_at: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquiry_type: Option<InquiryType>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub subject: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub property_id: Option<Option<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub agent_id: Option<Option<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub resolved_at: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub resolved_by: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub response: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::{Inquiry, InquiryPatch, InquiryType};
    use crate::model::entity::{apply_patch, build_entity};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn viewing_request() -> InquiryPatch {
        InquiryPatch {
            name: Some("John".to_string()),
            email: Some("john@example.com".to_string()),
            message: Some("Can I see it on Saturday?".to_string()),
            inquiry_type: Some(InquiryType::PropertyViewing),
            resolved: Some(false),
            ..InquiryPatch::default()
        }
    }

    #[test]
    fn resolving_requires_timestamp_and_resolver() {
        let inquiry: Inquiry = build_entity(&viewing_request(), Uuid::new_v4(), 1).unwrap();

        let partial = InquiryPatch {
            resolved: Some(true),
            resolved_at: Some(Some(50)),
            ..InquiryPatch::default()
        };
        let err = apply_patch(&inquiry, &partial, 2).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "resolvedBy"));

        let complete = InquiryPatch {
            resolved: Some(true),
            resolved_at: Some(Some(50)),
            resolved_by: Some(Some("agent-1".to_string())),
            ..InquiryPatch::default()
        };
        let resolved = apply_patch(&inquiry, &complete, 2).unwrap();
        assert!(resolved.resolved);
        assert_eq!(resolved.resolved_at, Some(50));
        assert_eq!(resolved.resolved_by.as_deref(), Some("agent-1"));
    }

    #[test]
    fn inquiry_type_defaults_to_general_info() {
        let mut patch = viewing_request();
        patch.inquiry_type = None;
        let inquiry: Inquiry = build_entity(&patch, Uuid::new_v4(), 1).unwrap();
        assert_eq!(inquiry.inquiry_type, InquiryType::GeneralInfo);
        assert_eq!(
            serde_json::to_value(InquiryType::PropertyViewing).unwrap(),
            serde_json::json!("property-viewing")
        );
    }
}
