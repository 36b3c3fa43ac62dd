//! Lead/client model used by the admin back office.

use crate::model::agent::{compose_full_name, require_person_name};
use crate::model::content::{ContentMeta, ContentStatus, ContentType, EntityId, EpochMillis};
use crate::model::entity::Entity;
use crate::model::patch::double_option;
use crate::model::property::join_text;
use crate::model::validation::{require_email, require_non_negative, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientType {
    Buyer,
    Seller,
    Renter,
    Investor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactMethod {
    Email,
    Phone,
    Text,
}

/// Saved search preferences of a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientPreferences {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub locations: Vec<String>,
    pub property_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(flatten)]
    pub meta: ContentMeta,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub client_type: ClientType,
    #[serde(default)]
    pub preferences: ClientPreferences,
    /// Weak reference to the responsible agent.
    #[serde(default)]
    pub assigned_agent_id: Option<EntityId>,
    /// Weak references to properties the lead asked about.
    #[serde(default)]
    pub interested_properties: Vec<EntityId>,
    #[serde(default)]
    pub preferred_contact: Option<ContactMethod>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub last_contact: Option<EpochMillis>,
    #[serde(default)]
    pub next_follow_up: Option<EpochMillis>,
    #[serde(default)]
    pub lead_source: Option<String>,
    /// 0 to 100.
    #[serde(default)]
    pub lead_score: Option<u8>,
}

impl Entity for Client {
    type Patch = ClientPatch;

    const CONTENT_TYPE: ContentType = ContentType::Client;
    const REQUIRED_FIELDS: &'static [&'static str] = &["email", "clientType"];

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn normalize(&mut self) {
        if self.full_name.trim().is_empty() {
            self.full_name = compose_full_name(&self.first_name, &self.last_name);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_person_name(&self.first_name, &self.last_name)?;
        require_email("email", &self.email)?;

        let preferences = &self.preferences;
        if let Some(min_price) = preferences.min_price {
            require_non_negative("preferences.minPrice", min_price)?;
        }
        if let Some(max_price) = preferences.max_price {
            require_non_negative("preferences.maxPrice", max_price)?;
        }
        if let (Some(min_price), Some(max_price)) = (preferences.min_price, preferences.max_price) {
            if min_price > max_price {
                return Err(ValidationError::invalid(
                    "preferences.minPrice",
                    "must not exceed maxPrice",
                ));
            }
        }
        if let Some(bathrooms) = preferences.bathrooms {
            require_non_negative("preferences.bathrooms", bathrooms)?;
        }
        if self.lead_score.is_some_and(|score| score > 100) {
            return Err(ValidationError::invalid("leadScore", "must be between 0 and 100"));
        }
        Ok(())
    }

    fn display_title(&self) -> String {
        self.full_name.clone()
    }

    fn search_text(&self) -> String {
        let mut parts = vec![self.full_name.clone(), self.email.clone()];
        parts.extend(self.phone.iter().cloned());
        parts.extend(self.notes.iter().cloned());
        parts.extend(self.lead_source.iter().cloned());
        parts.extend(self.preferences.locations.iter().cloned());
        join_text(parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientPatch {
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
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<ClientPreferences>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub assigned_agent_id: Option<Option<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interested_properties: Option<Vec<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub preferred_contact: Option<Option<ContactMethod>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub last_contact: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub next_follow_up: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub lead_source: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub lead_score: Option<Option<u8>>,
}

#[cfg(test)]
mod tests {
    use super::{Client, ClientPatch, ClientPreferences, ClientType};
    use crate::model::entity::build_entity;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn buyer() -> ClientPatch {
        ClientPatch {
            first_name: Some("Sam".to_string()),
            email: Some("sam@example.com".to_string()),
            client_type: Some(ClientType::Buyer),
            ..ClientPatch::default()
        }
    }

    #[test]
    fn requires_client_type() {
        let mut patch = buyer();
        patch.client_type = None;
        let err = build_entity::<Client>(&patch, Uuid::new_v4(), 1).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("clientType".to_string()));
    }

    #[test]
    fn rejects_inverted_price_range() {
        let mut patch = buyer();
        patch.preferences = Some(ClientPreferences {
            min_price: Some(900_000.0),
            max_price: Some(500_000.0),
            ..ClientPreferences::default()
        });
        assert!(build_entity::<Client>(&patch, Uuid::new_v4(), 1).is_err());
    }

    #[test]
    fn full_name_uses_available_parts() {
        let client: Client = build_entity(&buyer(), Uuid::new_v4(), 1).unwrap();
        assert_eq!(client.full_name, "Sam");
    }
}
