//! Site-wide settings singleton.

use crate::model::content::{EpochMillis, MediaAsset};
use crate::model::patch::{decode_fields, double_option, overlay, patch_fields, record_fields};
use crate::model::validation::{require_email, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficeHours {
    pub monday: Option<String>,
    pub tuesday: Option<String>,
    pub wednesday: Option<String>,
    pub thursday: Option<String>,
    pub friday: Option<String>,
    pub saturday: Option<String>,
    pub sunday: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSocial {
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub youtube: Option<String>,
}

/// Optional site features toggled from the back office.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    pub virtual_tours: bool,
    pub chat_support: bool,
    pub mortgage_calculator: bool,
    pub neighborhoods: bool,
}

/// Global configuration shown across the public site.
///
/// There is exactly one settings record; it is never addressed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub company_name: String,
    pub company_logo: Option<MediaAsset>,
    pub company_description: Option<String>,
    pub contact_email: String,
    pub contact_phone: String,
    pub contact_address: Option<String>,
    pub office_hours: OfficeHours,
    pub social: SiteSocial,
    pub default_seo_title: Option<String>,
    pub default_seo_description: Option<String>,
    pub seo_keywords: Vec<String>,
    pub features_enabled: FeatureFlags,
    /// `None` until the settings are first written.
    pub updated_at: Option<EpochMillis>,
}

impl SiteSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.contact_email.trim().is_empty() {
            require_email("contactEmail", &self.contact_email)?;
        }
        Ok(())
    }

    /// Returns a copy with the patch applied and `updated_at` refreshed.
    pub fn apply_patch(
        &self,
        patch: &SettingsPatch,
        now: EpochMillis,
    ) -> Result<SiteSettings, ValidationError> {
        let mut fields = record_fields(self)?;
        overlay(&mut fields, patch_fields(patch)?);
        let mut next: SiteSettings = decode_fields(fields)?;
        next.updated_at = Some(match self.updated_at {
            Some(previous) => now.max(previous.saturating_add(1)),
            None => now,
        });
        next.validate()?;
        Ok(next)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub company_logo: Option<Option<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub company_description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub contact_address: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_hours: Option<OfficeHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<SiteSocial>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub default_seo_title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub default_seo_description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features_enabled: Option<FeatureFlags>,
}

#[cfg(test)]
mod tests {
    use super::{FeatureFlags, SettingsPatch, SiteSettings};

    #[test]
    fn patch_merges_onto_defaults() {
        let settings = SiteSettings::default();
        let patch = SettingsPatch {
            company_name: Some("Bayside Realty".to_string()),
            features_enabled: Some(FeatureFlags {
                mortgage_calculator: true,
                ..FeatureFlags::default()
            }),
            ..SettingsPatch::default()
        };
        let next = settings.apply_patch(&patch, 42).unwrap();
        assert_eq!(next.company_name, "Bayside Realty");
        assert!(next.features_enabled.mortgage_calculator);
        assert_eq!(next.contact_email, "");
        assert_eq!(next.updated_at, Some(42));
    }

    #[test]
    fn rejects_malformed_contact_email() {
        let patch = SettingsPatch {
            contact_email: Some("office".to_string()),
            ..SettingsPatch::default()
        };
        assert!(SiteSettings::default().apply_patch(&patch, 1).is_err());
    }
}
