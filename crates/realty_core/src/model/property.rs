//! Property listing model.
//!
//! # Invariants
//! - `slug` is URL-safe and unique among properties (uniqueness is enforced
//!   by the repository, shape by `validate()`).
//! - `price` is finite and non-negative.
//! - `agent_id` is a weak reference; the agent may no longer exist.

use crate::model::content::{ContentMeta, ContentStatus, ContentType, EntityId, EpochMillis, MediaAsset};
use crate::model::entity::Entity;
use crate::model::patch::double_option;
use crate::model::validation::{
    require_non_blank, require_non_negative, require_range, require_slug, slug_or_fallback,
    ValidationError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    #[default]
    Residential,
    Commercial,
    Land,
    MultiFamily,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingType {
    #[default]
    Sale,
    Rent,
    Lease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PetPolicy {
    Allowed,
    NotAllowed,
    CaseByCase,
}

/// Engagement counter kept on a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCounter {
    Views,
    Inquiries,
}

impl PropertyCounter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Inquiries => "inquiries",
        }
    }
}

/// Structured postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub full_address: Option<String>,
}

impl Address {
    /// Returns `full_address` or a comma-joined rendering of the parts.
    pub fn display(&self) -> String {
        if let Some(full) = self.full_address.as_deref().filter(|v| !v.trim().is_empty()) {
            return full.to_string();
        }
        let state_zip = [self.state.trim(), self.zip_code.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        [self.street.trim(), self.city.trim(), state_zip.as_str(), self.country.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Real-estate listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Preformatted price, e.g. `$1,850,000`.
    #[serde(default)]
    pub price_display: Option<String>,
    #[serde(default)]
    pub address: Address,
    /// Short label such as `San Francisco, CA`.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub listing_type: ListingType,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: f64,
    #[serde(default)]
    pub sqft: u32,
    #[serde(default)]
    pub lot_size: Option<f64>,
    #[serde(default)]
    pub year_built: Option<u16>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<MediaAsset>,
    #[serde(default)]
    pub main_image: Option<MediaAsset>,
    #[serde(default)]
    pub virtual_tour_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub floor_plan_images: Vec<MediaAsset>,
    #[serde(default)]
    pub agent_id: Option<EntityId>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub inquiries: u64,
    #[serde(default)]
    pub saved_count: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub school_district: Option<String>,
    #[serde(default)]
    pub hoa_fees: Option<f64>,
    #[serde(default)]
    pub parking_spaces: Option<u32>,
    #[serde(default)]
    pub pet_policy: Option<PetPolicy>,
}

impl Property {
    /// Designated main image: explicit `main_image`, else the first image.
    pub fn main_image(&self) -> Option<&MediaAsset> {
        self.main_image.as_ref().or_else(|| self.images.first())
    }
}

impl Entity for Property {
    type Patch = PropertyPatch;

    const CONTENT_TYPE: ContentType = ContentType::Property;
    const REQUIRED_FIELDS: &'static [&'static str] = &["title", "price"];

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
            self.slug = slug_or_fallback(&self.title, "listing", self.meta.id);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("title", &self.title)?;
        require_slug("slug", &self.slug)?;
        require_non_negative("price", self.price)?;
        require_non_negative("bathrooms", self.bathrooms)?;
        if let Some(coordinates) = self.coordinates {
            require_range("coordinates.lat", coordinates.lat, -90.0, 90.0)?;
            require_range("coordinates.lng", coordinates.lng, -180.0, 180.0)?;
        }
        if let Some(lot_size) = self.lot_size {
            require_non_negative("lotSize", lot_size)?;
        }
        if let Some(hoa_fees) = self.hoa_fees {
            require_non_negative("hoaFees", hoa_fees)?;
        }
        Ok(())
    }

    fn display_title(&self) -> String {
        self.title.clone()
    }

    fn search_text(&self) -> String {
        let mut parts = vec![
            self.description.clone(),
            self.location.clone(),
            self.address.display(),
        ];
        parts.extend(self.neighborhood.iter().cloned());
        parts.extend(self.features.iter().cloned());
        parts.extend(self.amenities.iter().cloned());
        parts.extend(self.tags.iter().cloned());
        join_text(parts)
    }
}

/// Partial property input for create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub published_at: Option<Option<EpochMillis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub price_display: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub coordinates: Option<Option<Coordinates>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqft: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub lot_size: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub year_built: Option<Option<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub main_image: Option<Option<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub virtual_tour_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub video_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_plan_images: Option<Vec<MediaAsset>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub agent_id: Option<Option<EntityId>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub seo_title: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub seo_description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquiries: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub neighborhood: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub school_district: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub hoa_fees: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub parking_spaces: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "double_option")]
    pub pet_policy: Option<Option<PetPolicy>>,
}

pub(crate) fn join_text(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{Address, Property, PropertyPatch, PropertyType};
    use crate::model::content::{ContentStatus, MediaAsset};
    use crate::model::entity::{apply_patch, build_entity};
    use crate::model::validation::ValidationError;
    use serde_json::json;
    use uuid::Uuid;

    fn loft_patch() -> PropertyPatch {
        PropertyPatch {
            title: Some("Loft".to_string()),
            slug: Some("loft-1".to_string()),
            price: Some(100_000.0),
            status: Some(ContentStatus::Draft),
            ..PropertyPatch::default()
        }
    }

    #[test]
    fn build_assigns_identity_and_defaults() {
        let id = Uuid::new_v4();
        let property: Property = build_entity(&loft_patch(), id, 1_000).unwrap();
        assert_eq!(property.meta.id, id);
        assert_eq!(property.meta.created_at, 1_000);
        assert_eq!(property.meta.updated_at, 1_000);
        assert_eq!(property.meta.status, ContentStatus::Draft);
        assert_eq!(property.property_type, PropertyType::Residential);
        assert!(property.features.is_empty());
        assert_eq!(property.views, 0);
    }

    #[test]
    fn build_derives_slug_from_title() {
        let patch = PropertyPatch {
            title: Some("Modern Downtown Loft".to_string()),
            price: Some(1.0),
            ..PropertyPatch::default()
        };
        let property: Property = build_entity(&patch, Uuid::new_v4(), 1).unwrap();
        assert_eq!(property.slug, "modern-downtown-loft");
    }

    #[test]
    fn build_requires_title_and_price() {
        let patch = PropertyPatch {
            title: Some("No price".to_string()),
            ..PropertyPatch::default()
        };
        let err = build_entity::<Property>(&patch, Uuid::new_v4(), 1).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("price".to_string()));
    }

    #[test]
    fn build_rejects_non_numeric_price_from_json() {
        let patch: Result<PropertyPatch, _> =
            serde_json::from_value(json!({ "title": "Loft", "price": "a lot" }));
        assert!(patch.is_err());
    }

    #[test]
    fn build_rejects_negative_price_and_bad_slug() {
        let mut patch = loft_patch();
        patch.price = Some(-1.0);
        assert!(matches!(
            build_entity::<Property>(&patch, Uuid::new_v4(), 1),
            Err(ValidationError::InvalidField { ref field, .. }) if field == "price"
        ));

        let mut patch = loft_patch();
        patch.slug = Some("Loft 1".to_string());
        assert!(matches!(
            build_entity::<Property>(&patch, Uuid::new_v4(), 1),
            Err(ValidationError::InvalidField { ref field, .. }) if field == "slug"
        ));
    }

    #[test]
    fn publishing_stamps_published_at_once() {
        let property: Property = build_entity(&loft_patch(), Uuid::new_v4(), 10).unwrap();
        assert!(property.meta.published_at.is_none());

        let publish = PropertyPatch {
            status: Some(ContentStatus::Published),
            ..PropertyPatch::default()
        };
        let published = apply_patch(&property, &publish, 20).unwrap();
        assert_eq!(published.meta.published_at, Some(20));

        let reprice = PropertyPatch {
            price: Some(90_000.0),
            ..PropertyPatch::default()
        };
        let repriced = apply_patch(&published, &reprice, 30).unwrap();
        assert_eq!(repriced.meta.published_at, Some(20));
    }

    #[test]
    fn patch_changes_only_supplied_fields() {
        let property: Property = build_entity(&loft_patch(), Uuid::new_v4(), 10).unwrap();
        let patch = PropertyPatch {
            bedrooms: Some(3),
            ..PropertyPatch::default()
        };
        let updated = apply_patch(&property, &patch, 5).unwrap();

        assert_eq!(updated.bedrooms, 3);
        assert_eq!(updated.meta.updated_at, 11);
        let mut expected = property.clone();
        expected.bedrooms = 3;
        expected.meta.updated_at = 11;
        assert_eq!(updated, expected);
    }

    #[test]
    fn main_image_falls_back_to_first_image() {
        let mut property: Property = build_entity(&loft_patch(), Uuid::new_v4(), 1).unwrap();
        assert!(property.main_image().is_none());
        property.images = vec![
            MediaAsset::from_url("a", "/media/a/front.jpg"),
            MediaAsset::from_url("b", "/media/b/back.jpg"),
        ];
        assert_eq!(property.main_image().map(|image| image.id.as_str()), Some("a"));
        property.main_image = Some(MediaAsset::from_url("b", "/media/b/back.jpg"));
        assert_eq!(property.main_image().map(|image| image.id.as_str()), Some("b"));
    }

    #[test]
    fn address_display_joins_parts() {
        let address = Address {
            street: "1 Market St".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip_code: "94105".to_string(),
            country: "USA".to_string(),
            full_address: None,
        };
        assert_eq!(address.display(), "1 Market St, San Francisco, CA 94105, USA");
    }

    #[test]
    fn enums_use_kebab_case_on_the_wire() {
        assert_eq!(
            serde_json::to_value(PropertyType::MultiFamily).unwrap(),
            json!("multi-family")
        );
    }
}
