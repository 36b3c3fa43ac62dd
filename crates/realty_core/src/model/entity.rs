//! Entity contract and create/patch construction rules.
//!
//! # Responsibility
//! - Describe what the repository needs to know about each entity type.
//! - Build new records from patches and merge patches onto stored records,
//!   independent of any storage backend.
//!
//! # Invariants
//! - `id` and `createdAt` are never taken from caller input.
//! - `updatedAt` strictly increases on every successful merge.
//! - Every record returned from here has passed `Entity::validate()`.

use crate::model::content::{ContentMeta, ContentStatus, ContentType, EntityId, EpochMillis};
use crate::model::patch::{decode_fields, overlay, patch_fields, record_fields};
use crate::model::validation::ValidationError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A content record stored in one repository collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Partial-update shape; also the input of create.
    type Patch: Serialize + Send + Sync;

    const CONTENT_TYPE: ContentType;

    /// Wire names of fields a create patch must carry.
    const REQUIRED_FIELDS: &'static [&'static str];

    fn meta(&self) -> &ContentMeta;
    fn meta_mut(&mut self) -> &mut ContentMeta;

    fn id(&self) -> EntityId {
        self.meta().id
    }

    /// Slug used for `get_*_by_slug`, if the entity type has one.
    fn slug(&self) -> Option<&str> {
        None
    }

    /// Fills derived fields (slugs, display names) left blank by the caller.
    fn normalize(&mut self) {}

    fn validate(&self) -> Result<(), ValidationError>;

    /// Short human label used in search hits and logs.
    fn display_title(&self) -> String;

    /// Free text indexed for search.
    fn search_text(&self) -> String;
}

/// Builds a new record from a create patch.
///
/// # Errors
/// - `MissingField` when a required field is absent or null.
/// - `Malformed` when a field has the wrong type or enum value.
/// - Any error from `Entity::validate()`.
pub fn build_entity<E: Entity>(
    patch: &E::Patch,
    id: EntityId,
    now: EpochMillis,
) -> Result<E, ValidationError> {
    let mut fields = patch_fields(patch)?;
    for required in E::REQUIRED_FIELDS {
        match fields.get(*required) {
            None | Some(Value::Null) => {
                return Err(ValidationError::MissingField((*required).to_string()))
            }
            Some(_) => {}
        }
    }

    if matches!(fields.get("status"), None | Some(Value::Null)) {
        fields.insert(
            "status".to_string(),
            Value::String(ContentStatus::Draft.as_str().to_string()),
        );
    }
    fields.insert("id".to_string(), Value::String(id.to_string()));
    fields.insert("createdAt".to_string(), Value::from(now));
    fields.insert("updatedAt".to_string(), Value::from(now));

    let mut entity: E = decode_fields(fields)?;
    finish(&mut entity)?;
    Ok(entity)
}

/// Merges an update patch onto a stored record.
///
/// The returned record keeps the stored `id` and `createdAt` and carries a
/// refreshed `updatedAt`.
pub fn apply_patch<E: Entity>(
    current: &E,
    patch: &E::Patch,
    now: EpochMillis,
) -> Result<E, ValidationError> {
    let mut fields = record_fields(current)?;
    overlay(&mut fields, patch_fields(patch)?);

    let mut entity: E = decode_fields(fields)?;
    let stored = current.meta();
    let meta = entity.meta_mut();
    meta.id = stored.id;
    meta.created_at = stored.created_at;
    meta.updated_at = next_updated_at(stored.updated_at, now);
    finish(&mut entity)?;
    Ok(entity)
}

/// Returns a timestamp strictly after `previous`.
pub fn next_updated_at(previous: EpochMillis, now: EpochMillis) -> EpochMillis {
    now.max(previous.saturating_add(1))
}

/// Derives blank fields, stamps first publication, then validates.
fn finish<E: Entity>(entity: &mut E) -> Result<(), ValidationError> {
    entity.normalize();
    let meta = entity.meta_mut();
    if meta.status == ContentStatus::Published && meta.published_at.is_none() {
        meta.published_at = Some(meta.updated_at);
    }
    entity.validate()
}
