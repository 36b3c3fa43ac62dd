//! Partial-update plumbing shared by all patch types.
//!
//! # Responsibility
//! - Turn a typed patch into the set of fields it actually carries.
//! - Overlay those fields onto a stored record.
//!
//! # Invariants
//! - A patch field that is `None` never reaches the stored record.
//! - A nullable field patched with `Some(None)` is written as null.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserializes a present-but-null field as `Some(None)`.
///
/// Use with `#[serde(default)]` so an absent field stays `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Serializes a patch into the map of fields it sets.
pub(crate) fn patch_fields<P: Serialize>(patch: &P) -> Result<Map<String, Value>, ValidationError> {
    match serde_json::to_value(patch) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(ValidationError::Malformed(format!(
            "patch must serialize to an object, got {other}"
        ))),
        Err(err) => Err(ValidationError::Malformed(err.to_string())),
    }
}

/// Serializes a stored record into its field map.
pub(crate) fn record_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>, ValidationError> {
    patch_fields(record)
}

/// Overlays patch fields onto `base`. Nested objects are replaced wholesale.
pub(crate) fn overlay(base: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        base.insert(key, value);
    }
}

/// Decodes a field map into a typed record.
pub(crate) fn decode_fields<T: serde::de::DeserializeOwned>(
    fields: Map<String, Value>,
) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| ValidationError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{double_option, overlay, patch_fields};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    struct SamplePatch {
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(
            skip_serializing_if = "Option::is_none",
            deserialize_with = "double_option"
        )]
        agent_id: Option<Option<String>>,
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let fields = patch_fields(&SamplePatch::default()).unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn explicit_null_clears_field() {
        let patch: SamplePatch = serde_json::from_value(json!({ "agentId": null })).unwrap();
        assert_eq!(patch.agent_id, Some(None));

        let mut base = json!({ "title": "Loft", "agentId": "a-1" })
            .as_object()
            .cloned()
            .unwrap();
        overlay(&mut base, patch_fields(&patch).unwrap());
        assert_eq!(base["title"], "Loft");
        assert!(base["agentId"].is_null());
    }
}
