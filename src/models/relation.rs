//! Nested relation records (a shipment's client or carrier) reach us in several
//! shapes depending on how they were fetched: `null`, missing, an array holding
//! one record, or a bare record. Everything past this module sees a single
//! canonical `Option<RelatedName>`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Display name of a related record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedName {
    pub name: String,
}

impl RelatedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Normalize any JSON shape into a related name; malformed input yields `None`.
pub fn related_name(value: &Value) -> Option<RelatedName> {
    match value {
        Value::Array(items) => items.first().and_then(name_field),
        Value::Object(_) => name_field(value),
        _ => None,
    }
}

fn name_field(value: &Value) -> Option<RelatedName> {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(RelatedName::new)
}

/// `deserialize_with` adapter for nested relation fields.
pub fn deserialize_related<'de, D>(deserializer: D) -> Result<Option<RelatedName>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(related_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({ "name": "Acme" }), Some("Acme"))]
    #[case(json!([{ "name": "Acme" }]), Some("Acme"))]
    #[case(json!([{ "name": "Acme" }, { "name": "Other" }]), Some("Acme"))]
    #[case(json!([]), None)]
    #[case(json!(null), None)]
    #[case(json!({}), None)]
    #[case(json!({ "name": 42 }), None)]
    #[case(json!("Acme"), None)]
    fn test_shapes_normalize(#[case] input: Value, #[case] expected: Option<&str>) {
        assert_eq!(related_name(&input), expected.map(RelatedName::new));
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_related")]
        client: Option<RelatedName>,
    }

    #[test]
    fn test_missing_field_is_none() {
        let holder: Holder = serde_json::from_value(json!({})).unwrap();
        assert_eq!(holder.client, None);
    }

    #[test]
    fn test_array_field_is_flattened() {
        let holder: Holder =
            serde_json::from_value(json!({ "client": [{ "name": "Transports Martin" }] }))
                .unwrap();
        assert_eq!(holder.client, Some(RelatedName::new("Transports Martin")));
    }
}
