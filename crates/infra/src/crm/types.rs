//! Wire types for the provider's REST surface.
//!
//! Request bodies serialize with the provider's camelCase field names; the
//! introspection endpoint alone answers in snake_case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Exact-match contact search request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub filter_groups: Vec<FilterGroup>,
    pub limit: u32,
}

impl SearchRequest {
    /// Search for the single contact whose `property` equals `value`.
    #[must_use]
    pub fn exact_match(property: &str, value: &str) -> Self {
        Self {
            filter_groups: vec![FilterGroup {
                filters: vec![Filter {
                    property_name: property.to_string(),
                    operator: "EQ".to_string(),
                    value: value.to_string(),
                }],
            }],
            limit: 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub property_name: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: String,
}

/// Contact object read, narrowed to the name/email properties.
#[derive(Debug, Deserialize)]
pub struct ContactResponse {
    pub id: String,
    #[serde(default)]
    pub properties: ContactProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactProperties {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
}

/// Contact→company association read.
#[derive(Debug, Deserialize)]
pub struct AssociationsResponse {
    #[serde(default)]
    pub results: Vec<AssociationResult>,
}

#[derive(Debug, Deserialize)]
pub struct AssociationResult {
    pub id: String,
}

/// Timeline event post. Addressed by object id when the contact is resolved
/// and by email otherwise; never both.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventRequest {
    pub event_template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub tokens: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEventResponse {
    #[serde(default)]
    pub object_id: Option<String>,
}

/// Token introspection answer (snake_case on the wire).
#[derive(Debug, Deserialize)]
pub struct AccessTokenInfo {
    pub user: Option<String>,
    pub user_id: Option<i64>,
    pub hub_id: Option<i64>,
}

/// User settings read used to resolve the authenticated user's full name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsResponse {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_serializes_with_provider_field_names() {
        let request = SearchRequest::exact_match("phone", "+15551234567");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["limit"], 1);
        let filter = &json["filterGroups"][0]["filters"][0];
        assert_eq!(filter["propertyName"], "phone");
        assert_eq!(filter["operator"], "EQ");
        assert_eq!(filter["value"], "+15551234567");
    }

    #[test]
    fn timeline_request_omits_absent_addressing() {
        let by_email = TimelineEventRequest {
            event_template_id: "42".to_string(),
            object_id: None,
            email: Some("a@b.com".to_string()),
            tokens: BTreeMap::new(),
        };
        let json = serde_json::to_value(&by_email).unwrap();
        assert_eq!(json["eventTemplateId"], "42");
        assert_eq!(json["email"], "a@b.com");
        assert!(json.get("objectId").is_none());
    }

    #[test]
    fn introspection_parses_snake_case() {
        let info: AccessTokenInfo = serde_json::from_str(
            r#"{"user":"agent@example.com","user_id":77,"hub_id":4242}"#,
        )
        .unwrap();
        assert_eq!(info.user.as_deref(), Some("agent@example.com"));
        assert_eq!(info.user_id, Some(77));
        assert_eq!(info.hub_id, Some(4242));
    }
}
