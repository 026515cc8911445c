//! Inbound lead payloads and their mapping onto the Lawmatics prospect API.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::RelayError;
use crate::state::AppState;

/// A lead as posted by integrators (web forms, intake tools)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    /// Free-text description of the matter
    pub summary: Option<String>,
    /// Classification value for an optional Lawmatics custom field
    pub type_of_client: Option<String>,
    /// Identifier of the custom field the classification belongs to.
    /// Lawmatics field ids may be numeric or string, so this stays a Value.
    pub custom_field_id: Option<Value>,
}

impl LeadPayload {
    /// A lead is only useful with someone to contact
    pub fn validate(&self) -> Result<(), RelayError> {
        let has_first = self.first_name.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_last = self.last_name.as_deref().is_some_and(|s| !s.trim().is_empty());

        if !has_first || !has_last {
            return Err(RelayError::Validation(
                "firstName and lastName are required".to_string(),
            ));
        }

        Ok(())
    }

    /// Map onto the prospect schema Lawmatics expects. Absent address parts
    /// become empty strings, the country defaults to US, and the custom field
    /// is attached only when both its id and a value were supplied.
    pub fn to_prospect(&self) -> Value {
        let mut prospect = json!({
            "first_name": self.first_name,
            "last_name": self.last_name,
            "email": self.email,
            "cell_phone_number": self.phone,
            "address": {
                "address_line_1": self.address1.clone().unwrap_or_default(),
                "address_line_2": self.address2.clone().unwrap_or_default(),
                "city": self.city.clone().unwrap_or_default(),
                "state": self.state.clone().unwrap_or_default(),
                "zip": self.zip.clone().unwrap_or_default(),
                "country": self.country.clone().unwrap_or_else(|| "US".to_string()),
            },
            "lead_details": self.summary.clone().unwrap_or_default(),
        });

        if let (Some(type_of_client), Some(field_id)) = (&self.type_of_client, &self.custom_field_id)
        {
            prospect["custom_field_values"] = json!([{
                "custom_field_id": field_id,
                "value": type_of_client,
            }]);
        }

        prospect
    }
}

/// Validate, map, and submit a lead to Lawmatics exactly once.
///
/// Token errors from the lifecycle manager propagate unchanged so the HTTP
/// layer can report why the relay could not authenticate. A downstream
/// rejection is reported as-is; there is no automatic retry.
pub async fn submit_lead(state: &AppState, payload: &LeadPayload) -> Result<Value, RelayError> {
    payload.validate()?;
    let prospect = payload.to_prospect();

    let access_token = state.tokens.get_valid_access_token().await?;

    let url = state.settings.prospects_url();
    let response = state
        .http
        .post(&url)
        .bearer_auth(access_token)
        .json(&prospect)
        .send()
        .await
        .map_err(|err| RelayError::SubmissionFailed(format!("request to {url} failed: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RelayError::SubmissionFailed(format!(
            "Lawmatics returned {status}: {body}"
        )));
    }

    let data = response
        .json::<Value>()
        .await
        .map_err(|err| RelayError::SubmissionFailed(format!("could not parse response: {err}")))?;

    info!("Lead submitted to Lawmatics");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_lead() -> LeadPayload {
        LeadPayload {
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("j@x.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_last_name_fails_validation() {
        let lead = LeadPayload {
            first_name: Some("John".to_string()),
            ..Default::default()
        };
        assert!(matches!(lead.validate(), Err(RelayError::Validation(_))));
    }

    #[test]
    fn whitespace_only_names_fail_validation() {
        let lead = LeadPayload {
            first_name: Some("  ".to_string()),
            last_name: Some("Doe".to_string()),
            ..Default::default()
        };
        assert!(matches!(lead.validate(), Err(RelayError::Validation(_))));
    }

    #[test]
    fn complete_names_pass_validation() {
        assert!(minimal_lead().validate().is_ok());
    }

    #[test]
    fn minimal_lead_maps_with_defaults() {
        let prospect = minimal_lead().to_prospect();

        assert_eq!(prospect["first_name"], "John");
        assert_eq!(prospect["last_name"], "Doe");
        assert_eq!(prospect["email"], "j@x.com");
        assert_eq!(prospect["cell_phone_number"], Value::Null);
        assert_eq!(prospect["lead_details"], "");

        let address = &prospect["address"];
        for field in ["address_line_1", "address_line_2", "city", "state", "zip"] {
            assert_eq!(address[field], "", "expected empty {field}");
        }
        assert_eq!(address["country"], "US");

        // Not even a null placeholder
        assert!(prospect.get("custom_field_values").is_none());
    }

    #[test]
    fn full_address_is_passed_through() {
        let lead = LeadPayload {
            phone: Some("555-0100".to_string()),
            address1: Some("1 Main St".to_string()),
            address2: Some("Suite 2".to_string()),
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
            zip: Some("62701".to_string()),
            country: Some("CA".to_string()),
            summary: Some("Car accident".to_string()),
            ..minimal_lead()
        };

        let prospect = lead.to_prospect();
        assert_eq!(prospect["cell_phone_number"], "555-0100");
        assert_eq!(prospect["address"]["address_line_1"], "1 Main St");
        assert_eq!(prospect["address"]["country"], "CA");
        assert_eq!(prospect["lead_details"], "Car accident");
    }

    #[test]
    fn custom_field_requires_both_value_and_id() {
        // Classification without a field id: no custom_field_values key
        let lead = LeadPayload {
            type_of_client: Some("Real Estate".to_string()),
            ..minimal_lead()
        };
        assert!(lead.to_prospect().get("custom_field_values").is_none());

        // Field id without a classification: same
        let lead = LeadPayload {
            custom_field_id: Some(json!(42)),
            ..minimal_lead()
        };
        assert!(lead.to_prospect().get("custom_field_values").is_none());

        // Both supplied: attached as a single-element list
        let lead = LeadPayload {
            type_of_client: Some("Real Estate".to_string()),
            custom_field_id: Some(json!(42)),
            ..minimal_lead()
        };
        let prospect = lead.to_prospect();
        assert_eq!(
            prospect["custom_field_values"],
            json!([{"custom_field_id": 42, "value": "Real Estate"}])
        );
    }

    #[test]
    fn camel_case_payload_deserializes() {
        let lead: LeadPayload = serde_json::from_str(
            r#"{
                "firstName": "Jane",
                "lastName": "Roe",
                "typeOfClient": "Family Law",
                "customFieldId": "cf_19"
            }"#,
        )
        .unwrap();

        assert_eq!(lead.first_name.as_deref(), Some("Jane"));
        assert_eq!(lead.type_of_client.as_deref(), Some("Family Law"));
        assert_eq!(lead.custom_field_id, Some(json!("cf_19")));
    }
}
