use crate::{
    error::AppError,
    hubspot::items::{IntegrationItem, project},
};
use serde::Deserialize;
use serde_json::Value;

/// Properties requested from the contact list endpoint. Exactly the set
/// the projection reads.
const CONTACT_PROPERTIES: &str =
    "firstname,lastname,email,phone,city,company,createdate,lastmodifieddate";

#[derive(Debug, Deserialize)]
struct ContactListResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Thin client for the HubSpot CRM objects API.
pub struct HubSpotClient {
    http_client: reqwest::Client,
    contacts_url: String,
}

impl HubSpotClient {
    pub fn new(contacts_url: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            contacts_url,
        }
    }

    /// Fetch one page of contacts and project them into generic items.
    ///
    /// `credentials` is the raw token record handed out by the OAuth
    /// flow; only its `access_token` field is used. No pagination: the
    /// endpoint's first page is the whole result.
    pub async fn list_contacts(
        &self,
        credentials: &Value,
    ) -> Result<Vec<IntegrationItem>, AppError> {
        let access_token = credentials
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Internal("credential record is missing access_token".to_string())
            })?;

        let response = self
            .http_client
            .get(&self.contacts_url)
            .query(&[("properties", CONTACT_PROPERTIES)])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("contact request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Fetch(format!(
                "contact endpoint returned {}",
                response.status()
            )));
        }

        let list: ContactListResponse = response
            .json()
            .await
            .map_err(|e| AppError::Fetch(format!("unparsable contact response: {}", e)))?;

        Ok(list.results.iter().map(project).collect())
    }
}
