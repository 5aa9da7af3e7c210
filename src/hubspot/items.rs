use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider-agnostic contact record produced by projection.
///
/// Every field is optional: a contact missing a property simply carries
/// `None` there. Timestamps keep the provider's string form; the JSON
/// keys use camelCase (`createdAt`, `updatedAt`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationItem {
    pub id: Option<String>,
    pub city: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Project one HubSpot contact record into an [`IntegrationItem`].
///
/// Pure pass-through: `id` comes from the record root, the rest from its
/// `properties` map; `createdate` and `lastmodifieddate` land on the
/// generic timestamp fields. Missing or non-string values become `None`.
pub fn project(contact: &Value) -> IntegrationItem {
    let properties = contact.get("properties");
    let property = |name: &str| {
        properties
            .and_then(|props| props.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    IntegrationItem {
        id: contact
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string),
        city: property("city"),
        company: property("company"),
        email: property("email"),
        firstname: property("firstname"),
        lastname: property("lastname"),
        phone: property("phone"),
        created_at: property("createdate"),
        updated_at: property("lastmodifieddate"),
    }
}
