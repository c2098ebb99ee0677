use serde::{Deserialize, Serialize};

use super::EndpointApp;

/// SCIM list response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// SCIM schema URIs
    #[serde(default)]
    pub schemas: Vec<String>,

    /// Total number of matching resources
    #[serde(default)]
    pub total_results: Option<u64>,

    /// Returned resources, absent when the service has none
    #[serde(rename = "Resources")]
    pub resources: Option<Vec<T>>,
}

impl<T> ListResponse<T> {
    /// Consume the envelope, returning the resources if any were sent
    #[must_use]
    pub fn into_resources(self) -> Option<Vec<T>> {
        self.resources
    }
}

/// List response for endpoint applications
pub type EndpointAppList = ListResponse<EndpointApp>;
