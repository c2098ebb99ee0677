//! Endpoint application API endpoints.

use crate::OnboardingClient;
use onboard_core::{EndpointApp, EndpointAppList, Result};

const ENDPOINT_APPS_PATH: &str = "/EndpointApps";

/// Endpoint application API endpoints
pub struct EndpointAppsApi<'a> {
    client: &'a OnboardingClient,
}

impl<'a> EndpointAppsApi<'a> {
    pub(crate) const fn new(client: &'a OnboardingClient) -> Self {
        Self { client }
    }

    /// List all endpoint applications visible to this client.
    ///
    /// Returns `None` when the service answers without a body or without a
    /// `Resources` member.
    pub async fn list(&self) -> Result<Option<Vec<EndpointApp>>> {
        let list: Option<EndpointAppList> = self.client.get(ENDPOINT_APPS_PATH).await?;
        Ok(list.and_then(EndpointAppList::into_resources))
    }

    /// Register a new endpoint application
    pub async fn create(&self, draft: &EndpointApp) -> Result<Option<EndpointApp>> {
        self.client.post(ENDPOINT_APPS_PATH, draft).await
    }
}
