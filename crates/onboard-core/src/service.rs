//! The onboarding service seam.

use async_trait::async_trait;

use crate::{EndpointApp, Result};

/// Operations the onboarding authority exposes for endpoint applications.
///
/// Both calls return `Ok(None)` when the service answers successfully but
/// without a body.
#[async_trait]
pub trait OnboardingService: Send + Sync {
    /// List the endpoint applications known to the service.
    async fn list_endpoint_apps(&self) -> Result<Option<Vec<EndpointApp>>>;

    /// Submit a draft record and return the record the service stored.
    async fn create_endpoint_app(&self, draft: &EndpointApp) -> Result<Option<EndpointApp>>;
}

#[async_trait]
impl<T: OnboardingService + ?Sized> OnboardingService for &T {
    async fn list_endpoint_apps(&self) -> Result<Option<Vec<EndpointApp>>> {
        (**self).list_endpoint_apps().await
    }

    async fn create_endpoint_app(&self, draft: &EndpointApp) -> Result<Option<EndpointApp>> {
        (**self).create_endpoint_app(draft).await
    }
}
