//! Find-or-register flow against the onboarding service.

use onboard_core::{CertificateInfo, EndpointApp, EndpointAppType, OnboardingError, OnboardingService};
use tracing::{debug, info, warn};

use crate::config::AuthMode;
use crate::error::{BootstrapError, KeyMaterialError, Result};
use crate::identity;
use crate::key_material::KeyMaterial;

/// Resolves the endpoint application record for this process, creating it
/// on the first run.
///
/// Registration is keyed by `(name, type)`. An existing record is returned
/// untouched even if the local authentication mode has changed since it was
/// created.
pub struct EndpointAppRegistrar<'a, S: ?Sized> {
    service: &'a S,
}

impl<'a, S: OnboardingService + ?Sized> EndpointAppRegistrar<'a, S> {
    /// Create a registrar talking to `service`
    pub const fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Find the record for `(name, app_type)` or register a new one.
    ///
    /// In [`AuthMode::Cert`] a new record embeds the CN of the root CA and of
    /// the client certificate, so `key_material` must carry a client key
    /// container.
    pub async fn resolve_or_register(
        &self,
        name: &str,
        app_type: EndpointAppType,
        auth_mode: AuthMode,
        key_material: Option<&KeyMaterial>,
    ) -> Result<EndpointApp> {
        if let Some(existing) = self.find(name, app_type).await? {
            debug!(name, id = ?existing.id, "found existing endpoint app");
            return Ok(existing);
        }

        let draft = build_draft(name, app_type, auth_mode, key_material)?;
        info!(name, ?app_type, ?auth_mode, "registering endpoint app");

        match self.service.create_endpoint_app(&draft).await {
            Ok(Some(created)) if !created.application_name.is_empty() => {
                info!(name, id = ?created.id, "endpoint app registered");
                Ok(created)
            }
            Ok(_) => Err(BootstrapError::RegistrationRejected {
                reason: "create returned no endpoint app".to_string(),
            }),
            Err(OnboardingError::Json(e)) => Err(BootstrapError::RegistrationRejected {
                reason: format!("create returned an unreadable body: {e}"),
            }),
            Err(OnboardingError::Conflict { message }) => {
                // Another process registered the same key between our list and create
                warn!(name, %message, "endpoint app already exists, fetching it");
                self.find(name, app_type)
                    .await?
                    .ok_or_else(|| BootstrapError::RegistrationRejected {
                        reason: format!("create conflicted but no record is listed: {message}"),
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, name: &str, app_type: EndpointAppType) -> Result<Option<EndpointApp>> {
        let apps = self.service.list_endpoint_apps().await?.unwrap_or_default();
        debug!(count = apps.len(), "listed endpoint apps");
        Ok(apps.into_iter().find(|app| app.matches(name, app_type)))
    }
}

fn build_draft(
    name: &str,
    app_type: EndpointAppType,
    auth_mode: AuthMode,
    key_material: Option<&KeyMaterial>,
) -> Result<EndpointApp> {
    let draft = EndpointApp::draft(name, app_type);
    if auth_mode != AuthMode::Cert {
        return Ok(draft);
    }

    let material = key_material.ok_or(KeyMaterialError::MissingContainer)?;
    let ca = material.load_ca_certificate()?;
    let root_cn = identity::common_name(ca.der())?;
    let identity = material.load_client_identity()?;
    let subject_name = identity::common_name_from_identity(&identity)?;

    Ok(draft.with_certificate_info(CertificateInfo::new(root_cn, subject_name)))
}
