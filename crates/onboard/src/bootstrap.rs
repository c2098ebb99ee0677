//! Composition root: registrar, then resolver, then HTTP client settings.

use onboard_client::OnboardingClient;
use onboard_core::{EndpointApp, OnboardingService};
use tracing::info;

use crate::auth::{Authenticator, AuthenticatorResolver};
use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};
use crate::key_material::KeyMaterial;
use crate::registrar::EndpointAppRegistrar;

/// The resolved endpoint app and the authenticator built for it
#[derive(Debug, Clone)]
pub struct Bootstrapped {
    /// Record held by the onboarding service
    pub endpoint_app: EndpointApp,
    /// Credentials for the control service
    pub authenticator: Authenticator,
}

impl Bootstrapped {
    /// Build an HTTP client carrying the resolved credentials
    pub fn http_client(&self) -> Result<reqwest::Client> {
        self.authenticator
            .configure(reqwest::Client::builder())?
            .build()
            .map_err(|e| BootstrapError::Config(format!("control client: {e}")))
    }
}

/// Runs find-or-register and authenticator resolution once at startup
pub struct ClientBootstrapper<S> {
    config: BootstrapConfig,
    key_material: KeyMaterial,
    service: S,
}

impl ClientBootstrapper<OnboardingClient> {
    /// Build the onboarding client from configuration.
    ///
    /// The onboarding client trusts the configured root CA.
    pub fn from_config(config: BootstrapConfig) -> Result<Self> {
        let key_material = config.key_material();
        let ca = key_material.load_ca_certificate()?;

        let service = OnboardingClient::builder(&config.onboarding.url)
            .timeout(config.onboarding.timeout())
            .root_certificate_pem(ca.to_pem())
            .build()
            .map_err(|e| BootstrapError::Config(e.to_string()))?;

        Ok(Self {
            config,
            key_material,
            service,
        })
    }
}

impl<S: OnboardingService> ClientBootstrapper<S> {
    /// Use an already constructed onboarding service
    pub fn new(config: BootstrapConfig, service: S) -> Self {
        let key_material = config.key_material();
        Self {
            config,
            key_material,
            service,
        }
    }

    /// Replace the key material derived from configuration
    #[must_use]
    pub fn with_key_material(mut self, key_material: KeyMaterial) -> Self {
        self.key_material = key_material;
        self
    }

    /// Resolve the endpoint app and build its authenticator
    pub async fn bootstrap(&self) -> Result<Bootstrapped> {
        let app = &self.config.application;
        let endpoint_app = EndpointAppRegistrar::new(&self.service)
            .resolve_or_register(
                &app.name,
                app.app_type,
                app.auth_mode,
                Some(&self.key_material),
            )
            .await?;

        let authenticator = AuthenticatorResolver::new(&self.key_material).resolve(&endpoint_app)?;
        info!(
            app = %endpoint_app.application_name,
            certificate = authenticator.is_certificate(),
            "bootstrap complete"
        );

        Ok(Bootstrapped {
            endpoint_app,
            authenticator,
        })
    }
}
