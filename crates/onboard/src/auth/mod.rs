//! Authenticator selection for the control-service client.

mod api_key;
mod certificate;

pub use api_key::{ApiKeyAuthenticator, API_KEY_HEADER, APP_ID_HEADER};
pub use certificate::CertificateAuthenticator;

use onboard_core::EndpointApp;
use reqwest::ClientBuilder;
use tracing::info;

use crate::error::{KeyMaterialError, Result};
use crate::key_material::KeyMaterial;

/// Transport credentials for the control service
#[derive(Debug, Clone)]
pub enum Authenticator {
    /// Mutual TLS with the client certificate
    Certificate(CertificateAuthenticator),
    /// API key headers over server-authenticated TLS
    ApiKey(ApiKeyAuthenticator),
}

impl Authenticator {
    /// Returns true for the mutual-TLS variant
    #[must_use]
    pub const fn is_certificate(&self) -> bool {
        matches!(self, Self::Certificate(_))
    }

    /// Apply trust anchor and credentials to an HTTP client builder
    pub fn configure(&self, builder: ClientBuilder) -> Result<ClientBuilder> {
        match self {
            Self::Certificate(auth) => Ok(auth.configure(builder)?),
            Self::ApiKey(auth) => Ok(auth.configure(builder)),
        }
    }
}

/// Chooses and builds the authenticator for a resolved endpoint app.
///
/// Certificate info on the record is the discriminator: when present the
/// certificate path is taken even if a client token is also set.
pub struct AuthenticatorResolver<'a> {
    key_material: &'a KeyMaterial,
}

impl<'a> AuthenticatorResolver<'a> {
    /// Resolve against the given key material
    #[must_use]
    pub const fn new(key_material: &'a KeyMaterial) -> Self {
        Self { key_material }
    }

    /// Build the authenticator for `app`
    pub fn resolve(&self, app: &EndpointApp) -> Result<Authenticator> {
        let ca = self.key_material.load_ca_certificate()?;

        if app.certificate_info.is_some() {
            let client = self.key_material.load_client_identity()?;
            let auth = CertificateAuthenticator::new(&ca, &client)?;
            info!(app = %app.application_name, subject = auth.subject(), "using certificate authenticator");
            return Ok(Authenticator::Certificate(auth));
        }

        let token = app
            .client_token
            .as_deref()
            .ok_or_else(|| KeyMaterialError::MissingClientToken(app.application_name.clone()))?;
        let auth = ApiKeyAuthenticator::new(&ca, &app.application_name, token)?;
        info!(app = %app.application_name, "using API key authenticator");
        Ok(Authenticator::ApiKey(auth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootstrapError;
    use crate::error::IdentityError;
    use crate::key_material::testutil::{pkcs12, pki, pki_with_client_dn};
    use crate::key_material::MaterialSource;
    use onboard_core::{CertificateInfo, EndpointAppType};

    fn material(with_container: bool) -> KeyMaterial {
        let pki = pki("Example Root", "ctrl-1");
        let material = KeyMaterial::new(MaterialSource::bytes(pki.ca_pem.clone()));
        if with_container {
            material.with_client_container(MaterialSource::bytes(pkcs12(&pki, "pw")), "pw")
        } else {
            material
        }
    }

    fn app(cert: bool, token: Option<&str>) -> EndpointApp {
        let mut app = EndpointApp::draft("ctrl-1", EndpointAppType::DeviceControl);
        if cert {
            app.certificate_info = Some(CertificateInfo::new("Example Root", "ctrl-1"));
        }
        app.client_token = token.map(str::to_string);
        app
    }

    #[test]
    fn certificate_info_selects_certificate() {
        let material = material(true);
        let auth = AuthenticatorResolver::new(&material)
            .resolve(&app(true, None))
            .unwrap();

        match auth {
            Authenticator::Certificate(cert) => assert_eq!(cert.subject(), "ctrl-1"),
            other => panic!("expected certificate authenticator, got {other:?}"),
        }
    }

    #[test]
    fn certificate_takes_priority_over_token() {
        let material = material(true);
        let auth = AuthenticatorResolver::new(&material)
            .resolve(&app(true, Some("tok")))
            .unwrap();
        assert!(auth.is_certificate());
    }

    #[test]
    fn token_selects_api_key() {
        let material = material(false);
        let auth = AuthenticatorResolver::new(&material)
            .resolve(&app(false, Some("tok-123")))
            .unwrap();

        match auth {
            Authenticator::ApiKey(key) => {
                assert_eq!(key.app_id(), "ctrl-1");
                assert_eq!(key.headers()[API_KEY_HEADER], "tok-123");
                assert_eq!(key.headers()[APP_ID_HEADER], "ctrl-1");
                assert!(key.headers()[API_KEY_HEADER].is_sensitive());
            }
            other => panic!("expected API key authenticator, got {other:?}"),
        }
    }

    #[test]
    fn missing_token_is_key_material_error() {
        let material = material(true);
        let err = AuthenticatorResolver::new(&material)
            .resolve(&app(false, None))
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::KeyMaterial(KeyMaterialError::MissingClientToken(_))
        ));
    }

    #[test]
    fn empty_token_is_key_material_error() {
        let material = material(false);
        let err = AuthenticatorResolver::new(&material)
            .resolve(&app(false, Some("")))
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::KeyMaterial(KeyMaterialError::MissingClientToken(_))
        ));
    }

    #[test]
    fn certificate_record_without_container_fails() {
        let material = material(false);
        let err = AuthenticatorResolver::new(&material)
            .resolve(&app(true, None))
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::KeyMaterial(KeyMaterialError::MissingContainer)
        ));
    }

    #[test]
    fn client_certificate_without_cn_fails() {
        let mut dn = rcgen::DistinguishedName::new();
        dn.push(rcgen::DnType::OrganizationName, "Example");
        let pki = pki_with_client_dn("Example Root", dn);
        let material = KeyMaterial::new(MaterialSource::bytes(pki.ca_pem.clone()))
            .with_client_container(MaterialSource::bytes(pkcs12(&pki, "pw")), "pw");

        let err = AuthenticatorResolver::new(&material)
            .resolve(&app(true, None))
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::IdentityExtraction(IdentityError::MissingCommonName)
        ));
    }

    #[test]
    fn unreadable_ca_fails_both_paths() {
        let material = KeyMaterial::new(MaterialSource::path("/nonexistent/ca.pem"));
        let resolver = AuthenticatorResolver::new(&material);
        for record in [app(true, None), app(false, Some("tok"))] {
            assert!(matches!(
                resolver.resolve(&record),
                Err(BootstrapError::KeyMaterial(KeyMaterialError::Io { .. }))
            ));
        }
    }

    #[test]
    fn authenticators_build_http_clients() {
        let material = material(true);
        let resolver = AuthenticatorResolver::new(&material);
        for record in [app(true, None), app(false, Some("tok"))] {
            let auth = resolver.resolve(&record).unwrap();
            auth.configure(reqwest::Client::builder())
                .unwrap()
                .build()
                .unwrap();
        }
    }
}
