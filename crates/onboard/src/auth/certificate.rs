//! Mutual-TLS authenticator.

use std::fmt;

use reqwest::{Certificate, ClientBuilder, Identity};

use crate::error::{BootstrapError, KeyMaterialError};
use crate::identity;
use crate::key_material::{CaCertificate, ClientIdentity};

/// Presents the client certificate from the key container and trusts only
/// the configured root CA.
#[derive(Clone)]
pub struct CertificateAuthenticator {
    root: Certificate,
    identity_pem: Vec<u8>,
    subject: String,
}

impl CertificateAuthenticator {
    /// Bind the root CA and the container identity
    pub fn new(ca: &CaCertificate, client: &ClientIdentity) -> Result<Self, BootstrapError> {
        let root = Certificate::from_der(ca.der())
            .map_err(|e| KeyMaterialError::InvalidCredential(format!("root CA: {e}")))?;
        let identity_pem = client.to_pem().into_bytes();
        parse_identity(&identity_pem)?;
        let subject = identity::common_name_from_identity(client)?;

        Ok(Self {
            root,
            identity_pem,
            subject,
        })
    }

    /// CN of the client certificate, for logging
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Apply the trust anchor and client identity to an HTTP client
    pub fn configure(&self, builder: ClientBuilder) -> Result<ClientBuilder, KeyMaterialError> {
        Ok(builder
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .add_root_certificate(self.root.clone())
            .identity(parse_identity(&self.identity_pem)?))
    }
}

fn parse_identity(pem: &[u8]) -> Result<Identity, KeyMaterialError> {
    Identity::from_pem(pem)
        .map_err(|e| KeyMaterialError::InvalidCredential(format!("client identity: {e}")))
}

impl fmt::Debug for CertificateAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateAuthenticator")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}
