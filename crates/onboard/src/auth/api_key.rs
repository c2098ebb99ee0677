//! API-key authenticator.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Certificate, ClientBuilder};

use crate::error::KeyMaterialError;
use crate::key_material::CaCertificate;

/// Header carrying the application name
pub const APP_ID_HEADER: &str = "x-fabric-app-id";

/// Header carrying the client token
pub const API_KEY_HEADER: &str = "x-api-key";

/// Sends the application name and client token with every request and
/// trusts only the configured root CA.
#[derive(Clone)]
pub struct ApiKeyAuthenticator {
    root: Certificate,
    app_id: String,
    headers: HeaderMap,
}

impl ApiKeyAuthenticator {
    /// Bind the root CA, application name and client token.
    ///
    /// An empty token is rejected.
    pub fn new(ca: &CaCertificate, app_id: &str, api_key: &str) -> Result<Self, KeyMaterialError> {
        if api_key.is_empty() {
            return Err(KeyMaterialError::MissingClientToken(app_id.to_string()));
        }

        let root = Certificate::from_der(ca.der())
            .map_err(|e| KeyMaterialError::InvalidCredential(format!("root CA: {e}")))?;

        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| KeyMaterialError::InvalidCredential(format!("client token: {e}")))?;
        key.set_sensitive(true);
        let app = HeaderValue::from_str(app_id)
            .map_err(|e| KeyMaterialError::InvalidCredential(format!("application name: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(APP_ID_HEADER), app);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        Ok(Self {
            root,
            app_id: app_id.to_string(),
            headers,
        })
    }

    /// Application name sent with each request
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Headers that authenticate a request
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Apply the trust anchor and authentication headers to an HTTP client
    #[must_use]
    pub fn configure(&self, builder: ClientBuilder) -> ClientBuilder {
        builder
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .add_root_certificate(self.root.clone())
            .default_headers(self.headers.clone())
    }
}

impl fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyAuthenticator")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}
