//! Main onboarding service client implementation.

use crate::api::EndpointAppsApi;
use crate::config::JsonCodec;
use async_trait::async_trait;
use onboard_core::{EndpointApp, OnboardingError, OnboardingService, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Media type for SCIM request and response bodies
const SCIM_JSON: &str = "application/scim+json";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Onboarding service client
#[derive(Clone)]
pub struct OnboardingClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpClient,
    base_url: String,
    codec: JsonCodec,
}

impl OnboardingClient {
    /// Create a builder for the service at `base_url`
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> OnboardingClientBuilder {
        OnboardingClientBuilder::new(base_url)
    }

    /// Access endpoint application endpoints
    #[must_use]
    pub const fn endpoint_apps(&self) -> EndpointAppsApi<'_> {
        EndpointAppsApi::new(self)
    }

    /// The base URL requests are issued against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Perform a GET request
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.build_url(path);
        debug!(url = %url, "GET request");

        let response = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    /// Perform a POST request with a SCIM JSON body
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>> {
        let url = self.build_url(path);
        let body = self.inner.codec.encode(body)?;
        debug!(url = %url, bytes = body.len(), "POST request");

        let response = self
            .inner
            .http
            .post(&url)
            .header(CONTENT_TYPE, SCIM_JSON)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Handle an API response that may carry a JSON body
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await.map_err(transport_error)?;
            self.inner.codec.decode(&body)
        } else {
            Self::handle_error(status.as_u16(), response).await
        }
    }

    /// Convert an error response to an `OnboardingError`
    async fn handle_error<T>(status: u16, response: reqwest::Response) -> Result<T> {
        let body = response.text().await.unwrap_or_default();

        // SCIM errors carry the message in `detail`
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or(body);

        match status {
            401 | 403 => Err(OnboardingError::Unauthorized(message)),
            404 => Err(OnboardingError::NotFound { resource: message }),
            409 => {
                warn!(%message, "onboarding service reported a conflict");
                Err(OnboardingError::Conflict { message })
            }
            _ => Err(OnboardingError::Api {
                code: status,
                message,
            }),
        }
    }
}

#[async_trait]
impl OnboardingService for OnboardingClient {
    async fn list_endpoint_apps(&self) -> Result<Option<Vec<EndpointApp>>> {
        self.endpoint_apps().list().await
    }

    async fn create_endpoint_app(&self, draft: &EndpointApp) -> Result<Option<EndpointApp>> {
        self.endpoint_apps().create(draft).await
    }
}

fn transport_error(e: reqwest::Error) -> OnboardingError {
    if e.is_timeout() {
        OnboardingError::Timeout(e.to_string())
    } else if e.is_connect() {
        OnboardingError::Connection(e.to_string())
    } else {
        OnboardingError::Http(e.to_string())
    }
}

/// Builder for configuring an [`OnboardingClient`]
pub struct OnboardingClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    root_certificates: Vec<Vec<u8>>,
    headers: Vec<(String, String)>,
    codec: JsonCodec,
}

impl OnboardingClientBuilder {
    /// Create a new builder for the service at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("onboard-rust/{}", env!("CARGO_PKG_VERSION")),
            root_certificates: Vec::new(),
            headers: Vec::new(),
            codec: JsonCodec::default(),
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Trust an additional PEM-encoded root certificate
    #[must_use]
    pub fn root_certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_certificates.push(pem.into());
        self
    }

    /// Send a header with every request
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the JSON codec used for request and response bodies
    #[must_use]
    pub const fn codec(mut self, codec: JsonCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<OnboardingClient> {
        let base_url = normalize_base_url(&self.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(SCIM_JSON));
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| OnboardingError::Config(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| OnboardingError::Config(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }

        let mut http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .gzip(true);

        for pem in &self.root_certificates {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| OnboardingError::Config(format!("root certificate: {e}")))?;
            http = http.add_root_certificate(cert);
        }

        let http = http
            .build()
            .map_err(|e| OnboardingError::Config(e.to_string()))?;

        Ok(OnboardingClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                codec: self.codec,
            }),
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| OnboardingError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(OnboardingError::InvalidUrl(format!(
            "{raw}: unsupported scheme {}",
            url.scheme()
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(
            normalize_base_url("https://onboard.example/scim/v2/").unwrap(),
            "https://onboard.example/scim/v2"
        );
        assert_eq!(
            normalize_base_url("http://127.0.0.1:8081").unwrap(),
            "http://127.0.0.1:8081"
        );
    }

    #[test]
    fn rejects_bad_base_urls() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(OnboardingError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("ftp://onboard.example"),
            Err(OnboardingError::InvalidUrl(_))
        ));
    }

    #[test]
    fn builder_rejects_bad_header() {
        let result = OnboardingClient::builder("https://onboard.example")
            .header("bad header", "x")
            .build();
        assert!(matches!(result, Err(OnboardingError::Config(_))));
    }
}
