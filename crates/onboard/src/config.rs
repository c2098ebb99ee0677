//! Bootstrap configuration.
//!
//! ```toml
//! [application]
//! name = "ctrl-1"
//! type = "deviceControl"
//! auth_mode = "cert"
//!
//! [onboarding]
//! url = "https://localhost:8081/scim/v2"
//! timeout_secs = 30
//!
//! [key_material]
//! ca_certificate = "ca.pem"
//! client_keystore = "control-app.p12"
//! keystore_passphrase = ""
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use onboard_core::EndpointAppType;

use crate::error::{BootstrapError, Result};
use crate::key_material::{resolve_path, KeyMaterial, MaterialSource};

/// How the endpoint application authenticates to the control service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthMode {
    /// Mutual TLS with the client certificate from the key container
    Cert,
    /// API key issued by the onboarding service
    ApiKey,
}

impl AuthMode {
    /// Interpret a configured mode. Only the exact value `cert` selects
    /// certificate mode; anything else means API key.
    #[must_use]
    pub fn from_setting(setting: &str) -> Self {
        if setting == "cert" {
            Self::Cert
        } else {
            Self::ApiKey
        }
    }

    /// The configuration spelling of this mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cert => "cert",
            Self::ApiKey => "api-key",
        }
    }
}

impl From<String> for AuthMode {
    fn from(s: String) -> Self {
        Self::from_setting(&s)
    }
}

impl From<AuthMode> for String {
    fn from(mode: AuthMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Top-level bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// The endpoint application to resolve
    pub application: ApplicationConfig,

    /// Where the onboarding service lives
    pub onboarding: OnboardingConfig,

    /// Local certificate and key container locations
    pub key_material: KeyMaterialConfig,

    /// Directory relative key-material paths resolve against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Endpoint application identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name, unique within its type
    pub name: String,

    /// Application type
    #[serde(rename = "type", default = "default_app_type")]
    pub app_type: EndpointAppType,

    /// Authentication mode
    pub auth_mode: AuthMode,
}

const fn default_app_type() -> EndpointAppType {
    EndpointAppType::DeviceControl
}

/// Onboarding service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingConfig {
    /// Base URL of the SCIM endpoint
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    30
}

impl OnboardingConfig {
    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Key material locations
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyMaterialConfig {
    /// Root CA certificate (PEM or DER)
    pub ca_certificate: PathBuf,

    /// PKCS#12 client key container, required in certificate mode
    #[serde(default)]
    pub client_keystore: Option<PathBuf>,

    /// Passphrase for the client key container. Must be set explicitly
    /// whenever a container is configured; the empty string is allowed.
    #[serde(default)]
    pub keystore_passphrase: Option<String>,
}

impl std::fmt::Debug for KeyMaterialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterialConfig")
            .field("ca_certificate", &self.ca_certificate)
            .field("client_keystore", &self.client_keystore)
            .field(
                "keystore_passphrase",
                &self.keystore_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl BootstrapConfig {
    /// Parse and validate configuration from TOML text.
    ///
    /// Relative key-material paths are kept as written.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| BootstrapError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// Relative key-material paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BootstrapError::Config(format!("{}: {e}", path.display())))?;

        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.application.name.trim().is_empty() {
            return Err(BootstrapError::Config("application.name is empty".to_string()));
        }
        if self.application.app_type == EndpointAppType::Other {
            return Err(BootstrapError::Config(
                "application.type must be deviceControl or telemetry".to_string(),
            ));
        }
        if self.onboarding.timeout_secs == 0 {
            return Err(BootstrapError::Config(
                "onboarding.timeout_secs must be positive".to_string(),
            ));
        }

        let keys = &self.key_material;
        if self.application.auth_mode == AuthMode::Cert && keys.client_keystore.is_none() {
            return Err(BootstrapError::Config(
                "auth_mode = \"cert\" requires key_material.client_keystore".to_string(),
            ));
        }
        if keys.client_keystore.is_some() && keys.keystore_passphrase.is_none() {
            return Err(BootstrapError::Config(
                "key_material.keystore_passphrase must be set when client_keystore is configured"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Build key material sources from the configured paths
    #[must_use]
    pub fn key_material(&self) -> KeyMaterial {
        let base = self.base_dir.as_deref();
        let keys = &self.key_material;

        let material = KeyMaterial::new(MaterialSource::Path(resolve_path(
            base,
            &keys.ca_certificate,
        )));

        match (&keys.client_keystore, &keys.keystore_passphrase) {
            (Some(container), Some(passphrase)) => material.with_client_container(
                MaterialSource::Path(resolve_path(base, container)),
                passphrase.as_str(),
            ),
            _ => material,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_CONFIG: &str = r#"
        [application]
        name = "ctrl-1"
        auth_mode = "cert"

        [onboarding]
        url = "https://localhost:8081/scim/v2"

        [key_material]
        ca_certificate = "ca.pem"
        client_keystore = "control-app.p12"
        keystore_passphrase = ""
    "#;

    #[test]
    fn parses_cert_config_with_defaults() {
        let config = BootstrapConfig::from_toml_str(CERT_CONFIG).unwrap();
        assert_eq!(config.application.app_type, EndpointAppType::DeviceControl);
        assert_eq!(config.application.auth_mode, AuthMode::Cert);
        assert_eq!(config.onboarding.timeout(), Duration::from_secs(30));
        assert_eq!(config.key_material.keystore_passphrase.as_deref(), Some(""));
        assert!(config.key_material().has_client_container());
    }

    #[test]
    fn any_other_mode_is_api_key() {
        for mode in ["api-key", "token", "CERT", ""] {
            assert_eq!(AuthMode::from_setting(mode), AuthMode::ApiKey, "{mode:?}");
        }
        assert_eq!(AuthMode::from_setting("cert"), AuthMode::Cert);
    }

    #[test]
    fn cert_mode_requires_keystore() {
        let content = r#"
            [application]
            name = "ctrl-1"
            auth_mode = "cert"
            [onboarding]
            url = "https://localhost:8081/scim/v2"
            [key_material]
            ca_certificate = "ca.pem"
        "#;
        assert!(matches!(
            BootstrapConfig::from_toml_str(content),
            Err(BootstrapError::Config(_))
        ));
    }

    #[test]
    fn keystore_requires_explicit_passphrase() {
        let content = CERT_CONFIG.replace("keystore_passphrase = \"\"", "");
        let err = BootstrapConfig::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("keystore_passphrase"));
    }

    #[test]
    fn api_key_config_needs_only_ca() {
        let content = r#"
            [application]
            name = "ctrl-1"
            type = "telemetry"
            auth_mode = "api-key"
            [onboarding]
            url = "https://localhost:8081/scim/v2"
            timeout_secs = 5
            [key_material]
            ca_certificate = "/etc/onboard/ca.pem"
        "#;
        let config = BootstrapConfig::from_toml_str(content).unwrap();
        assert_eq!(config.application.app_type, EndpointAppType::Telemetry);
        assert_eq!(config.application.auth_mode, AuthMode::ApiKey);
        assert!(!config.key_material().has_client_container());
    }

    #[test]
    fn unknown_application_type_is_rejected() {
        let content = CERT_CONFIG.replace(
            "name = \"ctrl-1\"",
            "name = \"ctrl-1\"\n        type = \"gateway\"",
        );
        let err = BootstrapConfig::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("application.type"));
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("onboard.toml");
        std::fs::write(&path, CERT_CONFIG).unwrap();

        let config = BootstrapConfig::load(&path).unwrap();
        let rendered = format!("{:?}", config.key_material());
        assert!(rendered.contains(&dir.path().join("ca.pem").display().to_string()));
        assert!(rendered.contains(&dir.path().join("control-app.p12").display().to_string()));
    }

    #[test]
    fn debug_hides_passphrase() {
        let content = CERT_CONFIG.replace("keystore_passphrase = \"\"", "keystore_passphrase = \"hunter2\"");
        let config = BootstrapConfig::from_toml_str(&content).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
