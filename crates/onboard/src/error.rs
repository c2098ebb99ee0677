//! Error types for the bootstrap flow.

use onboard_core::OnboardingError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Errors surfaced while resolving an endpoint application and its authenticator
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// A certificate subject has no usable common name
    #[error("identity extraction failed: {0}")]
    IdentityExtraction(#[from] IdentityError),

    /// The onboarding service could not be reached or refused a call
    #[error("onboarding service unavailable: {0}")]
    OnboardingUnavailable(#[from] OnboardingError),

    /// The service accepted the registration but returned no usable record
    #[error("registration rejected: {reason}")]
    RegistrationRejected {
        /// Why the response was not usable
        reason: String,
    },

    /// Key material could not be loaded, or a credential is missing
    #[error("key material error: {0}")]
    KeyMaterial(#[from] KeyMaterialError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from common-name extraction
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    /// The certificate bytes are not a parseable X.509 certificate
    #[error("failed to parse certificate: {0}")]
    Certificate(String),

    /// The subject is not a structured distinguished name
    #[error("malformed distinguished name: {0}")]
    MalformedName(String),

    /// The subject has no CN component
    #[error("no CN found in certificate subject")]
    MissingCommonName,
}

/// Errors from loading certificates and key containers
#[derive(Error, Debug)]
pub enum KeyMaterialError {
    /// Reading a key material file failed
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// PEM framing is invalid or carries no certificate
    #[error("invalid PEM: {0}")]
    Pem(String),

    /// The key container could not be decoded or decrypted
    #[error("failed to open key container: {0}")]
    Container(String),

    /// The key container must hold exactly one private-key identity
    #[error("key container must hold exactly one identity, found {0}")]
    IdentityCount(usize),

    /// The identity in the container has no certificate
    #[error("key container identity has an empty certificate chain")]
    EmptyChain,

    /// Certificate mode was requested without a client key container
    #[error("no client key container configured")]
    MissingContainer,

    /// The endpoint app carries neither certificate info nor a client token
    #[error("endpoint app {0:?} has no certificate info and no client token")]
    MissingClientToken(String),

    /// A credential could not be turned into TLS or header settings
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

impl KeyMaterialError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
