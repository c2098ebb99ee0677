//! Find-or-register endpoint applications with an onboarding authority and
//! resolve the authenticator the control-service client should use.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use onboard::{BootstrapConfig, ClientBootstrapper};
//!
//! #[tokio::main]
//! async fn main() -> onboard::Result<()> {
//!     let config = BootstrapConfig::load("/etc/onboard/onboard.toml")?;
//!     let bootstrapped = ClientBootstrapper::from_config(config)?.bootstrap().await?;
//!
//!     println!("Endpoint app: {}", bootstrapped.endpoint_app.application_name);
//!     let control = bootstrapped.http_client()?;
//!     Ok(())
//! }
//! ```
//!
//! # TLS
//!
//! Both the onboarding client and the control-service client use rustls. The
//! control-service client trusts only the configured root CA.

#![doc(html_root_url = "https://docs.rs/onboard/0.1.0")]

pub mod auth;
mod bootstrap;
pub mod config;
mod error;
pub mod identity;
pub mod key_material;
pub mod registrar;

pub use auth::{ApiKeyAuthenticator, Authenticator, AuthenticatorResolver, CertificateAuthenticator};
pub use bootstrap::{Bootstrapped, ClientBootstrapper};
pub use config::{AuthMode, BootstrapConfig};
pub use error::{BootstrapError, IdentityError, KeyMaterialError, Result};
pub use key_material::{KeyMaterial, MaterialSource, Passphrase};
pub use registrar::EndpointAppRegistrar;

// Re-export core types
pub use onboard_core::{
    CertificateInfo, EndpointApp, EndpointAppType, OnboardingError, OnboardingService,
};

// Re-export client
pub use onboard_client::{JsonCodec, OnboardingClient, OnboardingClientBuilder};

// Re-export runtime for convenience
pub use tokio;
