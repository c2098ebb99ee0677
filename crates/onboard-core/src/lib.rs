//! Core types and traits for the endpoint-application onboarding client.
//!
//! This crate provides the foundational types used across the onboarding workspace:
//!
//! - **Types**: SCIM representations of endpoint applications and list envelopes
//! - **Errors**: Transport and API error handling with [`OnboardingError`]
//! - **Service**: The [`OnboardingService`] seam the registrar talks to
//!
//! # Example
//!
//! ```rust,ignore
//! use onboard_core::{EndpointApp, EndpointAppType, OnboardingService, Result};
//!
//! async fn find(service: &dyn OnboardingService, name: &str) -> Result<Option<EndpointApp>> {
//!     let apps = service.list_endpoint_apps().await?.unwrap_or_default();
//!     Ok(apps
//!         .into_iter()
//!         .find(|app| app.matches(name, EndpointAppType::DeviceControl)))
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/onboard-core/0.1.0")]

mod error;
mod service;
pub mod types;

pub use error::{OnboardingError, Result};
pub use service::OnboardingService;
pub use types::*;
