//! HTTP client for the SCIM endpoint-application onboarding service.
//!
//! This crate provides the [`OnboardingClient`], which implements
//! [`onboard_core::OnboardingService`] over HTTPS.

#![doc(html_root_url = "https://docs.rs/onboard-client/0.1.0")]

mod client;
mod config;
pub mod api;

pub use client::{OnboardingClient, OnboardingClientBuilder};
pub use config::*;
pub use onboard_core::{OnboardingError, Result};
