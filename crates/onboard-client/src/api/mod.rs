//! API endpoint modules.

mod endpoint_apps;

pub use endpoint_apps::EndpointAppsApi;
