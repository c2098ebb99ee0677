use serde::{Deserialize, Serialize};

/// SCIM schema URI for endpoint application resources
pub const ENDPOINT_APP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:EndpointApp";

/// Kind of endpoint application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndpointAppType {
    /// Issues control requests to onboarded devices
    DeviceControl,

    /// Receives telemetry from onboarded devices
    Telemetry,

    /// Any application type this client does not know about
    #[serde(other)]
    Other,
}

/// Certificate subject metadata for apps that authenticate with mutual TLS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Common name of the trust anchor that validates the service
    #[serde(rename = "rootCN")]
    pub root_cn: String,

    /// Common name of the application's client certificate
    #[serde(rename = "subjectName")]
    pub subject_name: String,
}

impl CertificateInfo {
    /// Create certificate metadata from the two common names
    #[must_use]
    pub fn new(root_cn: impl Into<String>, subject_name: impl Into<String>) -> Self {
        Self {
            root_cn: root_cn.into(),
            subject_name: subject_name.into(),
        }
    }
}

/// Endpoint application record held by the onboarding service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointApp {
    /// SCIM schema URIs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<String>,

    /// Server-assigned identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Application name, unique within its type
    pub application_name: String,

    /// Application type
    pub application_type: EndpointAppType,

    /// Present iff the app authenticates with a client certificate
    #[serde(default)]
    pub certificate_info: Option<CertificateInfo>,

    /// Present iff the app authenticates with an API key
    #[serde(default)]
    pub client_token: Option<String>,
}

impl EndpointApp {
    /// Start a draft record for registration
    #[must_use]
    pub fn draft(name: impl Into<String>, app_type: EndpointAppType) -> Self {
        Self {
            schemas: vec![ENDPOINT_APP_SCHEMA.to_string()],
            id: None,
            application_name: name.into(),
            application_type: app_type,
            certificate_info: None,
            client_token: None,
        }
    }

    /// Attach certificate metadata to the record
    #[must_use]
    pub fn with_certificate_info(mut self, info: CertificateInfo) -> Self {
        self.certificate_info = Some(info);
        self
    }

    /// Returns true if this record is keyed by `(name, app_type)`
    #[must_use]
    pub fn matches(&self, name: &str, app_type: EndpointAppType) -> bool {
        self.application_type == app_type && self.application_name == name
    }

    /// Returns true if the app authenticates with a client certificate
    #[must_use]
    pub const fn uses_certificate(&self) -> bool {
        self.certificate_info.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scim_record() {
        let json = r#"{
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:EndpointApp"],
            "id": "e1e6b7a2",
            "applicationType": "deviceControl",
            "applicationName": "ctrl-1",
            "certificateInfo": {"rootCN": "Example Root", "subjectName": "ctrl-1"}
        }"#;

        let app: EndpointApp = serde_json::from_str(json).unwrap();
        assert_eq!(app.id.as_deref(), Some("e1e6b7a2"));
        assert!(app.matches("ctrl-1", EndpointAppType::DeviceControl));
        assert!(app.uses_certificate());
        assert_eq!(app.certificate_info.unwrap().root_cn, "Example Root");
        assert!(app.client_token.is_none());
    }

    #[test]
    fn unknown_type_does_not_fail() {
        let json = r#"{"applicationType": "firmwareUpdate", "applicationName": "fw"}"#;
        let app: EndpointApp = serde_json::from_str(json).unwrap();
        assert_eq!(app.application_type, EndpointAppType::Other);
        assert!(!app.matches("fw", EndpointAppType::DeviceControl));
    }

    #[test]
    fn match_requires_name_and_type() {
        let app = EndpointApp::draft("ctrl-1", EndpointAppType::Telemetry);
        assert!(!app.matches("ctrl-1", EndpointAppType::DeviceControl));
        assert!(!app.matches("ctrl-2", EndpointAppType::Telemetry));
        assert!(app.matches("ctrl-1", EndpointAppType::Telemetry));
    }
}
