//! Client configuration types.

use onboard_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// JSON encoding settings for records exchanged with the onboarding service.
///
/// Built once and handed to the client builder; the client keeps its own copy
/// for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    /// Drop `null` members from encoded request bodies
    pub omit_null_fields: bool,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonCodec {
    /// Create a codec that omits null fields
    #[must_use]
    pub const fn new() -> Self {
        Self {
            omit_null_fields: true,
        }
    }

    /// Set whether null fields are omitted from request bodies
    #[must_use]
    pub const fn omit_null_fields(mut self, omit: bool) -> Self {
        self.omit_null_fields = omit;
        self
    }

    /// Encode a request body
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let mut tree = serde_json::to_value(value)?;
        if self.omit_null_fields {
            strip_nulls(&mut tree);
        }
        Ok(serde_json::to_vec(&tree)?)
    }

    /// Decode a response body, treating an empty body or `null` as absent
    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<Option<T>> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(serde_json::from_slice(body)?)
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
