//! Common Name extraction from X.509 certificates and distinguished names.
//!
//! Certificates are matched by attribute OID through `x509-parser`.
//! [`common_name_from_dn`] covers subjects that callers only have as text,
//! such as a subject copied from configuration or an audit log, and is not
//! on the certificate path.

use x509_parser::oid_registry::OID_X509_COMMON_NAME;
use x509_parser::prelude::*;

use crate::error::IdentityError;
use crate::key_material::{certificate_der, ClientIdentity};

type Result<T> = std::result::Result<T, IdentityError>;

/// Dotted form of the CN attribute type
const CN_OID: &str = "2.5.4.3";

/// Extract the subject CN from a DER-encoded certificate.
///
/// The subject RDNs are walked in encoded order and the first CN attribute
/// wins.
pub fn common_name(cert_der: &[u8]) -> Result<String> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| IdentityError::Certificate(e.to_string()))?;

    for rdn in cert.subject().iter() {
        for attr in rdn.iter() {
            if attr.attr_type() == &OID_X509_COMMON_NAME {
                return attr
                    .as_str()
                    .map(str::to_owned)
                    .map_err(|e| IdentityError::MalformedName(format!("CN value: {e}")));
            }
        }
    }

    Err(IdentityError::MissingCommonName)
}

/// Extract the subject CN from a certificate in PEM or DER form
pub fn common_name_from_pem_or_der(bytes: &[u8]) -> Result<String> {
    let der = certificate_der(bytes).map_err(|e| IdentityError::Certificate(e.to_string()))?;
    common_name(&der)
}

/// Extract the CN of the identity certificate in a client key container
pub fn common_name_from_identity(identity: &ClientIdentity) -> Result<String> {
    common_name(identity.leaf())
}

/// Extract the CN from an RFC 4514 string distinguished name.
///
/// The attribute type is matched case-insensitively, so `cn=device-42` and
/// `CN=device-42` both yield `device-42`. The dotted OID form is accepted too.
pub fn common_name_from_dn(dn: &str) -> Result<String> {
    parse_dn(dn)?
        .into_iter()
        .find(|(attr_type, _)| attr_type.eq_ignore_ascii_case("CN") || attr_type == CN_OID)
        .map(|(_, value)| value)
        .ok_or(IdentityError::MissingCommonName)
}

/// Split a string DN into `(type, value)` pairs in order.
///
/// Multi-valued RDNs (`+`) are flattened.
fn parse_dn(dn: &str) -> Result<Vec<(String, String)>> {
    if dn.trim().is_empty() {
        return Err(IdentityError::MalformedName("empty name".to_string()));
    }

    let mut components = Vec::new();
    for raw in split_unescaped(dn)? {
        let (attr_type, value) = raw
            .split_once('=')
            .ok_or_else(|| IdentityError::MalformedName(format!("missing '=' in {raw:?}")))?;

        let attr_type = attr_type.trim();
        if attr_type.is_empty() || !attr_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-') {
            return Err(IdentityError::MalformedName(format!(
                "bad attribute type {attr_type:?}"
            )));
        }

        components.push((attr_type.to_string(), unescape_value(value.trim())?));
    }
    Ok(components)
}

/// Split on `,`, `;` and `+` that are neither escaped nor quoted
fn split_unescaped(dn: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut quoted = false;

    for (i, c) in dn.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            ',' | ';' | '+' if !quoted => {
                parts.push(&dn[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if escaped || quoted {
        return Err(IdentityError::MalformedName(format!("unterminated escape or quote in {dn:?}")));
    }
    parts.push(&dn[start..]);
    Ok(parts)
}

/// Resolve quoting and backslash escapes, including `\XX` hex pairs
fn unescape_value(raw: &str) -> Result<String> {
    let raw = match raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Some(inner) => inner,
        None => raw,
    };

    let mut bytes = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let next = chars
            .next()
            .ok_or_else(|| IdentityError::MalformedName("dangling escape".to_string()))?;
        match (next.to_digit(16), chars.peek().and_then(|p| p.to_digit(16))) {
            (Some(hi), Some(lo)) => {
                chars.next();
                // hi and lo are single hex digits
                bytes.push(u8::try_from(hi * 16 + lo).unwrap_or_default());
            }
            _ => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8(bytes).map_err(|e| IdentityError::MalformedName(e.to_string()))
}
