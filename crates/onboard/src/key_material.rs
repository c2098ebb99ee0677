//! Root CA certificate and client key container loading.
//!
//! Sources are read when a component needs them and the bytes are dropped
//! once the certificate or identity has been extracted. No file handle is
//! kept open between calls.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use p12_keystore::{KeyStore, KeyStoreEntry};
use pem::Pem;
use tracing::debug;

use crate::error::KeyMaterialError;

type Result<T> = std::result::Result<T, KeyMaterialError>;

const PEM_CERTIFICATE: &str = "CERTIFICATE";
const PEM_PRIVATE_KEY: &str = "PRIVATE KEY";

/// Where a piece of key material comes from
#[derive(Clone)]
pub enum MaterialSource {
    /// A file read at the moment of use
    Path(PathBuf),
    /// Bytes bundled with the application
    Bytes(Vec<u8>),
}

impl MaterialSource {
    /// Read material from a file
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Use bundled bytes
    #[must_use]
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Path(path) => {
                debug!(path = %path.display(), "reading key material");
                std::fs::read(path)
                    .map(Cow::Owned)
                    .map_err(|e| KeyMaterialError::io(path, e))
            }
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

impl fmt::Debug for MaterialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Passphrase protecting the client key container
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    /// Wrap a configured passphrase. An empty string is a valid passphrase.
    #[must_use]
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self(passphrase.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

impl From<String> for Passphrase {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Local key material: the trust anchor and, for certificate mode, the
/// client key container with its passphrase.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    ca_certificate: MaterialSource,
    client_container: Option<(MaterialSource, Passphrase)>,
}

impl KeyMaterial {
    /// Key material with only a root CA certificate
    #[must_use]
    pub const fn new(ca_certificate: MaterialSource) -> Self {
        Self {
            ca_certificate,
            client_container: None,
        }
    }

    /// Attach a PKCS#12 client key container and the passphrase that opens it
    #[must_use]
    pub fn with_client_container(
        mut self,
        container: MaterialSource,
        passphrase: impl Into<Passphrase>,
    ) -> Self {
        self.client_container = Some((container, passphrase.into()));
        self
    }

    /// Returns true if a client key container is configured
    #[must_use]
    pub const fn has_client_container(&self) -> bool {
        self.client_container.is_some()
    }

    /// Load the root CA certificate (PEM or DER)
    pub fn load_ca_certificate(&self) -> Result<CaCertificate> {
        let bytes = self.ca_certificate.read()?;
        CaCertificate::from_pem_or_der(&bytes)
    }

    /// Open the client key container and return its single identity
    pub fn load_client_identity(&self) -> Result<ClientIdentity> {
        let (source, passphrase) = self
            .client_container
            .as_ref()
            .ok_or(KeyMaterialError::MissingContainer)?;
        let bytes = source.read()?;
        ClientIdentity::from_pkcs12(&bytes, passphrase)
    }
}

/// A DER-encoded trust anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaCertificate {
    der: Vec<u8>,
}

impl CaCertificate {
    /// Accept a PEM `CERTIFICATE` block or raw DER
    pub fn from_pem_or_der(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            der: certificate_der(bytes)?,
        })
    }

    /// DER encoding
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// PEM encoding
    #[must_use]
    pub fn to_pem(&self) -> String {
        pem::encode(&Pem::new(PEM_CERTIFICATE, self.der.clone()))
    }
}

/// The private key and certificate chain held in a client key container
#[derive(Clone)]
pub struct ClientIdentity {
    key_der: Vec<u8>,
    chain: Vec<Vec<u8>>,
}

impl ClientIdentity {
    /// Decode a PKCS#12 container that holds exactly one private-key entry.
    ///
    /// Trusted-certificate entries are ignored. Zero or several private-key
    /// entries are rejected rather than picking one.
    pub fn from_pkcs12(bytes: &[u8], passphrase: &Passphrase) -> Result<Self> {
        let store = KeyStore::from_pkcs12(bytes, passphrase.expose())
            .map_err(|e| KeyMaterialError::Container(e.to_string()))?;

        let mut identities = store.entries().filter_map(|(alias, entry)| match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => Some((alias, chain)),
            _ => None,
        });

        let (alias, chain) = match (identities.next(), identities.next()) {
            (Some(only), None) => only,
            (None, _) => return Err(KeyMaterialError::IdentityCount(0)),
            (Some(_), Some(_)) => {
                return Err(KeyMaterialError::IdentityCount(2 + identities.count()))
            }
        };

        if chain.chain().is_empty() {
            return Err(KeyMaterialError::EmptyChain);
        }
        debug!(%alias, certificates = chain.chain().len(), "opened client key container");

        Ok(Self {
            key_der: chain.key().to_vec(),
            chain: chain.chain().iter().map(|c| c.as_der().to_vec()).collect(),
        })
    }

    /// DER encoding of the identity certificate
    #[must_use]
    pub fn leaf(&self) -> &[u8] {
        // from_pkcs12 guarantees a non-empty chain
        &self.chain[0]
    }

    /// DER encodings of the chain, leaf first
    #[must_use]
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    /// PEM bundle of the PKCS#8 private key followed by the chain
    #[must_use]
    pub fn to_pem(&self) -> String {
        let mut blocks = vec![Pem::new(PEM_PRIVATE_KEY, self.key_der.clone())];
        blocks.extend(
            self.chain
                .iter()
                .map(|der| Pem::new(PEM_CERTIFICATE, der.clone())),
        );
        pem::encode_many(&blocks)
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("key", &"<redacted>")
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

/// Extract DER from a PEM `CERTIFICATE` block, or pass DER through
pub(crate) fn certificate_der(bytes: &[u8]) -> Result<Vec<u8>> {
    if !looks_like_pem(bytes) {
        return Ok(bytes.to_vec());
    }
    pem::parse_many(bytes)
        .map_err(|e| KeyMaterialError::Pem(e.to_string()))?
        .into_iter()
        .find(|p| p.tag() == PEM_CERTIFICATE)
        .map(|p| p.contents().to_vec())
        .ok_or_else(|| KeyMaterialError::Pem("no CERTIFICATE block".to_string()))
}

fn looks_like_pem(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"-----BEGIN")
}

/// Resolve `path` against `base` unless it is already absolute
pub(crate) fn resolve_path(base: Option<&Path>, path: &Path) -> PathBuf {
    match base {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
