//! Raw secret payload with automatic memory zeroing
//!
//! [`SecretPayload`] wraps `secrecy::SecretSlice<u8>` so fetched bytes are
//! zeroed when dropped and never show up in `Debug` output.

use secrecy::{ExposeSecret, SecretSlice};

/// Opaque bytes returned by a successful fetch.
///
/// No encoding is assumed at this layer; the parser decides how to read them.
/// The payload lives for one load call and is zeroed on drop.
///
/// # Example
///
/// ```ignore
/// let payload = SecretPayload::from(br#"{"api_key":"k"}"#.to_vec());
/// let object = parser.unmarshal(payload.expose())?;
/// // `payload` is zeroed when it goes out of scope
/// ```
pub struct SecretPayload {
    inner: SecretSlice<u8>,
}

impl SecretPayload {
    /// Move `bytes` into secure storage
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: SecretSlice::from(bytes),
        }
    }

    /// Expose the raw bytes.
    ///
    /// The caller must not log or persist the returned slice.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Length in bytes, without exposing the content
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Whether the payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl From<Vec<u8>> for SecretPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<String> for SecretPayload {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl std::fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretPayload([REDACTED; {} bytes])", self.len())
    }
}
