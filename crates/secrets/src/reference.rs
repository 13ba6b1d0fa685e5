//! Identifies one remote secret at one version

use crate::SecretError;
use std::time::Duration;

/// Timeout applied to remote calls when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// An immutable reference to exactly one remote secret value.
///
/// `location` is the vendor region (AWS) or project (GCP). When no version
/// label is set the vendor's "current" designation is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    location: Option<String>,
    secret: String,
    version: Option<String>,
    timeout: Duration,
}

impl SecretReference {
    /// Create a reference to `secret` with no location, the current version
    /// and [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidConfig`] if `secret` is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, SecretError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(SecretError::invalid_config("secret name must not be empty"));
        }

        Ok(Self {
            location: None,
            secret,
            version: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the region or project the secret lives in
    #[must_use]
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|l| !l.trim().is_empty());
        self
    }

    /// Pin a version label; blank labels mean "current"
    #[must_use]
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version.filter(|v| !v.trim().is_empty());
        self
    }

    /// Set the timeout for the remote call. `None` or zero keeps the default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = match timeout {
            Some(t) if !t.is_zero() => t,
            _ => DEFAULT_TIMEOUT,
        };
        self
    }

    /// Region or project identifier, if configured
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Secret name or ID
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Explicit version label, if configured
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Timeout for the remote call
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The version to request: the configured label, or `current`
    #[must_use]
    pub fn effective_version<'a>(&'a self, current: &'a str) -> &'a str {
        self.version.as_deref().unwrap_or(current)
    }
}
