//! Secret-backed configuration sources for secretcfg
//!
//! Provides a uniform contract for fetching a raw secret blob from a cloud
//! secrets store and a JSON parser that namespaces the decoded object under a
//! configurable prefix, so several unrelated secrets can share one
//! configuration tree without key collisions.
//!
//! # Loading a secret
//!
//! ```ignore
//! use secretcfg_secrets::{ConfigTree, PrefixJsonParser};
//!
//! let provider = secretcfg_aws::provider(config).await?;
//! let mut tree = ConfigTree::new(".");
//! tree.load(&provider, &PrefixJsonParser::new("stripe")).await?;
//!
//! assert_eq!(tree.get_str("stripe.api_key"), Some("testapikey"));
//! ```

mod parser;
mod provider;
mod reference;
mod tree;
mod types;

pub use parser::{Parser, PrefixJsonParser, namespace};
pub use provider::{Provider, SecretsProvider};
pub use reference::{DEFAULT_TIMEOUT, SecretReference};
pub use tree::ConfigTree;
pub use types::SecretPayload;

// Vendor implementations are in separate crates:
// - secretcfg-aws: AwsSecretsManager, AwsSecretConfig
// - secretcfg-gcp: GcpSecretsManager, GcpSecretConfig

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Decoded configuration object: string keys to dynamically typed JSON values
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Error types for secret fetching and parsing
#[derive(Debug, Error)]
pub enum SecretError {
    /// The vendor call failed (network, authorization, secret or version not found)
    #[error("Failed to fetch secret '{secret}' from {provider}: {message}")]
    FetchFailed {
        /// Provider name (e.g. `"aws"`)
        provider: &'static str,
        /// Secret identifier as configured
        secret: String,
        /// Error message from the vendor client
        message: String,
    },

    /// The vendor call did not complete within the configured timeout
    #[error("Timed out after {timeout:?} fetching secret '{secret}' from {provider}")]
    Timeout {
        /// Provider name
        provider: &'static str,
        /// Secret identifier as configured
        secret: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// Credentials or the vendor client could not be set up
    #[error("Failed to resolve {provider} credentials: {message}")]
    Credentials {
        /// Provider name
        provider: &'static str,
        /// Error message from credential discovery
        message: String,
    },

    /// The provider only supports byte-oriented reads
    #[error("{provider} provider does not support structured reads")]
    Unsupported {
        /// Provider name
        provider: &'static str,
    },

    /// The payload is not valid JSON
    #[error("Failed to parse secret payload as JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payload decoded to something other than a JSON object
    #[error("Secret payload must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead
        found: &'static str,
    },

    /// The prefix key already exists but does not hold an object
    #[error("Prefix '{prefix}' already holds a {found} value, cannot nest keys under it")]
    PrefixConflict {
        /// The configured prefix
        prefix: String,
        /// JSON type found under the prefix
        found: &'static str,
    },

    /// Construction-time configuration is invalid
    #[error("Invalid secret source configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration
        message: String,
    },
}

impl SecretError {
    /// Whether this error came from the remote fetch rather than parsing.
    ///
    /// Loaders that treat every fetch failure alike can match on this
    /// instead of the individual variants.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::Timeout { .. } | Self::Credentials { .. }
        )
    }

    /// Build an [`InvalidConfig`](Self::InvalidConfig) error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Name of the JSON type of `value`, used in error messages
#[must_use]
pub(crate) const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Vendor-specific access to a remote secrets service.
///
/// Implementors perform exactly one remote call per [`fetch`](SecretFetcher::fetch).
/// Timeouts, version defaulting and logging are applied by
/// [`SecretsProvider`], so vendors never duplicate that logic.
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    /// Provider identifier used in errors and log fields.
    ///
    /// Examples: `"aws"`, `"gcp"`
    fn provider_name(&self) -> &'static str;

    /// The vendor's designation for the current version of a secret
    /// (`AWSCURRENT` for AWS, `latest` for GCP).
    fn current_version(&self) -> &'static str;

    /// Fetch the payload of `reference` at `version`.
    ///
    /// `version` is already resolved: it is either the configured label or
    /// [`current_version`](SecretFetcher::current_version).
    async fn fetch(
        &self,
        reference: &SecretReference,
        version: &str,
    ) -> Result<SecretPayload, SecretError>;
}
