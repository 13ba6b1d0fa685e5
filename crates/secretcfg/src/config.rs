//! Source configuration files

use secretcfg_aws::AwsSecretConfig;
use secretcfg_gcp::GcpSecretConfig;
use secretcfg_secrets::SecretError;
use serde::Deserialize;
use std::path::Path;

/// One secret to load, and the prefix its keys are nested under
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Top-level key the secret's fields are relocated under; empty disables namespacing
    #[serde(default)]
    pub prefix: String,

    /// Vendor and vendor-specific settings
    #[serde(flatten)]
    pub backend: BackendConfig,
}

/// Vendor selection, tagged by `provider`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum BackendConfig {
    /// AWS Secrets Manager
    Aws(AwsSecretConfig),
    /// GCP Secret Manager
    Gcp(GcpSecretConfig),
}

impl BackendConfig {
    /// Vendor tag as written in configuration
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        match self {
            Self::Aws(_) => "aws",
            Self::Gcp(_) => "gcp",
        }
    }

    /// Configured secret identifier
    #[must_use]
    pub fn secret(&self) -> &str {
        match self {
            Self::Aws(config) => &config.secret,
            Self::Gcp(config) => &config.secret,
        }
    }
}

/// An ordered list of secret sources.
///
/// ```toml
/// [[sources]]
/// provider = "aws"
/// prefix = "stripe"
/// region = "us-east-1"
/// secret = "prod/stripe"
///
/// [[sources]]
/// provider = "gcp"
/// prefix = "twilio"
/// project = "my-project"
/// secret = "twilio"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    /// Sources in merge order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl SourcesConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidConfig`] if the document is malformed
    /// or names an unknown provider.
    pub fn from_toml_str(input: &str) -> Result<Self, SecretError> {
        toml::from_str(input)
            .map_err(|e| SecretError::invalid_config(format!("invalid TOML sources: {e}")))
    }

    /// Parse a JSON document
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidConfig`] if the document is malformed
    /// or names an unknown provider.
    pub fn from_json_str(input: &str) -> Result<Self, SecretError> {
        serde_json::from_str(input)
            .map_err(|e| SecretError::invalid_config(format!("invalid JSON sources: {e}")))
    }

    /// Read a sources file; `.json` files are parsed as JSON, anything else as TOML
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SecretError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SecretError::invalid_config(format!("failed to read {}: {e}", path.display()))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }
}
