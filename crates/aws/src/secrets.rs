//! AWS Secrets Manager secret fetcher

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::config::Credentials;
use aws_sdk_secretsmanager::config::retry::RetryConfig;
use aws_sdk_secretsmanager::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use aws_sdk_secretsmanager::primitives::Blob;
use secrecy::{ExposeSecret, SecretString};
use secretcfg_secrets::{
    SecretError, SecretFetcher, SecretPayload, SecretReference, SecretsProvider,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const PROVIDER: &str = "aws";

/// Version stage requested when no version is configured
pub const CURRENT_VERSION: &str = "AWSCURRENT";

/// Configuration for an AWS Secrets Manager source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsSecretConfig {
    /// AWS region; falls back to the SDK's region discovery when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Secret ID - can be ARN or secret name
    pub secret: String,

    /// Version stage (optional, defaults to AWSCURRENT)
    #[serde(default)]
    pub version: Option<String>,

    /// Timeout for client setup and each fetch, in milliseconds (default 5000)
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Endpoint override (LocalStack, VPC endpoints)
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// How credentials are obtained
    #[serde(default)]
    pub credentials: AwsCredentials,
}

impl AwsSecretConfig {
    /// Create a config for `secret` with every other setting defaulted
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Build the immutable [`SecretReference`] for this config
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidConfig`] if the secret ID is empty.
    pub fn reference(&self) -> Result<SecretReference, SecretError> {
        Ok(SecretReference::new(&self.secret)?
            .with_location(self.region.clone())
            .with_version(self.version.clone())
            .with_timeout(self.timeout_ms.map(Duration::from_millis)))
    }
}

/// Credential source for the AWS client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AwsCredentials {
    /// The SDK's default chain (environment, profile, IMDS, ...)
    #[default]
    Ambient,

    /// Fixed credentials, mostly for tests and local emulators
    #[serde(rename_all = "camelCase")]
    Static {
        /// Access key ID
        access_key_id: String,
        /// Secret access key
        secret_access_key: SecretString,
        /// Session token for temporary credentials
        #[serde(default)]
        session_token: Option<SecretString>,
    },
}

/// Build a provider for the secret described by `config`.
///
/// The SDK configuration is loaded once here, bounded by the configured
/// timeout. Each read then performs a single `GetSecretValue` call.
///
/// # Errors
///
/// Returns [`SecretError::InvalidConfig`] for an empty secret ID and
/// [`SecretError::Credentials`] if the SDK configuration cannot be loaded in time.
pub async fn provider(
    config: AwsSecretConfig,
) -> Result<SecretsProvider<AwsSecretsManager>, SecretError> {
    let reference = config.reference()?;
    let fetcher = AwsSecretsManager::connect(&config, reference.timeout()).await?;
    Ok(SecretsProvider::new(reference, fetcher))
}

/// Build a provider around an existing client, skipping SDK configuration loading.
///
/// `region`, `endpointUrl` and `credentials` in `config` are ignored; the
/// client already carries them. The client is used as-is, including its
/// retry policy; [`provider`] disables retries, an injected client keeps
/// whatever it was built with.
///
/// # Errors
///
/// Returns [`SecretError::InvalidConfig`] if the secret ID is empty.
pub fn provider_with_client(
    config: &AwsSecretConfig,
    client: Client,
) -> Result<SecretsProvider<AwsSecretsManager>, SecretError> {
    Ok(SecretsProvider::new(
        config.reference()?,
        AwsSecretsManager::from_client(client),
    ))
}

/// Fetches secret values from AWS Secrets Manager
#[derive(Clone)]
pub struct AwsSecretsManager {
    client: Client,
}

impl std::fmt::Debug for AwsSecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManager")
            .field("region", &self.client.config().region())
            .finish_non_exhaustive()
    }
}

impl AwsSecretsManager {
    /// Wrap a pre-built client
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Load SDK configuration and build a client.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Credentials`] if loading does not finish within `timeout`.
    pub async fn connect(config: &AwsSecretConfig, timeout: Duration) -> Result<Self, SecretError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }

        if let AwsCredentials::Static {
            access_key_id,
            secret_access_key,
            session_token,
        } = &config.credentials
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key.expose_secret(),
                session_token.as_ref().map(|t| t.expose_secret().to_string()),
                None,
                "secretcfg-static",
            ));
        }

        let shared = tokio::time::timeout(timeout, loader.load())
            .await
            .map_err(|_| SecretError::Credentials {
                provider: PROVIDER,
                message: format!("loading AWS configuration timed out after {timeout:?}"),
            })?;

        // One read is one GetSecretValue call; the SDK's standard retries stay off
        let mut builder = aws_sdk_secretsmanager::config::Builder::from(&shared)
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = config.endpoint_url.as_deref() {
            builder = builder.endpoint_url(endpoint);
        }

        debug!(
            region = ?shared.region(),
            endpoint = ?config.endpoint_url,
            "Initialized AWS Secrets Manager client"
        );

        Ok(Self::from_client(Client::from_conf(builder.build())))
    }

    /// Map an SDK error to a fetch failure, naming missing secrets explicitly
    fn fetch_error(
        reference: &SecretReference,
        err: &SdkError<GetSecretValueError>,
    ) -> SecretError {
        let message = match err.as_service_error() {
            Some(service) if service.is_resource_not_found_exception() => format!(
                "secret or version not found: {}",
                service.message().unwrap_or("ResourceNotFoundException")
            ),
            Some(service) => format!(
                "{}: {}",
                service.code().unwrap_or("ServiceError"),
                service.message().unwrap_or("no message")
            ),
            None => match std::error::Error::source(err) {
                Some(source) => format!("{err}: {source}"),
                None => err.to_string(),
            },
        };

        SecretError::FetchFailed {
            provider: PROVIDER,
            secret: reference.secret().to_string(),
            message,
        }
    }

    /// Prefer the textual payload, fall back to the binary one
    fn payload(
        reference: &SecretReference,
        secret_string: Option<&str>,
        secret_binary: Option<&Blob>,
    ) -> Result<SecretPayload, SecretError> {
        if let Some(text) = secret_string {
            return Ok(SecretPayload::from(text.to_string()));
        }

        if let Some(blob) = secret_binary {
            return Ok(SecretPayload::from(blob.as_ref().to_vec()));
        }

        Err(SecretError::FetchFailed {
            provider: PROVIDER,
            secret: reference.secret().to_string(),
            message: "response carried neither SecretString nor SecretBinary".to_string(),
        })
    }
}

#[async_trait]
impl SecretFetcher for AwsSecretsManager {
    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn current_version(&self) -> &'static str {
        CURRENT_VERSION
    }

    async fn fetch(
        &self,
        reference: &SecretReference,
        version: &str,
    ) -> Result<SecretPayload, SecretError> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(reference.secret())
            .version_stage(version)
            .send()
            .await
            .map_err(|e| Self::fetch_error(reference, &e))?;

        Self::payload(reference, response.secret_string(), response.secret_binary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> SecretReference {
        SecretReference::new("test").unwrap()
    }

    #[test]
    fn test_config_deserialization() {
        let json = r#"{
            "region": "us-east-1",
            "secret": "prod/stripe",
            "version": "AWSPREVIOUS",
            "timeoutMs": 2500,
            "endpointUrl": "http://localhost:4566"
        }"#;
        let config: AwsSecretConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.secret, "prod/stripe");
        assert_eq!(config.version.as_deref(), Some("AWSPREVIOUS"));
        assert_eq!(config.timeout_ms, Some(2500));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert!(matches!(config.credentials, AwsCredentials::Ambient));
    }

    #[test]
    fn test_static_credentials_deserialization() {
        let json = r#"{
            "secret": "test",
            "credentials": {"type": "static", "accessKeyId": "AKIA", "secretAccessKey": "shh"}
        }"#;
        let config: AwsSecretConfig = serde_json::from_str(json).unwrap();

        match &config.credentials {
            AwsCredentials::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                assert_eq!(access_key_id, "AKIA");
                assert_eq!(secret_access_key.expose_secret(), "shh");
                assert!(session_token.is_none());
            }
            AwsCredentials::Ambient => panic!("expected static credentials"),
        }

        let debug = format!("{config:?}");
        assert!(!debug.contains("shh"));
    }

    #[test]
    fn test_reference_defaults() {
        let reference = AwsSecretConfig::new("test").reference().unwrap();
        assert_eq!(reference.secret(), "test");
        assert_eq!(reference.timeout(), Duration::from_secs(5));
        assert_eq!(reference.effective_version(CURRENT_VERSION), "AWSCURRENT");
    }

    #[test]
    fn test_reference_zero_timeout_uses_default() {
        let config = AwsSecretConfig {
            timeout_ms: Some(0),
            ..AwsSecretConfig::new("test")
        };
        assert_eq!(config.reference().unwrap().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_reference_requires_secret() {
        assert!(matches!(
            AwsSecretConfig::default().reference(),
            Err(SecretError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_payload_prefers_string() {
        let blob = Blob::new(b"binary".to_vec());
        let payload =
            AwsSecretsManager::payload(&reference(), Some("text"), Some(&blob)).unwrap();
        assert_eq!(payload.expose(), b"text");
    }

    #[test]
    fn test_payload_falls_back_to_binary() {
        let blob = Blob::new(b"binary".to_vec());
        let payload = AwsSecretsManager::payload(&reference(), None, Some(&blob)).unwrap();
        assert_eq!(payload.expose(), b"binary");
    }

    #[test]
    fn test_payload_missing_is_fetch_failure() {
        let err = AwsSecretsManager::payload(&reference(), None, None).unwrap_err();
        assert!(err.is_fetch_failure());
    }
}
