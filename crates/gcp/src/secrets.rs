//! GCP Secret Manager secret fetcher

use async_trait::async_trait;
use google_secretmanager1::SecretManager;
use google_secretmanager1::api::AccessSecretVersionResponse;
use google_secretmanager1::common::NoToken;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use secrecy::{ExposeSecret, SecretString};
use secretcfg_secrets::{
    SecretError, SecretFetcher, SecretPayload, SecretReference, SecretsProvider,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use yup_oauth2::authenticator::ApplicationDefaultCredentialsTypes;

const PROVIDER: &str = "gcp";

/// Version alias requested when no version is configured
pub const CURRENT_VERSION: &str = "latest";

/// Secret Manager API hub over a rustls HTTPS client
pub type SecretManagerHub = SecretManager<HttpsConnector<HttpConnector>>;

/// Configuration for a GCP Secret Manager source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpSecretConfig {
    /// GCP project ID; optional when `secret` is a full resource name
    #[serde(default)]
    pub project: Option<String>,

    /// Secret name, or `projects/P/secrets/S[/versions/V]`
    pub secret: String,

    /// Version number or alias (optional, defaults to "latest")
    #[serde(default)]
    pub version: Option<String>,

    /// Timeout for client setup and each fetch, in milliseconds (default 5000)
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// API root override, e.g. `http://localhost:9090`
    #[serde(default)]
    pub base_url: Option<String>,

    /// How access tokens are obtained
    #[serde(default)]
    pub credentials: GcpCredentials,
}

impl GcpSecretConfig {
    /// Create a config for `secret` in `project` with every other setting defaulted
    #[must_use]
    pub fn new(project: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Build the immutable [`SecretReference`] for this config.
    ///
    /// A full resource name in `secret` supplies project and version; an
    /// explicit `version` still takes precedence.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidConfig`] if the secret is empty, the
    /// resource name is malformed, or no project is known.
    pub fn reference(&self) -> Result<SecretReference, SecretError> {
        let (project, secret, version) = if self.secret.starts_with("projects/") {
            let (project, secret, version) =
                parse_resource_name(&self.secret).ok_or_else(|| {
                    SecretError::invalid_config(format!(
                        "invalid GCP secret resource name: {}",
                        self.secret
                    ))
                })?;
            (
                Some(project.to_string()),
                secret.to_string(),
                self.version.clone().or_else(|| version.map(str::to_string)),
            )
        } else {
            (self.project.clone(), self.secret.clone(), self.version.clone())
        };

        let reference = SecretReference::new(secret)?
            .with_location(project)
            .with_version(version)
            .with_timeout(self.timeout_ms.map(Duration::from_millis));

        if reference.location().is_none() {
            return Err(SecretError::invalid_config(format!(
                "GCP project is required for secret '{}'",
                reference.secret()
            )));
        }

        Ok(reference)
    }
}

/// Split `projects/P/secrets/S[/versions/V]` into its parts
fn parse_resource_name(resource_name: &str) -> Option<(&str, &str, Option<&str>)> {
    let parts: Vec<&str> = resource_name.split('/').collect();
    match parts.as_slice() {
        ["projects", project, "secrets", secret]
            if !project.is_empty() && !secret.is_empty() =>
        {
            Some((*project, *secret, None))
        }
        ["projects", project, "secrets", secret, "versions", version]
            if !project.is_empty() && !secret.is_empty() && !version.is_empty() =>
        {
            Some((*project, *secret, Some(*version)))
        }
        _ => None,
    }
}

/// Credential source for the GCP client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GcpCredentials {
    /// Application Default Credentials (`GOOGLE_APPLICATION_CREDENTIALS`, metadata server)
    #[default]
    Ambient,

    /// A service account key file
    ServiceAccountKey {
        /// Path to the JSON key
        path: PathBuf,
    },

    /// A pre-issued OAuth2 access token
    AccessToken {
        /// Bearer token
        token: SecretString,
    },

    /// No authorization header; only useful against emulators
    Anonymous,
}

/// Build a provider for the secret described by `config`.
///
/// Credentials are resolved once here, bounded by the configured timeout.
/// Each read then performs a single `AccessSecretVersion` call.
///
/// # Errors
///
/// Returns [`SecretError::InvalidConfig`] for an incomplete secret reference and
/// [`SecretError::Credentials`] if the client cannot be set up in time.
pub async fn provider(
    config: GcpSecretConfig,
) -> Result<SecretsProvider<GcpSecretsManager>, SecretError> {
    let reference = config.reference()?;
    let fetcher = GcpSecretsManager::connect(&config, reference.timeout()).await?;
    Ok(SecretsProvider::new(reference, fetcher))
}

/// Build a provider around an existing hub, skipping credential setup.
///
/// `baseUrl` and `credentials` in `config` are ignored; the hub already
/// carries them.
///
/// # Errors
///
/// Returns [`SecretError::InvalidConfig`] for an incomplete secret reference.
pub fn provider_with_hub(
    config: &GcpSecretConfig,
    hub: SecretManagerHub,
) -> Result<SecretsProvider<GcpSecretsManager>, SecretError> {
    Ok(SecretsProvider::new(
        config.reference()?,
        GcpSecretsManager::from_hub(hub),
    ))
}

/// Fetches secret versions from GCP Secret Manager
pub struct GcpSecretsManager {
    hub: SecretManagerHub,
}

impl std::fmt::Debug for GcpSecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretsManager").finish_non_exhaustive()
    }
}

impl GcpSecretsManager {
    /// Wrap a pre-built hub
    #[must_use]
    pub const fn from_hub(hub: SecretManagerHub) -> Self {
        Self { hub }
    }

    /// Resolve credentials and build a hub.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Credentials`] if TLS or credentials cannot be
    /// set up, or setup does not finish within `timeout`.
    pub async fn connect(config: &GcpSecretConfig, timeout: Duration) -> Result<Self, SecretError> {
        let mut hub = tokio::time::timeout(timeout, Self::build_hub(&config.credentials))
            .await
            .map_err(|_| {
                credentials_error(format!("GCP client setup timed out after {timeout:?}"))
            })??;

        if let Some(base_url) = config.base_url.as_deref() {
            hub.base_url(format!("{}/", base_url.trim_end_matches('/')));
        }

        debug!(base_url = ?config.base_url, "Initialized GCP Secret Manager client");

        Ok(Self::from_hub(hub))
    }

    async fn build_hub(credentials: &GcpCredentials) -> Result<SecretManagerHub, SecretError> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .map_err(|e| credentials_error(format!("failed to configure TLS: {e}")))?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = hyper_util::client::legacy::Client::builder(
            hyper_util::rt::TokioExecutor::new(),
        )
        .build(connector);

        let hub = match credentials {
            GcpCredentials::Ambient => {
                let opts = yup_oauth2::ApplicationDefaultCredentialsFlowOpts::default();
                let auth =
                    match yup_oauth2::ApplicationDefaultCredentialsAuthenticator::builder(opts)
                        .await
                    {
                        ApplicationDefaultCredentialsTypes::ServiceAccount(builder) => {
                            info!("Using GCP service account from GOOGLE_APPLICATION_CREDENTIALS");
                            builder.build().await
                        }
                        ApplicationDefaultCredentialsTypes::InstanceMetadata(builder) => {
                            info!("Using GCP instance metadata credentials");
                            builder.build().await
                        }
                    }
                    .map_err(authenticator_error)?;
                SecretManager::new(client, auth)
            }
            GcpCredentials::ServiceAccountKey { path } => {
                let key = yup_oauth2::read_service_account_key(path)
                    .await
                    .map_err(|e| {
                        credentials_error(format!(
                            "failed to read service account key {}: {e}",
                            path.display()
                        ))
                    })?;
                let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
                    .build()
                    .await
                    .map_err(authenticator_error)?;
                SecretManager::new(client, auth)
            }
            GcpCredentials::AccessToken { token } => {
                SecretManager::new(client, token.expose_secret().to_string())
            }
            GcpCredentials::Anonymous => SecretManager::new(client, NoToken),
        };

        Ok(hub)
    }

    /// Full version resource name for `reference` at `version`
    fn resource_name(reference: &SecretReference, version: &str) -> String {
        format!(
            "projects/{}/secrets/{}/versions/{version}",
            reference.location().unwrap_or_default(),
            reference.secret()
        )
    }

    fn fetch_error(
        reference: &SecretReference,
        err: &google_secretmanager1::Error,
    ) -> SecretError {
        let message = match not_found_detail(err) {
            Some(detail) => format!("secret or version not found: {detail}"),
            None => err.to_string(),
        };

        SecretError::FetchFailed {
            provider: PROVIDER,
            secret: reference.secret().to_string(),
            message,
        }
    }

    fn payload(
        reference: &SecretReference,
        response: AccessSecretVersionResponse,
    ) -> Result<SecretPayload, SecretError> {
        response
            .payload
            .and_then(|payload| payload.data)
            .map(SecretPayload::from)
            .ok_or_else(|| SecretError::FetchFailed {
                provider: PROVIDER,
                secret: reference.secret().to_string(),
                message: "response carried no payload data".to_string(),
            })
    }
}

/// The API's explanation when `err` is a 404 / `NOT_FOUND` response
fn not_found_detail(err: &google_secretmanager1::Error) -> Option<String> {
    match err {
        google_secretmanager1::Error::BadRequest(body) => {
            let error = body.get("error")?;
            let not_found = error.get("code").and_then(Value::as_u64) == Some(404)
                || error.get("status").and_then(Value::as_str) == Some("NOT_FOUND");
            not_found.then(|| {
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("NOT_FOUND")
                    .to_string()
            })
        }
        google_secretmanager1::Error::Failure(response) if response.status().as_u16() == 404 => {
            Some("HTTP 404".to_string())
        }
        _ => None,
    }
}

fn credentials_error(message: String) -> SecretError {
    SecretError::Credentials {
        provider: PROVIDER,
        message,
    }
}

fn authenticator_error(err: impl std::fmt::Display) -> SecretError {
    credentials_error(format!("failed to create authenticator: {err}"))
}

#[async_trait]
impl SecretFetcher for GcpSecretsManager {
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
        let name = Self::resource_name(reference, version);

        let (_, response) = self
            .hub
            .projects()
            .secrets_versions_access(&name)
            .doit()
            .await
            .map_err(|e| Self::fetch_error(reference, &e))?;

        Self::payload(reference, response)
    }
}
