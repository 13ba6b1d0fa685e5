//! Byte-oriented configuration providers backed by a [`SecretFetcher`]

use crate::{ConfigMap, SecretError, SecretFetcher, SecretPayload, SecretReference};
use async_trait::async_trait;
use tracing::{debug, warn};

/// A source of raw configuration bytes.
///
/// [`read_bytes`](Provider::read_bytes) hands the payload to a
/// [`Parser`](crate::Parser). [`read`](Provider::read) would return an
/// already structured mapping; secret-backed providers never support it,
/// since structuring is the parser's job.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier for logging and errors
    fn provider_name(&self) -> &'static str;

    /// Fetch the raw payload
    async fn read_bytes(&self) -> Result<SecretPayload, SecretError>;

    /// Read a pre-structured mapping
    async fn read(&self) -> Result<ConfigMap, SecretError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Box<P> {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    async fn read_bytes(&self) -> Result<SecretPayload, SecretError> {
        (**self).read_bytes().await
    }

    async fn read(&self) -> Result<ConfigMap, SecretError> {
        (**self).read().await
    }
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for &P {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    async fn read_bytes(&self) -> Result<SecretPayload, SecretError> {
        (**self).read_bytes().await
    }

    async fn read(&self) -> Result<ConfigMap, SecretError> {
        (**self).read().await
    }
}

/// A [`Provider`] that fetches one secret through a vendor [`SecretFetcher`].
///
/// Each [`read_bytes`](Provider::read_bytes) performs a single remote call
/// bounded by the reference's timeout. Nothing is cached or retried.
#[derive(Debug)]
pub struct SecretsProvider<F> {
    reference: SecretReference,
    fetcher: F,
}

impl<F: SecretFetcher> SecretsProvider<F> {
    /// Bind `fetcher` to the secret identified by `reference`
    #[must_use]
    pub const fn new(reference: SecretReference, fetcher: F) -> Self {
        Self { reference, fetcher }
    }

    /// The secret this provider reads
    #[must_use]
    pub const fn reference(&self) -> &SecretReference {
        &self.reference
    }

    /// The vendor fetcher
    #[must_use]
    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

#[async_trait]
impl<F: SecretFetcher> Provider for SecretsProvider<F> {
    fn provider_name(&self) -> &'static str {
        self.fetcher.provider_name()
    }

    async fn read_bytes(&self) -> Result<SecretPayload, SecretError> {
        let provider = self.fetcher.provider_name();
        let secret = self.reference.secret();
        let version = self
            .reference
            .effective_version(self.fetcher.current_version());
        let timeout = self.reference.timeout();

        debug!(provider, secret, version, ?timeout, "Fetching secret");

        // Dropping the fetch future on timeout cancels the in-flight request
        match tokio::time::timeout(timeout, self.fetcher.fetch(&self.reference, version)).await {
            Ok(Ok(payload)) => {
                debug!(provider, secret, version, bytes = payload.len(), "Fetched secret");
                Ok(payload)
            }
            Ok(Err(e)) => {
                warn!(provider, secret, version, error = %e, "Secret fetch failed");
                Err(e)
            }
            Err(_) => {
                warn!(provider, secret, version, ?timeout, "Secret fetch timed out");
                Err(SecretError::Timeout {
                    provider,
                    secret: secret.to_string(),
                    timeout,
                })
            }
        }
    }

    async fn read(&self) -> Result<ConfigMap, SecretError> {
        Err(SecretError::Unsupported {
            provider: self.fetcher.provider_name(),
        })
    }
}
