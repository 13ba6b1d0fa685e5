//! Building providers and loading configured sources into a tree

use crate::config::{BackendConfig, SourceConfig, SourcesConfig};
use futures::future::try_join_all;
use secretcfg_secrets::{
    ConfigMap, ConfigTree, Parser, PrefixJsonParser, Provider, SecretError,
};
use tracing::{debug, info};

/// Construct the provider for `source`, selecting the vendor by its tag.
///
/// Vendor client setup (credentials, TLS) happens here, once per source.
///
/// # Errors
///
/// Returns [`SecretError::InvalidConfig`] for an incomplete source and
/// [`SecretError::Credentials`] if the vendor client cannot be built.
pub async fn build_provider(source: &SourceConfig) -> Result<Box<dyn Provider>, SecretError> {
    let provider: Box<dyn Provider> = match &source.backend {
        BackendConfig::Aws(config) => Box::new(secretcfg_aws::provider(config.clone()).await?),
        BackendConfig::Gcp(config) => Box::new(secretcfg_gcp::provider(config.clone()).await?),
    };
    Ok(provider)
}

/// Fetch one source and namespace it under its prefix
async fn fetch_source(source: &SourceConfig) -> Result<ConfigMap, SecretError> {
    debug!(
        provider = source.backend.provider_name(),
        secret = source.backend.secret(),
        prefix = %source.prefix,
        "Loading secret source"
    );

    let provider = build_provider(source).await?;
    let payload = provider.read_bytes().await?;
    PrefixJsonParser::new(source.prefix.clone()).unmarshal(payload.expose())
}

/// Load every source into a fresh tree using `delimiter` for key paths.
///
/// Sources are fetched concurrently and merged in configuration order, so a
/// later source wins where two share a key path.
///
/// # Errors
///
/// The first failing source's error is returned unchanged and no tree is
/// produced.
pub async fn load_sources(
    config: &SourcesConfig,
    delimiter: &str,
) -> Result<ConfigTree, SecretError> {
    let objects = try_join_all(config.sources.iter().map(fetch_source)).await?;

    let mut tree = ConfigTree::new(delimiter);
    for object in objects {
        tree.merge(object);
    }

    info!(sources = config.sources.len(), "Loaded secret sources");
    Ok(tree)
}
