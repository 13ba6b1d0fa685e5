//! secretcfg - load cloud-stored secrets into one configuration tree
//!
//! Each configured source names a vendor (`aws` or `gcp`), a secret, and a
//! prefix. The secret's JSON object is fetched, its top-level keys are
//! nested under the prefix, and every source is merged into a single
//! [`ConfigTree`], so `stripe.api_key` and `twilio.api_key` never collide.
//!
//! ```ignore
//! let config = secretcfg::SourcesConfig::from_file("sources.toml")?;
//! let tree = secretcfg::load_sources(&config, ".").await?;
//! let key = tree.get_str("stripe.api_key");
//! ```

pub mod config;
pub mod sources;

pub use config::{BackendConfig, SourceConfig, SourcesConfig};
pub use sources::{build_provider, load_sources};

pub use secretcfg_aws as aws;
pub use secretcfg_gcp as gcp;
pub use secretcfg_secrets::{
    ConfigMap, ConfigTree, DEFAULT_TIMEOUT, Parser, PrefixJsonParser, Provider, SecretError,
    SecretPayload, SecretReference, SecretsProvider, namespace,
};
