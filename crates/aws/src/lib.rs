//! AWS integration for secretcfg
//!
//! This crate provides an AWS Secrets Manager source for secretcfg.
//! - [`provider`] builds a timeout-bounded byte provider from an [`AwsSecretConfig`]
//! - [`AwsSecretsManager`] is the raw fetcher, injectable with a pre-built client

pub mod secrets;

// Re-export main types for convenience
pub use secrets::{
    AwsCredentials, AwsSecretConfig, AwsSecretsManager, CURRENT_VERSION, provider,
    provider_with_client,
};
