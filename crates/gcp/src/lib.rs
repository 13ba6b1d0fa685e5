//! GCP integration for secretcfg
//!
//! This crate provides a GCP Secret Manager source for secretcfg.
//! - [`provider`] builds a timeout-bounded byte provider from a [`GcpSecretConfig`]
//! - [`GcpSecretsManager`] is the raw fetcher, injectable with a pre-built hub

pub mod secrets;

// Re-export main types for convenience
pub use secrets::{
    CURRENT_VERSION, GcpCredentials, GcpSecretConfig, GcpSecretsManager, SecretManagerHub,
    provider, provider_with_hub,
};
