//! End-to-end loading through provider, parser and configuration tree

use async_trait::async_trait;
use secretcfg_secrets::{
    ConfigTree, PrefixJsonParser, Provider, SecretError, SecretFetcher, SecretPayload,
    SecretReference, SecretsProvider,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Serves fixed payloads keyed by secret name
struct StaticFetcher {
    secrets: HashMap<&'static str, &'static str>,
}

#[async_trait]
impl SecretFetcher for StaticFetcher {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    fn current_version(&self) -> &'static str {
        "current"
    }

    async fn fetch(
        &self,
        reference: &SecretReference,
        _version: &str,
    ) -> Result<SecretPayload, SecretError> {
        self.secrets
            .get(reference.secret())
            .map(|s| SecretPayload::from((*s).to_string()))
            .ok_or_else(|| SecretError::FetchFailed {
                provider: "static",
                secret: reference.secret().to_string(),
                message: "secret not found".to_string(),
            })
    }
}

fn provider(secret: &str) -> SecretsProvider<StaticFetcher> {
    SecretsProvider::new(
        SecretReference::new(secret).unwrap(),
        StaticFetcher {
            secrets: HashMap::from([
                ("stripe", r#"{"api_key": "testapikey"}"#),
                ("twilio", r#"{"api_key": "twiliokey", "sid": "AC123"}"#),
                ("broken", "not json"),
            ]),
        },
    )
}

#[tokio::test]
async fn test_load_with_prefix_parser() {
    let mut tree = ConfigTree::new(".");
    tree.load(&provider("stripe"), &PrefixJsonParser::new("stripe"))
        .await
        .unwrap();

    assert_eq!(tree.get_str("stripe.api_key"), Some("testapikey"));
    assert_eq!(tree.keys(), vec!["stripe.api_key"]);
}

#[tokio::test]
async fn test_secrets_with_shared_field_names_do_not_collide() {
    let mut tree = ConfigTree::new(".");
    tree.load(&provider("stripe"), &PrefixJsonParser::new("stripe"))
        .await
        .unwrap();
    tree.load(&provider("twilio"), &PrefixJsonParser::new("twilio"))
        .await
        .unwrap();

    assert_eq!(tree.get_str("stripe.api_key"), Some("testapikey"));
    assert_eq!(tree.get_str("twilio.api_key"), Some("twiliokey"));
    assert_eq!(tree.get_str("twilio.sid"), Some("AC123"));
}

#[tokio::test]
async fn test_unmarshal_loaded_tree_into_struct() {
    #[derive(Debug, Deserialize)]
    struct Stripe {
        api_key: String,
    }

    #[derive(Debug, Deserialize)]
    struct Conf {
        stripe: Stripe,
    }

    let mut tree = ConfigTree::new(".");
    tree.load(&provider("stripe"), &PrefixJsonParser::new("stripe"))
        .await
        .unwrap();

    let conf: Conf = tree.unmarshal("").unwrap();
    assert_eq!(conf.stripe.api_key, "testapikey");
}

#[tokio::test]
async fn test_missing_secret_fails_and_leaves_tree_untouched() {
    let mut tree = ConfigTree::new(".");
    let err = tree
        .load(&provider("absent"), &PrefixJsonParser::new("absent"))
        .await
        .unwrap_err();

    assert!(err.is_fetch_failure());
    assert!(tree.is_empty());
}

#[tokio::test]
async fn test_parse_failure_propagates() {
    let mut tree = ConfigTree::new(".");
    let err = tree
        .load(&provider("broken"), &PrefixJsonParser::new("broken"))
        .await
        .unwrap_err();

    assert!(matches!(err, SecretError::Parse(_)));
    assert!(tree.is_empty());
}

#[tokio::test]
async fn test_structured_read_fails_by_contract() {
    let err = provider("stripe").read().await.unwrap_err();
    assert!(matches!(err, SecretError::Unsupported { provider: "static" }));
}
