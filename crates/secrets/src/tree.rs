//! In-memory configuration tree that merges parsed sources
//!
//! [`ConfigTree`] is the consumer side of the provider/parser contract: it
//! reads bytes from a [`Provider`], decodes them with a [`Parser`] and deep
//! merges the result. Values are addressed by delimiter-separated paths.

use crate::{ConfigMap, Parser, Provider, SecretError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// A merged configuration tree.
///
/// # Example
///
/// ```ignore
/// let mut tree = ConfigTree::new(".");
/// tree.load(&stripe_provider, &PrefixJsonParser::new("stripe")).await?;
/// tree.load(&twilio_provider, &PrefixJsonParser::new("twilio")).await?;
///
/// let key = tree.get_str("stripe.api_key");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    delimiter: String,
    root: ConfigMap,
}

impl ConfigTree {
    /// Create an empty tree addressed with `delimiter` (usually `"."`)
    #[must_use]
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            root: ConfigMap::new(),
        }
    }

    /// Read one source and merge it into the tree.
    ///
    /// The payload is dropped (and zeroed) as soon as it has been parsed.
    ///
    /// # Errors
    ///
    /// Propagates provider and parser errors unchanged; the tree is left
    /// untouched on failure.
    pub async fn load<P, R>(&mut self, provider: &P, parser: &R) -> Result<(), SecretError>
    where
        P: Provider + ?Sized,
        R: Parser + ?Sized,
    {
        let object = {
            let payload = provider.read_bytes().await?;
            parser.unmarshal(payload.expose())?
        };

        debug!(
            provider = provider.provider_name(),
            keys = object.len(),
            "Merging secret into configuration tree"
        );
        self.merge(object);
        Ok(())
    }

    /// Deep-merge `object` into the tree. Objects merge key by key; any
    /// other value replaces what was there.
    pub fn merge(&mut self, object: ConfigMap) {
        merge_maps(&mut self.root, object);
    }

    /// Look up the value at `path`. An empty path is not a key.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }

        let mut segments = self.split(path);
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Look up a string value at `path`
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Whether a value exists at `path`
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// All leaf paths, sorted. Empty objects count as leaves.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", &self.delimiter, &mut keys);
        keys.sort();
        keys
    }

    /// The merged tree
    #[must_use]
    pub const fn raw(&self) -> &ConfigMap {
        &self.root
    }

    /// Whether nothing has been loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Deserialize the sub-tree at `path` (the whole tree for `""`).
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidConfig`] if `path` does not exist and
    /// [`SecretError::Parse`] if the value does not match `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self, path: &str) -> Result<T, SecretError> {
        let value = if path.is_empty() {
            Value::Object(self.root.clone())
        } else {
            self.get(path)
                .cloned()
                .ok_or_else(|| SecretError::invalid_config(format!("no value at '{path}'")))?
        };
        Ok(serde_json::from_value(value)?)
    }

    fn split<'a>(&'a self, path: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        if self.delimiter.is_empty() {
            Box::new(std::iter::once(path))
        } else {
            Box::new(path.split(self.delimiter.as_str()))
        }
    }
}

fn merge_maps(target: &mut ConfigMap, source: ConfigMap) {
    for (key, value) in source {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_maps(existing, incoming);
            continue;
        }
        target.insert(key, Value::Object(incoming));
    }
}

fn collect_keys(map: &ConfigMap, parent: &str, delimiter: &str, out: &mut Vec<String>) {
    for (key, value) in map {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}{delimiter}{key}")
        };
        match value {
            Value::Object(child) if !child.is_empty() => {
                collect_keys(child, &path, delimiter, out);
            }
            _ => out.push(path),
        }
    }
}
