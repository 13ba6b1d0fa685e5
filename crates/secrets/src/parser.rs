//! Prefix-namespacing JSON parser
//!
//! Secrets are usually stored as flat JSON objects (`{"api_key": "..."}`).
//! Loading two such secrets into one configuration tree would make their
//! keys collide, so [`PrefixJsonParser`] relocates every top-level key
//! under a single prefix key: `{"stripe": {"api_key": "..."}}`.

use crate::{ConfigMap, SecretError, json_type_name};
use serde_json::Value;

/// Converts raw provider bytes to a configuration object and back
pub trait Parser: Send + Sync {
    /// Decode `bytes` into a configuration object
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be decoded.
    fn unmarshal(&self, bytes: &[u8]) -> Result<ConfigMap, SecretError>;

    /// Encode a configuration object
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be encoded.
    fn marshal(&self, object: ConfigMap) -> Result<Vec<u8>, SecretError>;
}

/// JSON parser that nests all top-level keys under `prefix`.
///
/// An empty prefix disables namespacing and the parser behaves as a plain
/// JSON object parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixJsonParser {
    prefix: String,
}

impl PrefixJsonParser {
    /// Create a parser for `prefix`
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Parser for PrefixJsonParser {
    fn unmarshal(&self, bytes: &[u8]) -> Result<ConfigMap, SecretError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Value::Object(object) = value else {
            return Err(SecretError::NotAnObject {
                found: json_type_name(&value),
            });
        };
        namespace(object, &self.prefix)
    }

    /// Re-applies the relocation before serializing. This is not the inverse
    /// of [`unmarshal`](Parser::unmarshal): an already namespaced object is
    /// written back unchanged.
    fn marshal(&self, object: ConfigMap) -> Result<Vec<u8>, SecretError> {
        let object = namespace(object, &self.prefix)?;
        Ok(serde_json::to_vec(&object)?)
    }
}

/// Move every top-level entry of `object` other than `prefix` into the
/// object stored under `prefix`.
///
/// - An existing object under `prefix` is kept and receives the moved
///   entries; on a name clash the moved top-level value wins.
/// - An existing non-object value under `prefix` is a
///   [`SecretError::PrefixConflict`]; nothing is dropped silently.
/// - An empty `object` is returned as is, without creating the prefix key.
/// - An empty `prefix` returns `object` unchanged.
///
/// The result's only top-level key is `prefix` (or none for an empty
/// input), and applying the transform twice equals applying it once.
///
/// # Errors
///
/// Returns [`SecretError::PrefixConflict`] as described above.
pub fn namespace(mut object: ConfigMap, prefix: &str) -> Result<ConfigMap, SecretError> {
    if prefix.is_empty() {
        return Ok(object);
    }

    let existing = object.remove(prefix);
    if object.is_empty() {
        // Nothing to relocate; put the prefix entry back untouched
        if let Some(value) = existing {
            object.insert(prefix.to_string(), value);
        }
        return Ok(object);
    }

    let mut nested = match existing {
        None => ConfigMap::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(SecretError::PrefixConflict {
                prefix: prefix.to_string(),
                found: json_type_name(&other),
            });
        }
    };

    // `object` now only holds foreign keys; drain them into the nested map
    nested.extend(std::mem::take(&mut object));
    object.insert(prefix.to_string(), Value::Object(nested));
    Ok(object)
}
