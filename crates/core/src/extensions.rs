//! Typed access to extension maps.
//!
//! Tickets, assignments and matches carry an `Extensions` map from string keys
//! to an `Any` box: a type tag plus a serialized payload. `get_ext` decodes a
//! value into a concrete type and keeps "absent" distinct from "corrupt";
//! `get_str_ext` and `get_int_ext` collapse both into a zero value.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{Assignment, Match, MatchProfile, Ticket};

const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Extension map attached to a record. Ordered so dumps are stable.
pub type Extensions = BTreeMap<String, Any>;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("extension type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("failed to decode extension payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode extension payload: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A type-tagged value box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Any {
    #[serde(rename = "@type")]
    pub type_url: String,
    pub value: serde_json::Value,
}

impl Any {
    /// Box a value, tagging it with its type url.
    pub fn pack<T: ExtensionValue>(value: &T) -> Result<Self, ExtensionError> {
        Ok(Self {
            type_url: T::TYPE_URL.to_string(),
            value: serde_json::to_value(value).map_err(ExtensionError::Encode)?,
        })
    }

    /// Decode the boxed value as `T`.
    pub fn unpack<T: ExtensionValue>(&self) -> Result<T, ExtensionError> {
        if self.type_url != T::TYPE_URL {
            return Err(ExtensionError::TypeMismatch {
                expected: T::TYPE_URL.to_string(),
                actual: self.type_url.clone(),
            });
        }
        T::deserialize(&self.value).map_err(ExtensionError::Decode)
    }

    /// The type name without the url prefix.
    pub fn type_name(&self) -> &str {
        self.type_url
            .strip_prefix(TYPE_URL_PREFIX)
            .unwrap_or(&self.type_url)
    }
}

/// A value that can live inside an `Any`.
pub trait ExtensionValue: Serialize + DeserializeOwned {
    const TYPE_URL: &'static str;
}

/// Well-known string wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringValue(pub String);

impl ExtensionValue for StringValue {
    const TYPE_URL: &'static str = "type.googleapis.com/google.protobuf.StringValue";
}

/// Well-known 32-bit integer wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Int32Value(pub i32);

impl ExtensionValue for Int32Value {
    const TYPE_URL: &'static str = "type.googleapis.com/google.protobuf.Int32Value";
}

/// Records that carry an extension map.
///
/// `None` means there is no container at all (for example an absent record).
pub trait HasExtensions {
    fn extensions(&self) -> Option<&Extensions>;
}

impl HasExtensions for Extensions {
    fn extensions(&self) -> Option<&Extensions> {
        Some(self)
    }
}

impl HasExtensions for Ticket {
    fn extensions(&self) -> Option<&Extensions> {
        Some(&self.extensions)
    }
}

impl HasExtensions for Assignment {
    fn extensions(&self) -> Option<&Extensions> {
        Some(&self.extensions)
    }
}

impl HasExtensions for Match {
    fn extensions(&self) -> Option<&Extensions> {
        Some(&self.extensions)
    }
}

impl HasExtensions for MatchProfile {
    fn extensions(&self) -> Option<&Extensions> {
        Some(&self.extensions)
    }
}

impl<T: HasExtensions + ?Sized> HasExtensions for &T {
    fn extensions(&self) -> Option<&Extensions> {
        (**self).extensions()
    }
}

impl<T: HasExtensions> HasExtensions for Option<T> {
    fn extensions(&self) -> Option<&Extensions> {
        self.as_ref().and_then(|inner| inner.extensions())
    }
}

/// Read and decode the extension stored under `key`.
///
/// - `Ok(None)`: no container, or no entry for `key`.
/// - `Ok(Some(value))`: entry present and decoded.
/// - `Err(_)`: entry present but of another type or undecodable.
///
/// An absent record (`None::<T>`) counts as a missing container and yields
/// `Ok(None)`, not an error, so callers cannot tell it apart from a record
/// without the key.
pub fn get_ext<T, O>(obj: &O, key: &str) -> Result<Option<T>, ExtensionError>
where
    T: ExtensionValue,
    O: HasExtensions + ?Sized,
{
    let Some(extensions) = obj.extensions() else {
        return Ok(None);
    };
    let Some(any) = extensions.get(key) else {
        return Ok(None);
    };
    any.unpack().map(Some)
}

/// String extension under `key`, or `""` when absent or malformed.
pub fn get_str_ext<O: HasExtensions + ?Sized>(obj: &O, key: &str) -> String {
    match get_ext::<StringValue, _>(obj, key) {
        Ok(Some(StringValue(value))) => value,
        _ => String::new(),
    }
}

/// Integer extension under `key`, or `0` when absent or malformed.
pub fn get_int_ext<O: HasExtensions + ?Sized>(obj: &O, key: &str) -> i32 {
    match get_ext::<Int32Value, _>(obj, key) {
        Ok(Some(Int32Value(value))) => value,
        _ => 0,
    }
}
