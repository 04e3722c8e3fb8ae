//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Generic value wrapper and key/value entity.

use crate::error::{ia_err, DriverError, DriverErrorCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::result::Result;

/// A value read from or written to a bucket.
///
/// Values are JSON shaped: anything that implements [`serde::Serialize`] can be
/// wrapped, and a stored value can be read back into any type implementing
/// [`serde::de::DeserializeOwned`]. Stores never look inside a `Value`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Value {
    inner: serde_json::Value,
}

impl Value {
    /// Wrap a serializable value.
    pub fn of(val: impl Serialize) -> Result<Value, DriverError> {
        Ok(Value {
            inner: serde_json::to_value(val)?,
        })
    }

    /// Parse a JSON document into a `Value`.
    pub fn from_json_str(json: &str) -> Result<Value, DriverError> {
        Ok(Value {
            inner: serde_json::from_str(json)?,
        })
    }

    /// Convert the value into a native type.
    pub fn get<T: DeserializeOwned>(&self) -> Result<T, DriverError> {
        serde_json::from_value(self.inner.clone()).map_err(|e| {
            DriverError::new(
                DriverErrorCode::Serialization,
                &format!("could not convert value: {}", e),
            )
        })
    }

    /// Get the underlying JSON value.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.inner
    }

    pub fn into_json(self) -> serde_json::Value {
        self.inner
    }

    /// Returns true if this value holds JSON `null`. Null values cannot be stored.
    pub fn is_null(&self) -> bool {
        self.inner.is_null()
    }

    /// Serialize the value to a JSON string.
    pub fn to_json_string(&self) -> String {
        self.inner.to_string()
    }
}

impl From<serde_json::Value> for Value {
    fn from(inner: serde_json::Value) -> Self {
        Value { inner }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A key and the value stored under it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueEntity {
    key: String,
    value: Value,
}

impl KeyValueEntity {
    /// Create a new entity. The key is rendered with its `Display` implementation.
    pub fn new(key: impl Display, value: Value) -> KeyValueEntity {
        KeyValueEntity {
            key: key.to_string(),
            value,
        }
    }

    /// Create a new entity from any serializable value.
    pub fn of(key: impl Display, value: impl Serialize) -> Result<KeyValueEntity, DriverError> {
        Ok(KeyValueEntity::new(key, Value::of(value)?))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.key, self.value)
    }
}

pub(crate) fn require_key(key: &str) -> Result<(), DriverError> {
    if key.is_empty() {
        return ia_err!("key is required");
    }
    Ok(())
}

pub(crate) fn require_value(value: &Value) -> Result<(), DriverError> {
    if value.is_null() {
        return ia_err!("value is required");
    }
    Ok(())
}

pub(crate) fn require_ttl(ttl: &std::time::Duration) -> Result<(), DriverError> {
    if ttl.is_zero() {
        return ia_err!("ttl is required and must be greater than zero");
    }
    Ok(())
}
