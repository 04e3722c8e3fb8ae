//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! The store-neutral key-value interface implemented by every driver.

use crate::error::DriverError;
use crate::settings::Settings;
use crate::value::{require_ttl, KeyValueEntity, Value};
use async_trait::async_trait;
use std::fmt::Debug;
use std::result::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Key-value access to a single bucket (namespace) in a store.
///
/// Implementations validate their arguments and then hand the call to the
/// vendor store in one hop. Keys must be non-empty, values must not be JSON
/// `null` and TTLs must be greater than zero; violations return an
/// [`IllegalArgument`](crate::DriverErrorCode::IllegalArgument) error before
/// anything is sent.
///
/// The bulk methods call their single-item counterpart once per element, in
/// order. There is no batching and no rollback: the first failure is returned
/// immediately and the remaining elements are not attempted.
#[async_trait]
pub trait BucketManager: Send + Sync + Debug {
    /// The name of the bucket this manager is bound to.
    fn name(&self) -> &str;

    /// Insert or update `value` under `key`.
    async fn put(&self, key: &str, value: &Value) -> Result<(), DriverError>;

    /// Insert or update the entity's value under its key, expiring after `ttl`.
    async fn put_with_ttl(&self, entity: &KeyValueEntity, ttl: Duration)
        -> Result<(), DriverError>;

    /// Get the value stored under `key`. Returns `None` if the key does not
    /// exist or has expired.
    async fn get(&self, key: &str) -> Result<Option<Value>, DriverError>;

    /// Remove `key`. Removing a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> Result<(), DriverError>;

    /// Insert or update a single entity.
    async fn put_entity(&self, entity: &KeyValueEntity) -> Result<(), DriverError> {
        self.put(entity.key(), entity.value()).await
    }

    async fn put_all(&self, entities: &[KeyValueEntity]) -> Result<(), DriverError> {
        trace!("put_all: bucket={} count={}", self.name(), entities.len());
        for entity in entities {
            self.put_entity(entity).await?;
        }
        Ok(())
    }

    async fn put_all_with_ttl(
        &self,
        entities: &[KeyValueEntity],
        ttl: Duration,
    ) -> Result<(), DriverError> {
        require_ttl(&ttl)?;
        trace!(
            "put_all_with_ttl: bucket={} count={} ttl={:?}",
            self.name(),
            entities.len(),
            ttl
        );
        for entity in entities {
            self.put_with_ttl(entity, ttl).await?;
        }
        Ok(())
    }

    /// Get the values of all present keys, in key order. Absent keys are skipped.
    async fn get_all(&self, keys: &[String]) -> Result<Vec<Value>, DriverError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(v) = self.get(key).await? {
                values.push(v);
            }
        }
        Ok(values)
    }

    async fn delete_all(&self, keys: &[String]) -> Result<(), DriverError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Creates [`BucketManager`]s for one configured store.
#[async_trait]
pub trait BucketManagerFactory: Send + Sync + Debug {
    /// Get a manager bound to bucket `name`. `name` must be non-empty.
    async fn bucket(&self, name: &str) -> Result<Arc<dyn BucketManager>, DriverError>;

    async fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Turns generic [`Settings`] into a store-specific [`BucketManagerFactory`].
#[async_trait]
pub trait DatabaseConfiguration: Send + Sync + Debug {
    /// The provider name this configuration is registered under, such as `couchbase`.
    fn provider(&self) -> &str;

    async fn apply(&self, settings: &Settings) -> Result<Arc<dyn BucketManagerFactory>, DriverError>;
}
