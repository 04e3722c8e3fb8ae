//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! In-process store with per-entry expiry.
//!
//! The memory driver has the same contract as the vendor drivers, which makes it
//! useful for tests and local development. Nothing is persisted.

use crate::bucket::{BucketManager, BucketManagerFactory, DatabaseConfiguration};
use crate::error::{ia_err, DriverError, DriverErrorCode};
use crate::settings::Settings;
use crate::value::{require_key, require_ttl, require_value, KeyValueEntity, Value};
use async_trait::async_trait;
use std::collections::HashMap;
use std::result::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

pub const PROVIDER_NAME: &str = "memory";

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(t) if t <= now)
    }
}

type Bucket = Arc<Mutex<HashMap<String, Entry>>>;

/// [`DatabaseConfiguration`] for the memory driver. It takes no settings.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfiguration;

#[async_trait]
impl DatabaseConfiguration for MemoryConfiguration {
    fn provider(&self) -> &str {
        PROVIDER_NAME
    }

    async fn apply(
        &self,
        _settings: &Settings,
    ) -> Result<Arc<dyn BucketManagerFactory>, DriverError> {
        Ok(Arc::new(MemoryBucketManagerFactory::new()))
    }
}

/// Factory for [`MemoryBucketManager`]s. Managers for the same bucket name share storage.
///
/// Closing the factory also closes every manager it handed out.
#[derive(Debug, Default)]
pub struct MemoryBucketManagerFactory {
    buckets: Mutex<HashMap<String, Bucket>>,
    closed: Arc<AtomicBool>,
}

impl MemoryBucketManagerFactory {
    pub fn new() -> Self {
        debug!("Creating new in-memory bucket manager factory");
        MemoryBucketManagerFactory::default()
    }

    /// Get a concrete manager, without going through `dyn BucketManager`.
    pub fn memory_bucket(&self, name: &str) -> Result<MemoryBucketManager, DriverError> {
        if name.is_empty() {
            return ia_err!("bucket name is required");
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(closed_error(name));
        }
        let data = {
            let mut guard = lock(&self.buckets)?;
            guard
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(HashMap::new())))
                .clone()
        };
        Ok(MemoryBucketManager {
            name: name.to_string(),
            data,
            closed: AtomicBool::new(false),
            factory_closed: self.closed.clone(),
        })
    }
}

#[async_trait]
impl BucketManagerFactory for MemoryBucketManagerFactory {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn BucketManager>, DriverError> {
        Ok(Arc::new(self.memory_bucket(name)?))
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// A [`BucketManager`] backed by a shared in-process map.
#[derive(Debug)]
pub struct MemoryBucketManager {
    name: String,
    data: Bucket,
    closed: AtomicBool,
    factory_closed: Arc<AtomicBool>,
}

impl MemoryBucketManager {
    fn check_open(&self) -> Result<(), DriverError> {
        if self.closed.load(Ordering::Acquire) || self.factory_closed.load(Ordering::Acquire) {
            return Err(closed_error(&self.name));
        }
        Ok(())
    }

    fn insert(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<(), DriverError> {
        // a TTL past the end of the clock never expires
        let expires_at = ttl.and_then(|t| Instant::now().checked_add(t));
        let mut guard = lock(&self.data)?;
        guard.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    /// Number of live (unexpired) entries in the bucket. Expired entries are purged.
    pub fn len(&self) -> Result<usize, DriverError> {
        let now = Instant::now();
        let mut guard = lock(&self.data)?;
        guard.retain(|_, e| !e.is_expired(now));
        Ok(guard.len())
    }

    pub fn is_empty(&self) -> Result<bool, DriverError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl BucketManager for MemoryBucketManager {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), DriverError> {
        require_key(key)?;
        require_value(value)?;
        self.check_open()?;
        trace!("memory put: bucket={} key={}", self.name, key);
        self.insert(key, value, None)
    }

    async fn put_with_ttl(
        &self,
        entity: &KeyValueEntity,
        ttl: Duration,
    ) -> Result<(), DriverError> {
        require_key(entity.key())?;
        require_value(entity.value())?;
        require_ttl(&ttl)?;
        self.check_open()?;
        trace!(
            "memory put: bucket={} key={} ttl={:?}",
            self.name,
            entity.key(),
            ttl
        );
        self.insert(entity.key(), entity.value(), Some(ttl))
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, DriverError> {
        require_key(key)?;
        self.check_open()?;
        let now = Instant::now();
        let mut guard = lock(&self.data)?;
        let expired = match guard.get(key) {
            Some(e) => e.is_expired(now),
            None => return Ok(None),
        };
        if expired {
            trace!("memory get: bucket={} key={} expired", self.name, key);
            guard.remove(key);
            return Ok(None);
        }
        Ok(guard.get(key).map(|e| e.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), DriverError> {
        require_key(key)?;
        self.check_open()?;
        trace!("memory delete: bucket={} key={}", self.name, key);
        lock(&self.data)?.remove(key);
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, DriverError> {
    m.lock().map_err(|_| {
        DriverError::new(
            DriverErrorCode::VendorError,
            "memory store lock poisoned by a panicked writer",
        )
    })
}

fn closed_error(name: &str) -> DriverError {
    DriverError::new(
        DriverErrorCode::Closed,
        &format!("bucket manager for '{}' is closed", name),
    )
}
