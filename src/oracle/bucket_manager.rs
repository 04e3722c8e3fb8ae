//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::bucket::{BucketManager, BucketManagerFactory};
use crate::error::{ia_err, DriverError, DriverErrorCode};
use crate::oracle::configuration::OracleTableSettings;
use crate::oracle::convert::field_value_to_json;
use crate::value::{require_key, require_ttl, require_value, KeyValueEntity, Value};
use async_trait::async_trait;
use oracle_nosql_rust_sdk::types::{Consistency, FieldValue, MapValue};
use oracle_nosql_rust_sdk::{DeleteRequest, GetRequest, Handle, PutRequest, TableRequest};
use std::collections::HashSet;
use std::result::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, trace};

pub(crate) const KEY_FIELD: &str = "id";
pub(crate) const VALUE_FIELD: &str = "content";

const MAX_TABLE_NAME_LEN: usize = 256;
const SECONDS_PER_HOUR: u64 = 3600;
// the store keeps a row TTL as a 32-bit count of hours
const MAX_TTL_HOURS: u64 = i32::MAX as u64;

/// Per-request options shared by every manager of a factory.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub compartment: Option<String>,
    pub consistency: Consistency,
    pub timeout: Option<Duration>,
}

/// The store keeps TTLs in whole hours; round up so a row never expires early.
/// TTLs longer than the store can hold are clamped to its maximum.
pub(crate) fn ttl_in_hours(ttl: &Duration) -> Duration {
    let mut hours = ttl.as_secs() / SECONDS_PER_HOUR;
    if ttl.as_secs() % SECONDS_PER_HOUR > 0 || ttl.subsec_nanos() > 0 {
        hours += 1;
    }
    Duration::from_secs(hours.clamp(1, MAX_TTL_HOURS) * SECONDS_PER_HOUR)
}

pub(crate) fn validate_table_name(name: &str) -> Result<(), DriverError> {
    if name.is_empty() {
        return ia_err!("bucket name is required");
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return ia_err!("bucket name '{}' is longer than {} characters", name, MAX_TABLE_NAME_LEN);
    }
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return ia_err!(
            "bucket name '{}' must start with a letter and contain only letters, digits and underscores",
            name
        );
    }
    Ok(())
}

pub(crate) fn create_table_statement(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} STRING, {} JSON, PRIMARY KEY({}))",
        table, KEY_FIELD, VALUE_FIELD, KEY_FIELD
    )
}

fn key_of(key: &str) -> MapValue {
    MapValue::new().str(KEY_FIELD, key)
}

/// The Oracle NoSQL implementation of [`BucketManager`].
///
/// Rows are `(id, content)` pairs in the table named after the bucket.
#[derive(Debug, Clone)]
pub struct OracleBucketManager {
    handle: Handle,
    table: String,
    options: RequestOptions,
}

impl OracleBucketManager {
    pub fn new(handle: Handle, table: &str, options: RequestOptions) -> OracleBucketManager {
        OracleBucketManager {
            handle,
            table: table.to_string(),
            options,
        }
    }

    /// The SDK handle requests are sent with.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    fn put_request(&self, entity_key: &str, value: &Value) -> PutRequest {
        let row = key_of(entity_key).column(VALUE_FIELD, value.as_json().clone());
        let mut req = PutRequest::new(&self.table).value(row);
        if let Some(t) = &self.options.timeout {
            req = req.timeout(t);
        }
        if let Some(c) = &self.options.compartment {
            req = req.compartment_id(c);
        }
        req
    }
}

#[async_trait]
impl BucketManager for OracleBucketManager {
    fn name(&self) -> &str {
        &self.table
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), DriverError> {
        require_key(key)?;
        require_value(value)?;
        trace!("oracle nosql put: table={} key={}", self.table, key);
        // an existing row would otherwise keep the TTL of an earlier put;
        // tables are created without a default TTL, so this clears it
        self.put_request(key, value)
            .use_table_ttl(true)
            .execute(&self.handle)
            .await?;
        Ok(())
    }

    async fn put_with_ttl(
        &self,
        entity: &KeyValueEntity,
        ttl: Duration,
    ) -> Result<(), DriverError> {
        require_key(entity.key())?;
        require_value(entity.value())?;
        require_ttl(&ttl)?;
        let ttl = ttl_in_hours(&ttl);
        trace!(
            "oracle nosql put: table={} key={} ttl={:?}",
            self.table,
            entity.key(),
            ttl
        );
        self.put_request(entity.key(), entity.value())
            .ttl(&ttl)
            .execute(&self.handle)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, DriverError> {
        require_key(key)?;
        trace!("oracle nosql get: table={} key={}", self.table, key);
        let mut req = GetRequest::new(&self.table)
            .key(key_of(key))
            .consistency(self.options.consistency);
        if let Some(t) = &self.options.timeout {
            req = req.timeout(t);
        }
        if let Some(c) = &self.options.compartment {
            req = req.compartment_id(c);
        }
        let res = req.execute(&self.handle).await?;
        let row = match res.row() {
            Some(r) => r,
            None => return Ok(None),
        };
        match row.get_field_value(VALUE_FIELD) {
            None | Some(FieldValue::Null) | Some(FieldValue::JsonNull) => Ok(None),
            Some(fv) => Ok(Some(Value::from(field_value_to_json(fv)?))),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), DriverError> {
        require_key(key)?;
        trace!("oracle nosql delete: table={} key={}", self.table, key);
        let mut req = DeleteRequest::new(&self.table, key_of(key));
        if let Some(t) = &self.options.timeout {
            req = req.timeout(t);
        }
        if let Some(c) = &self.options.compartment {
            req = req.compartment_id(c);
        }
        req.execute(&self.handle).await?;
        Ok(())
    }
}

/// Creates [`OracleBucketManager`]s sharing one SDK [`Handle`].
///
/// The first request for a bucket creates its table if it does not exist and
/// waits for it to become active.
#[derive(Debug)]
pub struct OracleBucketManagerFactory {
    handle: Handle,
    options: RequestOptions,
    table_settings: OracleTableSettings,
    tables: Mutex<HashSet<String>>,
}

impl OracleBucketManagerFactory {
    pub fn new(
        handle: Handle,
        options: RequestOptions,
        table_settings: OracleTableSettings,
    ) -> OracleBucketManagerFactory {
        OracleBucketManagerFactory {
            handle,
            options,
            table_settings,
            tables: Mutex::new(HashSet::new()),
        }
    }

    fn is_known(&self, table: &str) -> Result<bool, DriverError> {
        match self.tables.lock() {
            Ok(t) => Ok(t.contains(table)),
            Err(_) => Err(DriverError::new(
                DriverErrorCode::VendorError,
                "table cache lock poisoned",
            )),
        }
    }

    fn remember(&self, table: &str) {
        if let Ok(mut t) = self.tables.lock() {
            t.insert(table.to_string());
        }
    }

    async fn ensure_table(&self, table: &str) -> Result<(), DriverError> {
        if self.is_known(table)? {
            return Ok(());
        }
        let stmt = create_table_statement(table);
        debug!("Creating oracle nosql table: {}", stmt);
        let mut req = TableRequest::new(table).statement(&stmt);
        if let Some(limits) = &self.table_settings.limits {
            req = req.limits(limits);
        }
        if let Some(c) = &self.options.compartment {
            req = req.compartment_id(c);
        }
        if let Some(t) = &self.options.timeout {
            req = req.timeout(t);
        }
        req.execute(&self.handle)
            .await?
            .wait_for_completion(&self.handle, self.table_settings.wait, self.table_settings.delay)
            .await?;
        self.remember(table);
        Ok(())
    }

    pub async fn oracle_bucket(&self, name: &str) -> Result<OracleBucketManager, DriverError> {
        validate_table_name(name)?;
        self.ensure_table(name).await?;
        Ok(OracleBucketManager::new(
            self.handle.clone(),
            name,
            self.options.clone(),
        ))
    }
}

#[async_trait]
impl BucketManagerFactory for OracleBucketManagerFactory {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn BucketManager>, DriverError> {
        Ok(Arc::new(self.oracle_bucket(name).await?))
    }
}
