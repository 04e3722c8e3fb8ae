//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::bucket::{BucketManager, BucketManagerFactory};
use crate::couchbase::client::CouchbaseClient;
use crate::couchbase::statement::{expiry_from_ttl, Keyspace};
use crate::error::{ia_err, DriverError};
use crate::value::{require_key, require_ttl, require_value, KeyValueEntity, Value};
use async_trait::async_trait;
use std::result::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// The Couchbase implementation of [`BucketManager`].
///
/// Every call is a single statement against the Query service, on the
/// collection given by the manager's [`Keyspace`].
#[derive(Debug, Clone)]
pub struct CouchbaseBucketManager {
    client: CouchbaseClient,
    keyspace: Keyspace,
}

impl CouchbaseBucketManager {
    pub fn new(client: CouchbaseClient, keyspace: Keyspace) -> CouchbaseBucketManager {
        CouchbaseBucketManager { client, keyspace }
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }
}

#[async_trait]
impl BucketManager for CouchbaseBucketManager {
    fn name(&self) -> &str {
        self.keyspace.bucket()
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), DriverError> {
        require_key(key)?;
        require_value(value)?;
        trace!("couchbase upsert: keyspace={} key={}", self.keyspace, key);
        let args = [serde_json::Value::from(key), value.as_json().clone()];
        self.client.query(&self.keyspace.upsert(), &args).await?;
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
        let expiry = expiry_from_ttl(&ttl, chrono::Utc::now().timestamp());
        trace!(
            "couchbase upsert: keyspace={} key={} expiry={}",
            self.keyspace,
            entity.key(),
            expiry
        );
        let args = [
            serde_json::Value::from(entity.key()),
            entity.value().as_json().clone(),
        ];
        self.client
            .query(&self.keyspace.upsert_with_expiry(expiry), &args)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, DriverError> {
        require_key(key)?;
        trace!("couchbase get: keyspace={} key={}", self.keyspace, key);
        let rows = self
            .client
            .query(&self.keyspace.select_by_key(), &[serde_json::Value::from(key)])
            .await?;
        Ok(rows.into_iter().next().map(Value::from))
    }

    async fn delete(&self, key: &str) -> Result<(), DriverError> {
        require_key(key)?;
        trace!("couchbase delete: keyspace={} key={}", self.keyspace, key);
        self.client
            .query(&self.keyspace.delete_by_key(), &[serde_json::Value::from(key)])
            .await?;
        Ok(())
    }
}

/// Creates [`CouchbaseBucketManager`]s sharing one [`CouchbaseClient`].
#[derive(Debug, Clone)]
pub struct CouchbaseBucketManagerFactory {
    client: CouchbaseClient,
    scope: String,
    collection: String,
}

impl CouchbaseBucketManagerFactory {
    pub fn new(client: CouchbaseClient, scope: &str, collection: &str) -> Self {
        CouchbaseBucketManagerFactory {
            client,
            scope: scope.to_string(),
            collection: collection.to_string(),
        }
    }

    pub fn couchbase_bucket(&self, name: &str) -> Result<CouchbaseBucketManager, DriverError> {
        if name.is_empty() {
            return ia_err!("bucket name is required");
        }
        let keyspace = Keyspace::new(name, &self.scope, &self.collection)?;
        Ok(CouchbaseBucketManager::new(self.client.clone(), keyspace))
    }
}

#[async_trait]
impl BucketManagerFactory for CouchbaseBucketManagerFactory {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn BucketManager>, DriverError> {
        Ok(Arc::new(self.couchbase_bucket(name)?))
    }
}
