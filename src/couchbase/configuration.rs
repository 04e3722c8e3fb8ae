//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::bucket::{BucketManagerFactory, DatabaseConfiguration};
use crate::couchbase::bucket_manager::CouchbaseBucketManagerFactory;
use crate::couchbase::client::{CouchbaseClient, CouchbaseClientBuilder};
use crate::couchbase::statement::{DEFAULT_COLLECTION, DEFAULT_SCOPE};
use crate::error::DriverError;
use crate::settings::{self, Settings};
use async_trait::async_trait;
use std::result::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const PROVIDER_NAME: &str = "couchbase";

/// Couchbase node, for example `couchbase://localhost` or `http://localhost:8093`.
pub const HOST: &str = "couchbase.host";
pub const USER: &str = "couchbase.user";
pub const PASSWORD: &str = "couchbase.password";
pub const SCOPE: &str = "couchbase.scope";
pub const COLLECTION: &str = "couchbase.collection";
/// Query timeout in milliseconds.
pub const TIMEOUT: &str = "couchbase.timeout";
/// `true` to skip certificate checks on https connections.
pub const ACCEPT_INVALID_CERTS: &str = "couchbase.accept.invalid.certs";

const DEFAULT_HOST: &str = "http://localhost:8093";

/// The Couchbase [`DatabaseConfiguration`].
///
/// | setting | default |
/// | ------- | ------- |
/// | `couchbase.host` (or `nosql.host`) | `http://localhost:8093` |
/// | `couchbase.user` (or `nosql.user`) | none (anonymous) |
/// | `couchbase.password` (or `nosql.password`) | empty |
/// | `couchbase.scope` | `_default` |
/// | `couchbase.collection` | `_default` |
/// | `couchbase.timeout` | `30000` |
/// | `couchbase.accept.invalid.certs` | `false` |
#[derive(Debug, Default, Clone)]
pub struct CouchbaseConfiguration;

impl CouchbaseConfiguration {
    /// Build the client builder described by `settings`, without connecting.
    pub fn client_builder(settings: &Settings) -> Result<CouchbaseClientBuilder, DriverError> {
        let host = settings
            .get_first(&[HOST, settings::HOST])
            .unwrap_or(DEFAULT_HOST);
        let mut builder = CouchbaseClient::builder().endpoint(host)?;
        if let Some(user) = settings.get_first(&[USER, settings::USER]) {
            let password = settings
                .get_first(&[PASSWORD, settings::PASSWORD])
                .unwrap_or("");
            builder = builder.credentials(user, password)?;
        }
        if let Some(ms) = settings.get_u64(TIMEOUT)? {
            builder = builder.timeout(Duration::from_millis(ms))?;
        }
        if let Some(accept) = settings.get_bool(ACCEPT_INVALID_CERTS)? {
            builder = builder.danger_accept_invalid_certs(accept)?;
        }
        Ok(builder)
    }

    /// Build the concrete factory described by `settings`.
    pub fn factory(settings: &Settings) -> Result<CouchbaseBucketManagerFactory, DriverError> {
        let client = Self::client_builder(settings)?.build()?;
        let scope = settings.get_or(SCOPE, DEFAULT_SCOPE);
        let collection = settings.get_or(COLLECTION, DEFAULT_COLLECTION);
        debug!(
            "Creating couchbase bucket manager factory: url={} scope={} collection={}",
            client.query_url(),
            scope,
            collection
        );
        Ok(CouchbaseBucketManagerFactory::new(client, &scope, &collection))
    }
}

#[async_trait]
impl DatabaseConfiguration for CouchbaseConfiguration {
    fn provider(&self) -> &str {
        PROVIDER_NAME
    }

    async fn apply(&self, settings: &Settings) -> Result<Arc<dyn BucketManagerFactory>, DriverError> {
        Ok(Arc::new(Self::factory(settings)?))
    }
}
