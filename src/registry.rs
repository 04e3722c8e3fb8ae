//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::bucket::{BucketManagerFactory, DatabaseConfiguration};
use crate::couchbase::CouchbaseConfiguration;
use crate::error::{setting_err, DriverError};
use crate::memory::MemoryConfiguration;
use crate::oracle::OracleConfiguration;
use crate::repository::{Repository, RepositoryDescriptor};
use crate::settings::{self, Settings};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::result::Result;
use std::sync::Arc;
use tracing::debug;

/// Maps provider names to their [`DatabaseConfiguration`].
///
/// The provider to use is chosen at run time from the `nosql.provider` setting:
///
/// ```no_run
/// use nosql_drivers::{ProviderRegistry, Settings};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::builder().from_environment().build();
/// let factory = ProviderRegistry::with_defaults().configure(&settings).await?;
/// let users = factory.bucket("users").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn DatabaseConfiguration>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> ProviderRegistry {
        ProviderRegistry::default()
    }

    /// A registry holding the `couchbase`, `oracle` and `memory` providers.
    pub fn with_defaults() -> ProviderRegistry {
        ProviderRegistry::new()
            .register(Arc::new(CouchbaseConfiguration))
            .register(Arc::new(OracleConfiguration))
            .register(Arc::new(MemoryConfiguration))
    }

    /// Add a provider, replacing any registered under the same name.
    pub fn register(mut self, config: Arc<dyn DatabaseConfiguration>) -> ProviderRegistry {
        self.providers.insert(config.provider().to_string(), config);
        self
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn DatabaseConfiguration>> {
        self.providers.get(provider).cloned()
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(|k| k.as_str())
    }

    /// Apply the configuration of the provider named by `nosql.provider`.
    pub async fn configure(
        &self,
        settings: &Settings,
    ) -> Result<Arc<dyn BucketManagerFactory>, DriverError> {
        let name = settings.require(settings::PROVIDER)?;
        self.configure_provider(name, settings).await
    }

    /// Apply the configuration of the named provider.
    pub async fn configure_provider(
        &self,
        provider: &str,
        settings: &Settings,
    ) -> Result<Arc<dyn BucketManagerFactory>, DriverError> {
        let name = provider.trim().to_lowercase();
        let config = match self.providers.get(&name) {
            Some(c) => c,
            None => {
                return setting_err!(
                    UnknownProvider,
                    "unknown provider '{}', expected one of: {}",
                    provider,
                    self.providers().collect::<Vec<_>>().join(", ")
                );
            }
        };
        debug!("Configuring provider {}", name);
        config.apply(settings).await
    }

    /// Configure the provider named by `nosql.provider` and bind a [`Repository`]
    /// for entity type `T` to `bucket`.
    pub async fn repository<T>(
        &self,
        settings: &Settings,
        bucket: &str,
    ) -> Result<(RepositoryDescriptor, Repository<T>), DriverError>
    where
        T: Serialize + DeserializeOwned,
    {
        let name = settings.require(settings::PROVIDER)?;
        let factory = self.configure_provider(name, settings).await?;
        let descriptor = RepositoryDescriptor::of::<T>(&name.trim().to_lowercase());
        debug!("Binding repository {} to bucket {}", descriptor, bucket);
        Ok((descriptor, Repository::new(factory.bucket(bucket).await?)))
    }
}
