//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! NoSQL key-value drivers
//!
//! This crate gives applications one key-value API over several NoSQL stores:
//! [Couchbase](https://www.couchbase.com/), the
//! [Oracle NoSQL Database](https://www.oracle.com/database/nosql-cloud.html)
//! (cloud service, on-premises proxy or cloud simulator) and an in-process
//! memory store for tests and local development.
//!
//! All methods are `async` and run on the [tokio](https://crates.io/crates/tokio) runtime. There is no blocking support.
//!
//! The general flow for an application is:
//! - Collect [`Settings`] in code, from the environment or from a file
//! - Turn them into a [`BucketManagerFactory`] with a [`DatabaseConfiguration`], or let a [`ProviderRegistry`] pick one from the `nosql.provider` setting
//! - Get a [`BucketManager`] per bucket and call `put`, `get`, `delete` and their bulk and TTL variants, or wrap it in a typed [`Repository`]
//!
//! ## Simple Example
//! ```no_run
//! use nosql_drivers::{ProviderRegistry, Settings, Value};
//! use std::error::Error;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     let settings = Settings::builder()
//!         .put("nosql.provider", "couchbase")
//!         .put("couchbase.host", "couchbase://localhost")
//!         .put("couchbase.user", "Administrator")
//!         .put("couchbase.password", "password")
//!         .from_environment()
//!         .build();
//!     let factory = ProviderRegistry::with_defaults().configure(&settings).await?;
//!     let heroes = factory.bucket("heroes").await?;
//!     heroes.put("storm", &Value::of("Ororo Munroe")?).await?;
//!     let storm = heroes.get("storm").await?;
//!     println!("storm={:?}", storm);
//!     Ok(())
//! }
//! ```
//!
//! ## Keys, values and TTL
//!
//! Keys are non-empty strings. Values are JSON documents wrapped in [`Value`];
//! anything that implements `serde::Serialize` can be stored with
//! [`Value::of()`] and read back with [`Value::get()`]. A JSON `null` cannot be
//! stored. Getting a key that does not exist returns `Ok(None)`, and deleting
//! it is not an error.
//!
//! A put with a TTL makes the entry expire after the given duration. Each store
//! has its own resolution: Couchbase counts whole seconds (rounded up),
//! Oracle NoSQL counts whole hours (rounded up, minimum one hour). A TTL longer
//! than a store can hold is clamped to its maximum. A plain put clears any
//! expiry set by an earlier put of the same key, on every store.
//!
//! Bulk operations run the single-item operation once per element, in order.
//! The first failure is returned and the rest are not attempted.
//!
//! ## Configuring the drivers
//!
//! The provider is chosen by `nosql.provider`: `couchbase`, `oracle` or `memory`.
//! `nosql.host`, `nosql.user` and `nosql.password` are used by every driver
//! unless a driver-specific key is given.
//!
//! | provider | settings |
//! | -------- | -------- |
//! | `couchbase` | See [`CouchbaseConfiguration`]. Talks to the Couchbase Query service (port 8093, or 18093 over TLS). |
//! | `oracle` | See [`OracleConfiguration`]. Each bucket is a table, created on first use. |
//! | `memory` | None. |
//!
//! [`SettingsBuilder::from_environment()`] reads every `NOSQL_*` variable:
//! `NOSQL_COUCHBASE_HOST` becomes `couchbase.host`, `NOSQL_PROVIDER` becomes
//! `nosql.provider`. [`SettingsBuilder::from_file()`] reads a properties or
//! ini file.
//!
//! ## Errors
//!
//! Every method returns [`DriverError`], holding a [`DriverErrorCode`] and a
//! message. Errors from the underlying store are passed through with their
//! original message and the code `VendorError`, or `RequestTimeout`.
//!
//! ## Logging
//!
//! The drivers log through [tracing](https://crates.io/crates/tracing): `debug`
//! when factories and tables are created, `trace` for each operation.
//!
//! ## License
//!
//! Copyright (C) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//!
//! Licensed under the Universal Permissive License 1.0.
//!

pub(crate) mod bucket;
pub use crate::bucket::{BucketManager, BucketManagerFactory, DatabaseConfiguration};

pub mod couchbase;
pub use crate::couchbase::{CouchbaseBucketManager, CouchbaseBucketManagerFactory, CouchbaseConfiguration};

pub(crate) mod error;
pub use crate::error::{DriverError, DriverErrorCode};

pub(crate) mod file_utils;
pub(crate) mod memory;
pub use crate::memory::{MemoryBucketManager, MemoryBucketManagerFactory, MemoryConfiguration};

#[cfg(test)]
pub(crate) mod memory_tests;

pub mod oracle;
pub use crate::oracle::{OracleBucketManager, OracleBucketManagerFactory, OracleConfiguration};

pub(crate) mod registry;
pub use crate::registry::ProviderRegistry;

pub(crate) mod repository;
pub use crate::repository::{Repository, RepositoryDescriptor};

pub mod settings;
pub use crate::settings::{Settings, SettingsBuilder};

pub(crate) mod value;
pub use crate::value::{KeyValueEntity, Value};
