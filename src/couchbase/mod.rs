//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Couchbase driver.
//!
//! Documents are read and written through the Couchbase Query service
//! (`/query/service`, port 8093 or 18093 for TLS) with one statement per call.
//! Keys map to document ids; values are stored as the document body.

pub(crate) mod bucket_manager;
pub(crate) mod client;
pub(crate) mod configuration;
pub(crate) mod statement;

pub use bucket_manager::{CouchbaseBucketManager, CouchbaseBucketManagerFactory};
pub use client::{CouchbaseClient, CouchbaseClientBuilder};
pub use configuration::{
    CouchbaseConfiguration, ACCEPT_INVALID_CERTS, COLLECTION, HOST, PASSWORD, PROVIDER_NAME,
    SCOPE, TIMEOUT, USER,
};
pub use statement::Keyspace;
