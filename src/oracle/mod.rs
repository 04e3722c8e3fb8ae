//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Oracle NoSQL Database driver.
//!
//! Built on the Oracle NoSQL Rust SDK. Each bucket is a table keyed by a
//! string `id` with the value held in a JSON `content` column.

pub(crate) mod bucket_manager;
pub(crate) mod configuration;
pub(crate) mod convert;

pub use bucket_manager::{OracleBucketManager, OracleBucketManagerFactory, RequestOptions};
pub use configuration::{
    Deployment, OracleConfiguration, OracleTableSettings, COMPARTMENT, CONFIG_FILE, CONSISTENCY,
    DEPLOYMENT, HOST, PASSWORD, PROFILE, PROVIDER_NAME, REGION, TABLE_DELAY_MILLIS,
    TABLE_READ_LIMIT, TABLE_STORAGE_GB, TABLE_WAIT_MILLIS, TABLE_WRITE_LIMIT, TIMEOUT, USER,
};
