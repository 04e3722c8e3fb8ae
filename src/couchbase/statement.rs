//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{ia_err, DriverError};
use std::fmt::Display;
use std::time::Duration;

pub const DEFAULT_SCOPE: &str = "_default";
pub const DEFAULT_COLLECTION: &str = "_default";

// Couchbase reads expiry values larger than 30 days as an absolute unix time.
const RELATIVE_EXPIRY_LIMIT_SECS: u64 = 30 * 24 * 60 * 60;

/// A Couchbase `bucket`.`scope`.`collection` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyspace {
    bucket: String,
    scope: String,
    collection: String,
}

impl Keyspace {
    pub fn new(bucket: &str, scope: &str, collection: &str) -> Result<Keyspace, DriverError> {
        check_identifier("bucket", bucket)?;
        check_identifier("scope", scope)?;
        check_identifier("collection", collection)?;
        Ok(Keyspace {
            bucket: bucket.to_string(),
            scope: scope.to_string(),
            collection: collection.to_string(),
        })
    }

    /// The default collection of `bucket`.
    pub fn default_collection(bucket: &str) -> Result<Keyspace, DriverError> {
        Keyspace::new(bucket, DEFAULT_SCOPE, DEFAULT_COLLECTION)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// `UPSERT` of one document: `$1` is the key, `$2` the document.
    pub(crate) fn upsert(&self) -> String {
        format!("UPSERT INTO {} (KEY, VALUE) VALUES ($1, $2)", self)
    }

    /// `UPSERT` of one document with a document expiry, in Couchbase expiry units.
    pub(crate) fn upsert_with_expiry(&self, expiry: u32) -> String {
        format!(
            "UPSERT INTO {} (KEY, VALUE, OPTIONS) VALUES ($1, $2, {{\"expiration\": {}}})",
            self, expiry
        )
    }

    /// Fetch one document by key, returning the bare document.
    pub(crate) fn select_by_key(&self) -> String {
        format!("SELECT RAW d FROM {} AS d USE KEYS $1", self)
    }

    pub(crate) fn delete_by_key(&self) -> String {
        format!("DELETE FROM {} USE KEYS $1", self)
    }
}

impl Display for Keyspace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "`{}`.`{}`.`{}`", self.bucket, self.scope, self.collection)
    }
}

fn check_identifier(kind: &str, name: &str) -> Result<(), DriverError> {
    if name.is_empty() {
        return ia_err!("{} name is required", kind);
    }
    if name.contains('`') {
        return ia_err!("invalid {} name '{}': backticks are not allowed", kind, name);
    }
    Ok(())
}

/// Convert a TTL to the value Couchbase expects for a document expiry.
///
/// Couchbase counts expiry in whole seconds, so partial seconds round up. Up to
/// 30 days the value is relative; beyond that it must be an absolute unix time.
/// Expiry is a 32-bit field, so TTLs reaching past it are clamped to `u32::MAX`.
pub(crate) fn expiry_from_ttl(ttl: &Duration, now_unix_secs: i64) -> u32 {
    let mut secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs = secs.saturating_add(1);
    }
    let secs = secs.max(1);
    if secs <= RELATIVE_EXPIRY_LIMIT_SECS {
        return secs as u32;
    }
    let now: u64 = now_unix_secs.max(0).unsigned_abs();
    let absolute = now.saturating_add(secs);
    u32::try_from(absolute).unwrap_or(u32::MAX)
}
