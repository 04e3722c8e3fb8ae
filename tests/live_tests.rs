//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
// These tests need running stores. They do nothing unless NOSQL_INTEGRATION=true.
//
// Couchbase: NOSQL_COUCHBASE_HOST, NOSQL_COUCHBASE_USER, NOSQL_COUCHBASE_PASSWORD
// and a bucket named by NOSQL_COUCHBASE_BUCKET (default "heroes").
//
// Oracle NoSQL: NOSQL_ORACLE_NOSQL_HOST (default http://localhost:8080, cloudsim)
// and the other oracle.nosql.* settings as NOSQL_ORACLE_NOSQL_* variables.
//
use nosql_drivers::{
    BucketManager, CouchbaseConfiguration, DatabaseConfiguration,
    KeyValueEntity, OracleBucketManager, OracleConfiguration, Settings, Value,
};
use oracle_nosql_rust_sdk::types::MapValue;
use oracle_nosql_rust_sdk::GetRequest;
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

fn integration_enabled() -> bool {
    matches!(
        std::env::var("NOSQL_INTEGRATION").map(|v| v.to_lowercase()),
        Ok(v) if v == "true"
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_ansi(false)
        .compact()
        .try_init();
}

async fn exercise(bucket: Arc<dyn BucketManager>) -> Result<(), Box<dyn Error>> {
    let doc = json!({"name": "Ada Lovelace", "born": 1815, "tags": ["math", "engines"]});
    bucket.put("ada", &Value::from(doc.clone())).await?;
    let got = bucket.get("ada").await?.ok_or("ada missing after put")?;
    assert_eq!(got.as_json()["name"], doc["name"]);
    assert_eq!(got.as_json()["born"], doc["born"]);

    bucket
        .put_with_ttl(&KeyValueEntity::of("brief", "soon gone")?, Duration::from_secs(3600))
        .await?;
    assert_eq!(bucket.get("brief").await?.ok_or("brief missing")?.get::<String>()?, "soon gone");

    let many = vec![
        KeyValueEntity::of("k1", json!({"n": 1}))?,
        KeyValueEntity::of("k2", json!({"n": 2}))?,
    ];
    bucket.put_all(&many).await?;
    let keys = vec!["k1".to_string(), "k2".to_string(), "nope".to_string()];
    assert_eq!(bucket.get_all(&keys).await?.len(), 2);

    // a plain put over a TTL put leaves the entry in place
    bucket
        .put_with_ttl(&KeyValueEntity::of("brief", "again")?, Duration::from_secs(3600))
        .await?;
    bucket.put("brief", &Value::of("kept")?).await?;
    assert_eq!(bucket.get("brief").await?.ok_or("brief missing")?.get::<String>()?, "kept");

    bucket.delete_all(&keys).await?;
    bucket.delete("ada").await?;
    bucket.delete("brief").await?;
    assert!(bucket.get("ada").await?.is_none());
    assert!(bucket.get_all(&keys).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn couchbase_live() -> Result<(), Box<dyn Error>> {
    if !integration_enabled() {
        return Ok(());
    }
    init_tracing();
    let settings = Settings::builder().from_environment().build();
    let bucket_name = settings.get_or("couchbase.bucket", "heroes");
    let factory = CouchbaseConfiguration.apply(&settings).await?;
    exercise(factory.bucket(&bucket_name).await?).await?;
    factory.close().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oracle_live() -> Result<(), Box<dyn Error>> {
    if !integration_enabled() {
        return Ok(());
    }
    init_tracing();
    let settings = Settings::builder().from_environment().build();
    let factory = OracleConfiguration.apply(&settings).await?;
    exercise(factory.bucket("nosql_drivers_live").await?).await?;
    factory.close().await?;
    Ok(())
}

async fn expiration_time(bucket: &OracleBucketManager, key: &str) -> Result<i64, Box<dyn Error>> {
    let res = GetRequest::new(bucket.name())
        .key(MapValue::new().str("id", key))
        .execute(bucket.handle())
        .await?;
    Ok(res.expiration_time())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oracle_live_put_clears_ttl() -> Result<(), Box<dyn Error>> {
    if !integration_enabled() {
        return Ok(());
    }
    init_tracing();
    let settings = Settings::builder().from_environment().build();
    let factory = OracleConfiguration::factory(&settings).await?;
    let bucket = factory.oracle_bucket("nosql_drivers_live").await?;
    bucket
        .put_with_ttl(&KeyValueEntity::of("ttl", "expiring")?, Duration::MAX)
        .await?;
    assert!(expiration_time(&bucket, "ttl").await? > 0);
    bucket.put("ttl", &Value::of("permanent")?).await?;
    assert_eq!(expiration_time(&bucket, "ttl").await?, 0);
    bucket.delete("ttl").await?;
    Ok(())
}
