//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::bucket::{BucketManager, BucketManagerFactory, DatabaseConfiguration};
use crate::error::DriverErrorCode;
use crate::memory::{MemoryBucketManagerFactory, MemoryConfiguration};
use crate::settings::Settings;
use crate::value::{KeyValueEntity, Value};
use std::error::Error;
use std::result::Result;
use std::time::Duration;

fn entities(n: usize) -> Result<Vec<KeyValueEntity>, Box<dyn Error>> {
    let mut v = Vec::new();
    for i in 0..n {
        v.push(KeyValueEntity::of(format!("user:{}", i), format!("name{}", i))?);
    }
    Ok(v)
}

#[tokio::test]
async fn test_put_get_delete() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.bucket("users").await?;
    assert_eq!(bucket.name(), "users");

    bucket.put("otavio", &Value::of("Brazil")?).await?;
    let v = bucket.get("otavio").await?.ok_or("value missing")?;
    assert_eq!(v.get::<String>()?, "Brazil");

    // upsert replaces
    bucket.put("otavio", &Value::of(42)?).await?;
    assert_eq!(bucket.get("otavio").await?.ok_or("value missing")?.get::<i32>()?, 42);

    bucket.delete("otavio").await?;
    assert!(bucket.get("otavio").await?.is_none());
    // deleting again is fine
    bucket.delete("otavio").await?;
    Ok(())
}

#[tokio::test]
async fn test_argument_validation() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.bucket("users").await?;
    let e = bucket.put("", &Value::of(1)?).await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::IllegalArgument);
    let e = bucket.put("k", &Value::default()).await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::IllegalArgument);
    let e = bucket.get("").await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::IllegalArgument);
    let e = bucket.delete("").await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::IllegalArgument);
    let ent = KeyValueEntity::of("k", 1)?;
    let e = bucket.put_with_ttl(&ent, Duration::ZERO).await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::IllegalArgument);
    let e = factory.bucket("").await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::IllegalArgument);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.memory_bucket("sessions")?;
    let ent = KeyValueEntity::of("s1", "token")?;
    bucket.put_with_ttl(&ent, Duration::from_secs(2)).await?;
    bucket.put("s2", &Value::of("forever")?).await?;
    assert!(bucket.get("s1").await?.is_some());

    tokio::time::advance(Duration::from_millis(1999)).await;
    assert!(bucket.get("s1").await?.is_some());

    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(bucket.get("s1").await?.is_none());
    assert!(bucket.get("s2").await?.is_some());
    assert_eq!(bucket.len()?, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_longest_ttl() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.memory_bucket("sessions")?;
    bucket
        .put_with_ttl(&KeyValueEntity::of("max", "forever")?, Duration::MAX)
        .await?;
    let centuries = Duration::from_secs(200 * 365 * 24 * 3600);
    bucket
        .put_with_ttl(&KeyValueEntity::of("long", "a while")?, centuries)
        .await?;
    bucket.put_all_with_ttl(&entities(2)?, Duration::MAX).await?;
    tokio::time::advance(Duration::from_secs(300 * 24 * 3600)).await;
    assert!(bucket.get("max").await?.is_some());
    assert!(bucket.get("long").await?.is_some());
    assert_eq!(bucket.len()?, 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_put_clears_earlier_ttl() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.memory_bucket("sessions")?;
    bucket
        .put_with_ttl(&KeyValueEntity::of("s1", "token")?, Duration::from_secs(5))
        .await?;
    bucket.put("s1", &Value::of("kept")?).await?;
    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(bucket.get("s1").await?.is_some());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_put_all_with_ttl() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.memory_bucket("sessions")?;
    bucket
        .put_all_with_ttl(&entities(3)?, Duration::from_secs(60))
        .await?;
    assert_eq!(bucket.len()?, 3);
    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(bucket.is_empty()?);
    let e = bucket
        .put_all_with_ttl(&entities(1)?, Duration::ZERO)
        .await
        .unwrap_err();
    assert!(e.is_illegal_argument());
    Ok(())
}

#[tokio::test]
async fn test_bulk_operations() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.bucket("users").await?;
    bucket.put_all(&entities(4)?).await?;

    let keys: Vec<String> = vec!["user:3".into(), "missing".into(), "user:0".into()];
    let values = bucket.get_all(&keys).await?;
    let names: Vec<String> = values
        .iter()
        .map(|v| v.get::<String>())
        .collect::<Result<_, _>>()?;
    assert_eq!(names, vec!["name3", "name0"]);

    bucket.delete_all(&keys).await?;
    assert!(bucket.get("user:0").await?.is_none());
    assert!(bucket.get("user:1").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_bulk_aborts_on_first_failure() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.memory_bucket("users")?;
    let batch = vec![
        KeyValueEntity::of("a", 1)?,
        KeyValueEntity::new("b", Value::default()),
        KeyValueEntity::of("c", 3)?,
    ];
    let e = bucket.put_all(&batch).await.unwrap_err();
    assert!(e.is_illegal_argument());
    // "a" was written before the failure, "c" never attempted
    assert!(bucket.get("a").await?.is_some());
    assert!(bucket.get("c").await?.is_none());

    let keys: Vec<String> = vec!["a".into(), "".into(), "c".into()];
    assert!(bucket.get_all(&keys).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_shared_and_isolated_buckets() -> Result<(), Box<dyn Error>> {
    let factory = MemoryConfiguration.apply(&Settings::empty()).await?;
    let a1 = factory.bucket("a").await?;
    let a2 = factory.bucket("a").await?;
    let b = factory.bucket("b").await?;
    a1.put("k", &Value::of("v")?).await?;
    assert!(a2.get("k").await?.is_some());
    assert!(b.get("k").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_close() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.bucket("users").await?;
    bucket.close().await?;
    let e = bucket.get("k").await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::Closed);

    factory.close().await?;
    let e = factory.bucket("users").await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::Closed);
    Ok(())
}

#[tokio::test]
async fn test_factory_close_reaches_existing_managers() -> Result<(), Box<dyn Error>> {
    let factory = MemoryBucketManagerFactory::new();
    let bucket = factory.bucket("users").await?;
    bucket.put("k", &Value::of(1)?).await?;
    factory.close().await?;
    let e = bucket.get("k").await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::Closed);
    let e = bucket.put("k", &Value::of(2)?).await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::Closed);
    let e = bucket.delete("k").await.unwrap_err();
    assert_eq!(e.code, DriverErrorCode::Closed);
    Ok(())
}
