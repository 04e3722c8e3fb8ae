//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::bucket::BucketManager;
use crate::error::DriverError;
use crate::value::{KeyValueEntity, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::result::Result;
use std::sync::Arc;
use std::time::Duration;

/// Identifies a repository binding: the entity type it stores and the provider
/// it stores it with. Rendered as `"<entity type name>@<provider>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryDescriptor {
    entity: String,
    provider: String,
}

impl RepositoryDescriptor {
    pub fn new(entity: &str, provider: &str) -> RepositoryDescriptor {
        RepositoryDescriptor {
            entity: entity.to_string(),
            provider: provider.to_string(),
        }
    }

    /// Descriptor for entity type `T`, named by the last path segment of its type name.
    pub fn of<T: ?Sized>(provider: &str) -> RepositoryDescriptor {
        let full = std::any::type_name::<T>();
        // generic arguments may contain "::" too; only look before them
        let base = full.split('<').next().unwrap_or(full);
        let start = base.rfind("::").map(|i| i + 2).unwrap_or(0);
        RepositoryDescriptor::new(&full[start..], provider)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl Display for RepositoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.entity, self.provider)
    }
}

/// Typed access to a bucket.
///
/// Entities are stored as JSON under the id they are saved with. Any type that
/// round-trips through serde can be used:
///
/// ```no_run
/// use nosql_drivers::{MemoryConfiguration, DatabaseConfiguration, Repository, Settings};
/// use serde_derive::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Hero {
///     name: String,
///     power: u32,
/// }
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = MemoryConfiguration.apply(&Settings::empty()).await?;
/// let heroes: Repository<Hero> = Repository::new(factory.bucket("heroes").await?);
/// heroes.save("storm", &Hero { name: "Storm".into(), power: 9 }).await?;
/// let storm = heroes.find_by_id("storm").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Repository<T> {
    bucket: Arc<dyn BucketManager>,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            bucket: self.bucket.clone(),
            phantom: PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(bucket: Arc<dyn BucketManager>) -> Repository<T> {
        Repository {
            bucket,
            phantom: PhantomData,
        }
    }

    pub fn bucket(&self) -> &Arc<dyn BucketManager> {
        &self.bucket
    }

    pub async fn save(&self, id: impl Display, entity: &T) -> Result<(), DriverError> {
        let id = id.to_string();
        self.bucket.put(&id, &Value::of(entity)?).await
    }

    pub async fn save_with_ttl(
        &self,
        id: impl Display,
        entity: &T,
        ttl: Duration,
    ) -> Result<(), DriverError> {
        let kv = KeyValueEntity::of(id, entity)?;
        self.bucket.put_with_ttl(&kv, ttl).await
    }

    /// Save every `(id, entity)` pair in order, stopping at the first failure.
    pub async fn save_all(&self, entities: &[(String, T)]) -> Result<(), DriverError> {
        let mut kvs = Vec::with_capacity(entities.len());
        for (id, e) in entities {
            kvs.push(KeyValueEntity::of(id, e)?);
        }
        self.bucket.put_all(&kvs).await
    }

    pub async fn find_by_id(&self, id: impl Display) -> Result<Option<T>, DriverError> {
        match self.bucket.get(&id.to_string()).await? {
            Some(v) => Ok(Some(v.get()?)),
            None => Ok(None),
        }
    }

    /// Entities found for `ids`, in order. Missing ids are skipped.
    pub async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<T>, DriverError> {
        let values = self.bucket.get_all(ids).await?;
        let mut out = Vec::with_capacity(values.len());
        for v in values {
            out.push(v.get()?);
        }
        Ok(out)
    }

    pub async fn exists_by_id(&self, id: impl Display) -> Result<bool, DriverError> {
        Ok(self.bucket.get(&id.to_string()).await?.is_some())
    }

    pub async fn delete_by_id(&self, id: impl Display) -> Result<(), DriverError> {
        self.bucket.delete(&id.to_string()).await
    }

    pub async fn delete_all_by_id(&self, ids: &[String]) -> Result<(), DriverError> {
        self.bucket.delete_all(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBucketManagerFactory;
    use crate::bucket::BucketManagerFactory;
    use crate::error::DriverErrorCode;
    use serde_derive::{Deserialize, Serialize};
    use std::error::Error;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Hero {
        name: String,
        power: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Villain {
        alias: String,
    }

    fn hero(name: &str, power: u32) -> Hero {
        Hero {
            name: name.to_string(),
            power,
        }
    }

    async fn heroes() -> Result<Repository<Hero>, Box<dyn Error>> {
        let f = MemoryBucketManagerFactory::new();
        Ok(Repository::new(f.bucket("heroes").await?))
    }

    #[test]
    fn test_descriptor() {
        let d = RepositoryDescriptor::of::<Hero>("couchbase");
        assert_eq!(d.entity(), "Hero");
        assert_eq!(d.provider(), "couchbase");
        assert_eq!(d.id(), "Hero@couchbase");
        assert_eq!(RepositoryDescriptor::of::<String>("oracle").id(), "String@oracle");
        assert_ne!(
            RepositoryDescriptor::of::<Hero>("couchbase"),
            RepositoryDescriptor::of::<Hero>("oracle")
        );
    }

    #[tokio::test]
    async fn test_save_find_delete() -> Result<(), Box<dyn Error>> {
        let repo = heroes().await?;
        assert_eq!(repo.bucket().name(), "heroes");
        repo.save("storm", &hero("Storm", 9)).await?;
        assert_eq!(repo.find_by_id("storm").await?, Some(hero("Storm", 9)));
        assert!(repo.exists_by_id("storm").await?);
        assert_eq!(repo.find_by_id("rogue").await?, None);
        repo.delete_by_id("storm").await?;
        assert!(!repo.exists_by_id("storm").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk() -> Result<(), Box<dyn Error>> {
        let repo = heroes().await?;
        repo.save_all(&[
            ("storm".to_string(), hero("Storm", 9)),
            ("cyclops".to_string(), hero("Cyclops", 7)),
        ])
        .await?;
        let ids = vec!["cyclops".to_string(), "nobody".to_string(), "storm".to_string()];
        let found = repo.find_all_by_id(&ids).await?;
        assert_eq!(found, vec![hero("Cyclops", 7), hero("Storm", 9)]);
        repo.delete_all_by_id(&ids[..1]).await?;
        assert_eq!(repo.find_all_by_id(&ids).await?.len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_with_ttl() -> Result<(), Box<dyn Error>> {
        let repo = heroes().await?;
        repo.save_with_ttl(1, &hero("Jubilee", 3), Duration::from_secs(10))
            .await?;
        assert!(repo.exists_by_id(1).await?);
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(!repo.exists_by_id(1).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_shape_is_serialization_error() -> Result<(), Box<dyn Error>> {
        let f = MemoryBucketManagerFactory::new();
        let heroes: Repository<Hero> = Repository::new(f.bucket("people").await?);
        let villains: Repository<Villain> = Repository::new(f.bucket("people").await?);
        villains
            .save("magneto", &Villain { alias: "Magneto".into() })
            .await?;
        let e = heroes.find_by_id("magneto").await.unwrap_err();
        assert_eq!(e.code, DriverErrorCode::Serialization);
        Ok(())
    }
}
