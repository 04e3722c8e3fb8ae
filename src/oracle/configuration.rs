//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::bucket::{BucketManagerFactory, DatabaseConfiguration};
use crate::error::{setting_err, DriverError, DriverErrorCode};
use crate::file_utils::expand_user_home;
use crate::oracle::bucket_manager::{OracleBucketManagerFactory, RequestOptions};
use crate::settings::{self, Settings};
use async_trait::async_trait;
use oracle_nosql_rust_sdk::types::{Consistency, TableLimits};
use oracle_nosql_rust_sdk::{Handle, HandleBuilder, HandleMode, NoSQLError};
use std::result::Result;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const PROVIDER_NAME: &str = "oracle";

/// Endpoint of the NoSQL proxy, cloudsim or cloud service.
pub const HOST: &str = "oracle.nosql.host";
/// One of `cloudsim`, `on_premises`, `cloud_api_key`, `cloud_instance_principal`,
/// `cloud_resource_principal`.
pub const DEPLOYMENT: &str = "oracle.nosql.deployment";
pub const USER: &str = "oracle.nosql.user";
pub const PASSWORD: &str = "oracle.nosql.password";
/// OCI config file used by `cloud_api_key`. Defaults to `~/.oci/config`.
pub const CONFIG_FILE: &str = "oracle.nosql.config.file";
pub const PROFILE: &str = "oracle.nosql.profile";
pub const REGION: &str = "oracle.nosql.region";
pub const COMPARTMENT: &str = "oracle.nosql.compartment";
/// Request timeout in milliseconds.
pub const TIMEOUT: &str = "oracle.nosql.timeout";
/// `eventual` or `absolute`.
pub const CONSISTENCY: &str = "oracle.nosql.consistency";
pub const TABLE_READ_LIMIT: &str = "oracle.nosql.table.read.limit";
pub const TABLE_WRITE_LIMIT: &str = "oracle.nosql.table.write.limit";
pub const TABLE_STORAGE_GB: &str = "oracle.nosql.table.storage.gb";
pub const TABLE_WAIT_MILLIS: &str = "oracle.nosql.table.wait.millis";
pub const TABLE_DELAY_MILLIS: &str = "oracle.nosql.table.delay.millis";

const DEFAULT_HOST: &str = "http://localhost:8080";
const DEFAULT_OCI_CONFIG: &str = "~/.oci/config";
const DEFAULT_PROFILE: &str = "DEFAULT";

/// How the store is deployed, which decides how the handle authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deployment {
    /// Local cloud simulator, no authentication.
    #[default]
    Cloudsim,
    /// On-premises proxy, optionally secured with user/password.
    OnPremises,
    /// Cloud service, user identity from an OCI config file.
    CloudApiKey,
    /// Cloud service, OCI instance principal.
    CloudInstancePrincipal,
    /// Cloud service, OCI resource principal.
    CloudResourcePrincipal,
}

impl Deployment {
    pub fn is_cloud(&self) -> bool {
        matches!(
            self,
            Deployment::CloudApiKey
                | Deployment::CloudInstancePrincipal
                | Deployment::CloudResourcePrincipal
        )
    }
}

impl FromStr for Deployment {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "cloudsim" => Ok(Deployment::Cloudsim),
            "on_premises" | "onprem" => Ok(Deployment::OnPremises),
            "cloud_api_key" => Ok(Deployment::CloudApiKey),
            "cloud_instance_principal" => Ok(Deployment::CloudInstancePrincipal),
            "cloud_resource_principal" => Ok(Deployment::CloudResourcePrincipal),
            _ => setting_err!(InvalidSetting, "invalid value '{}' for {}", s, DEPLOYMENT),
        }
    }
}

/// Table parameters used when a bucket's table is created.
#[derive(Debug, Clone)]
pub struct OracleTableSettings {
    /// Provisioned throughput; only sent to the cloud service.
    pub limits: Option<TableLimits>,
    pub wait: Duration,
    pub delay: Duration,
}

impl Default for OracleTableSettings {
    fn default() -> Self {
        OracleTableSettings {
            limits: None,
            wait: Duration::from_millis(15000),
            delay: Duration::from_millis(500),
        }
    }
}

/// The Oracle NoSQL [`DatabaseConfiguration`].
///
/// Every bucket is a table `(id STRING, content JSON, PRIMARY KEY(id))` named
/// after the bucket, created on first use.
///
/// | setting | default |
/// | ------- | ------- |
/// | `oracle.nosql.host` (or `nosql.host`) | `http://localhost:8080` |
/// | `oracle.nosql.deployment` | `cloudsim` |
/// | `oracle.nosql.user` / `.password` (or `nosql.user` / `nosql.password`) | none |
/// | `oracle.nosql.config.file` / `.profile` | `~/.oci/config` / `DEFAULT` |
/// | `oracle.nosql.region`, `oracle.nosql.compartment` | none |
/// | `oracle.nosql.timeout` | SDK default (30s) |
/// | `oracle.nosql.consistency` | `eventual` |
/// | `oracle.nosql.table.read.limit` / `.write.limit` / `.storage.gb` | 10 / 10 / 1 |
/// | `oracle.nosql.table.wait.millis` / `.delay.millis` | 15000 / 500 |
#[derive(Debug, Default, Clone)]
pub struct OracleConfiguration;

fn sdk_setting_error(e: NoSQLError) -> DriverError {
    DriverError::new(
        DriverErrorCode::InvalidSetting,
        &format!("oracle nosql configuration: {}", e),
    )
}

impl OracleConfiguration {
    /// Build the SDK [`HandleBuilder`] described by `settings`.
    pub fn handle_builder(settings: &Settings) -> Result<HandleBuilder, DriverError> {
        let deployment = match settings.get(DEPLOYMENT) {
            Some(d) => Deployment::from_str(d)?,
            None => Deployment::default(),
        };
        let host = settings.get_first(&[HOST, settings::HOST]);
        let mut b = Handle::builder();
        match deployment {
            Deployment::Cloudsim => {
                b = b
                    .endpoint(host.unwrap_or(DEFAULT_HOST))
                    .and_then(|b| b.mode(HandleMode::Cloudsim))
                    .map_err(sdk_setting_error)?;
            }
            Deployment::OnPremises => {
                // the endpoint must be set before credentials; auth uses it for login
                b = b
                    .endpoint(host.unwrap_or(DEFAULT_HOST))
                    .and_then(|b| b.mode(HandleMode::Onprem))
                    .map_err(sdk_setting_error)?;
                // an empty user means an unsecured store
                let user = settings.get_first(&[USER, settings::USER]).unwrap_or("");
                let password = settings
                    .get_first(&[PASSWORD, settings::PASSWORD])
                    .unwrap_or("");
                b = b.onprem_auth(user, password).map_err(sdk_setting_error)?;
            }
            Deployment::CloudApiKey => {
                if let Some(region) = settings.get(REGION) {
                    b = b.cloud_region(region).map_err(sdk_setting_error)?;
                }
                let file = expand_user_home(&settings.get_or(CONFIG_FILE, DEFAULT_OCI_CONFIG))?;
                let profile = settings.get_or(PROFILE, DEFAULT_PROFILE);
                b = b
                    .cloud_auth_from_file_with_profile(&file, &profile)
                    .map_err(sdk_setting_error)?;
            }
            Deployment::CloudInstancePrincipal => {
                if let Some(region) = settings.get(REGION) {
                    b = b.cloud_region(region).map_err(sdk_setting_error)?;
                }
                b = b.cloud_auth_from_instance().map_err(sdk_setting_error)?;
            }
            Deployment::CloudResourcePrincipal => {
                if let Some(region) = settings.get(REGION) {
                    b = b.cloud_region(region).map_err(sdk_setting_error)?;
                }
                b = b.cloud_auth_from_resource().map_err(sdk_setting_error)?;
            }
        }
        if deployment.is_cloud() {
            // an explicit host overrides the region's endpoint
            if let Some(h) = settings.get(HOST) {
                b = b.endpoint(h).map_err(sdk_setting_error)?;
            }
        }
        if let Some(ms) = settings.get_u64(TIMEOUT)? {
            b = b
                .timeout(Duration::from_millis(ms))
                .map_err(sdk_setting_error)?;
        }
        Ok(b)
    }

    pub fn request_options(settings: &Settings) -> Result<RequestOptions, DriverError> {
        let consistency = match settings.get(CONSISTENCY).map(|c| c.trim().to_lowercase()) {
            None => Consistency::Eventual,
            Some(c) if c == "eventual" => Consistency::Eventual,
            Some(c) if c == "absolute" => Consistency::Absolute,
            Some(c) => {
                return setting_err!(InvalidSetting, "invalid value '{}' for {}", c, CONSISTENCY);
            }
        };
        let timeout = settings.get_u64(TIMEOUT)?.map(Duration::from_millis);
        Ok(RequestOptions {
            compartment: settings.get_string(COMPARTMENT),
            consistency,
            timeout,
        })
    }

    pub fn table_settings(settings: &Settings) -> Result<OracleTableSettings, DriverError> {
        let deployment = match settings.get(DEPLOYMENT) {
            Some(d) => Deployment::from_str(d)?,
            None => Deployment::default(),
        };
        let read = settings.get_i32(TABLE_READ_LIMIT)?.unwrap_or(10);
        let write = settings.get_i32(TABLE_WRITE_LIMIT)?.unwrap_or(10);
        let storage = settings.get_i32(TABLE_STORAGE_GB)?.unwrap_or(1);
        let limits = if deployment != Deployment::OnPremises {
            Some(TableLimits::provisioned(read, write, storage))
        } else {
            None
        };
        Ok(OracleTableSettings {
            limits,
            wait: Duration::from_millis(settings.get_u64(TABLE_WAIT_MILLIS)?.unwrap_or(15000)),
            delay: Duration::from_millis(settings.get_u64(TABLE_DELAY_MILLIS)?.unwrap_or(500)),
        })
    }

    /// Build the handle and the concrete factory described by `settings`.
    pub async fn factory(settings: &Settings) -> Result<OracleBucketManagerFactory, DriverError> {
        let builder = Self::handle_builder(settings)?;
        let options = Self::request_options(settings)?;
        let table = Self::table_settings(settings)?;
        let handle = builder.build().await?;
        debug!(
            "Creating oracle nosql bucket manager factory: options={:?} table={:?}",
            options, table
        );
        Ok(OracleBucketManagerFactory::new(handle, options, table))
    }
}

#[async_trait]
impl DatabaseConfiguration for OracleConfiguration {
    fn provider(&self) -> &str {
        PROVIDER_NAME
    }

    async fn apply(&self, settings: &Settings) -> Result<Arc<dyn BucketManagerFactory>, DriverError> {
        Ok(Arc::new(Self::factory(settings).await?))
    }
}
