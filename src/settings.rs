//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Generic configuration handed to a [`DatabaseConfiguration`](crate::DatabaseConfiguration).
//!
//! Settings are a flat map of dotted string keys to string values. They can be
//! assembled in code, read from the process environment or loaded from a
//! properties file:
//! ```no_run
//! use nosql_drivers::Settings;
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::builder()
//!     .put("nosql.provider", "couchbase")
//!     .put("couchbase.host", "http://localhost:8093")
//!     .put("couchbase.user", "Administrator")
//!     .put("couchbase.password", "password")
//!     .from_file("~/nosql.properties")?
//!     .from_environment()
//!     .build();
//! # Ok(())
//! # }
//! ```

use crate::error::{setting_err, DriverError};
use crate::file_utils::file_to_string;
use ini::Ini;
use std::collections::BTreeMap;
use std::env;
use std::result::Result;
use std::str::FromStr;

/// Setting selecting the provider used by [`ProviderRegistry::configure()`](crate::ProviderRegistry::configure()).
pub const PROVIDER: &str = "nosql.provider";
/// Generic host setting, used when no provider-specific host is given.
pub const HOST: &str = "nosql.host";
/// Generic user setting, used when no provider-specific user is given.
pub const USER: &str = "nosql.user";
/// Generic password setting, used when no provider-specific password is given.
pub const PASSWORD: &str = "nosql.password";

const ENV_PREFIX: &str = "NOSQL_";

/// An immutable set of configuration values.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

/// Builder for [`Settings`]. Later calls override earlier ones.
#[derive(Default, Debug, Clone)]
pub struct SettingsBuilder {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Settings with no values.
    pub fn empty() -> Settings {
        Settings::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(|s| s.to_string())
    }

    /// Get the first key in `keys` that has a value.
    ///
    /// Used for provider settings that fall back to a generic one, such as
    /// `couchbase.host` then `nosql.host`.
    pub fn get_first(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Get a value that must be present.
    pub fn require(&self, key: &str) -> Result<&str, DriverError> {
        match self.get(key) {
            Some(v) => Ok(v),
            None => setting_err!(MissingSetting, "setting '{}' is required", key),
        }
    }

    /// Parse a value into any [`FromStr`] type.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, DriverError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => match v.trim().parse::<T>() {
                Ok(t) => Ok(Some(t)),
                Err(_) => setting_err!(InvalidSetting, "invalid value '{}' for setting '{}'", v, key),
            },
        }
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, DriverError> {
        self.get_parsed::<u64>(key)
    }

    pub fn get_i32(&self, key: &str) -> Result<Option<i32>, DriverError> {
        self.get_parsed::<i32>(key)
    }

    /// Boolean values accept `true`/`false`/`1`/`0`/`yes`/`no`, any case.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, DriverError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => match v.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Some(true)),
                "false" | "0" | "no" => Ok(Some(false)),
                _ => setting_err!(InvalidSetting, "invalid boolean '{}' for setting '{}'", v, key),
            },
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Create a builder pre-populated with these settings.
    pub fn to_builder(&self) -> SettingsBuilder {
        SettingsBuilder {
            values: self.values.clone(),
        }
    }
}

impl SettingsBuilder {
    pub fn new() -> Self {
        SettingsBuilder::default()
    }

    pub fn put(mut self, key: &str, value: impl ToString) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Gather settings from the process environment.
    ///
    /// Every variable starting with `NOSQL_` is used: the prefix is removed, the
    /// rest lower-cased and `_` replaced by `.`. For example `NOSQL_COUCHBASE_HOST`
    /// becomes `couchbase.host`. `NOSQL_PROVIDER`, `NOSQL_HOST`, `NOSQL_USER` and
    /// `NOSQL_PASSWORD` map to the generic `nosql.*` keys.
    pub fn from_environment(self) -> Self {
        self.from_vars(env::vars())
    }

    pub(crate) fn from_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in vars {
            if let Some(key) = env_to_key(&name) {
                self.values.insert(key, value);
            }
        }
        self
    }

    /// Load settings from a properties file.
    ///
    /// The file uses `key=value` lines. Keys under an ini style `[section]`
    /// header are prefixed with the section name, so
    /// ```text
    /// [couchbase]
    /// host=http://localhost:8093
    /// ```
    /// yields `couchbase.host`.
    pub fn from_file(self, filename: &str) -> Result<Self, DriverError> {
        let data = file_to_string(filename)?;
        self.from_properties_str(&data)
            .map_err(|e| DriverError::new(e.code, &format!("{} in {}", e.message, filename)))
    }

    pub fn from_properties_str(mut self, data: &str) -> Result<Self, DriverError> {
        let ini = match Ini::load_from_str(data) {
            Ok(i) => i,
            Err(e) => {
                return setting_err!(InvalidSetting, "error parsing properties: {}", e);
            }
        };
        for (section, props) in ini.iter() {
            for (k, v) in props.iter() {
                let key = match section {
                    Some(s) => format!("{}.{}", s, k),
                    None => k.to_string(),
                };
                self.values.insert(key, v.to_string());
            }
        }
        Ok(self)
    }

    pub fn build(self) -> Settings {
        Settings {
            values: self.values,
        }
    }
}

fn env_to_key(name: &str) -> Option<String> {
    let rest = name.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    let key = rest.to_lowercase().replace('_', ".");
    match key.as_str() {
        "provider" | "host" | "user" | "password" => Some(format!("nosql.{}", key)),
        _ => Some(key),
    }
}
