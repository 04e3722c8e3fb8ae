//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
include!(concat!(env!("OUT_DIR"), "/version.rs"));

pub(crate) fn driver_version() -> &'static str {
    DRIVER_VERSION
}

pub(crate) fn user_agent() -> &'static str {
    USER_AGENT
}

/// The error returned by every operation in this library.
///
/// Failures raised by a vendor store are wrapped with code
/// [`DriverErrorCode::VendorError`] (or [`DriverErrorCode::RequestTimeout`]) and
/// keep the vendor's message as-is. Nothing is retried.
#[derive(Debug, Clone)]
pub struct DriverError {
    pub code: DriverErrorCode,
    pub message: String,
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "code={:?} message=\"{}\"", self.code, self.message)
    }
}

impl DriverError {
    pub fn new(code: DriverErrorCode, msg: &str) -> DriverError {
        DriverError {
            code,
            message: msg.to_string(),
        }
    }

    /// Returns true if this error was produced by argument validation.
    pub fn is_illegal_argument(&self) -> bool {
        self.code == DriverErrorCode::IllegalArgument
    }
}

macro_rules! ia_error {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        crate::error::DriverError {
            code: crate::error::DriverErrorCode::IllegalArgument,
            message: format!("{} ({})", m, crate::error::driver_version()),
        }
    }};
}

pub(crate) use ia_error;

macro_rules! ia_err {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        Err(crate::error::DriverError {
            code: crate::error::DriverErrorCode::IllegalArgument,
            message: format!("{} ({})", m, crate::error::driver_version()),
        })
    }};
}

pub(crate) use ia_err;

macro_rules! setting_err {
    ($code:ident, $($t:tt)*) => {{
        let m = format!($($t)*);
        Err(crate::error::DriverError {
            code: crate::error::DriverErrorCode::$code,
            message: format!("{} ({})", m, crate::error::driver_version()),
        })
    }};
}

pub(crate) use setting_err;

impl From<reqwest::Error> for DriverError {
    fn from(e: reqwest::Error) -> Self {
        let mut code = DriverErrorCode::VendorError;
        if e.is_timeout() {
            code = DriverErrorCode::RequestTimeout;
        }
        DriverError {
            code,
            message: format!("reqwest error: {} ({})", e, driver_version()),
        }
    }
}

impl From<reqwest::header::InvalidHeaderValue> for DriverError {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        ia_error!("invalid header value: {}", e)
    }
}

impl From<url::ParseError> for DriverError {
    fn from(e: url::ParseError) -> Self {
        ia_error!("error parsing url: {}", e)
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(e: serde_json::Error) -> Self {
        DriverError {
            code: DriverErrorCode::Serialization,
            message: format!("json error: {} ({})", e, driver_version()),
        }
    }
}

impl From<oracle_nosql_rust_sdk::NoSQLError> for DriverError {
    fn from(e: oracle_nosql_rust_sdk::NoSQLError) -> Self {
        let code = match e.code {
            oracle_nosql_rust_sdk::NoSQLErrorCode::RequestTimeout => {
                DriverErrorCode::RequestTimeout
            }
            _ => DriverErrorCode::VendorError,
        };
        DriverError {
            code,
            message: format!("oracle nosql: {}", e),
        }
    }
}

/// DriverErrorCode represents the error code.
///
/// Codes below 100 are raised by this library itself; codes from 100 on wrap a
/// failure reported by the underlying store or its client.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(i32)]
pub enum DriverErrorCode {
    /// IllegalArgument represents a missing or empty key, a null value, a zero
    /// TTL or an empty bucket name.
    IllegalArgument = 1,

    /// MissingSetting represents a required configuration setting that was not given.
    MissingSetting = 2,

    /// InvalidSetting represents a configuration setting whose value could not be used.
    InvalidSetting = 3,

    /// UnknownProvider represents a provider name with no registered configuration.
    UnknownProvider = 4,

    /// Serialization represents a value that could not be converted to or from JSON.
    Serialization = 5,

    /// Closed represents an operation attempted on a manager or factory after `close()`.
    Closed = 6,

    /// RequestTimeout represents a store request that did not complete in time.
    RequestTimeout = 100,

    /// VendorError represents any other failure reported by the store, passed
    /// through with its original message.
    VendorError = 101,
}
