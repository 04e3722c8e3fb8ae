//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{ia_err, user_agent, DriverError, DriverErrorCode};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_derive::{Deserialize, Serialize};
use std::result::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const QUERY_PORT: u16 = 8093;
const QUERY_TLS_PORT: u16 = 18093;
const QUERY_PATH: &str = "/query/service";
// query service error code for "Timeout exceeded"
const QUERY_TIMEOUT_CODE: i64 = 1080;

/// Builder for a [`CouchbaseClient`].
#[derive(Default, Debug, Clone)]
pub struct CouchbaseClientBuilder {
    pub(crate) endpoint: String,
    pub(crate) use_https: bool,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) client: Option<Client>,
    pub(crate) accept_invalid_certs: bool,
}

impl CouchbaseClientBuilder {
    pub fn new() -> Self {
        CouchbaseClientBuilder {
            ..Default::default()
        }
    }

    /// Set the Couchbase node to connect to.
    ///
    /// Accepted forms:
    /// ```text
    ///     couchbase://db.example.com         -> http://db.example.com:8093
    ///     couchbases://db.example.com        -> https://db.example.com:18093
    ///     http://db.example.com:8093
    ///     db.example.com                     -> http://db.example.com:8093
    /// ```
    pub fn endpoint(mut self, endpoint: &str) -> Result<Self, DriverError> {
        // normalize to just host[:port]
        let (https, rest, default_port) = if let Some(r) = endpoint.strip_prefix("couchbases://") {
            (true, r, Some(QUERY_TLS_PORT))
        } else if let Some(r) = endpoint.strip_prefix("couchbase://") {
            (false, r, Some(QUERY_PORT))
        } else if let Some(r) = endpoint.strip_prefix("https://") {
            (true, r, None)
        } else if let Some(r) = endpoint.strip_prefix("http://") {
            (false, r, None)
        } else {
            (false, endpoint, Some(QUERY_PORT))
        };
        let host = rest.trim_end_matches('/');
        if host.is_empty() {
            return ia_err!("invalid couchbase endpoint '{}'", endpoint);
        }
        // connection strings may list several nodes; the query service is on every node
        let host = host.split(',').next().unwrap_or(host);
        let is_connection_string =
            endpoint.starts_with("couchbase://") || endpoint.starts_with("couchbases://");
        self.use_https = https;
        self.endpoint = match default_port {
            // a port in a connection string is the key-value port, not the query port
            Some(p) if is_connection_string => format!("{}:{}", without_port(host), p),
            Some(p) if without_port(host) == host => format!("{}:{}", host, p),
            _ => host.to_string(),
        };
        Ok(self)
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Result<Self, DriverError> {
        self.username = username.to_string();
        self.password = password.to_string();
        Ok(self)
    }

    /// Timeout for each query. The default is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Result<Self, DriverError> {
        if timeout.is_zero() {
            return ia_err!("timeout must be greater than zero");
        }
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Use an existing [`reqwest::Client`] instead of creating a new one.
    pub fn reqwest_client(mut self, client: &Client) -> Result<Self, DriverError> {
        self.client = Some(client.clone());
        Ok(self)
    }

    /// Allow https connections without validating certificates. Only for local testing.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Result<Self, DriverError> {
        self.accept_invalid_certs = accept;
        Ok(self)
    }

    pub fn build(self) -> Result<CouchbaseClient, DriverError> {
        CouchbaseClient::new(&self)
    }
}

/// A client for the Couchbase Query service.
///
/// Cloning is cheap and returns a handle to the same underlying connection pool.
#[derive(Clone, Debug)]
pub struct CouchbaseClient {
    pub(crate) inner: Arc<CouchbaseClientRef>,
}

#[derive(Debug)]
pub(crate) struct CouchbaseClientRef {
    client: Client,
    query_url: Url,
    authorization: Option<HeaderValue>,
    timeout: Duration,
    request_id: AtomicUsize,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    statement: &'a str,
    args: &'a [serde_json::Value],
    timeout: String,
    client_context_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) results: Vec<serde_json::Value>,
    #[serde(default)]
    pub(crate) errors: Vec<QueryError>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryError {
    #[serde(default)]
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) msg: String,
}

impl CouchbaseClient {
    pub fn builder() -> CouchbaseClientBuilder {
        CouchbaseClientBuilder::new()
    }

    pub(crate) fn new(b: &CouchbaseClientBuilder) -> Result<CouchbaseClient, DriverError> {
        if b.endpoint.is_empty() {
            return ia_err!("can't determine couchbase endpoint: call CouchbaseClientBuilder::endpoint()");
        }
        let timeout = b.timeout.unwrap_or(Duration::from_secs(30));
        let client = match &b.client {
            Some(c) => c.clone(),
            None => {
                let mut cb = Client::builder().connect_timeout(timeout);
                if b.accept_invalid_certs {
                    cb = cb.danger_accept_invalid_certs(true);
                }
                cb.build()?
            }
        };
        let scheme = if b.use_https { "https" } else { "http" };
        let query_url = Url::parse(&format!("{}://{}{}", scheme, b.endpoint, QUERY_PATH))?;
        let authorization = if b.username.is_empty() {
            None
        } else {
            let up = format!("{}:{}", b.username, b.password);
            Some(HeaderValue::from_str(&format!(
                "Basic {}",
                BASE64_STANDARD.encode(up)
            ))?)
        };
        debug!(
            "Creating new CouchbaseClient: url={} user={}",
            query_url, b.username
        );
        Ok(CouchbaseClient {
            inner: Arc::new(CouchbaseClientRef {
                client,
                query_url,
                authorization,
                timeout,
                request_id: AtomicUsize::new(1),
            }),
        })
    }

    pub fn query_url(&self) -> &Url {
        &self.inner.query_url
    }

    /// Run one statement with positional arguments and return its result rows.
    pub async fn query(
        &self,
        statement: &str,
        args: &[serde_json::Value],
    ) -> Result<Vec<serde_json::Value>, DriverError> {
        let request_id = self.inner.request_id.fetch_add(1, Ordering::Relaxed);
        let body = QueryRequest {
            statement,
            args,
            timeout: format!("{}ms", self.inner.timeout.as_millis()),
            client_context_id: format!("nosql-drivers-{}", request_id),
        };
        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_str(user_agent())?);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        if let Some(auth) = &self.inner.authorization {
            headers.insert("Authorization", auth.clone());
        }
        trace!("couchbase query [{}]: {}", request_id, statement);
        let resp = self
            .inner
            .client
            .post(self.inner.query_url.clone())
            .headers(headers)
            .json(&body)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        let parsed: Result<QueryResponse, serde_json::Error> = serde_json::from_str(&text);
        match parsed {
            Ok(qr) => into_results(qr),
            Err(_) if !status.is_success() => Err(DriverError::new(
                DriverErrorCode::VendorError,
                &format!(
                    "got unexpected http status: {}, response text: {}",
                    status, text
                ),
            )),
            Err(e) => Err(DriverError::new(
                DriverErrorCode::VendorError,
                &format!("invalid query service response: {}: {}", e, text),
            )),
        }
    }
}

// host[:port] or [ipv6][:port] with the port removed
fn without_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(i) => &host[..=i],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

pub(crate) fn into_results(qr: QueryResponse) -> Result<Vec<serde_json::Value>, DriverError> {
    if qr.status == "success" && qr.errors.is_empty() {
        return Ok(qr.results);
    }
    if let Some(e) = qr.errors.first() {
        let code = if e.code == QUERY_TIMEOUT_CODE {
            DriverErrorCode::RequestTimeout
        } else {
            DriverErrorCode::VendorError
        };
        return Err(DriverError::new(
            code,
            &format!("couchbase query error {}: {}", e.code, e.msg),
        ));
    }
    Err(DriverError::new(
        DriverErrorCode::VendorError,
        &format!("couchbase query finished with status '{}'", qr.status),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_forms() -> Result<(), DriverError> {
        let b = CouchbaseClient::builder().endpoint("couchbase://localhost")?;
        assert_eq!(b.endpoint, "localhost:8093");
        assert!(!b.use_https);

        let b = CouchbaseClient::builder().endpoint("couchbases://cb.example.com,cb2.example.com")?;
        assert_eq!(b.endpoint, "cb.example.com:18093");
        assert!(b.use_https);

        let b = CouchbaseClient::builder().endpoint("http://10.0.0.5:9499/")?;
        assert_eq!(b.endpoint, "10.0.0.5:9499");

        let b = CouchbaseClient::builder().endpoint("db")?;
        assert_eq!(b.endpoint, "db:8093");

        assert!(CouchbaseClient::builder().endpoint("http://").is_err());
        Ok(())
    }

    #[test]
    fn test_connection_string_ports_are_ignored() -> Result<(), DriverError> {
        let b = CouchbaseClient::builder().endpoint("couchbase://h:11210")?;
        assert_eq!(b.endpoint, "h:8093");
        let b = CouchbaseClient::builder().endpoint("couchbases://h:11207,h2:11207")?;
        assert_eq!(b.endpoint, "h:18093");
        assert!(b.use_https);
        let b = CouchbaseClient::builder().endpoint("couchbase://[::1]:11210")?;
        assert_eq!(b.endpoint, "[::1]:8093");
        let b = CouchbaseClient::builder().endpoint("couchbase://[fe80::1]")?;
        assert_eq!(b.endpoint, "[fe80::1]:8093");
        // bare hosts and urls keep an explicit port
        let b = CouchbaseClient::builder().endpoint("db:9499")?;
        assert_eq!(b.endpoint, "db:9499");
        let b = CouchbaseClient::builder().endpoint("couchbase.local:9499")?;
        assert_eq!(b.endpoint, "couchbase.local:9499");
        let b = CouchbaseClient::builder().endpoint("https://db:18093")?;
        assert_eq!(b.endpoint, "db:18093");
        Ok(())
    }

    #[test]
    fn test_build_requires_endpoint() {
        let e = CouchbaseClient::builder().build().unwrap_err();
        assert!(e.is_illegal_argument());
        assert!(CouchbaseClient::builder().timeout(Duration::ZERO).is_err());
    }

    #[test]
    fn test_build_query_url() -> Result<(), DriverError> {
        let c = CouchbaseClient::builder()
            .endpoint("couchbases://cb.example.com")?
            .credentials("Administrator", "password")?
            .build()?;
        assert_eq!(
            c.query_url().as_str(),
            "https://cb.example.com:18093/query/service"
        );
        // base64("Administrator:password")
        let auth = c.inner.authorization.as_ref().map(|h| h.to_str().unwrap_or(""));
        assert_eq!(auth, Some("Basic QWRtaW5pc3RyYXRvcjpwYXNzd29yZA=="));

        let anonymous = CouchbaseClient::builder().endpoint("localhost")?.build()?;
        assert!(anonymous.inner.authorization.is_none());
        Ok(())
    }

    #[test]
    fn test_request_body() -> Result<(), serde_json::Error> {
        let args = vec![serde_json::json!("k1"), serde_json::json!({"a": 1})];
        let req = QueryRequest {
            statement: "SELECT 1",
            args: &args,
            timeout: "250ms".to_string(),
            client_context_id: "nosql-drivers-7".to_string(),
        };
        let v = serde_json::to_value(&req)?;
        assert_eq!(v["statement"], "SELECT 1");
        assert_eq!(v["args"][0], "k1");
        assert_eq!(v["args"][1]["a"], 1);
        assert_eq!(v["timeout"], "250ms");
        Ok(())
    }

    #[test]
    fn test_response_success() -> Result<(), Box<dyn std::error::Error>> {
        let qr: QueryResponse = serde_json::from_str(
            r#"{"requestID":"x","signature":{"*":"*"},"results":[{"name":"Ada"}],
                "status":"success","metrics":{"resultCount":1}}"#,
        )?;
        let rows = into_results(qr)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Ada");

        let qr: QueryResponse = serde_json::from_str(r#"{"results":[],"status":"success"}"#)?;
        assert!(into_results(qr)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_response_errors() -> Result<(), Box<dyn std::error::Error>> {
        let qr: QueryResponse = serde_json::from_str(
            r#"{"errors":[{"code":12003,"msg":"Keyspace not found in CB datastore: default:nope"}],
                "status":"fatal"}"#,
        )?;
        let e = into_results(qr).unwrap_err();
        assert_eq!(e.code, DriverErrorCode::VendorError);
        assert!(e.message.contains("12003"));
        assert!(e.message.contains("Keyspace not found"));

        let qr: QueryResponse = serde_json::from_str(
            r#"{"errors":[{"code":1080,"msg":"Timeout 1ms exceeded"}],"status":"timeout"}"#,
        )?;
        assert_eq!(into_results(qr).unwrap_err().code, DriverErrorCode::RequestTimeout);

        let qr: QueryResponse = serde_json::from_str(r#"{"status":"stopped"}"#)?;
        assert!(into_results(qr).unwrap_err().message.contains("stopped"));
        Ok(())
    }
}
