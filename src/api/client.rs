//
//  schematics-cli
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Client Wrapper for the Schematics API
//!
//! This module provides the core HTTP client shared by every Schematics
//! resource module. It handles endpoint resolution, authentication, retries
//! and request/response serialization.
//!
//! ## Features
//!
//! - Regional endpoint resolution (public and private)
//! - Authentication header injection through an [`Authenticator`]
//! - Retries with backoff for throttled and unavailable responses
//! - JSON serialization/deserialization
//! - Status-code mapping to [`ApiError`]
//!
//! Resource modules describe each call as an [`ApiRequest`] and hand it to
//! [`SchematicsClient::send`] (or one of its siblings).

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::api::common::{ApiError, Region, Visibility};
use crate::auth::Authenticator;
use crate::config::Config;

/// Environment variable that overrides the resolved API endpoint.
pub const ENDPOINT_ENV: &str = "IBMCLOUD_SCHEMATICS_API_ENDPOINT";

/// Returns the Schematics endpoint for a region.
///
/// # Example
///
/// ```rust
/// use schematics_cli::api::client::endpoint_for;
/// use schematics_cli::api::common::{Region, Visibility};
///
/// assert_eq!(
///     endpoint_for(Region::EuDe, Visibility::Private),
///     "https://private-eu-de.schematics.cloud.ibm.com"
/// );
/// ```
pub fn endpoint_for(region: Region, visibility: Visibility) -> String {
    match visibility {
        Visibility::Public => format!("https://{}.schematics.cloud.ibm.com", region),
        Visibility::Private => format!("https://private-{}.schematics.cloud.ibm.com", region),
    }
}

/// Controls how failed requests are retried.
///
/// Connection failures, timeouts and the statuses 429, 502, 503 and 504 are
/// retried. The delay comes from an integer `Retry-After` header when the
/// service sends one, otherwise it doubles from `retry_interval` up to
/// `max_retry_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt. `0` disables retries.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_interval: Duration,
    /// Upper bound for any single delay.
    pub max_retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval: Duration::from_secs(1),
            max_retry_interval: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (starting at 0).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_interval
            .saturating_mul(factor)
            .min(self.max_retry_interval)
    }

    fn delay_for(&self, attempt: u32, headers: &HeaderMap) -> Duration {
        retry_after(headers)
            .map(|d| d.min(self.max_retry_interval))
            .unwrap_or_else(|| self.backoff(attempt))
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// A single API call, described independently of the client.
///
/// The path is held as unescaped segments; they are percent-escaped when
/// joined to the client's base URL, so IDs containing `/` or spaces cannot
/// change the route.
///
/// # Example
///
/// ```rust
/// use schematics_cli::api::client::ApiRequest;
///
/// let request = ApiRequest::get(&["v2", "jobs", "job-1"]).query("profile", "detailed");
/// assert_eq!(request.path(), "/v2/jobs/job-1");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Creates a request with the given method and path segments.
    pub fn new(method: Method, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(segments: &[&str]) -> Self {
        Self::new(Method::GET, segments)
    }

    pub fn post(segments: &[&str]) -> Self {
        Self::new(Method::POST, segments)
    }

    pub fn put(segments: &[&str]) -> Self {
        Self::new(Method::PUT, segments)
    }

    pub fn patch(segments: &[&str]) -> Self {
        Self::new(Method::PATCH, segments)
    }

    pub fn delete(segments: &[&str]) -> Self {
        Self::new(Method::DELETE, segments)
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Adds a query parameter when `value` is set.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Adds a request header.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Adds a request header when `value` is set.
    pub fn header_opt<V: Into<String>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.header(name, value),
            None => self,
        }
    }

    /// Sets the JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Unescaped path, for display and logging.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Query parameters in insertion order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// JSON body, when one was set.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// The HTTP client for the IBM Cloud Schematics API.
///
/// Cloning is cheap: the connection pool and the authenticator are shared.
///
/// # Creating a Client
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use schematics_cli::api::SchematicsClient;
/// use schematics_cli::api::common::{Region, Visibility};
/// use schematics_cli::auth::IamAuthenticator;
///
/// let auth = IamAuthenticator::new("my-api-key")?;
/// let client = SchematicsClient::new(Region::UsSouth, Visibility::Public)?
///     .with_auth(Arc::new(auth));
/// # Ok::<(), schematics_cli::api::ApiError>(())
/// ```
#[derive(Clone)]
pub struct SchematicsClient {
    http: Client,
    base_url: Url,
    auth: Option<Arc<dyn Authenticator>>,
    retry: RetryPolicy,
    default_headers: Vec<(String, String)>,
    // Set when the base URL was derived from a region rather than given.
    region: Option<(Region, Visibility)>,
}

impl std::fmt::Debug for SchematicsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchematicsClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.auth.is_some())
            .field("retry", &self.retry)
            .finish()
    }
}

impl SchematicsClient {
    /// Creates a client for a region.
    ///
    /// `IBMCLOUD_SCHEMATICS_API_ENDPOINT` takes precedence over the regional
    /// endpoint when it is set.
    pub fn new(region: Region, visibility: Visibility) -> Result<Self, ApiError> {
        match std::env::var(ENDPOINT_ENV) {
            Ok(endpoint) if !endpoint.trim().is_empty() => Self::with_endpoint(&endpoint),
            _ => {
                let mut client = Self::with_endpoint(&endpoint_for(region, visibility))?;
                client.region = Some((region, visibility));
                Ok(client)
            }
        }
    }

    /// Creates a client for an explicit base URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schematics_cli::api::SchematicsClient;
    ///
    /// let client = SchematicsClient::with_endpoint("http://127.0.0.1:8080/")?;
    /// assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    /// # Ok::<(), schematics_cli::api::ApiError>(())
    /// ```
    pub fn with_endpoint(endpoint: &str) -> Result<Self, ApiError> {
        let trimmed = endpoint.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| ApiError::InvalidArgument(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidArgument(format!(
                "invalid endpoint '{}': expected an http(s) URL",
                endpoint
            )));
        }

        let http = Client::builder()
            .user_agent(user_agent())
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            http,
            base_url,
            auth: None,
            retry: RetryPolicy::default(),
            default_headers: vec![("X-Original-User-Agent".to_string(), user_agent())],
            region: None,
        })
    }

    /// Creates a client from the loaded configuration.
    ///
    /// An `endpoint` in the configuration replaces the regional endpoint.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client = match config.core.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => Self::with_endpoint(endpoint)?,
            _ => Self::new(config.core.region, config.core.visibility)?,
        };
        Ok(client.with_retry_policy(config.retry.policy()))
    }

    /// Sets the authenticator used for every request.
    pub fn with_auth(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The resolved base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// The region the client targets, unless an explicit endpoint is in use.
    pub fn region(&self) -> Option<Region> {
        self.region.map(|(region, _)| region)
    }

    /// Returns a client for the region that stores `id`.
    ///
    /// Schematics IDs start with the region that owns them
    /// (`eu-de.workspace.demo.1a2b3c4d`), and a resource can only be reached
    /// through its own regional endpoint. Clients with an explicit endpoint,
    /// and IDs without a region prefix, are returned unchanged.
    pub fn for_resource(&self, id: &str) -> Self {
        match (self.region, Region::from_resource_id(id)) {
            (Some((current, visibility)), Some(target)) if current != target => {
                match Url::parse(&endpoint_for(target, visibility)) {
                    Ok(base_url) => Self {
                        base_url,
                        region: Some((target, visibility)),
                        ..self.clone()
                    },
                    Err(_) => self.clone(),
                }
            }
            _ => self.clone(),
        }
    }

    /// Returns `true` when an authenticator is configured.
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// The IAM refresh token that Schematics needs to run Terraform on the
    /// caller's behalf.
    ///
    /// # Errors
    ///
    /// `AuthRequired` without an authenticator; `AuthFailed` when the
    /// authenticator has no refresh token (a static bearer token).
    pub async fn refresh_token(&self) -> Result<String, ApiError> {
        let auth = self.auth.as_ref().ok_or(ApiError::AuthRequired)?;
        auth.refresh_token().await?.ok_or_else(|| {
            ApiError::AuthFailed(
                "this operation needs an IAM refresh token; log in with an API key".to_string(),
            )
        })
    }

    /// Executes a request and decodes the JSON response.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(&request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Executes a request and discards the response body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(&request).await?;
        Ok(())
    }

    /// Executes a request and returns the raw response body.
    pub async fn send_text(&self, request: ApiRequest) -> Result<String, ApiError> {
        let response = self.execute(&request).await?;
        Ok(response.text().await?)
    }

    fn url_for(&self, segments: &[String]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidArgument(format!("endpoint '{}' cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = self.url_for(&request.segments)?;
        let mut attempt = 0u32;

        loop {
            let mut builder = self
                .http
                .request(request.method.clone(), url.clone())
                .header(ACCEPT, "application/json");

            for (name, value) in self.default_headers.iter().chain(request.headers.iter()) {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            if let Some(auth) = &self.auth {
                builder = auth.authenticate(builder).await?;
            }

            let started = Instant::now();
            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        method = %request.method,
                        url = %url,
                        status = status.as_u16(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "schematics request"
                    );

                    if is_retryable_status(status) && attempt < self.retry.max_retries {
                        let delay = self.retry.delay_for(attempt, response.headers());
                        attempt += 1;
                        warn!(
                            status = status.as_u16(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying {} {}",
                            request.method,
                            request.path()
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status.is_success() {
                        return Ok(response);
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(ApiError::from_response(status, &body));
                }
                Err(err) if (err.is_connect() || err.is_timeout()) && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    attempt += 1;
                    warn!(
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying {} {}",
                        request.method,
                        request.path()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn user_agent() -> String {
    format!("{}/{}", crate::APP_NAME, crate::VERSION)
}
