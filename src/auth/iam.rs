//
//  schematics-cli
//  auth/iam.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # IAM API Key Authentication
//!
//! Exchanges an IBM Cloud API key for an IAM access token at the IAM token
//! service:
//!
//! ```text
//! POST https://iam.cloud.ibm.com/identity/token
//! Content-Type: application/x-www-form-urlencoded
//!
//! grant_type=urn:ibm:params:oauth:grant-type:apikey&apikey=<key>
//! ```
//!
//! The response carries an access token, a refresh token and the token
//! lifetime. The token is cached and exchanged again once 80% of its
//! lifetime has elapsed, so long-running commands never send a token that
//! is about to expire.
//!
//! The token service URL can be overridden with
//! `IBMCLOUD_IAM_API_ENDPOINT` (private endpoints, tests).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::Authenticator;
use crate::api::common::{extract_error_message, require};
use crate::api::ApiError;
use crate::util::mask_secret;

/// Environment variable overriding the IAM endpoint.
pub const IAM_ENDPOINT_ENV: &str = "IBMCLOUD_IAM_API_ENDPOINT";

/// Public IAM endpoint.
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com";

const GRANT_TYPE_API_KEY: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Fraction of the token lifetime after which a new token is fetched.
const REFRESH_FRACTION: f64 = 0.8;

/// A token issued by IAM.
#[derive(Clone, PartialEq, Eq)]
pub struct IamToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
    /// Expiry as a Unix timestamp.
    pub expiration: i64,
}

impl IamToken {
    /// Unix time from which the token should be replaced.
    pub fn refresh_at(&self) -> i64 {
        let lifetime = (self.expires_in as f64 * REFRESH_FRACTION) as i64;
        self.expiration - self.expires_in + lifetime
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expiration
    }

    pub fn needs_refresh_at(&self, now: i64) -> bool {
        now >= self.refresh_at()
    }
}

impl fmt::Debug for IamToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamToken")
            .field("access_token", &mask_secret(&self.access_token))
            .field("token_type", &self.token_type)
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponseRaw {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
    expiration: Option<i64>,
}

impl From<TokenResponseRaw> for IamToken {
    fn from(raw: TokenResponseRaw) -> Self {
        let now = Utc::now().timestamp();
        let expires_in = raw.expires_in.unwrap_or(3600);
        Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            token_type: raw.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in,
            expiration: raw.expiration.unwrap_or(now + expires_in),
        }
    }
}

/// Authenticates with an IAM API key.
///
/// Clones of a [`SchematicsClient`](crate::api::SchematicsClient) share one
/// authenticator, and the token cache is behind an async mutex: concurrent
/// requests that find the cache empty wait for a single exchange instead of
/// each performing their own.
pub struct IamAuthenticator {
    api_key: String,
    token_url: Url,
    http: Client,
    cache: Mutex<Option<IamToken>>,
}

impl IamAuthenticator {
    /// Creates an authenticator against the default IAM endpoint, or
    /// `IBMCLOUD_IAM_API_ENDPOINT` when set.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let endpoint = std::env::var(IAM_ENDPOINT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IAM_ENDPOINT.to_string());
        Self::with_endpoint(api_key, &endpoint)
    }

    /// Creates an authenticator against an explicit IAM endpoint.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: &str) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        require("api_key", &api_key)?;

        let mut base = Url::parse(endpoint.trim()).map_err(|e| {
            ApiError::InvalidArgument(format!("invalid IAM endpoint '{}': {}", endpoint, e))
        })?;
        // Keep any path prefix of the endpoint when joining.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let token_url = base.join("identity/token").map_err(|e| {
            ApiError::InvalidArgument(format!("invalid IAM endpoint '{}': {}", endpoint, e))
        })?;

        let http = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            token_url,
            http,
            cache: Mutex::new(None),
        })
    }

    pub fn token_url(&self) -> &str {
        self.token_url.as_str()
    }

    /// Returns a valid token, exchanging the API key when needed.
    pub async fn token(&self) -> Result<IamToken, ApiError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cache.as_ref() {
            if !token.needs_refresh_at(now) {
                return Ok(token.clone());
            }
        }

        match self.request_token().await {
            Ok(token) => {
                debug!(expiration = token.expiration, "obtained IAM token");
                *cache = Some(token.clone());
                Ok(token)
            }
            // A token in its last 20% is still usable if the exchange fails.
            Err(e) => match cache.as_ref() {
                Some(token) if !token.is_expired_at(now) => {
                    warn!("IAM token refresh failed, reusing current token: {}", e);
                    Ok(token.clone())
                }
                _ => Err(e),
            },
        }
    }

    /// Drops the cached token so the next request performs a new exchange.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn request_token(&self) -> Result<IamToken, ApiError> {
        debug!(url = %self.token_url, "requesting IAM token");
        let params = [
            ("grant_type", GRANT_TYPE_API_KEY),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_client_error() {
                let message = extract_error_message(&body)
                    .unwrap_or_else(|| format!("IAM token exchange failed ({})", status));
                return Err(ApiError::AuthFailed(message));
            }
            return Err(ApiError::from_response(status, &body));
        }

        let bytes = response.bytes().await?;
        let raw: TokenResponseRaw = serde_json::from_slice(&bytes)?;
        Ok(raw.into())
    }
}

impl fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("api_key", &mask_secret(&self.api_key))
            .field("token_url", &self.token_url.as_str())
            .finish()
    }
}

#[async_trait]
impl Authenticator for IamAuthenticator {
    async fn authenticate(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token().await?;
        Ok(request.bearer_auth(token.access_token))
    }

    async fn refresh_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.token().await?.refresh_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expires_in: i64, expiration: i64) -> IamToken {
        IamToken {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            token_type: "Bearer".to_string(),
            expires_in,
            expiration,
        }
    }

    #[test]
    fn test_refresh_at_eighty_percent() {
        // Issued at 1000, valid for an hour.
        let t = token(3600, 4600);
        assert_eq!(t.refresh_at(), 1000 + 2880);
        assert!(!t.needs_refresh_at(3879));
        assert!(t.needs_refresh_at(3880));
        assert!(!t.is_expired_at(4599));
        assert!(t.is_expired_at(4600));
    }

    #[test]
    fn test_missing_expiration_is_derived() {
        let raw = TokenResponseRaw {
            access_token: "a".to_string(),
            refresh_token: None,
            token_type: None,
            expires_in: Some(1200),
            expiration: None,
        };
        let before = Utc::now().timestamp();
        let t: IamToken = raw.into();
        assert_eq!(t.token_type, "Bearer");
        assert!(t.expiration >= before + 1200);
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(matches!(
            IamAuthenticator::with_endpoint("", DEFAULT_IAM_ENDPOINT),
            Err(ApiError::MissingParameter("api_key"))
        ));
        assert!(IamAuthenticator::with_endpoint("k", "not a url").is_err());

        let auth = IamAuthenticator::with_endpoint("k", "https://private.iam.cloud.ibm.com/").unwrap();
        assert_eq!(
            auth.token_url(),
            "https://private.iam.cloud.ibm.com/identity/token"
        );
        assert!(!format!("{:?}", auth).contains("\"k\""));
    }

    #[test]
    fn test_endpoint_path_prefix_is_kept() {
        for endpoint in ["https://gateway.example.com/iam", "https://gateway.example.com/iam/"] {
            let auth = IamAuthenticator::with_endpoint("k", endpoint).unwrap();
            assert_eq!(
                auth.token_url(),
                "https://gateway.example.com/iam/identity/token"
            );
        }
    }
}
