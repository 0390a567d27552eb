//
//  schematics-cli
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Schematics accepts IBM Cloud IAM bearer tokens. This module provides the
//! ways of getting one onto a request:
//!
//! - **IAM API key** ([`IamAuthenticator`]): the key is exchanged for an
//!   access token and a refresh token, which are cached and renewed before
//!   they expire. Operations that run Terraform on the service side need the
//!   refresh token, so this is the method to use for anything beyond reads.
//! - **Static bearer token** ([`BearerTokenAuthenticator`]): an access token
//!   obtained elsewhere, for example with `ibmcloud iam oauth-tokens`.
//!
//! ## Module Structure
//!
//! - [`iam`](IamAuthenticator): API key exchange and token caching
//! - [`token`](TokenClaims): JWT claim decoding and secret input helpers
//! - [`keyring`](KeyringStore): API keys in the system keyring
//!
//! ## Credential Resolution
//!
//! [`resolve_credentials`] picks the first of:
//!
//! 1. `IBMCLOUD_API_KEY` or `IC_API_KEY`
//! 2. `IBMCLOUD_IAM_TOKEN` (with `IBMCLOUD_IAM_REFRESH_TOKEN` when set)
//! 3. an API key stored in the keyring by `sch auth login`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use schematics_cli::api::SchematicsClient;
//! use schematics_cli::api::common::{Region, Visibility};
//! use schematics_cli::auth::IamAuthenticator;
//!
//! # fn example() -> Result<(), schematics_cli::api::ApiError> {
//! let auth = IamAuthenticator::new("my-api-key")?;
//! let client = SchematicsClient::new(Region::EuDe, Visibility::Public)?
//!     .with_auth(Arc::new(auth));
//! # Ok(())
//! # }
//! ```

mod iam;
mod keyring;
mod token;

pub use self::iam::*;
pub use self::keyring::*;
pub use self::token::*;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;

use crate::api::ApiError;
use crate::util::mask_secret;

/// Environment variables holding an IAM API key, in lookup order.
pub const API_KEY_ENV: [&str; 2] = ["IBMCLOUD_API_KEY", "IC_API_KEY"];

/// Environment variable holding a ready-made IAM access token.
pub const IAM_TOKEN_ENV: &str = "IBMCLOUD_IAM_TOKEN";

/// Environment variable holding the refresh token that goes with [`IAM_TOKEN_ENV`].
pub const IAM_REFRESH_TOKEN_ENV: &str = "IBMCLOUD_IAM_REFRESH_TOKEN";

/// Adds credentials to outgoing requests.
///
/// Implementations are shared between clones of
/// [`SchematicsClient`](crate::api::SchematicsClient) through an `Arc`, so
/// any cached state must be synchronised internally.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Adds the `Authorization` header to a request.
    async fn authenticate(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError>;

    /// The IAM refresh token, when this authenticator has one.
    async fn refresh_token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// Authenticates with a fixed IAM access token.
///
/// The token is never renewed; requests fail with
/// [`ApiError::AuthFailed`] once it expires.
#[derive(Clone)]
pub struct BearerTokenAuthenticator {
    token: String,
    refresh_token: Option<String>,
}

impl BearerTokenAuthenticator {
    /// Creates an authenticator for `token`. A leading `Bearer ` is stripped.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .unwrap_or(token);
        Self {
            token: token.trim().to_string(),
            refresh_token: None,
        }
    }

    /// Attaches the refresh token issued with the access token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("token", &mask_secret(&self.token))
            .field("refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::AuthRequired);
        }
        Ok(request.bearer_auth(&self.token))
    }

    async fn refresh_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.refresh_token.clone())
    }
}

/// Where a set of credentials came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// An environment variable.
    Env(&'static str),
    /// The system keyring, under the given profile.
    Keyring(String),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(name) => write!(f, "environment ({})", name),
            Self::Keyring(profile) => write!(f, "keyring (profile '{}')", profile),
        }
    }
}

/// Credentials found by [`resolve_credentials`].
#[derive(Clone)]
pub enum Credentials {
    ApiKey {
        api_key: String,
        source: CredentialSource,
    },
    Token {
        token: String,
        refresh_token: Option<String>,
        source: CredentialSource,
    },
}

impl Credentials {
    pub fn source(&self) -> &CredentialSource {
        match self {
            Self::ApiKey { source, .. } | Self::Token { source, .. } => source,
        }
    }

    /// Builds the matching authenticator.
    ///
    /// `iam_endpoint` overrides the IAM token service for API keys.
    pub fn into_authenticator(
        self,
        iam_endpoint: Option<&str>,
    ) -> Result<Arc<dyn Authenticator>, ApiError> {
        match self {
            Self::ApiKey { api_key, .. } => {
                let auth = match iam_endpoint {
                    Some(endpoint) => IamAuthenticator::with_endpoint(api_key, endpoint)?,
                    None => IamAuthenticator::new(api_key)?,
                };
                Ok(Arc::new(auth))
            }
            Self::Token {
                token,
                refresh_token,
                ..
            } => {
                let mut auth = BearerTokenAuthenticator::new(token);
                if let Some(refresh_token) = refresh_token {
                    auth = auth.with_refresh_token(refresh_token);
                }
                Ok(Arc::new(auth))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { api_key, source } => f
                .debug_struct("ApiKey")
                .field("api_key", &mask_secret(api_key))
                .field("source", source)
                .finish(),
            Self::Token { token, source, .. } => f
                .debug_struct("Token")
                .field("token", &mask_secret(token))
                .field("source", source)
                .finish(),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Returns the API key from the environment, if any.
pub fn resolve_api_key() -> Option<(String, &'static str)> {
    API_KEY_ENV
        .iter()
        .find_map(|name| env_value(name).map(|key| (key, *name)))
}

/// Finds credentials in the environment, then in the keyring under `profile`.
///
/// Returns `None` when nothing is configured. Keyring failures are
/// logged and treated as "no credentials" so that headless machines without
/// a secret service still work with environment variables.
pub fn resolve_credentials(store: &KeyringStore, profile: &str) -> Option<Credentials> {
    if let Some((api_key, name)) = resolve_api_key() {
        return Some(Credentials::ApiKey {
            api_key,
            source: CredentialSource::Env(name),
        });
    }

    if let Some(token) = env_value(IAM_TOKEN_ENV) {
        return Some(Credentials::Token {
            token,
            refresh_token: env_value(IAM_REFRESH_TOKEN_ENV),
            source: CredentialSource::Env(IAM_TOKEN_ENV),
        });
    }

    match store.get(profile) {
        Ok(Some(api_key)) => Some(Credentials::ApiKey {
            api_key,
            source: CredentialSource::Keyring(profile.to_string()),
        }),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!("keyring lookup failed: {:#}", e);
            None
        }
    }
}
