//
//  schematics-cli
//  auth/token.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Token Helpers
//!
//! IAM access tokens are JWTs. The claims are read here without verifying
//! the signature; they are only used to show who is logged in and when the
//! token expires (`sch auth status`), never to make authorization decisions.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schematics_cli::auth::TokenClaims;
//!
//! # fn example(access_token: &str) -> Result<(), schematics_cli::api::ApiError> {
//! let claims = TokenClaims::decode(access_token)?;
//! println!("{} in account {:?}", claims.subject(), claims.account_id());
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::api::ApiError;

/// Reads a secret from a single line of stdin, trimmed.
///
/// Used by `sch auth login --with-api-key` so keys can be piped in instead
/// of passed on the command line.
pub fn read_secret_from_stdin() -> Result<String> {
    use std::io::{self, BufRead};

    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;

    Ok(line.trim().to_string())
}

/// Rough shape check for an IBM Cloud API key.
///
/// Keys are 44 characters of base64url today; anything non-empty without
/// whitespace is accepted so older key formats keep working.
pub fn validate_api_key(key: &str) -> bool {
    !key.is_empty() && !key.chars().any(char::is_whitespace)
}

/// Account block of an IAM token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenAccount {
    #[serde(default)]
    pub bss: Option<String>,

    #[serde(default)]
    pub valid: Option<bool>,
}

/// Claims of an IAM access token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub iam_id: Option<String>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub sub_type: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub account: Option<TokenAccount>,

    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decodes the payload segment of a JWT.
    pub fn decode(token: &str) -> Result<Self, ApiError> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        let payload = token
            .split('.')
            .nth(1)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::InvalidArgument("token is not a JWT".to_string()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ApiError::InvalidArgument(format!("token payload is not base64url: {}", e)))?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Best name for the token owner: e-mail, then subject, then IAM ID.
    pub fn subject(&self) -> &str {
        self.email
            .as_deref()
            .or(self.sub.as_deref())
            .or(self.iam_id.as_deref())
            .unwrap_or("unknown")
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account.as_ref().and_then(|a| a.bss.as_deref())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at()
            .map(|exp| exp <= Utc::now())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn test_decode_claims() {
        let token = jwt(&serde_json::json!({
            "iam_id": "IBMid-123",
            "sub": "dev@example.com",
            "account": { "bss": "abc123", "valid": true },
            "exp": 4102444800i64
        }));

        let claims = TokenClaims::decode(&format!("Bearer {}", token)).unwrap();
        assert_eq!(claims.iam_id.as_deref(), Some("IBMid-123"));
        assert_eq!(claims.subject(), "dev@example.com");
        assert_eq!(claims.account_id(), Some("abc123"));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_expired_claims() {
        let claims = TokenClaims::decode(&jwt(&serde_json::json!({ "exp": 1 }))).unwrap();
        assert!(claims.is_expired());
        assert_eq!(claims.subject(), "unknown");
    }

    #[test]
    fn test_decode_rejects_non_jwt() {
        assert!(TokenClaims::decode("opaque-token").is_err());
        assert!(TokenClaims::decode("a.!!!.c").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("abcDEF123_-"));
        assert!(!validate_api_key(""));
        assert!(!validate_api_key("has space"));
    }
}
