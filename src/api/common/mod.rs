//
//  schematics-cli
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for the Schematics v1 and v2 APIs
//!
//! This module provides shared types and utilities used across every
//! Schematics resource family. It includes error handling, list/paging
//! helpers, and the value types (regions, variables, sources) that several
//! resources embed.
//!
//! # Overview
//!
//! - [`ApiError`] - Unified error type for all API operations
//! - [`require`] - Client-side validation of required path parameters
//! - Paging types (re-exported from the `pagination` submodule)
//! - Shared value types (re-exported from the `types` submodule)
//!
//! # Example
//!
//! ```rust
//! use schematics_cli::api::common::ApiError;
//!
//! fn handle_result<T>(result: Result<T, ApiError>) {
//!     match result {
//!         Ok(_) => println!("Success!"),
//!         Err(ApiError::AuthRequired) => println!("Please run 'sch auth login' first"),
//!         Err(ApiError::NotFound(message)) => println!("Not found: {}", message),
//!         Err(e) => println!("Error: {}", e),
//!     }
//! }
//! ```

use reqwest::StatusCode;
use thiserror::Error;

mod pagination;
mod types;

pub use pagination::*;
pub use types::*;

pub(crate) use pagination::impl_list_page;

/// Unified error type for all Schematics API operations.
///
/// `ApiError` covers both client-side validation failures (raised before any
/// request is sent) and failures reported by the service or the transport.
///
/// # Variants
///
/// | Variant | Description | HTTP Status |
/// |---------|-------------|-------------|
/// | `InvalidArgument` | A request field failed validation | N/A |
/// | `MissingParameter` | A required path parameter was empty | N/A |
/// | `AuthRequired` | No credentials configured | N/A |
/// | `AuthFailed` | Invalid or expired credentials | 401 |
/// | `Forbidden` | Insufficient permissions | 403 |
/// | `NotFound` | Requested resource does not exist | 404 |
/// | `Conflict` | Resource is locked or in a conflicting state | 409 |
/// | `BadRequest` | Invalid request parameters | 400, other 4xx |
/// | `RateLimited` | Too many requests | 429 |
/// | `ServerError` | Internal service error | 5xx |
/// | `Unexpected` | Any other non-success status | other |
/// | `Timeout` | A wait gave up before the resource settled | N/A |
/// | `Network` | Transport failure | N/A |
/// | `Json` | Body could not be encoded or decoded | N/A |
#[derive(Error, Debug)]
pub enum ApiError {
    /// A request field failed client-side validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required path parameter (an ID) was empty.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// No authentication credentials are configured.
    #[error("Authentication required")]
    AuthRequired,

    /// Authentication failed due to invalid or expired credentials.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The caller is not allowed to perform the operation.
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource is locked or busy (for example a workspace with a
    /// running job).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request was malformed or contained invalid parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// API rate limit has been exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service returned a 5xx status.
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Any other non-success status.
    #[error("Unexpected response ({status}): {message}")]
    Unexpected {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// A polling operation gave up.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A network-level error occurred during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A request body could not be encoded, or a response body decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Builds an error from a non-success HTTP response.
    ///
    /// The message is extracted from the response body with
    /// [`extract_error_message`]; the raw body is used when no known
    /// format matches.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            StatusCode::UNAUTHORIZED => Self::AuthFailed(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            s if s.is_server_error() => Self::ServerError {
                status: s.as_u16(),
                message,
            },
            s if s.is_client_error() => Self::BadRequest(message),
            s => Self::Unexpected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Returns `true` for a 404 from the service.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` when the failure is about credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::AuthFailed(_))
    }
}

/// Extracts a human-readable message from an error response body.
///
/// The following formats are recognised, in order:
///
/// ```json
/// {"requestid": "…", "messageid": "M1097", "message": "Workspace not found"}
/// {"errorCode": "BXNIM0415E", "errorMessage": "Provided API key could not be found."}
/// {"errors": [{"code": "not_found", "message": "…"}]}
/// {"error": {"message": "…"}}
/// {"error": "…"}
/// ```
pub fn extract_error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;

    // Schematics format
    if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
        return Some(message.to_string());
    }

    // IAM token service format
    if let Some(message) = json.get("errorMessage").and_then(|m| m.as_str()) {
        return Some(message.to_string());
    }

    if let Some(message) = json
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|arr| arr.first())
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }

    match json.get("error") {
        Some(serde_json::Value::String(message)) => Some(message.clone()),
        Some(error) => error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        None => None,
    }
}

/// Validates that a required path parameter is not empty.
///
/// Every operation that takes an ID calls this before building its request,
/// so an empty ID never produces a request against the collection URL.
///
/// # Example
///
/// ```rust
/// use schematics_cli::api::common::{require, ApiError};
///
/// assert!(require("w_id", "us-south.workspace.demo.1a2b3c").is_ok());
/// assert!(matches!(require("w_id", "  "), Err(ApiError::MissingParameter("w_id"))));
/// ```
pub fn require<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::MissingParameter(name))
    } else {
        Ok(trimmed)
    }
}

/// Decodes an optional enum field of a service reply.
///
/// The service adds locations and job commands faster than this client
/// learns about them, so a value outside the known set (or an empty
/// string) reads as `None` instead of failing the whole reply. Request
/// types keep the strict derive.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    use serde::Deserialize;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => serde_json::from_value(value).ok(),
    })
}

/// Decodes a list of enum values from a service reply, skipping entries
/// outside the known set.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    use serde::Deserialize;

    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Located {
        #[serde(default, deserialize_with = "lenient")]
        location: Option<Region>,

        #[serde(default, deserialize_with = "lenient_list")]
        locations: Vec<Region>,
    }

    #[test]
    fn test_lenient_enum_fields() {
        let known: Located = serde_json::from_str(r#"{"location":"eu-de"}"#).unwrap();
        assert_eq!(known.location, Some(Region::EuDe));

        for body in [
            r#"{"location":"ca-tor"}"#,
            r#"{"location":""}"#,
            r#"{"location":null}"#,
            r#"{"location":42}"#,
            r#"{}"#,
        ] {
            let decoded: Located = serde_json::from_str(body).unwrap();
            assert_eq!(decoded.location, None, "{}", body);
        }

        let scoped: Located =
            serde_json::from_str(r#"{"locations":["us-east","ca-tor","eu-gb"]}"#).unwrap();
        assert_eq!(scoped.locations, vec![Region::UsEast, Region::EuGb]);
    }

    #[test]
    fn test_extract_schematics_message() {
        let body = r#"{"requestid":"abc","messageid":"M1097","message":"Workspace not found","statuscode":404}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Workspace not found")
        );
    }

    #[test]
    fn test_extract_iam_message() {
        let body = r#"{"errorCode":"BXNIM0415E","errorMessage":"Provided API key could not be found."}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("Provided API key could not be found.")
        );
    }

    #[test]
    fn test_extract_errors_array_and_error_forms() {
        assert_eq!(
            extract_error_message(r#"{"errors":[{"code":"x","message":"first"}]}"#).as_deref(),
            Some("first")
        );
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(
            extract_error_message(r#"{"error":"plain"}"#).as_deref(),
            Some("plain")
        );
        assert_eq!(extract_error_message("not json"), None);
    }

    #[test]
    fn test_status_mapping() {
        assert!(ApiError::from_response(StatusCode::NOT_FOUND, "").is_not_found());
        assert!(ApiError::from_response(StatusCode::UNAUTHORIZED, "{}").is_auth());
        assert!(matches!(
            ApiError::from_response(StatusCode::CONFLICT, r#"{"message":"locked"}"#),
            ApiError::Conflict(m) if m == "locked"
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream down"),
            ApiError::ServerError { status: 502, message } if message == "upstream down"
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, ""),
            ApiError::BadRequest(_)
        ));
    }

    #[test]
    fn test_require() {
        assert_eq!(require("job_id", " abc ").unwrap(), "abc");
        assert!(matches!(
            require("job_id", ""),
            Err(ApiError::MissingParameter("job_id"))
        ));
    }
}
