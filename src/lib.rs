//
//  schematics-cli
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Schematics CLI Library
//!
//! A typed client and command-line interface for the IBM Cloud Schematics
//! API.
//!
//! ## Overview
//!
//! The library drives the `sch` binary but is usable on its own: build a
//! [`api::SchematicsClient`] for a region, attach an IAM authenticator and
//! call the resource operations.
//!
//! ## Features
//!
//! - **Workspaces (v1)**: create, update, plan, apply, destroy and inspect
//!   Terraform workspaces
//! - **Jobs (v2)**: submit jobs, read logs and wait for completion
//! - **Actions, agents, inventories, policies, blueprints (v2)**
//! - **IAM authentication**: API key exchange with automatic refresh,
//!   keyring storage per profile
//! - **Regional routing**: requests for a resource ID go to that resource's
//!   regional endpoint
//!
//! ## Module Structure
//!
//! - [`api`]: HTTP client, request types and resource operations
//! - [`auth`]: IAM token handling and credential storage
//! - [`cli`]: Command-line interface definitions using clap
//! - [`config`]: Configuration file management
//! - [`output`]: Table, JSON and YAML output
//! - [`interactive`]: Prompts and progress spinners
//! - [`util`]: Formatting and file helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use schematics_cli::api::SchematicsClient;
//! use schematics_cli::api::common::{ListOptions, Region, Visibility};
//! use schematics_cli::auth::IamAuthenticator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), schematics_cli::api::ApiError> {
//! let auth = IamAuthenticator::new("my-api-key".to_string())?;
//! let client = SchematicsClient::new(Region::EuDe, Visibility::Public)?
//!     .with_auth(Arc::new(auth));
//!
//! let page = client.list_workspaces(&ListOptions::default()).await?;
//! for ws in page.workspaces {
//!     println!("{} {:?}", ws.id, ws.name);
//! }
//! # Ok(())
//! # }
//! ```

/// HTTP client and resource operations.
///
/// Workspaces use the v1 API; jobs, actions, agents, inventories, policies
/// and blueprints use v2.
pub mod api;

/// IAM authentication and credential storage.
pub mod auth;

/// Command-line interface definitions.
///
/// Each resource has its own command module; global flags live in
/// [`cli::GlobalOptions`].
pub mod cli;

/// Configuration file management.
///
/// The file lives at `$SCH_CONFIG` when set, otherwise in the platform
/// config directory:
/// - Linux: `~/.config/sch/config.toml`
/// - macOS: `~/Library/Application Support/sch/config.toml`
/// - Windows: `%APPDATA%\sch\config\config.toml`
pub mod config;

/// Prompts and progress spinners.
pub mod interactive;

/// Output formatting for table, JSON and YAML modes.
pub mod output;

/// Formatting and file helpers.
pub mod util;

pub use cli::Cli;
pub use config::Config;

/// Name of the binary, also used for the config directory.
pub const APP_NAME: &str = "sch";

/// Crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for the CLI.
///
/// Scripts can branch on these to tell failure kinds apart:
///
/// | Code | Meaning |
/// |------|---------|
/// | 0 | Success |
/// | 1 | Any other error |
/// | 2 | Invalid usage |
/// | 4 | Missing or rejected credentials |
/// | 8 | Resource not found |
/// | 16 | Cancelled at a prompt |
/// | 32 | Rate limited |
/// | 64 | A watched job did not finish successfully |
pub mod exit_codes {
    use crate::api::ApiError;
    use crate::cli::JobFailed;
    use crate::interactive::Cancelled;

    pub const SUCCESS: i32 = 0;

    pub const ERROR: i32 = 1;

    /// Invalid arguments; clap exits with this code on its own.
    pub const USAGE: i32 = 2;

    /// Run `sch auth login` or set `IBMCLOUD_API_KEY`.
    pub const AUTH_ERROR: i32 = 4;

    pub const NOT_FOUND: i32 = 8;

    pub const CANCELLED: i32 = 16;

    pub const RATE_LIMIT: i32 = 32;

    pub const JOB_FAILED: i32 = 64;

    /// Maps an error to its exit code by looking through the error chain.
    pub fn for_error(err: &anyhow::Error) -> i32 {
        for cause in err.chain() {
            if let Some(api) = cause.downcast_ref::<ApiError>() {
                return match api {
                    e if e.is_auth() => AUTH_ERROR,
                    e if e.is_not_found() => NOT_FOUND,
                    ApiError::RateLimited => RATE_LIMIT,
                    _ => ERROR,
                };
            }
            if cause.is::<Cancelled>() {
                return CANCELLED;
            }
            if cause.is::<JobFailed>() {
                return JOB_FAILED;
            }
        }
        ERROR
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use anyhow::Context;

        #[test]
        fn test_api_errors() {
            let err = anyhow::Error::from(ApiError::AuthRequired);
            assert_eq!(for_error(&err), AUTH_ERROR);

            let err = anyhow::Error::from(ApiError::NotFound("workspace".to_string()));
            assert_eq!(for_error(&err), NOT_FOUND);

            let err = anyhow::Error::from(ApiError::RateLimited);
            assert_eq!(for_error(&err), RATE_LIMIT);

            let err = anyhow::Error::from(ApiError::Conflict("locked".to_string()));
            assert_eq!(for_error(&err), ERROR);
        }

        #[test]
        fn test_wrapped_errors() {
            let err = Err::<(), _>(Cancelled).context("Delete workspace").unwrap_err();
            assert_eq!(for_error(&err), CANCELLED);

            let err = anyhow::Error::from(JobFailed {
                id: "job-1".to_string(),
                status: "job_failed".to_string(),
            });
            assert_eq!(for_error(&err), JOB_FAILED);
        }

        #[test]
        fn test_plain_error() {
            assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
        }
    }
}
