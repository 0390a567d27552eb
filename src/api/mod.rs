//
//  schematics-cli
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides a typed client for the IBM Cloud Schematics REST API.
//!
//! ## API Families
//!
//! - **v1**: Workspaces, their template inputs/outputs and activities
//! - **v2**: Jobs, actions, agents, inventories, policies and blueprints
//!
//! ## Architecture
//!
//! - [`client`]: Core HTTP client with endpoint resolution, authentication and retries
//! - [`v1`]: Workspace operations
//! - [`v2`]: Job, action, agent, inventory, policy and blueprint operations
//! - [`common`]: Shared types (errors, paging, variables, sources)
//!
//! Each resource module adds its operations to [`SchematicsClient`] in an
//! `impl` block of its own, so every operation is a method on the client.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use schematics_cli::api::SchematicsClient;
//! use schematics_cli::api::common::{ListOptions, Region, Visibility};
//! use schematics_cli::auth::BearerTokenAuthenticator;
//!
//! # async fn example() -> Result<(), schematics_cli::api::ApiError> {
//! let client = SchematicsClient::new(Region::UsSouth, Visibility::Public)?
//!     .with_auth(Arc::new(BearerTokenAuthenticator::new("iam-access-token")));
//!
//! let workspaces = client.list_workspaces(&ListOptions::new().limit(10)).await?;
//! for ws in workspaces.workspaces {
//!     println!("{}", ws.name.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`ApiError`]; see its documentation for the
//! mapping from HTTP status codes.

/// Core HTTP client for the Schematics API.
pub mod client;

/// Schematics v1 API (workspaces).
pub mod v1;

/// Schematics v2 API (jobs, actions, agents, inventories, policies, blueprints).
pub mod v2;

/// Types shared by both API families.
pub mod common;

pub use client::{ApiRequest, RetryPolicy, SchematicsClient};
pub use common::ApiError;
