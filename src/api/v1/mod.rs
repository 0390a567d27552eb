//
//  schematics-cli
//  api/v1/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Schematics API v1.
//!
//! The v1 API is organised around workspaces: a workspace records where a
//! Terraform template lives, the inputs it is run with and the state of
//! the last run. Runs on a workspace are called *activities*.
//!
//! # Module Organization
//!
//! - [`workspaces`] - Workspace CRUD, template inputs/outputs and activities
//!
//! # Notes
//!
//! - Workspace IDs are prefixed with the region that stores them
//!   (for example `us-south.workspace.demo.1a2b3c4d`)
//! - All timestamps are RFC 3339 strings

pub mod workspaces;

pub use workspaces::*;
