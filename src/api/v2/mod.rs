//
//  schematics-cli
//  api/v2/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Schematics API v2.
//!
//! # Module Organization
//!
//! - [`jobs`] - Job submission, status polling and logs
//! - [`actions`] - Ansible actions
//! - [`agents`] - Agents and their deploy/health/prs jobs
//! - [`inventories`] - Host inventories for actions
//! - [`policies`] - Agent assignment policies
//! - [`blueprints`] - Multi-workspace blueprints
//!
//! # Notes
//!
//! - Lists report `total_count` and accept up to [`V2_MAX_LIMIT`] items per page
//! - IDs carry the region that stores the resource as a prefix

pub mod actions;
pub mod agents;
pub mod blueprints;
pub mod inventories;
pub mod jobs;
pub mod policies;

pub use actions::*;
pub use agents::*;
pub use blueprints::*;
pub use inventories::*;
pub use jobs::*;
pub use policies::*;

/// Largest page size accepted by the v2 list endpoints.
pub const V2_MAX_LIMIT: u32 = 2000;
