//
//  schematics-cli
//  api/v1/workspaces.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Workspace API types and operations.
//!
//! A workspace points Schematics at a Terraform template (a Git repository,
//! a catalog offering or an uploaded tarball) and stores the variables the
//! template is run with.
//!
//! # Workspace Lifecycle
//!
//! ```text
//! DRAFT -> INACTIVE -> (plan) -> INACTIVE -> (apply) -> ACTIVE
//!                                                  \-> FAILED
//! ACTIVE -> (destroy) -> INACTIVE
//! ```
//!
//! While an activity runs the workspace is locked; starting a second
//! activity fails with a 409 ([`ApiError::Conflict`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use schematics_cli::api::SchematicsClient;
//! use schematics_cli::api::v1::{CreateWorkspaceRequest, TemplateRepoRequest};
//!
//! # async fn example(client: SchematicsClient) -> Result<(), schematics_cli::api::ApiError> {
//! let request = CreateWorkspaceRequest {
//!     name: "demo".to_string(),
//!     template_type: vec!["terraform_v1.5".to_string()],
//!     template_repo: Some(TemplateRepoRequest {
//!         url: Some("https://github.com/IBM-Cloud/terraform-simple-vpc".to_string()),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//! let workspace = client.create_workspace(&request, None).await?;
//! let activity = client.plan_workspace(&workspace.id).await?;
//! println!("plan started: {}", activity.activityid);
//! # Ok(())
//! # }
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::client::{ApiRequest, SchematicsClient};
use crate::api::common::{impl_list_page, require, ApiError, ListOptions, Region};

/// Largest page size accepted by `GET /v1/workspaces`.
pub const WORKSPACE_MAX_LIMIT: u32 = 200;

static WORKSPACE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_ \-]*$").unwrap());

static TEMPLATE_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^terraform_v(?:1\.4|1\.5|1\.6|1\.7|1\.8|1\.9)(?:\.\d+)?$").unwrap()
});

/// Checks a workspace name: 1 to 128 characters, starting with a letter or
/// digit, then letters, digits, `-`, `_` or spaces.
pub fn validate_workspace_name(name: &str) -> Result<(), ApiError> {
    let len = name.chars().count();
    if len == 0 || len > 128 {
        return Err(ApiError::InvalidArgument(
            "workspace name must be between 1 and 128 characters".to_string(),
        ));
    }
    if !WORKSPACE_NAME.is_match(name) {
        return Err(ApiError::InvalidArgument(format!(
            "invalid workspace name '{}': use letters, digits, '-', '_' and spaces, starting with a letter or digit",
            name
        )));
    }
    Ok(())
}

/// Checks a workspace description (at most 2048 characters).
pub fn validate_workspace_description(description: &str) -> Result<(), ApiError> {
    if description.chars().count() > 2048 {
        return Err(ApiError::InvalidArgument(
            "workspace description must not exceed 2048 characters".to_string(),
        ));
    }
    Ok(())
}

/// Checks a Terraform template type such as `terraform_v1.5`.
pub fn validate_template_type(template_type: &str) -> Result<(), ApiError> {
    if TEMPLATE_TYPE.is_match(template_type) {
        Ok(())
    } else {
        Err(ApiError::InvalidArgument(format!(
            "unsupported template type '{}', expected terraform_v1.4 through terraform_v1.9",
            template_type
        )))
    }
}

/// A Schematics workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace ID, prefixed with its region.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Region where the workspace data is stored.
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub crn: Option<String>,

    /// Template types, for example `["terraform_v1.5"]`.
    #[serde(rename = "type", default)]
    pub template_type: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Overall status: `DRAFT`, `INACTIVE`, `ACTIVE`, `FAILED`, `INPROGRESS`...
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,

    #[serde(default)]
    pub last_health_check_at: Option<String>,

    #[serde(default)]
    pub catalog_ref: Option<CatalogRef>,

    #[serde(default)]
    pub template_ref: Option<String>,

    #[serde(default)]
    pub template_repo: Option<TemplateRepoResponse>,

    #[serde(default)]
    pub template_data: Vec<TemplateSourceDataResponse>,

    #[serde(default)]
    pub runtime_data: Vec<TemplateRunTimeData>,

    #[serde(default)]
    pub shared_data: Option<SharedTargetData>,

    #[serde(default)]
    pub applied_shareddata_ids: Vec<String>,

    #[serde(default)]
    pub workspace_status: Option<WorkspaceStatusResponse>,

    #[serde(default)]
    pub workspace_status_msg: Option<WorkspaceStatusMessage>,
}

impl Workspace {
    /// Returns `true` while an activity holds the workspace lock.
    pub fn is_locked(&self) -> bool {
        self.workspace_status
            .as_ref()
            .and_then(|s| s.locked)
            .unwrap_or(false)
    }

    /// Returns `true` when the workspace is frozen against changes.
    pub fn is_frozen(&self) -> bool {
        self.workspace_status
            .as_ref()
            .and_then(|s| s.frozen)
            .unwrap_or(false)
    }

    /// ID of the first template, needed for the input operations.
    pub fn template_id(&self) -> Option<&str> {
        self.template_data
            .iter()
            .find_map(|t| t.id.as_deref())
            .or_else(|| self.runtime_data.iter().find_map(|r| r.id.as_deref()))
    }

    /// Region encoded in the workspace ID.
    pub fn region(&self) -> Option<Region> {
        Region::from_resource_id(&self.id)
    }
}

/// One page of `GET /v1/workspaces`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceList {
    #[serde(default)]
    pub count: Option<u64>,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub workspaces: Vec<Workspace>,
}

impl_list_page!(WorkspaceList, Workspace, workspaces, count);

/// Catalog offering a workspace was created from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_account: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_icon_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_readme_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_version: Option<String>,
}

/// Cluster information shared with the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedTargetData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_created_on: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entitlement_keys: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_count: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_machine_type: Option<String>,
}

/// Template settings sent on create, update and replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSourceDataRequest {
    /// Environment variables as `{"NAME": "value"}` maps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_values: Vec<serde_json::Value>,

    /// Folder inside the repository that holds the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_state_file: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall_script_name: Option<String>,

    /// Raw `terraform.tfvars` content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_metadata: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variablestore: Vec<WorkspaceVariableRequest>,
}

/// Template settings as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSourceDataResponse {
    #[serde(default)]
    pub env_values: Vec<EnvVariable>,

    #[serde(default)]
    pub folder: Option<String>,

    #[serde(default)]
    pub compact: Option<bool>,

    #[serde(default)]
    pub has_githubtoken: Option<bool>,

    /// Template ID (`t_id` in the input operations).
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type", default)]
    pub template_type: Option<String>,

    #[serde(default)]
    pub uninstall_script_name: Option<String>,

    #[serde(default)]
    pub values: Option<String>,

    #[serde(default)]
    pub values_metadata: Vec<serde_json::Value>,

    #[serde(default)]
    pub values_url: Option<String>,

    #[serde(default)]
    pub variablestore: Vec<WorkspaceVariableResponse>,
}

/// An environment variable attached to a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvVariable {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub secure: Option<bool>,

    #[serde(default)]
    pub hidden: Option<bool>,
}

/// A Terraform input variable sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceVariableRequest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_default: Option<bool>,
}

impl WorkspaceVariableRequest {
    /// A plain string input.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

/// A Terraform input variable as returned by the service.
///
/// Secure values come back masked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceVariableResponse {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(rename = "type", default)]
    pub variable_type: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub secure: Option<bool>,
}

/// Template repository settings sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateRepoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_sha_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,

    /// Full URL of the template, including the folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Template repository settings as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateRepoResponse {
    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub full_url: Option<String>,

    #[serde(default)]
    pub has_uploadedgitrepotar: Option<bool>,

    #[serde(default)]
    pub release: Option<String>,

    #[serde(default)]
    pub repo_sha_value: Option<String>,

    #[serde(default)]
    pub repo_url: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
}

/// Frozen and locked flags of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceStatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_time: Option<String>,
}

/// The request form has the same fields as the response.
pub type WorkspaceStatusRequest = WorkspaceStatusResponse;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceStatusMessage {
    #[serde(default)]
    pub status_code: Option<String>,

    #[serde(default)]
    pub status_msg: Option<String>,
}

/// Engine and state locations of one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateRunTimeData {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub engine_cmd: Option<String>,

    #[serde(default)]
    pub engine_name: Option<String>,

    #[serde(default)]
    pub engine_version: Option<String>,

    #[serde(default)]
    pub log_store_url: Option<String>,

    #[serde(default)]
    pub state_store_url: Option<String>,

    #[serde(default)]
    pub output_values: Vec<serde_json::Value>,

    #[serde(default)]
    pub resources: Vec<serde_json::Value>,
}

/// Body of `POST /v1/workspaces`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub template_type: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_data: Vec<TemplateSourceDataRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_repo: Option<TemplateRepoRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_ref: Option<CatalogRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_data: Option<SharedTargetData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_shareddata_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_status: Option<WorkspaceStatusRequest>,
}

impl CreateWorkspaceRequest {
    /// Validates the name, description and template types.
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_workspace_name(&self.name)?;
        if let Some(description) = &self.description {
            validate_workspace_description(description)?;
        }
        validate_template_types(&self.template_type, &self.template_data)
    }
}

/// Body of `PATCH` and `PUT /v1/workspaces/{w_id}`.
///
/// `PATCH` changes only the fields that are set. `PUT` replaces the
/// workspace definition and is required for template repository changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateWorkspaceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub template_type: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_data: Vec<TemplateSourceDataRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_repo: Option<TemplateRepoRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_ref: Option<CatalogRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_data: Option<SharedTargetData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_status: Option<WorkspaceStatusRequest>,
}

impl UpdateWorkspaceRequest {
    /// Validates the fields that are set.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            validate_workspace_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_workspace_description(description)?;
        }
        validate_template_types(&self.template_type, &self.template_data)
    }
}

fn validate_template_types(
    types: &[String],
    data: &[TemplateSourceDataRequest],
) -> Result<(), ApiError> {
    types
        .iter()
        .map(String::as_str)
        .chain(data.iter().filter_map(|d| d.template_type.as_deref()))
        .try_for_each(validate_template_type)
}

/// Input values of one template (`GET …/template_data/{t_id}/values`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateValues {
    #[serde(default)]
    pub env_values: Vec<serde_json::Value>,

    #[serde(default)]
    pub values: Option<String>,

    #[serde(default)]
    pub variablestore: Vec<WorkspaceVariableResponse>,
}

/// Body of `PUT …/template_data/{t_id}/values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaceInputsRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_values: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variablestore: Vec<WorkspaceVariableRequest>,
}

/// Terraform outputs of one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputValues {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub folder: Option<String>,

    #[serde(default)]
    pub value_type: Option<String>,

    /// Maps of output name to `{"value": …, "type": …, "sensitive": …}`.
    #[serde(default)]
    pub output_values: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl OutputValues {
    /// Flattens the outputs into `(name, value)` pairs.
    pub fn flatten(&self) -> Vec<(String, serde_json::Value)> {
        self.output_values
            .iter()
            .flat_map(|map| map.iter())
            .map(|(name, output)| {
                let value = output.get("value").cloned().unwrap_or_else(|| output.clone());
                (name.clone(), value)
            })
            .collect()
    }
}

/// A workspace run (plan, apply, destroy, refresh...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceActivity {
    #[serde(default)]
    pub action_id: Option<String>,

    /// Activity type, for example `PLAN` or `APPLY`.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Vec<String>,

    #[serde(default)]
    pub performed_at: Option<String>,

    #[serde(default)]
    pub performed_by: Option<String>,

    #[serde(default)]
    pub templates: Vec<serde_json::Value>,
}

/// Response of `GET /v1/workspaces/{w_id}/actions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceActivities {
    #[serde(default)]
    pub workspace_id: Option<String>,

    #[serde(default)]
    pub workspace_name: Option<String>,

    #[serde(default)]
    pub actions: Vec<WorkspaceActivity>,
}

/// Identifies an activity started on a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityId {
    #[serde(default)]
    pub activityid: String,
}

/// Options for `DELETE /v1/workspaces/{w_id}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteWorkspaceOptions {
    /// Also destroy the cloud resources the workspace created.
    pub destroy_resources: Option<bool>,
}

impl SchematicsClient {
    /// Lists workspaces. Only `offset` and `limit` apply to this endpoint.
    pub async fn list_workspaces(&self, options: &ListOptions) -> Result<WorkspaceList, ApiError> {
        options.validate(WORKSPACE_MAX_LIMIT)?;
        let request = ApiRequest::get(&["v1", "workspaces"])
            .query_opt("offset", options.offset)
            .query_opt("limit", options.limit);
        self.send(request).await
    }

    pub async fn get_workspace(&self, w_id: &str) -> Result<Workspace, ApiError> {
        let w_id = require("w_id", w_id)?;
        self.send(ApiRequest::get(&["v1", "workspaces", w_id])).await
    }

    /// Creates a workspace. `github_token` is needed for private template
    /// repositories.
    pub async fn create_workspace(
        &self,
        body: &CreateWorkspaceRequest,
        github_token: Option<&str>,
    ) -> Result<Workspace, ApiError> {
        body.validate()?;
        let request = ApiRequest::post(&["v1", "workspaces"])
            .header_opt("X-Github-token", github_token)
            .json(body)?;
        self.send(request).await
    }

    /// Updates the fields that are set in `body` (`PATCH`).
    pub async fn update_workspace(
        &self,
        w_id: &str,
        body: &UpdateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        let w_id = require("w_id", w_id)?;
        body.validate()?;
        let request = ApiRequest::patch(&["v1", "workspaces", w_id]).json(body)?;
        self.send(request).await
    }

    /// Replaces the workspace definition (`PUT`).
    pub async fn replace_workspace(
        &self,
        w_id: &str,
        body: &UpdateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        let w_id = require("w_id", w_id)?;
        body.validate()?;
        let request = ApiRequest::put(&["v1", "workspaces", w_id]).json(body)?;
        self.send(request).await
    }

    /// Deletes a workspace and returns the service's confirmation text.
    pub async fn delete_workspace(
        &self,
        w_id: &str,
        options: &DeleteWorkspaceOptions,
    ) -> Result<String, ApiError> {
        let w_id = require("w_id", w_id)?;
        let refresh_token = self.refresh_token().await?;
        let request = ApiRequest::delete(&["v1", "workspaces", w_id])
            .header("refresh_token", refresh_token)
            .query_opt("destroy_resources", options.destroy_resources);
        self.send_text(request).await
    }

    pub async fn get_workspace_inputs(&self, w_id: &str, t_id: &str) -> Result<TemplateValues, ApiError> {
        let w_id = require("w_id", w_id)?;
        let t_id = require("t_id", t_id)?;
        let request = ApiRequest::get(&["v1", "workspaces", w_id, "template_data", t_id, "values"]);
        self.send(request).await
    }

    pub async fn replace_workspace_inputs(
        &self,
        w_id: &str,
        t_id: &str,
        body: &ReplaceInputsRequest,
    ) -> Result<TemplateValues, ApiError> {
        let w_id = require("w_id", w_id)?;
        let t_id = require("t_id", t_id)?;
        let request = ApiRequest::put(&["v1", "workspaces", w_id, "template_data", t_id, "values"])
            .json(body)?;
        self.send(request).await
    }

    pub async fn get_workspace_outputs(&self, w_id: &str) -> Result<Vec<OutputValues>, ApiError> {
        let w_id = require("w_id", w_id)?;
        self.send(ApiRequest::get(&["v1", "workspaces", w_id, "output_values"]))
            .await
    }

    /// Starts `terraform apply`.
    pub async fn apply_workspace(&self, w_id: &str) -> Result<ActivityId, ApiError> {
        self.start_workspace_activity(Method::PUT, w_id, "apply").await
    }

    /// Starts `terraform plan`.
    pub async fn plan_workspace(&self, w_id: &str) -> Result<ActivityId, ApiError> {
        self.start_workspace_activity(Method::POST, w_id, "plan").await
    }

    /// Starts `terraform destroy`.
    pub async fn destroy_workspace(&self, w_id: &str) -> Result<ActivityId, ApiError> {
        self.start_workspace_activity(Method::PUT, w_id, "destroy").await
    }

    /// Starts `terraform refresh`.
    pub async fn refresh_workspace(&self, w_id: &str) -> Result<ActivityId, ApiError> {
        self.start_workspace_activity(Method::PUT, w_id, "refresh").await
    }

    pub async fn list_workspace_activities(
        &self,
        w_id: &str,
        options: &ListOptions,
    ) -> Result<WorkspaceActivities, ApiError> {
        let w_id = require("w_id", w_id)?;
        options.validate(WORKSPACE_MAX_LIMIT)?;
        let request = ApiRequest::get(&["v1", "workspaces", w_id, "actions"])
            .query_opt("offset", options.offset)
            .query_opt("limit", options.limit);
        self.send(request).await
    }

    pub async fn get_workspace_activity(
        &self,
        w_id: &str,
        activity_id: &str,
    ) -> Result<WorkspaceActivity, ApiError> {
        let w_id = require("w_id", w_id)?;
        let activity_id = require("activity_id", activity_id)?;
        self.send(ApiRequest::get(&["v1", "workspaces", w_id, "actions", activity_id]))
            .await
    }

    async fn start_workspace_activity(
        &self,
        method: Method,
        w_id: &str,
        activity: &str,
    ) -> Result<ActivityId, ApiError> {
        let w_id = require("w_id", w_id)?;
        let refresh_token = self.refresh_token().await?;
        let request = ApiRequest::new(method, &["v1", "workspaces", w_id, activity])
            .header("refresh_token", refresh_token);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::ListPage;

    #[test]
    fn test_workspace_name_rules() {
        assert!(validate_workspace_name("my-workspace_1 dev").is_ok());
        assert!(validate_workspace_name("9lives").is_ok());
        assert!(validate_workspace_name("").is_err());
        assert!(validate_workspace_name("-leading").is_err());
        assert!(validate_workspace_name("bad!name").is_err());
        assert!(validate_workspace_name(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_template_type_rules() {
        assert!(validate_template_type("terraform_v1.5").is_ok());
        assert!(validate_template_type("terraform_v1.9.2").is_ok());
        assert!(validate_template_type("terraform_v0.12").is_err());
        assert!(validate_template_type("terraform_v1.10").is_err());
    }

    #[test]
    fn test_create_request_checks_template_data_types() {
        let request = CreateWorkspaceRequest {
            name: "demo".to_string(),
            template_data: vec![TemplateSourceDataRequest {
                template_type: Some("terraform_v0.13".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(matches!(request.validate(), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn test_create_request_serialization() {
        let request = CreateWorkspaceRequest {
            name: "demo".to_string(),
            template_type: vec!["terraform_v1.5".to_string()],
            template_data: vec![TemplateSourceDataRequest {
                folder: Some(".".to_string()),
                variablestore: vec![WorkspaceVariableRequest::new("region", "us-south")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "demo",
                "type": ["terraform_v1.5"],
                "template_data": [{
                    "folder": ".",
                    "variablestore": [{"name": "region", "value": "us-south"}]
                }]
            })
        );
    }

    #[test]
    fn test_workspace_status_accessors() {
        let workspace: Workspace = serde_json::from_value(serde_json::json!({
            "id": "us-south.workspace.demo.1a2b3c4d",
            "name": "demo",
            "status": "INACTIVE",
            "workspace_status": {"locked": true, "frozen": false},
            "template_data": [{"id": "tmpl-1", "type": "terraform_v1.5"}],
            "unknown_field": 42
        }))
        .unwrap();

        assert!(workspace.is_locked());
        assert!(!workspace.is_frozen());
        assert_eq!(workspace.template_id(), Some("tmpl-1"));
        assert_eq!(workspace.region(), Some(Region::UsSouth));
    }

    #[test]
    fn test_workspace_list_paging() {
        let page: WorkspaceList = serde_json::from_value(serde_json::json!({
            "count": 3,
            "offset": 0,
            "limit": 2,
            "workspaces": [{"id": "a"}, {"id": "b"}]
        }))
        .unwrap();
        assert_eq!(page.next_offset(), Some(2));
    }

    #[test]
    fn test_output_values_flatten() {
        let outputs: OutputValues = serde_json::from_value(serde_json::json!({
            "id": "tmpl-1",
            "output_values": [{
                "vpc_id": {"sensitive": false, "type": "string", "value": "r006-123"}
            }]
        }))
        .unwrap();
        assert_eq!(
            outputs.flatten(),
            vec![("vpc_id".to_string(), serde_json::json!("r006-123"))]
        );
    }
}
