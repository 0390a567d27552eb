//
//  schematics-cli
//  api/v2/actions.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Action API types and operations.
//!
//! An action wraps an Ansible playbook repository together with the
//! inventory it runs against. Playbooks are run by submitting an
//! `ansible_playbook_run` job for the action.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::client::{ApiRequest, SchematicsClient};
use crate::api::common::{
    impl_list_page, lenient, require, ApiError, BastionResourceDefinition, ExternalSource,
    ListOptions, Profile, Region, SourceType, SystemLock, UserState, VariableData,
};
use crate::api::v2::V2_MAX_LIMIT;

static ACTION_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_\-]*$").unwrap());

/// Checks an action name: 1 to 65 characters, starting with a letter.
pub fn validate_action_name(name: &str) -> Result<(), ApiError> {
    let len = name.chars().count();
    if !(1..=65).contains(&len) {
        return Err(ApiError::InvalidArgument(format!(
            "action name must be 1 to 65 characters, got {}",
            len
        )));
    }
    if !ACTION_NAME.is_match(name) {
        return Err(ApiError::InvalidArgument(format!(
            "invalid action name '{}': must start with a letter and contain only letters, digits, '_' or '-'",
            name
        )));
    }
    Ok(())
}

/// State of the last job run for an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionState {
    /// `normal`, `pending`, `disabled` or `critical`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_job_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// A Schematics action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Region>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub user_state: Option<UserState>,

    #[serde(default)]
    pub source_readme_url: Option<String>,

    #[serde(default)]
    pub source: Option<ExternalSource>,

    #[serde(default)]
    pub source_type: Option<SourceType>,

    #[serde(default)]
    pub command_parameter: Option<String>,

    /// Inventory ID or name used as the playbook target.
    #[serde(default)]
    pub inventory: Option<String>,

    #[serde(default)]
    pub credentials: Vec<VariableData>,

    #[serde(default)]
    pub bastion: Option<BastionResourceDefinition>,

    #[serde(default)]
    pub bastion_credential: Option<VariableData>,

    #[serde(default)]
    pub targets_ini: Option<String>,

    #[serde(default)]
    pub inputs: Vec<VariableData>,

    #[serde(default)]
    pub outputs: Vec<VariableData>,

    #[serde(default)]
    pub settings: Vec<VariableData>,

    #[serde(default)]
    pub crn: Option<String>,

    #[serde(default)]
    pub account: Option<String>,

    #[serde(default)]
    pub source_created_at: Option<String>,

    #[serde(default)]
    pub source_created_by: Option<String>,

    #[serde(default)]
    pub source_updated_at: Option<String>,

    #[serde(default)]
    pub source_updated_by: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,

    #[serde(default)]
    pub state: Option<ActionState>,

    #[serde(default)]
    pub playbook_names: Vec<String>,

    #[serde(default)]
    pub sys_lock: Option<SystemLock>,
}

impl Action {
    pub fn is_locked(&self) -> bool {
        self.sys_lock.as_ref().map(SystemLock::is_locked).unwrap_or(false)
    }
}

/// An action as returned by `GET /v2/actions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionLite {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub crn: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Region>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub playbook_name: Option<String>,

    #[serde(default)]
    pub user_state: Option<UserState>,

    #[serde(default)]
    pub state: Option<ActionState>,

    #[serde(default)]
    pub sys_lock: Option<SystemLock>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,
}

/// One page of `GET /v2/actions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionList {
    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub actions: Vec<ActionLite>,
}

impl_list_page!(ActionList, ActionLite, actions, total_count);

/// Body of `POST /v2/actions` and `PATCH /v2/actions/{action_id}`.
///
/// Every field is optional so the same type serves partial updates;
/// [`CreateActionRequest::validate`] enforces what a create needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateActionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Region>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_state: Option<UserState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_readme_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ExternalSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_parameter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<VariableData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion: Option<BastionResourceDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion_credential: Option<VariableData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets_ini: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<VariableData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<VariableData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<VariableData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ActionState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys_lock: Option<SystemLock>,
}

impl CreateActionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Checks the request before a create.
    pub fn validate(&self) -> Result<(), ApiError> {
        match self.name.as_deref() {
            Some(name) => validate_action_name(name),
            None => Err(ApiError::MissingParameter("name")),
        }
    }

    /// Checks the request before an update; only set fields are checked.
    pub fn validate_update(&self) -> Result<(), ApiError> {
        match self.name.as_deref() {
            Some(name) => validate_action_name(name),
            None => Ok(()),
        }
    }
}

impl SchematicsClient {
    pub async fn list_actions(&self, options: &ListOptions) -> Result<ActionList, ApiError> {
        options.validate(V2_MAX_LIMIT)?;
        self.send(options.apply(ApiRequest::get(&["v2", "actions"])))
            .await
    }

    /// Creates an action. `github_token` is forwarded for private repositories.
    pub async fn create_action(
        &self,
        body: &CreateActionRequest,
        github_token: Option<&str>,
    ) -> Result<Action, ApiError> {
        body.validate()?;
        let request = ApiRequest::post(&["v2", "actions"])
            .header_opt("X-Github-token", github_token)
            .json(body)?;
        self.send(request).await
    }

    pub async fn get_action(
        &self,
        action_id: &str,
        profile: Option<Profile>,
    ) -> Result<Action, ApiError> {
        let action_id = require("action_id", action_id)?;
        let request = ApiRequest::get(&["v2", "actions", action_id])
            .query_opt("profile", profile.map(|p| p.as_str()));
        self.send(request).await
    }

    pub async fn update_action(
        &self,
        action_id: &str,
        body: &CreateActionRequest,
        github_token: Option<&str>,
    ) -> Result<Action, ApiError> {
        let action_id = require("action_id", action_id)?;
        body.validate_update()?;
        let request = ApiRequest::patch(&["v2", "actions", action_id])
            .header_opt("X-Github-token", github_token)
            .json(body)?;
        self.send(request).await
    }

    pub async fn delete_action(
        &self,
        action_id: &str,
        force: Option<bool>,
        propagate: Option<bool>,
    ) -> Result<(), ApiError> {
        let action_id = require("action_id", action_id)?;
        let request = ApiRequest::delete(&["v2", "actions", action_id])
            .query_opt("force", force)
            .query_opt("propagate", propagate);
        self.send_empty(request).await
    }
}
