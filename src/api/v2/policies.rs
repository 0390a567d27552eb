//
//  schematics-cli
//  api/v2/policies.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Policy API types and operations.
//!
//! Policies live under `/v2/settings/policies`. The only kind the service
//! offers today is `agent_assignment_policy`, which routes jobs for the
//! selected workspaces and actions to a particular agent.

use serde::{Deserialize, Serialize};

use crate::api::client::{ApiRequest, SchematicsClient};
use crate::api::common::{
    impl_list_page, lenient, lenient_list, require, ApiError, ListOptions, Profile, Region,
    UserState,
};
use crate::api::v2::V2_MAX_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    AgentAssignmentPolicy,
}

/// How a policy selects the objects it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// An explicit list of IDs.
    Ids,
    /// Everything matching a set of scopes.
    Scoped,
}

/// Objects matched by tag, resource group and location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySelectorScope {
    /// `workspace`, `action`, `system` or `environment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_groups: Vec<String>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "lenient_list"
    )]
    pub locations: Vec<Region>,
}

/// Objects a policy applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTarget {
    pub selector_kind: SelectorKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selector_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selector_scope: Vec<PolicySelectorScope>,
}

impl PolicyTarget {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selector_kind: SelectorKind::Ids,
            selector_ids: ids.into_iter().map(Into::into).collect(),
            selector_scope: Vec::new(),
        }
    }

    pub fn scoped(scope: Vec<PolicySelectorScope>) -> Self {
        Self {
            selector_kind: SelectorKind::Scoped,
            selector_ids: Vec::new(),
            selector_scope: scope,
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        let empty = match self.selector_kind {
            SelectorKind::Ids => self.selector_ids.is_empty(),
            SelectorKind::Scoped => self.selector_scope.is_empty(),
        };
        if empty {
            return Err(ApiError::InvalidArgument(
                "policy target selects nothing".to_string(),
            ));
        }
        Ok(())
    }
}

/// Kind-specific parameters; for assignment policies, the agents to use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_assignment_policy_parameter: Option<PolicyTarget>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Region>,

    #[serde(default)]
    pub state: Option<UserState>,

    #[serde(default, deserialize_with = "lenient")]
    pub policy_kind: Option<PolicyKind>,

    #[serde(default)]
    pub policy_target: Option<PolicyTarget>,

    #[serde(default)]
    pub policy_parameter: Option<PolicyParameter>,

    #[serde(default)]
    pub crn: Option<String>,

    #[serde(default)]
    pub account: Option<String>,

    #[serde(default)]
    pub scoped_resources: Vec<serde_json::Value>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One page of `GET /v2/settings/policies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyList {
    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl_list_page!(PolicyList, Policy, policies, total_count);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Region>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<UserState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_kind: Option<PolicyKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_target: Option<PolicyTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_parameter: Option<PolicyParameter>,
}

impl PolicyRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", self.name.as_deref().unwrap_or_default())?;
        if self.policy_kind.is_none() {
            return Err(ApiError::MissingParameter("policy_kind"));
        }
        if let Some(target) = &self.policy_target {
            target.validate()?;
        }
        Ok(())
    }
}

impl SchematicsClient {
    pub async fn list_policies(&self, options: &ListOptions) -> Result<PolicyList, ApiError> {
        options.validate(V2_MAX_LIMIT)?;
        self.send(options.apply(ApiRequest::get(&["v2", "settings", "policies"])))
            .await
    }

    pub async fn create_policy(&self, body: &PolicyRequest) -> Result<Policy, ApiError> {
        body.validate()?;
        self.send(ApiRequest::post(&["v2", "settings", "policies"]).json(body)?)
            .await
    }

    pub async fn get_policy(
        &self,
        policy_id: &str,
        profile: Option<Profile>,
    ) -> Result<Policy, ApiError> {
        let policy_id = require("policy_id", policy_id)?;
        let request = ApiRequest::get(&["v2", "settings", "policies", policy_id])
            .query_opt("profile", profile.map(|p| p.as_str()));
        self.send(request).await
    }

    pub async fn update_policy(&self, policy_id: &str, body: &PolicyRequest) -> Result<Policy, ApiError> {
        let policy_id = require("policy_id", policy_id)?;
        if let Some(target) = &body.policy_target {
            target.validate()?;
        }
        self.send(ApiRequest::patch(&["v2", "settings", "policies", policy_id]).json(body)?)
            .await
    }

    pub async fn delete_policy(&self, policy_id: &str) -> Result<(), ApiError> {
        let policy_id = require("policy_id", policy_id)?;
        self.send_empty(ApiRequest::delete(&["v2", "settings", "policies", policy_id]))
            .await
    }
}
