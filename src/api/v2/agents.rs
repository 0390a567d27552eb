//
//  schematics-cli
//  api/v2/agents.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Agent API types and operations.
//!
//! An agent runs Schematics jobs inside the caller's own infrastructure
//! (a Kubernetes or OpenShift cluster plus a COS bucket). After an agent is
//! registered it is installed with a *deploy* job, checked with a *health*
//! job and, when needed, re-configured with a *prs* (pre-requisite scanner)
//! job.
//!
//! # Example
//!
//! ```rust,no_run
//! use schematics_cli::api::SchematicsClient;
//! use schematics_cli::api::v2::AgentJobKind;
//!
//! # async fn example(client: SchematicsClient) -> Result<(), schematics_cli::api::ApiError> {
//! let agent_id = "us-south.AGENT.edge.7f3c";
//! client.run_agent_job(agent_id, AgentJobKind::Deploy, false).await?;
//! let job = client.get_agent_job(agent_id, AgentJobKind::Deploy).await?;
//! println!("{:?}", job.status_code);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::de::{value, IntoDeserializer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::{ApiRequest, SchematicsClient};
use crate::api::common::{
    impl_list_page, lenient, require, ApiError, ListOptions, Profile, Region, UserState,
    VariableData,
};
use crate::api::v2::jobs::check_poll_interval;
use crate::api::v2::{JobStatusCode, V2_MAX_LIMIT};

/// Cluster and storage an agent is installed into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInfrastructure {
    /// `ibm_kubernetes`, `ibm_openshift` or `ibm_satellite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_instance_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_bucket_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_bucket_region: Option<String>,
}

/// Free-form metadata attached to an agent, such as `purpose` or `git_endpoints`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadataInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSystemStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// Health indicators reported by an installed agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentKpi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_indicator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_indicator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_usage_indicator: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub application_indicators: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub infra_indicators: Vec<serde_json::Value>,
}

/// Kind of agent job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentJobKind {
    /// Install or upgrade the agent.
    Deploy,
    /// Check connectivity and permissions.
    Health,
    /// Pre-requisite scan of the target cluster.
    Prs,
}

impl AgentJobKind {
    /// Path segment of the job endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Health => "health",
            Self::Prs => "prs",
        }
    }
}

impl fmt::Display for AgentJobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentJobKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deploy" => Ok(Self::Deploy),
            "health" => Ok(Self::Health),
            "prs" => Ok(Self::Prs),
            other => Err(ApiError::InvalidArgument(format!(
                "unknown agent job '{}', expected deploy, health or prs",
                other
            ))),
        }
    }
}

/// Most recent deploy, health, prs or destroy job of an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentJob {
    #[serde(default)]
    pub agent_id: Option<String>,

    #[serde(default)]
    pub job_id: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,

    /// Only reported for deploy jobs.
    #[serde(default)]
    pub is_redeployed: Option<bool>,

    #[serde(default)]
    pub agent_version: Option<String>,

    #[serde(default)]
    pub status_code: Option<String>,

    #[serde(default)]
    pub status_message: Option<String>,

    #[serde(default)]
    pub log_url: Option<String>,
}

impl AgentJob {
    /// The status code as a [`JobStatusCode`]; unrecognised codes map to
    /// [`JobStatusCode::Unknown`].
    pub fn code(&self) -> Option<JobStatusCode> {
        let code = self.status_code.as_deref()?.trim();
        if code.is_empty() {
            return None;
        }
        let deserializer: value::StrDeserializer<'_, value::Error> = code.into_deserializer();
        Some(JobStatusCode::deserialize(deserializer).unwrap_or(JobStatusCode::Unknown))
    }
}

/// A Schematics agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Agent {
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

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub schematics_location: Option<Region>,

    /// Region of the cluster the agent runs in; any IBM Cloud region.
    #[serde(default)]
    pub agent_location: Option<String>,

    #[serde(default)]
    pub agent_infrastructure: Option<AgentInfrastructure>,

    #[serde(default)]
    pub agent_metadata: Vec<AgentMetadataInfo>,

    #[serde(default)]
    pub agent_inputs: Vec<VariableData>,

    #[serde(default)]
    pub user_state: Option<UserState>,

    #[serde(default)]
    pub agent_crn: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub creation_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,

    #[serde(default)]
    pub system_state: Option<AgentSystemStatus>,

    #[serde(default)]
    pub agent_kpi: Option<AgentKpi>,

    #[serde(default)]
    pub recent_prs_job: Option<AgentJob>,

    #[serde(default)]
    pub recent_deploy_job: Option<AgentJob>,

    #[serde(default)]
    pub recent_health_job: Option<AgentJob>,

    /// Set once resources have been removed with `DELETE /resources`.
    #[serde(default)]
    pub recent_destroy_job: Option<AgentJob>,
}

impl Agent {
    /// Most recent job of the given kind.
    pub fn recent_job(&self, kind: AgentJobKind) -> Option<&AgentJob> {
        match kind {
            AgentJobKind::Deploy => self.recent_deploy_job.as_ref(),
            AgentJobKind::Health => self.recent_health_job.as_ref(),
            AgentJobKind::Prs => self.recent_prs_job.as_ref(),
        }
    }

    /// Returns `true` once the destroy job will not change state again.
    ///
    /// A destroy job reported with an empty status code counts as settled;
    /// a missing one is still pending.
    pub fn destroy_settled(&self) -> bool {
        let Some(job) = &self.recent_destroy_job else {
            return false;
        };
        match job.status_code.as_deref() {
            Some(code) if code.trim().is_empty() => true,
            Some(_) => job.code().is_some_and(|c| c.is_terminal()),
            None => false,
        }
    }
}

/// One page of `GET /v2/agents`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentList {
    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub agents: Vec<Agent>,
}

impl_list_page!(AgentList, Agent, agents, total_count);

/// Body of `POST /v2/agents` and `PUT /v2/agents/{agent_id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schematics_location: Option<Region>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_infrastructure: Option<AgentInfrastructure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_metadata: Vec<AgentMetadataInfo>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_inputs: Vec<VariableData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_state: Option<UserState>,
}

impl AgentRequest {
    /// Checks the fields a new agent must carry.
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", self.name.as_deref().unwrap_or_default())?;
        require(
            "resource_group",
            self.resource_group.as_deref().unwrap_or_default(),
        )?;
        require("version", self.version.as_deref().unwrap_or_default())?;
        if self.schematics_location.is_none() {
            return Err(ApiError::MissingParameter("schematics_location"));
        }
        require(
            "agent_location",
            self.agent_location.as_deref().unwrap_or_default(),
        )?;
        if self.agent_infrastructure.is_none() {
            return Err(ApiError::MissingParameter("agent_infrastructure"));
        }
        Ok(())
    }
}

impl SchematicsClient {
    pub async fn list_agents(&self, options: &ListOptions) -> Result<AgentList, ApiError> {
        options.validate(V2_MAX_LIMIT)?;
        self.send(options.apply(ApiRequest::get(&["v2", "agents"])))
            .await
    }

    /// Registers an agent. The agent is not installed until a deploy job runs.
    pub async fn create_agent(&self, body: &AgentRequest) -> Result<Agent, ApiError> {
        body.validate()?;
        self.send(ApiRequest::post(&["v2", "agents"]).json(body)?)
            .await
    }

    pub async fn get_agent(
        &self,
        agent_id: &str,
        profile: Option<Profile>,
    ) -> Result<Agent, ApiError> {
        let agent_id = require("agent_id", agent_id)?;
        let request = ApiRequest::get(&["v2", "agents", agent_id])
            .query_opt("profile", profile.map(|p| p.as_str()));
        self.send(request).await
    }

    pub async fn update_agent(&self, agent_id: &str, body: &AgentRequest) -> Result<Agent, ApiError> {
        let agent_id = require("agent_id", agent_id)?;
        self.send(ApiRequest::put(&["v2", "agents", agent_id]).json(body)?)
            .await
    }

    /// Deletes the agent registration.
    ///
    /// The IAM refresh token is forwarded when the authenticator has one so
    /// the service can clean up on the caller's behalf. `force` deletes the
    /// registration even when deployed resources are still recorded.
    pub async fn delete_agent(&self, agent_id: &str, force: bool) -> Result<(), ApiError> {
        let agent_id = require("agent_id", agent_id)?;
        let refresh_token = self.refresh_token().await.ok();
        let request = ApiRequest::delete(&["v2", "agents", agent_id])
            .header_opt("refresh_token", refresh_token)
            .header("force", force.to_string());
        self.send_empty(request).await
    }

    /// Starts a deploy, health or prs job on an agent.
    ///
    /// `force` re-runs the job even when the last one succeeded.
    pub async fn run_agent_job(
        &self,
        agent_id: &str,
        kind: AgentJobKind,
        force: bool,
    ) -> Result<AgentJob, ApiError> {
        let agent_id = require("agent_id", agent_id)?;
        let request = ApiRequest::put(&["v2", "agents", agent_id, kind.as_str()])
            .header("force", force.to_string());
        self.send(request).await
    }

    pub async fn get_agent_job(
        &self,
        agent_id: &str,
        kind: AgentJobKind,
    ) -> Result<AgentJob, ApiError> {
        let agent_id = require("agent_id", agent_id)?;
        self.send(ApiRequest::get(&["v2", "agents", agent_id, kind.as_str()]))
            .await
    }

    /// Removes the resources a deploy job installed in the target cluster.
    pub async fn delete_agent_resources(&self, agent_id: &str) -> Result<(), ApiError> {
        let agent_id = require("agent_id", agent_id)?;
        let refresh_token = self.refresh_token().await?;
        let request = ApiRequest::delete(&["v2", "agents", agent_id, "resources"])
            .header("refresh_token", refresh_token);
        self.send_empty(request).await
    }

    /// Polls an agent every `interval` until the destroy job started by
    /// [`SchematicsClient::delete_agent_resources`] settles.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for a zero `interval`,
    /// [`ApiError::Timeout`] when the job is still running after `timeout`,
    /// and any error from [`SchematicsClient::get_agent`].
    pub async fn wait_for_agent_destroy(
        &self,
        agent_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Agent, ApiError> {
        self.wait_for_agent_destroy_with(agent_id, interval, timeout, |_| {})
            .await
    }

    /// Like [`SchematicsClient::wait_for_agent_destroy`], calling `on_poll`
    /// with every destroy job state fetched.
    pub async fn wait_for_agent_destroy_with<F>(
        &self,
        agent_id: &str,
        interval: Duration,
        timeout: Duration,
        mut on_poll: F,
    ) -> Result<Agent, ApiError>
    where
        F: FnMut(Option<&AgentJob>),
    {
        check_poll_interval(interval)?;
        let started = Instant::now();

        loop {
            let agent = self.get_agent(agent_id, Some(Profile::Detailed)).await?;
            let job = agent.recent_destroy_job.as_ref();
            debug!(
                agent_id,
                status = ?job.and_then(|j| j.status_code.as_deref()),
                "polled agent destroy job"
            );
            on_poll(job);

            if agent.destroy_settled() {
                return Ok(agent);
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(ApiError::Timeout(format!(
                    "agent {} resources still {} after {}s",
                    agent_id,
                    job.and_then(|j| j.status_code.as_deref())
                        .unwrap_or("job_pending"),
                    elapsed.as_secs()
                )));
            }

            tokio::time::sleep(interval.min(timeout - elapsed)).await;
        }
    }
}
