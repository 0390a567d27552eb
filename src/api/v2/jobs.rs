//
//  schematics-cli
//  api/v2/jobs.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Job API types and operations.
//!
//! A job runs a command against a workspace, an action or the service
//! itself (for example `workspace_apply` or `ansible_playbook_run`). Jobs
//! are asynchronous: [`SchematicsClient::create_job`] returns immediately
//! and [`SchematicsClient::wait_for_job`] polls until the job settles.
//!
//! # Job Lifecycle
//!
//! ```text
//! job_pending -> job_in_progress -> job_finished
//!                               \-> job_failed
//!                               \-> job_cancelled / job_stopped
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use schematics_cli::api::SchematicsClient;
//! use schematics_cli::api::v2::{CommandName, CommandObject, CreateJobRequest};
//!
//! # async fn example(client: SchematicsClient) -> Result<(), schematics_cli::api::ApiError> {
//! let request = CreateJobRequest::new(
//!     CommandObject::Action,
//!     "us-east.ACTION.demo.5e8f1a2b",
//!     CommandName::AnsiblePlaybookRun,
//! );
//! let job = client.create_job(&request).await?;
//! let job = client
//!     .wait_for_job(&job.id, Duration::from_secs(10), Duration::from_secs(1800))
//!     .await?;
//! println!("{:?}", job.status_code());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::{ApiRequest, SchematicsClient};
use crate::api::common::{
    impl_list_page, lenient, require, ApiError, BastionResourceDefinition, ListOptions, Profile,
    Region, VariableData,
};
use crate::api::v2::V2_MAX_LIMIT;

/// Kind of object a job runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandObject {
    Action,
    Environment,
    System,
    Workspace,
}

impl CommandObject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Environment => "environment",
            Self::System => "system",
            Self::Workspace => "workspace",
        }
    }
}

impl fmt::Display for CommandObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandObject {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "action" => Ok(Self::Action),
            "environment" => Ok(Self::Environment),
            "system" => Ok(Self::System),
            "workspace" => Ok(Self::Workspace),
            other => Err(ApiError::InvalidArgument(format!(
                "unknown command object '{}', expected action, environment, system or workspace",
                other
            ))),
        }
    }
}

/// Command a job executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    AnsiblePlaybookCheck,
    AnsiblePlaybookRun,
    CreateAction,
    CreateCart,
    CreateEnvironment,
    CreateWorkspace,
    DeleteAction,
    DeleteEnvironment,
    DeleteWorkspace,
    EnvironmentInit,
    EnvironmentInstall,
    EnvironmentUninstall,
    PatchAction,
    PatchWorkspace,
    PutAction,
    PutEnvironment,
    PutWorkspace,
    RepositoryProcess,
    SystemKeyDelete,
    SystemKeyDisable,
    SystemKeyEnable,
    SystemKeyRestore,
    SystemKeyRotate,
    WorkspaceApply,
    WorkspaceDestroy,
    WorkspacePlan,
    WorkspaceRefresh,
}

impl CommandName {
    /// Every command name with its wire form.
    pub const ALL: [(CommandName, &'static str); 27] = [
        (Self::AnsiblePlaybookCheck, "ansible_playbook_check"),
        (Self::AnsiblePlaybookRun, "ansible_playbook_run"),
        (Self::CreateAction, "create_action"),
        (Self::CreateCart, "create_cart"),
        (Self::CreateEnvironment, "create_environment"),
        (Self::CreateWorkspace, "create_workspace"),
        (Self::DeleteAction, "delete_action"),
        (Self::DeleteEnvironment, "delete_environment"),
        (Self::DeleteWorkspace, "delete_workspace"),
        (Self::EnvironmentInit, "environment_init"),
        (Self::EnvironmentInstall, "environment_install"),
        (Self::EnvironmentUninstall, "environment_uninstall"),
        (Self::PatchAction, "patch_action"),
        (Self::PatchWorkspace, "patch_workspace"),
        (Self::PutAction, "put_action"),
        (Self::PutEnvironment, "put_environment"),
        (Self::PutWorkspace, "put_workspace"),
        (Self::RepositoryProcess, "repository_process"),
        (Self::SystemKeyDelete, "system_key_delete"),
        (Self::SystemKeyDisable, "system_key_disable"),
        (Self::SystemKeyEnable, "system_key_enable"),
        (Self::SystemKeyRestore, "system_key_restore"),
        (Self::SystemKeyRotate, "system_key_rotate"),
        (Self::WorkspaceApply, "workspace_apply"),
        (Self::WorkspaceDestroy, "workspace_destroy"),
        (Self::WorkspacePlan, "workspace_plan"),
        (Self::WorkspaceRefresh, "workspace_refresh"),
    ];

    pub fn as_str(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(name, _)| name == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(command, _)| *command)
            .ok_or_else(|| ApiError::InvalidArgument(format!("unknown command name '{}'", s)))
    }
}

/// Status code reported in the job status blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatusCode {
    JobPending,
    JobInProgress,
    JobFinished,
    JobFailed,
    JobCancelled,
    JobStopped,
    JobStoppedWithErrors,
    #[serde(other)]
    Unknown,
}

impl JobStatusCode {
    /// Returns `true` once the job will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::JobFinished
                | Self::JobFailed
                | Self::JobCancelled
                | Self::JobStopped
                | Self::JobStoppedWithErrors
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::JobFinished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobPending => "job_pending",
            Self::JobInProgress => "job_in_progress",
            Self::JobFinished => "job_finished",
            Self::JobFailed => "job_failed",
            Self::JobCancelled => "job_cancelled",
            Self::JobStopped => "job_stopped",
            Self::JobStoppedWithErrors => "job_stopped_with_errors",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status blocks of a job; only the block matching its command object is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_in_queue: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_in_queue: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_job_status: Option<WorkspaceJobStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_job_status: Option<ActionJobStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_job_status: Option<SystemJobStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_job_status: Option<FlowJobStatus>,
}

impl JobStatus {
    /// First status code found across the status blocks.
    pub fn code(&self) -> Option<JobStatusCode> {
        self.workspace_job_status
            .as_ref()
            .and_then(|s| s.status_code)
            .or_else(|| self.action_job_status.as_ref().and_then(|s| s.status_code))
            .or_else(|| {
                self.system_job_status
                    .as_ref()
                    .and_then(|s| s.system_status_code)
            })
            .or_else(|| self.flow_job_status.as_ref().and_then(|s| s.status_code))
    }

    /// Status message matching [`JobStatus::code`].
    pub fn message(&self) -> Option<&str> {
        self.workspace_job_status
            .as_ref()
            .and_then(|s| s.status_message.as_deref())
            .or_else(|| {
                self.action_job_status
                    .as_ref()
                    .and_then(|s| s.status_message.as_deref())
            })
            .or_else(|| {
                self.system_job_status
                    .as_ref()
                    .and_then(|s| s.system_status_message.as_deref())
            })
            .or_else(|| {
                self.flow_job_status
                    .as_ref()
                    .and_then(|s| s.status_message.as_deref())
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceJobStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<JobStatusCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_status: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionJobStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<JobStatusCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion_status_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion_status_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets_status_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets_status_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemJobStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_status_code: Option<JobStatusCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_status_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowJobStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<JobStatusCode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Summary the service extracts from a job log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobLogSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_start_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_analyzed_till: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_errors: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_download_job: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_job: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_job: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_job: Option<serde_json::Value>,
}

/// A Schematics job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub command_object: Option<CommandObject>,

    #[serde(default)]
    pub command_object_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub command_name: Option<CommandName>,

    #[serde(default)]
    pub command_parameter: Option<String>,

    #[serde(default)]
    pub command_options: Vec<String>,

    #[serde(default)]
    pub inputs: Vec<VariableData>,

    #[serde(default)]
    pub settings: Vec<VariableData>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Region>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub submitted_at: Option<String>,

    #[serde(default)]
    pub submitted_by: Option<String>,

    #[serde(default)]
    pub start_at: Option<String>,

    #[serde(default)]
    pub end_at: Option<String>,

    #[serde(default)]
    pub duration: Option<String>,

    #[serde(default)]
    pub status: Option<JobStatus>,

    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub bastion: Option<BastionResourceDefinition>,

    #[serde(default)]
    pub log_summary: Option<JobLogSummary>,

    #[serde(default)]
    pub log_store_url: Option<String>,

    #[serde(default)]
    pub state_store_url: Option<String>,

    #[serde(default)]
    pub results_url: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Job {
    /// Status code of the job, whichever status block carries it.
    pub fn status_code(&self) -> Option<JobStatusCode> {
        self.status.as_ref().and_then(JobStatus::code)
    }

    /// Returns `true` once the job has settled.
    pub fn is_terminal(&self) -> bool {
        self.status_code().map(|c| c.is_terminal()).unwrap_or(false)
    }
}

/// A job as returned by `GET /v2/jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobLite {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub command_object: Option<CommandObject>,

    #[serde(default)]
    pub command_object_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub command_name: Option<CommandName>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Region>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub submitted_at: Option<String>,

    #[serde(default)]
    pub submitted_by: Option<String>,

    #[serde(default)]
    pub duration: Option<String>,

    #[serde(default)]
    pub start_at: Option<String>,

    #[serde(default)]
    pub end_at: Option<String>,

    #[serde(default)]
    pub status: Option<JobStatus>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

impl JobLite {
    pub fn status_code(&self) -> Option<JobStatusCode> {
        self.status.as_ref().and_then(JobStatus::code)
    }
}

/// One page of `GET /v2/jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub jobs: Vec<JobLite>,
}

impl_list_page!(JobList, JobLite, jobs, total_count);

/// Body of `POST /v2/jobs` and `PUT /v2/jobs/{job_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub command_object: CommandObject,

    pub command_object_id: String,

    pub command_name: CommandName,

    /// Playbook name for action jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_parameter: Option<String>,

    /// Extra command-line options, for example `--target=module.vpc`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command_options: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<VariableData>,

    /// Environment settings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<VariableData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Region>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion: Option<BastionResourceDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CreateJobRequest {
    pub fn new(
        command_object: CommandObject,
        command_object_id: impl Into<String>,
        command_name: CommandName,
    ) -> Self {
        Self {
            command_object,
            command_object_id: command_object_id.into(),
            command_name,
            command_parameter: None,
            command_options: Vec::new(),
            inputs: Vec::new(),
            settings: Vec::new(),
            tags: Vec::new(),
            location: None,
            bastion: None,
            data: None,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        require("command_object_id", &self.command_object_id)?;
        if self.command_name == CommandName::AnsiblePlaybookRun
            && self.command_object != CommandObject::Action
        {
            return Err(ApiError::InvalidArgument(
                "ansible_playbook_run jobs must target an action".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which jobs `GET /v2/jobs` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobListScope {
    /// Every job.
    All,
    /// Only the latest job per resource.
    Latest,
}

impl JobListScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Latest => "latest",
        }
    }
}

/// Filters for [`SchematicsClient::list_jobs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListJobsOptions {
    /// Restrict to jobs on one kind of resource.
    pub resource: Option<CommandObject>,
    /// Restrict to jobs on one resource.
    pub resource_id: Option<String>,
    pub action_id: Option<String>,
    pub workspace_id: Option<String>,
    pub list: Option<JobListScope>,
    pub paging: ListOptions,
}

/// Options for [`SchematicsClient::delete_job`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteJobOptions {
    /// Stop the job even when it is running.
    pub force: Option<bool>,
    /// Also delete jobs started by this one.
    pub propagate: Option<bool>,
}

/// Log of a job (`GET /v2/jobs/{job_id}/logs`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobLog {
    #[serde(default)]
    pub job_id: Option<String>,

    #[serde(default)]
    pub job_name: Option<String>,

    #[serde(default)]
    pub log_summary: Option<JobLogSummary>,

    /// `text`, `html`, `json` or `markdown`.
    #[serde(default)]
    pub format: Option<String>,

    /// Base64 encoded log content.
    #[serde(default)]
    pub details: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

impl JobLog {
    /// Decoded log content; undecodable content is returned as sent.
    pub fn text(&self) -> String {
        let Some(details) = self.details.as_deref() else {
            return String::new();
        };
        base64::engine::general_purpose::STANDARD
            .decode(details.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| details.to_string())
    }
}

impl SchematicsClient {
    pub async fn list_jobs(&self, options: &ListJobsOptions) -> Result<JobList, ApiError> {
        options.paging.validate(V2_MAX_LIMIT)?;
        let request = ApiRequest::get(&["v2", "jobs"])
            .query_opt("resource", options.resource.map(|r| r.as_str()))
            .query_opt("resource_id", options.resource_id.as_deref())
            .query_opt("action_id", options.action_id.as_deref())
            .query_opt("workspace_id", options.workspace_id.as_deref())
            .query_opt("list", options.list.map(|l| l.as_str()));
        self.send(options.paging.apply(request)).await
    }

    /// Submits a job. The IAM refresh token is attached for the service.
    pub async fn create_job(&self, body: &CreateJobRequest) -> Result<Job, ApiError> {
        body.validate()?;
        let refresh_token = self.refresh_token().await?;
        let request = ApiRequest::post(&["v2", "jobs"])
            .header("refresh_token", refresh_token)
            .json(body)?;
        self.send(request).await
    }

    pub async fn get_job(&self, job_id: &str, profile: Option<Profile>) -> Result<Job, ApiError> {
        let job_id = require("job_id", job_id)?;
        let request = ApiRequest::get(&["v2", "jobs", job_id])
            .query_opt("profile", profile.map(|p| p.as_str()));
        self.send(request).await
    }

    /// Re-runs a job with a new definition.
    pub async fn update_job(&self, job_id: &str, body: &CreateJobRequest) -> Result<Job, ApiError> {
        let job_id = require("job_id", job_id)?;
        body.validate()?;
        let refresh_token = self.refresh_token().await?;
        let request = ApiRequest::put(&["v2", "jobs", job_id])
            .header("refresh_token", refresh_token)
            .json(body)?;
        self.send(request).await
    }

    /// Stops and deletes a job.
    pub async fn delete_job(&self, job_id: &str, options: &DeleteJobOptions) -> Result<(), ApiError> {
        let job_id = require("job_id", job_id)?;
        let refresh_token = self.refresh_token().await?;
        let request = ApiRequest::delete(&["v2", "jobs", job_id])
            .header("refresh_token", refresh_token)
            .query_opt("force", options.force)
            .query_opt("propagate", options.propagate);
        self.send_empty(request).await
    }

    pub async fn get_job_logs(&self, job_id: &str) -> Result<JobLog, ApiError> {
        let job_id = require("job_id", job_id)?;
        self.send(ApiRequest::get(&["v2", "jobs", job_id, "logs"]))
            .await
    }

    /// Polls a job every `interval` until it reaches a terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for a zero `interval`,
    /// [`ApiError::Timeout`] when the job is still running after `timeout`,
    /// and any error from [`SchematicsClient::get_job`].
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Job, ApiError> {
        self.wait_for_job_with(job_id, interval, timeout, |_| {}).await
    }

    /// Like [`SchematicsClient::wait_for_job`], calling `on_poll` with every
    /// job state fetched, including the final one.
    pub async fn wait_for_job_with<F>(
        &self,
        job_id: &str,
        interval: Duration,
        timeout: Duration,
        mut on_poll: F,
    ) -> Result<Job, ApiError>
    where
        F: FnMut(&Job),
    {
        check_poll_interval(interval)?;
        let started = Instant::now();

        loop {
            let job = self.get_job(job_id, None).await?;
            let code = job.status_code();
            debug!(job_id, status = ?code, "polled job");
            on_poll(&job);

            if job.is_terminal() {
                return Ok(job);
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(ApiError::Timeout(format!(
                    "job {} still {} after {}s",
                    job_id,
                    code.map(|c| c.as_str()).unwrap_or("pending"),
                    elapsed.as_secs()
                )));
            }

            tokio::time::sleep(interval.min(timeout - elapsed)).await;
        }
    }
}

/// Rejects a polling interval that would hammer the API in a tight loop.
pub(crate) fn check_poll_interval(interval: Duration) -> Result<(), ApiError> {
    if interval.is_zero() {
        return Err(ApiError::InvalidArgument(
            "polling interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_name_table_matches_serde() {
        for (command, name) in CommandName::ALL {
            assert_eq!(serde_json::to_value(command).unwrap(), serde_json::json!(name));
            assert_eq!(name.parse::<CommandName>().unwrap(), command);
        }
        assert!("workspace_explode".parse::<CommandName>().is_err());
    }

    #[test]
    fn test_status_code_is_found_in_any_block() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "us-east.JOB.demo.1",
            "command_object": "action",
            "command_name": "ansible_playbook_run",
            "status": {
                "action_job_status": {
                    "action_name": "demo",
                    "status_code": "job_failed",
                    "status_message": "playbook failed"
                }
            }
        }))
        .unwrap();

        assert_eq!(job.status_code(), Some(JobStatusCode::JobFailed));
        assert!(job.is_terminal());
        assert_eq!(
            job.status.as_ref().and_then(|s| s.message()),
            Some("playbook failed")
        );
    }

    #[test]
    fn test_unknown_status_code() {
        let status: WorkspaceJobStatus =
            serde_json::from_str(r#"{"status_code":"job_ready"}"#).unwrap();
        assert_eq!(status.status_code, Some(JobStatusCode::Unknown));
        assert!(!JobStatusCode::Unknown.is_terminal());
    }

    #[test]
    fn test_terminal_codes() {
        assert!(JobStatusCode::JobFinished.is_success());
        assert!(JobStatusCode::JobStoppedWithErrors.is_terminal());
        assert!(!JobStatusCode::JobInProgress.is_terminal());
        assert!(!JobStatusCode::JobCancelled.is_success());
    }

    #[test]
    fn test_create_job_validation() {
        let request = CreateJobRequest::new(CommandObject::Workspace, " ", CommandName::WorkspaceApply);
        assert!(matches!(
            request.validate(),
            Err(ApiError::MissingParameter("command_object_id"))
        ));

        let request = CreateJobRequest::new(
            CommandObject::Workspace,
            "us-south.workspace.demo.1",
            CommandName::AnsiblePlaybookRun,
        );
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_job_log_text() {
        let log = JobLog {
            details: Some("aGVsbG8gd29ybGQ=".to_string()),
            ..Default::default()
        };
        assert_eq!(log.text(), "hello world");

        let log = JobLog {
            details: Some("plain text!".to_string()),
            ..Default::default()
        };
        assert_eq!(log.text(), "plain text!");
    }
}
