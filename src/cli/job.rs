//
//  schematics-cli
//  cli/job.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Job commands
//!
//! `sch job watch` polls a job until it settles and exits with status 64
//! when the job did not finish successfully, so CI pipelines can gate on
//! `sch job create --wait ...`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;
use thiserror::Error;

use crate::api::common::{ListOptions, Profile, VariableData};
use crate::api::v2::{
    CommandName, CommandObject, CreateJobRequest, DeleteJobOptions, Job, JobListScope, JobLite,
    JobLog, JobStatusCode, ListJobsOptions,
};
use crate::api::SchematicsClient;
use crate::interactive::Spinner;
use crate::output::{
    format_status, or_dash, print_field, print_header, print_optional, write_structured, OutputWriter,
    TableOutput, TableRow,
};
use crate::util::{format_duration, format_relative_time, parse_key_value, read_document};

use super::{fetch_items, show_count, GlobalOptions, PageArgs};

/// A watched job settled without finishing successfully.
#[derive(Debug, Error)]
#[error("Job {id} ended with status {status}")]
pub struct JobFailed {
    pub id: String,
    pub status: String,
}

/// Create, inspect and follow jobs
#[derive(Args, Debug)]
pub struct JobCommand {
    #[command(subcommand)]
    pub command: JobSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum JobSubcommand {
    /// List jobs
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View job details
    View(ViewArgs),

    /// Submit a job
    Create(CreateArgs),

    /// Run a job again with a new definition
    Update(UpdateArgs),

    /// Stop and delete a job
    #[command(visible_alias = "stop")]
    Cancel(CancelArgs),

    /// Print the job log
    Logs(IdArgs),

    /// Wait for a job to finish
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only jobs on this kind of resource
    #[arg(long)]
    pub resource: Option<CommandObject>,

    /// Only jobs on this resource
    #[arg(long)]
    pub resource_id: Option<String>,

    /// Only jobs on this workspace
    #[arg(long, short = 'w')]
    pub workspace: Option<String>,

    /// Only jobs on this action
    #[arg(long, short = 'a')]
    pub action: Option<String>,

    /// Only the latest job per resource
    #[arg(long)]
    pub latest: bool,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Job ID
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Job ID
    pub id: String,

    /// Include the full job data
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Seconds between polls
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Give up after this many seconds
    #[arg(long, default_value = "3600")]
    pub timeout: u64,

    /// Print the job log when it settles
    #[arg(long)]
    pub logs: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON or YAML request document ('-' for stdin)
    #[arg(long, short = 'f', conflicts_with_all = ["object", "command"])]
    pub file: Option<PathBuf>,

    /// Kind of object the job runs against
    #[arg(long, required_unless_present = "file")]
    pub object: Option<CommandObject>,

    /// ID of the workspace or action
    #[arg(long = "target", required_unless_present = "file")]
    pub target: Option<String>,

    /// Command to run, for example workspace_apply or ansible_playbook_run
    #[arg(long, required_unless_present = "file")]
    pub command: Option<CommandName>,

    /// Playbook name for action jobs
    #[arg(long)]
    pub parameter: Option<String>,

    /// Extra command option (repeatable)
    #[arg(long = "option")]
    pub options: Vec<String>,

    /// Input variable as NAME=VALUE (repeatable)
    #[arg(long = "input", value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,

    /// Environment setting as NAME=VALUE (repeatable)
    #[arg(long = "setting", value_name = "NAME=VALUE")]
    pub settings: Vec<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Wait for the job to finish
    #[arg(long)]
    pub wait: bool,

    #[command(flatten)]
    pub wait_args: WaitArgs,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Job ID
    pub id: String,

    /// JSON or YAML request document
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct CancelArgs {
    /// Job ID
    pub id: String,

    /// Stop the job even while it is running
    #[arg(long)]
    pub force: bool,

    /// Also delete jobs started by this one
    #[arg(long)]
    pub propagate: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Job ID
    pub id: String,

    #[command(flatten)]
    pub wait: WaitArgs,
}

fn status_text(code: Option<JobStatusCode>) -> &'static str {
    code.map(|c| c.as_str()).unwrap_or("-")
}

impl TableRow for JobLite {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "COMMAND", "TARGET", "STATUS", "SUBMITTED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            self.id.clone(),
            or_dash(self.command_name.map(|c| c.as_str())),
            or_dash(self.command_object_id.as_deref()),
            format_status(status_text(self.status_code()), color),
            or_dash(self.submitted_at.as_deref().map(format_relative_time).as_deref()),
        ]
    }
}

impl TableOutput for Job {
    fn print_table(&self, color: bool) {
        print_header(self.name.as_deref().unwrap_or(&self.id));
        println!();
        print_field("ID", &self.id, color);
        print_field("Status", &format_status(status_text(self.status_code()), color), color);
        print_optional("Message", self.status.as_ref().and_then(|s| s.message()), color);
        print_optional("Command", self.command_name.map(|c| c.as_str()), color);
        print_optional("Object", self.command_object.map(|o| o.as_str()), color);
        print_optional("Target", self.command_object_id.as_deref(), color);
        print_optional("Parameter", self.command_parameter.as_deref(), color);
        if let Some(location) = self.location {
            print_field("Location", location.as_str(), color);
        }
        print_optional("Submitted by", self.submitted_by.as_deref(), color);
        print_optional("Submitted", self.submitted_at.as_deref(), color);
        print_optional("Started", self.start_at.as_deref(), color);
        print_optional("Ended", self.end_at.as_deref(), color);
        print_optional("Duration", self.duration.as_deref(), color);

        if let Some(summary) = &self.log_summary {
            if let Some(elapsed) = summary.elapsed_time {
                print_field("Elapsed", &format_duration(Duration::from_secs_f64(elapsed.max(0.0))), color);
            }
        }
    }
}

impl TableOutput for JobLog {
    fn print_table(&self, _color: bool) {
        print!("{}", self.text());
    }
}

fn variables(pairs: &[String]) -> Result<Vec<VariableData>> {
    pairs
        .iter()
        .map(|pair| {
            let (name, value) = parse_key_value(pair)?;
            Ok(VariableData::new(name, value))
        })
        .collect()
}

impl JobCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            JobSubcommand::List(args) => self.list(args, global).await,
            JobSubcommand::View(args) => self.view(args, global).await,
            JobSubcommand::Create(args) => self.create(args, global).await,
            JobSubcommand::Update(args) => self.update(args, global).await,
            JobSubcommand::Cancel(args) => self.cancel(args, global).await,
            JobSubcommand::Logs(args) => self.logs(args, global).await,
            JobSubcommand::Watch(args) => self.watch(args, global).await,
        }
    }

    async fn list(&self, args: &ListArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?;

        let filters = ListJobsOptions {
            resource: args.resource,
            resource_id: args.resource_id.clone(),
            action_id: args.action.clone(),
            workspace_id: args.workspace.clone(),
            list: args.latest.then_some(JobListScope::Latest),
            paging: ListOptions::default(),
        };

        let jobs = fetch_items(&args.page, |paging: ListOptions| {
            let client = &client;
            let options = ListJobsOptions {
                paging,
                ..filters.clone()
            };
            async move { client.list_jobs(&options).await }
        })
        .await?;

        let writer = global.writer(&config);
        writer.write_list(&jobs)?;
        show_count(&writer, jobs.len(), "job");
        Ok(())
    }

    async fn view(&self, args: &ViewArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let profile = args.detailed.then_some(Profile::Detailed);
        let job = client.get_job(&args.id, profile).await?;
        global.writer(&config).write(&job)
    }

    async fn create(&self, args: &CreateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let request = match (&args.file, args.object, &args.target, args.command) {
            (Some(path), _, _, _) => read_document::<CreateJobRequest>(path)?,
            (None, Some(object), Some(target), Some(command)) => {
                let mut request = CreateJobRequest::new(object, target.clone(), command);
                request.command_parameter = args.parameter.clone();
                request.command_options = args.options.clone();
                request.inputs = variables(&args.inputs)?;
                request.settings = variables(&args.settings)?;
                request.tags = args.tags.clone();
                request
            }
            _ => anyhow::bail!("Pass --file, or --object, --target and --command"),
        };

        let client = global.client(&config)?.for_resource(&request.command_object_id);
        let job = client.create_job(&request).await?;

        let writer = global.writer(&config);
        if !args.wait {
            if writer.format().is_structured() {
                return writer.write(&job);
            }
            writer.write_success(&format!("Submitted job {}", style(&job.id).bold()));
            println!("Follow it with: sch job watch {}", job.id);
            return Ok(());
        }

        writer.write_success(&format!("Submitted job {}", job.id));
        let client = client.for_resource(&job.id);
        wait_and_report(&client, &job.id, &args.wait_args, &writer).await
    }

    async fn update(&self, args: &UpdateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let request: CreateJobRequest = read_document(&args.file)?;
        let client = global.client(&config)?.for_resource(&args.id);
        let job = client.update_job(&args.id, &request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&job)?;
        } else {
            writer.write_success(&format!("Resubmitted job {}", job.id));
        }
        Ok(())
    }

    async fn cancel(&self, args: &CancelArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        global
            .prompter(&config)
            .confirm_destructive(&format!("Stop and delete job {}?", args.id), args.yes)?;

        let client = global.client(&config)?.for_resource(&args.id);
        let options = DeleteJobOptions {
            force: args.force.then_some(true),
            propagate: args.propagate.then_some(true),
        };
        client.delete_job(&args.id, &options).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            write_structured(writer.format(), &serde_json::json!({ "id": args.id, "deleted": true }))?;
        } else {
            writer.write_success(&format!("Cancelled job {}", args.id));
        }
        Ok(())
    }

    async fn logs(&self, args: &IdArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let log = client.get_job_logs(&args.id).await?;
        global.writer(&config).write(&log)
    }

    async fn watch(&self, args: &WatchArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let writer = global.writer(&config);
        wait_and_report(&client, &args.id, &args.wait, &writer).await
    }
}

#[derive(Debug, Serialize)]
struct WatchResult<'a> {
    id: &'a str,
    status: &'a str,
    message: Option<&'a str>,
    success: bool,
}

/// Polls a job to completion, reports the outcome and turns an
/// unsuccessful job into [`JobFailed`].
pub(super) async fn wait_and_report(
    client: &SchematicsClient,
    job_id: &str,
    wait: &WaitArgs,
    writer: &OutputWriter,
) -> Result<()> {
    let spinner = Spinner::new(format!("Waiting for job {}", job_id), !writer.format().is_structured());
    let job = client
        .wait_for_job_with(
            job_id,
            Duration::from_secs(wait.interval),
            Duration::from_secs(wait.timeout),
            |job| spinner.set_message(format!("{} {}", job_id, status_text(job.status_code()))),
        )
        .await;
    spinner.clear();
    let job = job?;

    let code = job.status_code();
    let status = status_text(code);
    let success = code.map(|c| c.is_success()).unwrap_or(false);
    let message = job.status.as_ref().and_then(|s| s.message());

    if wait.logs {
        let log = client.get_job_logs(job_id).await?;
        if writer.format().is_structured() {
            eprint!("{}", log.text());
        } else {
            print!("{}", log.text());
            println!();
        }
    }

    if writer.format().is_structured() {
        write_structured(
            writer.format(),
            &WatchResult {
                id: job_id,
                status,
                message,
                success,
            },
        )?;
    } else if success {
        writer.write_success(&format!("Job {} finished", job_id));
    } else {
        writer.write_error(&format!(
            "Job {} ended with status {}",
            job_id,
            format_status(status, writer.color_enabled())
        ));
        if let Some(message) = message {
            eprintln!("  {}", message);
        }
    }

    if success {
        Ok(())
    } else {
        Err(JobFailed {
            id: job_id.to_string(),
            status: status.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_row() {
        let job: JobLite = serde_json::from_value(serde_json::json!({
            "id": "us-south.JOB.demo.1",
            "command_name": "workspace_plan",
            "command_object_id": "us-south.workspace.demo.2",
            "status": { "workspace_job_status": { "status_code": "job_in_progress" } }
        }))
        .unwrap();

        let row = job.row(false);
        assert_eq!(row[1], "workspace_plan");
        assert_eq!(row[2], "us-south.workspace.demo.2");
        assert_eq!(row[3], "job_in_progress");
        assert_eq!(row[4], "-");
    }

    #[test]
    fn test_variables() {
        let vars = variables(&["count=2".to_string()]).unwrap();
        assert_eq!(vars[0].name, "count");
        assert_eq!(vars[0].value.as_deref(), Some("2"));
    }

    #[test]
    fn test_job_failed_message() {
        let err = JobFailed {
            id: "job-1".to_string(),
            status: "job_failed".to_string(),
        };
        assert_eq!(err.to_string(), "Job job-1 ended with status job_failed");
    }
}
