//
//  schematics-cli
//  cli/agent.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Agent commands
//!
//! Registering an agent (`sch agent create`) does not install anything.
//! Run `sch agent deploy` afterwards, then `sch agent job <id> deploy` to
//! follow it. `sch agent delete --destroy-resources` tears the install down
//! before removing the registration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::api::common::{ListOptions, Profile};
use crate::api::v2::{Agent, AgentInfrastructure, AgentJob, AgentJobKind, AgentRequest};
use crate::interactive::Spinner;
use crate::output::{
    format_bool, format_status, or_dash, print_field, print_header, print_optional, write_structured,
    TableOutput, TableRow,
};
use crate::util::{format_relative_time, format_time, read_document};

use super::{fetch_items, show_count, GlobalOptions, PageArgs};

/// Manage Schematics agents
#[derive(Args, Debug)]
pub struct AgentCommand {
    #[command(subcommand)]
    pub command: AgentSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AgentSubcommand {
    /// List agents
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View agent details
    View(ViewArgs),

    /// Register an agent
    Create(CreateArgs),

    /// Update an agent from a request document
    Update(UpdateArgs),

    /// Delete an agent registration
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Install or upgrade the agent in its cluster
    Deploy(RunJobArgs),

    /// Check the agent's connectivity and permissions
    Health(RunJobArgs),

    /// Scan the target cluster for pre-requisites
    Prs(RunJobArgs),

    /// Show the latest deploy, health or prs job
    Job(JobArgs),

    /// Remove what a deploy installed in the cluster
    DeleteResources(ConfirmArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Agent ID
    pub id: String,

    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON or YAML request document ('-' for stdin)
    #[arg(long, short = 'f', conflicts_with_all = ["name", "cluster_id"])]
    pub file: Option<PathBuf>,

    /// Agent name
    #[arg(long, short = 'n', required_unless_present = "file")]
    pub name: Option<String>,

    /// Agent version to install
    #[arg(long = "agent-version", default_value = "1.0.0")]
    pub agent_version: String,

    /// IBM Cloud region of the cluster
    #[arg(long, required_unless_present = "file")]
    pub agent_location: Option<String>,

    /// ibm_kubernetes, ibm_openshift or ibm_satellite
    #[arg(long, default_value = "ibm_kubernetes")]
    pub infra_type: String,

    #[arg(long, required_unless_present = "file")]
    pub cluster_id: Option<String>,

    #[arg(long)]
    pub cluster_resource_group: Option<String>,

    #[arg(long)]
    pub cos_instance: Option<String>,

    #[arg(long)]
    pub cos_bucket: Option<String>,

    #[arg(long)]
    pub cos_bucket_region: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Agent ID
    pub id: String,

    /// JSON or YAML request document
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Agent ID
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Agent ID
    pub id: String,

    /// Remove what a deploy installed and wait for it before deleting
    #[arg(long)]
    pub destroy_resources: bool,

    /// Delete the registration even if deployed resources remain
    #[arg(long)]
    pub force: bool,

    /// Seconds between destroy job polls
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Give up waiting for the destroy job after this many seconds
    #[arg(long, default_value = "1800")]
    pub timeout: u64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct RunJobArgs {
    /// Agent ID
    pub id: String,

    /// Run even when the last job succeeded
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct JobArgs {
    /// Agent ID
    pub id: String,

    /// deploy, health or prs
    pub kind: AgentJobKind,
}

fn agent_status(agent: &Agent) -> &str {
    agent
        .system_state
        .as_ref()
        .and_then(|s| s.status_code.as_deref())
        .unwrap_or("-")
}

impl TableRow for Agent {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "LOCATION", "VERSION", "STATUS", "UPDATED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            or_dash(self.agent_location.as_deref()),
            or_dash(self.version.as_deref()),
            format_status(agent_status(self), color),
            or_dash(self.updated_at.as_deref().map(format_relative_time).as_deref()),
        ]
    }
}

impl TableOutput for Agent {
    fn print_table(&self, color: bool) {
        print_header(&self.name);
        if let Some(description) = &self.description {
            println!("{}", description);
        }
        println!();
        print_field("ID", &self.id, color);
        print_field("Status", &format_status(agent_status(self), color), color);
        print_optional("Version", self.version.as_deref(), color);
        if let Some(location) = self.schematics_location {
            print_field("Schematics", location.as_str(), color);
        }
        print_optional("Location", self.agent_location.as_deref(), color);
        print_optional("Resource group", self.resource_group.as_deref(), color);
        if let Some(infra) = &self.agent_infrastructure {
            print_optional("Infrastructure", infra.infra_type.as_deref(), color);
            print_optional("Cluster", infra.cluster_id.as_deref(), color);
            print_optional("COS bucket", infra.cos_bucket_name.as_deref(), color);
        }
        if let Some(kpi) = &self.agent_kpi {
            print_optional("Availability", kpi.availability_indicator.as_deref(), color);
        }
        if !self.tags.is_empty() {
            print_field("Tags", &self.tags.join(", "), color);
        }

        let jobs: Vec<_> = [AgentJobKind::Deploy, AgentJobKind::Health, AgentJobKind::Prs]
            .into_iter()
            .filter_map(|kind| self.recent_job(kind).map(|job| (kind, job)))
            .collect();
        if !jobs.is_empty() {
            println!();
            println!("{}", style("Recent jobs").bold());
            for (kind, job) in jobs {
                println!(
                    "  {:<7} {}  {}",
                    kind.as_str(),
                    format_status(job.status_code.as_deref().unwrap_or("-"), color),
                    job.updated_at.as_deref().map(format_relative_time).unwrap_or_default()
                );
            }
        }
    }
}

impl TableOutput for AgentJob {
    fn print_table(&self, color: bool) {
        print_optional("Job", self.job_id.as_deref(), color);
        print_field(
            "Status",
            &format_status(self.status_code.as_deref().unwrap_or("-"), color),
            color,
        );
        print_optional("Message", self.status_message.as_deref(), color);
        print_optional("Agent version", self.agent_version.as_deref(), color);
        if let Some(redeployed) = self.is_redeployed {
            print_field("Redeployed", &format_bool(redeployed, color), color);
        }
        print_optional("Updated", self.updated_at.as_deref().map(format_time).as_deref(), color);
        print_optional("Log", self.log_url.as_deref(), color);
    }
}

impl AgentCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            AgentSubcommand::List(args) => self.list(args, global).await,
            AgentSubcommand::View(args) => self.view(args, global).await,
            AgentSubcommand::Create(args) => self.create(args, global).await,
            AgentSubcommand::Update(args) => self.update(args, global).await,
            AgentSubcommand::Delete(args) => self.delete(args, global).await,
            AgentSubcommand::Deploy(args) => self.run_job(AgentJobKind::Deploy, args, global).await,
            AgentSubcommand::Health(args) => self.run_job(AgentJobKind::Health, args, global).await,
            AgentSubcommand::Prs(args) => self.run_job(AgentJobKind::Prs, args, global).await,
            AgentSubcommand::Job(args) => self.job(args, global).await,
            AgentSubcommand::DeleteResources(args) => self.delete_resources(args, global).await,
        }
    }

    async fn list(&self, args: &ListArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?;

        let agents = fetch_items(&args.page, |opts: ListOptions| {
            let client = &client;
            async move { client.list_agents(&opts).await }
        })
        .await?;

        let writer = global.writer(&config);
        writer.write_list(&agents)?;
        show_count(&writer, agents.len(), "agent");
        Ok(())
    }

    async fn view(&self, args: &ViewArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let agent = client
            .get_agent(&args.id, args.detailed.then_some(Profile::Detailed))
            .await?;
        global.writer(&config).write(&agent)
    }

    async fn create(&self, args: &CreateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let mut request: AgentRequest = match &args.file {
            Some(path) => read_document(path)?,
            None => AgentRequest {
                name: args.name.clone(),
                description: args.description.clone(),
                resource_group: args.resource_group.clone(),
                tags: args.tags.clone(),
                version: Some(args.agent_version.clone()),
                agent_location: args.agent_location.clone(),
                agent_infrastructure: Some(AgentInfrastructure {
                    infra_type: Some(args.infra_type.clone()),
                    cluster_id: args.cluster_id.clone(),
                    cluster_resource_group: args.cluster_resource_group.clone(),
                    cos_instance_name: args.cos_instance.clone(),
                    cos_bucket_name: args.cos_bucket.clone(),
                    cos_bucket_region: args.cos_bucket_region.clone(),
                }),
                ..Default::default()
            },
        };

        if request.schematics_location.is_none() {
            request.schematics_location = Some(config.core.region);
        }
        if request.resource_group.is_none() {
            request.resource_group = config.core.resource_group.clone();
        }

        let client = global.client(&config)?;
        let agent = client.create_agent(&request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&agent)?;
        } else {
            writer.write_success(&format!(
                "Registered agent {} ({})",
                style(&agent.name).bold(),
                agent.id
            ));
            println!("Install it with: sch agent deploy {}", agent.id);
        }
        Ok(())
    }

    async fn update(&self, args: &UpdateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let request: AgentRequest = read_document(&args.file)?;
        if request == AgentRequest::default() {
            bail!("Nothing to update in {}", args.file.display());
        }

        let client = global.client(&config)?.for_resource(&args.id);
        let agent = client.update_agent(&args.id, &request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&agent)?;
        } else {
            writer.write_success(&format!("Updated agent {}", agent.name));
        }
        Ok(())
    }

    async fn delete(&self, args: &DeleteArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let question = if args.destroy_resources {
            format!("Remove agent {} resources and delete the agent?", args.id)
        } else {
            format!("Delete agent {}?", args.id)
        };
        global
            .prompter(&config)
            .confirm_destructive(&question, args.yes)?;

        let client = global.client(&config)?.for_resource(&args.id);
        let writer = global.writer(&config);

        if args.destroy_resources {
            client.delete_agent_resources(&args.id).await?;

            let spinner = Spinner::new(
                format!("Removing agent {} resources", args.id),
                !writer.format().is_structured(),
            );
            let agent = client
                .wait_for_agent_destroy_with(
                    &args.id,
                    Duration::from_secs(args.interval),
                    Duration::from_secs(args.timeout),
                    |job| {
                        let status = job.and_then(|j| j.status_code.as_deref());
                        spinner.set_message(format!("{} {}", args.id, status.unwrap_or("job_pending")));
                    },
                )
                .await;
            spinner.clear();
            let agent = agent?;

            let destroy = agent.recent_destroy_job.as_ref();
            if !destroy.and_then(|j| j.code()).is_some_and(|c| c.is_success()) {
                let status = destroy.and_then(|j| j.status_code.as_deref()).unwrap_or("-");
                tracing::warn!(agent = %args.id, status, "destroy job did not finish cleanly");
                writer.write_warning(&format!(
                    "Destroy job ended with status {}{}",
                    status,
                    destroy
                        .and_then(|j| j.log_url.as_deref())
                        .map(|url| format!(" (log: {})", url))
                        .unwrap_or_default()
                ));
            }
        }

        client
            .delete_agent(&args.id, args.force || args.destroy_resources)
            .await?;

        if writer.format().is_structured() {
            write_structured(writer.format(), &serde_json::json!({ "id": args.id, "deleted": true }))?;
        } else {
            writer.write_success(&format!("Deleted agent {}", args.id));
        }
        Ok(())
    }

    async fn run_job(&self, kind: AgentJobKind, args: &RunJobArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let job = client.run_agent_job(&args.id, kind, args.force).await?;
        tracing::debug!(agent = %args.id, kind = %kind, job = ?job.job_id, "started agent job");

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            return writer.write(&job);
        }
        writer.write_success(&format!(
            "Started {} job {} on agent {}",
            kind,
            job.job_id.as_deref().unwrap_or("-"),
            args.id
        ));
        println!("Check it with: sch agent job {} {}", args.id, kind);
        Ok(())
    }

    async fn job(&self, args: &JobArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let job = client.get_agent_job(&args.id, args.kind).await?;
        global.writer(&config).write(&job)
    }

    async fn delete_resources(&self, args: &ConfirmArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        global.prompter(&config).confirm_destructive(
            &format!("Remove everything agent {} installed in its cluster?", args.id),
            args.yes,
        )?;

        let client = global.client(&config)?.for_resource(&args.id);
        client.delete_agent_resources(&args.id).await?;
        global
            .writer(&config)
            .write_success(&format!("Requested removal of agent {} resources", args.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: AgentSubcommand,
    }

    #[test]
    fn test_job_kind_argument() {
        let cli = TestCli::try_parse_from(["test", "job", "agent-1", "health"]).unwrap();
        match cli.command {
            AgentSubcommand::Job(args) => assert_eq!(args.kind, AgentJobKind::Health),
            _ => panic!("expected job"),
        }
        assert!(TestCli::try_parse_from(["test", "job", "agent-1", "upgrade"]).is_err());
    }

    #[test]
    fn test_agent_row() {
        let agent: Agent = serde_json::from_value(serde_json::json!({
            "id": "us-south.AGENT.edge.1",
            "name": "edge",
            "agent_location": "jp-tok",
            "system_state": { "status_code": "draft" }
        }))
        .unwrap();

        let row = agent.row(false);
        assert_eq!(row[2], "jp-tok");
        assert_eq!(row[3], "-");
        assert_eq!(row[4], "draft");
    }

    #[test]
    fn test_delete_teardown_flags() {
        let cli = TestCli::try_parse_from([
            "test",
            "delete",
            "agent-1",
            "--destroy-resources",
            "--interval",
            "2",
            "-y",
        ])
        .unwrap();
        match cli.command {
            AgentSubcommand::Delete(args) => {
                assert!(args.destroy_resources);
                assert!(!args.force);
                assert_eq!(args.interval, 2);
                assert_eq!(args.timeout, 1800);
                assert!(args.yes);
            }
            _ => panic!("expected delete"),
        }
        assert!(TestCli::try_parse_from(["test", "delete", "agent-1", "--interval", "0"]).is_err());
    }
}
