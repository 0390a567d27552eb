//
//  schematics-cli
//  cli/action.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::api::common::{ExternalSource, ListOptions, Profile, VariableData};
use crate::api::v2::{Action, ActionLite, CommandName, CommandObject, CreateActionRequest, CreateJobRequest};
use crate::output::{
    format_status, or_dash, print_field, print_header, print_optional, write_structured, TableOutput,
    TableRow,
};
use crate::util::{format_relative_time, format_time, parse_key_value, read_document};

use super::{fetch_items, show_count, GlobalOptions, PageArgs};

/// Manage Ansible actions
#[derive(Args, Debug)]
pub struct ActionCommand {
    #[command(subcommand)]
    pub command: ActionSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ActionSubcommand {
    /// List actions
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View action details
    View(ViewArgs),

    /// Create an action
    Create(CreateArgs),

    /// Update an action
    Update(UpdateArgs),

    /// Delete an action
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Run a playbook of an action
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Action ID
    pub id: String,

    /// Include inputs, outputs and settings in full
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON or YAML request document ('-' for stdin)
    #[arg(long, short = 'f', conflicts_with_all = ["name", "repo_url"])]
    pub file: Option<PathBuf>,

    /// Action name
    #[arg(long, short = 'n', required_unless_present = "file")]
    pub name: Option<String>,

    /// Git repository holding the playbooks
    #[arg(long, required_unless_present = "file")]
    pub repo_url: Option<String>,

    #[arg(long)]
    pub branch: Option<String>,

    /// Default playbook to run
    #[arg(long)]
    pub playbook: Option<String>,

    /// Inventory ID to run against
    #[arg(long)]
    pub inventory: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Input variable as NAME=VALUE (repeatable)
    #[arg(long = "input", value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Token for a private repository
    #[arg(long, env = "SCH_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Action ID
    pub id: String,

    /// JSON or YAML document with the fields to change
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long)]
    pub playbook: Option<String>,

    #[arg(long)]
    pub inventory: Option<String>,

    /// Replace the tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    #[arg(long, env = "SCH_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Action ID
    pub id: String,

    /// Delete even while jobs are running
    #[arg(long)]
    pub force: bool,

    /// Also delete the action's jobs
    #[arg(long)]
    pub propagate: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Action ID
    pub id: String,

    /// Playbook to run instead of the action's default
    #[arg(long)]
    pub playbook: Option<String>,

    /// Input variable as NAME=VALUE (repeatable)
    #[arg(long = "input", value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,

    /// Wait for the job to finish
    #[arg(long)]
    pub wait: bool,

    #[command(flatten)]
    pub wait_args: super::job::WaitArgs,
}

fn action_state(state: Option<&crate::api::v2::ActionState>) -> &str {
    state.and_then(|s| s.status_code.as_deref()).unwrap_or("-")
}

impl TableRow for ActionLite {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "PLAYBOOK", "STATE", "UPDATED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            or_dash(self.playbook_name.as_deref()),
            format_status(action_state(self.state.as_ref()), color),
            or_dash(self.updated_at.as_deref().map(format_relative_time).as_deref()),
        ]
    }
}

impl TableOutput for Action {
    fn print_table(&self, color: bool) {
        print_header(&self.name);
        if let Some(description) = &self.description {
            println!("{}", description);
        }
        println!();
        print_field("ID", &self.id, color);
        print_field("State", &format_status(action_state(self.state.as_ref()), color), color);
        print_optional(
            "Message",
            self.state.as_ref().and_then(|s| s.status_message.as_deref()),
            color,
        );
        if let Some(location) = self.location {
            print_field("Location", location.as_str(), color);
        }
        print_optional("Resource group", self.resource_group.as_deref(), color);
        print_optional(
            "Repository",
            self.source
                .as_ref()
                .and_then(|s| s.git.as_ref())
                .and_then(|g| g.git_repo_url.as_deref()),
            color,
        );
        print_optional("Playbook", self.command_parameter.as_deref(), color);
        print_optional("Inventory", self.inventory.as_deref(), color);
        if self.is_locked() {
            let locked = if color {
                style("yes").yellow().to_string()
            } else {
                "yes".to_string()
            };
            print_field("Locked", &locked, color);
        }
        if !self.tags.is_empty() {
            print_field("Tags", &self.tags.join(", "), color);
        }
        print_optional("Updated", self.updated_at.as_deref().map(format_time).as_deref(), color);

        if !self.playbook_names.is_empty() {
            println!();
            println!("{}", style("Playbooks").bold());
            for name in &self.playbook_names {
                println!("  {}", name);
            }
        }
        if !self.inputs.is_empty() {
            println!();
            println!("{}", style("Inputs").bold());
            for var in &self.inputs {
                let value = if var.is_secure() {
                    "********"
                } else {
                    var.value.as_deref().unwrap_or("")
                };
                println!("  {} = {}", var.name, value);
            }
        }
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

impl ActionCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            ActionSubcommand::List(args) => self.list(args, global).await,
            ActionSubcommand::View(args) => self.view(args, global).await,
            ActionSubcommand::Create(args) => self.create(args, global).await,
            ActionSubcommand::Update(args) => self.update(args, global).await,
            ActionSubcommand::Delete(args) => self.delete(args, global).await,
            ActionSubcommand::Run(args) => self.run_playbook(args, global).await,
        }
    }

    async fn list(&self, args: &ListArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?;

        let actions = fetch_items(&args.page, |opts: ListOptions| {
            let client = &client;
            async move { client.list_actions(&opts).await }
        })
        .await?;

        let writer = global.writer(&config);
        writer.write_list(&actions)?;
        show_count(&writer, actions.len(), "action");
        Ok(())
    }

    async fn view(&self, args: &ViewArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let action = client
            .get_action(&args.id, args.detailed.then_some(Profile::Detailed))
            .await?;
        global.writer(&config).write(&action)
    }

    async fn create(&self, args: &CreateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let mut request: CreateActionRequest = match &args.file {
            Some(path) => read_document(path)?,
            None => {
                let mut request = CreateActionRequest::new(args.name.clone().unwrap_or_default());
                request.description = args.description.clone();
                request.resource_group = args.resource_group.clone();
                request.source = args.repo_url.as_ref().map(|url| {
                    let mut source = ExternalSource::git(url.clone());
                    if let Some(git) = source.git.as_mut() {
                        git.git_branch = args.branch.clone();
                    }
                    source
                });
                request.command_parameter = args.playbook.clone();
                request.inventory = args.inventory.clone();
                request.inputs = variables(&args.inputs)?;
                request.tags = args.tags.clone();
                request
            }
        };

        if request.location.is_none() {
            request.location = Some(config.core.region);
        }
        if request.resource_group.is_none() {
            request.resource_group = config.core.resource_group.clone();
        }

        let client = global.client(&config)?;
        let action = client
            .create_action(&request, args.github_token.as_deref())
            .await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&action)?;
        } else {
            writer.write_success(&format!(
                "Created action {} ({})",
                style(&action.name).bold(),
                action.id
            ));
        }
        Ok(())
    }

    async fn update(&self, args: &UpdateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let request = match &args.file {
            Some(path) => read_document(path)?,
            None => CreateActionRequest {
                description: args.description.clone(),
                command_parameter: args.playbook.clone(),
                inventory: args.inventory.clone(),
                tags: args.tags.clone(),
                ..Default::default()
            },
        };
        if request == CreateActionRequest::default() {
            bail!("Nothing to update. Pass --file or at least one field flag");
        }

        let client = global.client(&config)?.for_resource(&args.id);
        let action = client
            .update_action(&args.id, &request, args.github_token.as_deref())
            .await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&action)?;
        } else {
            writer.write_success(&format!("Updated action {}", action.name));
        }
        Ok(())
    }

    async fn delete(&self, args: &DeleteArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        global
            .prompter(&config)
            .confirm_destructive(&format!("Delete action {}?", args.id), args.yes)?;

        let client = global.client(&config)?.for_resource(&args.id);
        client
            .delete_action(
                &args.id,
                args.force.then_some(true),
                args.propagate.then_some(true),
            )
            .await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            write_structured(writer.format(), &serde_json::json!({ "id": args.id, "deleted": true }))?;
        } else {
            writer.write_success(&format!("Deleted action {}", args.id));
        }
        Ok(())
    }

    async fn run_playbook(&self, args: &RunArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);

        let playbook = match &args.playbook {
            Some(playbook) => playbook.clone(),
            None => {
                let action = client.get_action(&args.id, None).await?;
                match action.command_parameter {
                    Some(playbook) => playbook,
                    None => bail!("Action {} has no default playbook. Pass --playbook", args.id),
                }
            }
        };

        let mut request =
            CreateJobRequest::new(CommandObject::Action, args.id.clone(), CommandName::AnsiblePlaybookRun);
        request.command_parameter = Some(playbook.clone());
        request.inputs = variables(&args.inputs)?;

        let job = client.create_job(&request).await?;
        let writer = global.writer(&config);
        if !args.wait {
            if writer.format().is_structured() {
                return writer.write(&job);
            }
            writer.write_success(&format!("Running {} as job {}", playbook, style(&job.id).bold()));
            println!("Follow it with: sch job watch {}", job.id);
            return Ok(());
        }

        writer.write_success(&format!("Running {} as job {}", playbook, job.id));
        let client = client.for_resource(&job.id);
        super::job::wait_and_report(&client, &job.id, &args.wait_args, &writer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_row() {
        let action: ActionLite = serde_json::from_value(serde_json::json!({
            "id": "us-east.ACTION.web.1",
            "name": "web",
            "playbook_name": "site.yml",
            "state": { "status_code": "normal" }
        }))
        .unwrap();

        let row = action.row(false);
        assert_eq!(row[0], "us-east.ACTION.web.1");
        assert_eq!(row[2], "site.yml");
        assert_eq!(row[3], "normal");
        assert_eq!(row[4], "-");
    }

    #[test]
    fn test_missing_state_is_dash() {
        assert_eq!(action_state(None), "-");
    }
}
