//
//  schematics-cli
//  cli/workspace.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Workspace commands
//!
//! Workspaces hold a Terraform template, its inputs and its state. Plan,
//! apply, destroy and refresh start an activity and return its ID; follow
//! the matching job with `sch job watch`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use crate::api::common::{ListOptions, DEFAULT_PAGE_SIZE};
use crate::api::v1::{
    ActivityId, CreateWorkspaceRequest, DeleteWorkspaceOptions, OutputValues, ReplaceInputsRequest,
    TemplateRepoRequest, TemplateSourceDataRequest, TemplateValues, UpdateWorkspaceRequest,
    Workspace, WorkspaceActivity, WorkspaceVariableRequest,
};
use crate::api::SchematicsClient;
use crate::output::{
    format_bool, format_status, or_dash, print_field, print_header, print_optional, write_structured,
    TableBuilder, TableOutput, TableRow,
};
use crate::util::{format_relative_time, format_time, open_browser, parse_key_value, read_document, truncate};

use super::{fetch_items, show_count, GlobalOptions, PageArgs};

const CONSOLE_URL: &str = "https://cloud.ibm.com/schematics/workspaces";

/// Manage Terraform workspaces
#[derive(Args, Debug)]
pub struct WorkspaceCommand {
    #[command(subcommand)]
    pub command: WorkspaceSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceSubcommand {
    /// List workspaces
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View workspace details
    View(ViewArgs),

    /// Create a workspace
    Create(CreateArgs),

    /// Update a workspace
    Update(UpdateArgs),

    /// Delete a workspace
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Run terraform plan
    Plan(RunArgs),

    /// Run terraform apply
    Apply(RunArgs),

    /// Run terraform destroy
    Destroy(RunArgs),

    /// Run terraform refresh
    Refresh(RunArgs),

    /// Show or replace template input variables
    Inputs(InputsArgs),

    /// Show Terraform outputs
    Outputs(IdArgs),

    /// List activities, or show one
    Activities(ActivitiesArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Workspace ID
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Workspace ID
    pub id: String,

    /// Open in the IBM Cloud console
    #[arg(long, short = 'w')]
    pub web: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON or YAML request document ('-' for stdin)
    #[arg(long, short = 'f', conflicts_with_all = ["name", "repo_url"])]
    pub file: Option<PathBuf>,

    /// Workspace name
    #[arg(long, short = 'n', required_unless_present = "file")]
    pub name: Option<String>,

    /// Git URL of the template repository
    #[arg(long, requires = "name")]
    pub repo_url: Option<String>,

    /// Branch of the template repository
    #[arg(long)]
    pub branch: Option<String>,

    /// Folder of the template inside the repository
    #[arg(long)]
    pub folder: Option<String>,

    /// Terraform version, for example terraform_v1.5
    #[arg(long = "type", short = 't')]
    pub template_type: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Resource group ID; defaults to the configured resource group
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Input variable as NAME=VALUE (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Token for private GitHub repositories
    #[arg(long, env = "SCH_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Workspace ID
    pub id: String,

    /// JSON or YAML request document
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Replace the definition (PUT) instead of merging it (PATCH)
    #[arg(long)]
    pub replace: bool,

    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Replaces all tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Freeze the workspace against changes
    #[arg(long, conflicts_with = "unfreeze")]
    pub freeze: bool,

    #[arg(long)]
    pub unfreeze: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Workspace ID
    pub id: String,

    /// Also destroy the resources the workspace created
    #[arg(long)]
    pub destroy_resources: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workspace ID
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct InputsArgs {
    /// Workspace ID
    pub id: String,

    /// Template ID; defaults to the workspace's first template
    #[arg(long)]
    pub template: Option<String>,

    /// Replace the input values with NAME=VALUE pairs (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Replace the input values from a JSON or YAML document
    #[arg(long, short = 'f', conflicts_with = "set")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ActivitiesArgs {
    /// Workspace ID
    pub id: String,

    /// Show a single activity
    #[arg(long)]
    pub activity: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

impl TableRow for Workspace {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "STATUS", "LOCATION", "UPDATED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        let updated = self
            .updated_at
            .as_deref()
            .or(self.created_at.as_deref())
            .map(format_relative_time);
        vec![
            self.id.clone(),
            or_dash(self.name.as_deref()),
            format_status(self.status.as_deref().unwrap_or("-"), color),
            or_dash(self.location.as_deref()),
            or_dash(updated.as_deref()),
        ]
    }
}

impl TableOutput for Workspace {
    fn print_table(&self, color: bool) {
        print_header(self.name.as_deref().unwrap_or(&self.id));
        println!();
        print_field("ID", &self.id, color);
        print_field("Status", &format_status(self.status.as_deref().unwrap_or("-"), color), color);
        print_optional("Description", self.description.as_deref(), color);
        print_optional("Location", self.location.as_deref(), color);
        print_optional("Resource group", self.resource_group.as_deref(), color);
        if !self.template_type.is_empty() {
            print_field("Type", &self.template_type.join(", "), color);
        }
        if let Some(repo) = &self.template_repo {
            print_optional("Repository", repo.url.as_deref().or(repo.repo_url.as_deref()), color);
            print_optional("Branch", repo.branch.as_deref(), color);
        }
        print_field("Locked", &format_bool(self.is_locked(), color), color);
        print_field("Frozen", &format_bool(self.is_frozen(), color), color);
        if !self.tags.is_empty() {
            print_field("Tags", &self.tags.join(", "), color);
        }
        print_optional("Created", self.created_at.as_deref().map(format_time).as_deref(), color);
        print_optional("Updated", self.updated_at.as_deref().map(format_time).as_deref(), color);

        if let Some(msg) = self.workspace_status_msg.as_ref().and_then(|m| m.status_msg.as_deref()) {
            if !msg.is_empty() {
                println!();
                println!("{}", msg);
            }
        }

        println!();
        println!("Console: {}/{}", CONSOLE_URL, self.id);
    }
}

impl TableRow for WorkspaceActivity {
    fn headers() -> Vec<&'static str> {
        vec!["ACTIVITY", "NAME", "STATUS", "PERFORMED BY", "PERFORMED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            or_dash(self.action_id.as_deref()),
            or_dash(self.name.as_deref()),
            format_status(self.status.as_deref().unwrap_or("-"), color),
            or_dash(self.performed_by.as_deref()),
            or_dash(self.performed_at.as_deref().map(format_relative_time).as_deref()),
        ]
    }
}

impl TableOutput for WorkspaceActivity {
    fn print_table(&self, color: bool) {
        print_header(self.name.as_deref().unwrap_or("Activity"));
        println!();
        print_optional("ID", self.action_id.as_deref(), color);
        print_field("Status", &format_status(self.status.as_deref().unwrap_or("-"), color), color);
        print_optional("Performed by", self.performed_by.as_deref(), color);
        print_optional("Performed at", self.performed_at.as_deref(), color);
        for line in &self.message {
            println!("  {}", line);
        }
    }
}

impl TableOutput for ActivityId {
    fn print_table(&self, color: bool) {
        print_field("Activity", &self.activityid, color);
    }
}

impl TableOutput for TemplateValues {
    fn print_table(&self, color: bool) {
        if self.variablestore.is_empty() {
            println!("No input variables");
            return;
        }
        TableBuilder::new()
            .color(color)
            .headers(["NAME", "VALUE", "TYPE", "SECURE"])
            .rows(self.variablestore.iter().map(|v| {
                let secure = v.secure.unwrap_or(false);
                let value = if secure {
                    "********".to_string()
                } else {
                    truncate(v.value.as_deref().unwrap_or(""), 60)
                };
                vec![
                    or_dash(v.name.as_deref()),
                    value,
                    or_dash(v.variable_type.as_deref()),
                    format_bool(secure, color),
                ]
            }))
            .print();
    }
}

#[derive(Debug, Serialize)]
struct OutputRow {
    template: String,
    name: String,
    value: serde_json::Value,
}

impl TableRow for OutputRow {
    fn headers() -> Vec<&'static str> {
        vec!["TEMPLATE", "NAME", "VALUE"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        let value = match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        vec![self.template.clone(), self.name.clone(), truncate(&value, 80)]
    }
}

fn output_rows(outputs: &[OutputValues]) -> Vec<OutputRow> {
    outputs
        .iter()
        .flat_map(|o| {
            let template = o.id.clone().unwrap_or_else(|| "-".to_string());
            o.flatten().into_iter().map(move |(name, value)| OutputRow {
                template: template.clone(),
                name,
                value,
            })
        })
        .collect()
}

fn variables(pairs: &[String]) -> Result<Vec<WorkspaceVariableRequest>> {
    pairs
        .iter()
        .map(|pair| {
            let (name, value) = parse_key_value(pair)?;
            Ok(WorkspaceVariableRequest::new(name, value))
        })
        .collect()
}

impl WorkspaceCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            WorkspaceSubcommand::List(args) => self.list(args, global).await,
            WorkspaceSubcommand::View(args) => self.view(args, global).await,
            WorkspaceSubcommand::Create(args) => self.create(args, global).await,
            WorkspaceSubcommand::Update(args) => self.update(args, global).await,
            WorkspaceSubcommand::Delete(args) => self.delete(args, global).await,
            WorkspaceSubcommand::Plan(args) => self.start(Activity::Plan, args, global).await,
            WorkspaceSubcommand::Apply(args) => self.start(Activity::Apply, args, global).await,
            WorkspaceSubcommand::Destroy(args) => self.start(Activity::Destroy, args, global).await,
            WorkspaceSubcommand::Refresh(args) => self.start(Activity::Refresh, args, global).await,
            WorkspaceSubcommand::Inputs(args) => self.inputs(args, global).await,
            WorkspaceSubcommand::Outputs(args) => self.outputs(args, global).await,
            WorkspaceSubcommand::Activities(args) => self.activities(args, global).await,
        }
    }

    async fn list(&self, args: &ListArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?;

        let workspaces = fetch_items(&args.page, |opts: ListOptions| {
            let client = &client;
            async move { client.list_workspaces(&opts).await }
        })
        .await?;

        let writer = global.writer(&config);
        writer.write_list(&workspaces)?;
        show_count(&writer, workspaces.len(), "workspace");
        Ok(())
    }

    async fn view(&self, args: &ViewArgs, global: &GlobalOptions) -> Result<()> {
        if args.web {
            let url = format!("{}/{}", CONSOLE_URL, args.id);
            println!("Opening {} in browser...", url);
            return open_browser(&url);
        }

        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let workspace = client.get_workspace(&args.id).await?;
        global.writer(&config).write(&workspace)
    }

    async fn create(&self, args: &CreateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let mut request: CreateWorkspaceRequest = match &args.file {
            Some(path) => read_document(path)?,
            None => {
                let template_type = args.template_type.clone();
                let mut template = TemplateSourceDataRequest {
                    folder: args.folder.clone(),
                    template_type: template_type.clone(),
                    ..Default::default()
                };
                template.variablestore = variables(&args.vars)?;

                CreateWorkspaceRequest {
                    name: args.name.clone().unwrap_or_default(),
                    description: args.description.clone(),
                    resource_group: args.resource_group.clone(),
                    location: Some(config.core.region.to_string()),
                    tags: args.tags.clone(),
                    template_type: template_type.into_iter().collect(),
                    template_data: vec![template],
                    template_repo: args.repo_url.as_ref().map(|url| TemplateRepoRequest {
                        url: Some(url.clone()),
                        branch: args.branch.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
            }
        };

        if request.resource_group.is_none() {
            request.resource_group = config.core.resource_group.clone();
        }

        let client = global.client(&config)?;
        let workspace = client
            .create_workspace(&request, args.github_token.as_deref())
            .await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&workspace)?;
        } else {
            writer.write_success(&format!("Created workspace {}", style(&workspace.id).bold()));
        }
        Ok(())
    }

    async fn update(&self, args: &UpdateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let mut request: UpdateWorkspaceRequest = match &args.file {
            Some(path) => read_document(path)?,
            None => UpdateWorkspaceRequest::default(),
        };
        if let Some(name) = &args.name {
            request.name = Some(name.clone());
        }
        if let Some(description) = &args.description {
            request.description = Some(description.clone());
        }
        if !args.tags.is_empty() {
            request.tags = Some(args.tags.clone());
        }
        if args.freeze || args.unfreeze {
            let status = request.workspace_status.get_or_insert_with(Default::default);
            status.frozen = Some(args.freeze);
        }
        if request == UpdateWorkspaceRequest::default() {
            bail!("Nothing to update. Pass --file or at least one field flag");
        }

        let client = global.client(&config)?.for_resource(&args.id);
        let workspace = if args.replace {
            client.replace_workspace(&args.id, &request).await?
        } else {
            client.update_workspace(&args.id, &request).await?
        };

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&workspace)?;
        } else {
            writer.write_success(&format!("Updated workspace {}", workspace.id));
        }
        Ok(())
    }

    async fn delete(&self, args: &DeleteArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let question = if args.destroy_resources {
            format!("Delete workspace {} and destroy its resources?", args.id)
        } else {
            format!("Delete workspace {}?", args.id)
        };
        global.prompter(&config).confirm_destructive(&question, args.yes)?;

        let client = global.client(&config)?.for_resource(&args.id);
        let options = DeleteWorkspaceOptions {
            destroy_resources: args.destroy_resources.then_some(true),
        };
        let message = client.delete_workspace(&args.id, &options).await?;
        tracing::debug!(response = %message, "workspace deleted");

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            write_structured(
                writer.format(),
                &serde_json::json!({ "id": args.id, "deleted": true, "message": message.trim() }),
            )?;
        } else {
            writer.write_success(&format!("Deleted workspace {}", args.id));
        }
        Ok(())
    }

    async fn start(&self, activity: Activity, args: &RunArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        if activity.is_destructive() {
            global.prompter(&config).confirm_destructive(
                &format!("Run terraform {} on workspace {}?", activity.name(), args.id),
                args.yes,
            )?;
        }

        let client = global.client(&config)?.for_resource(&args.id);
        let started = activity.start(&client, &args.id).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&started)?;
        } else {
            writer.write_success(&format!(
                "Started {} on {} (activity {})",
                activity.name(),
                args.id,
                started.activityid
            ));
            println!("Follow it with: sch job watch {}", started.activityid);
        }
        Ok(())
    }

    async fn inputs(&self, args: &InputsArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);

        let template_id = match &args.template {
            Some(t) => t.clone(),
            None => {
                let workspace = client.get_workspace(&args.id).await?;
                match workspace.template_id() {
                    Some(t) => t.to_string(),
                    None => bail!("Workspace {} has no template; pass --template", args.id),
                }
            }
        };

        let writer = global.writer(&config);
        let replacement = match &args.file {
            Some(path) => Some(read_document::<ReplaceInputsRequest>(path)?),
            None if !args.set.is_empty() => Some(ReplaceInputsRequest {
                variablestore: variables(&args.set)?,
                ..Default::default()
            }),
            None => None,
        };

        let values = match replacement {
            Some(request) => {
                let values = client
                    .replace_workspace_inputs(&args.id, &template_id, &request)
                    .await?;
                if !writer.format().is_structured() {
                    writer.write_success(&format!("Replaced inputs of template {}", template_id));
                    println!();
                }
                values
            }
            None => client.get_workspace_inputs(&args.id, &template_id).await?,
        };
        writer.write(&values)
    }

    async fn outputs(&self, args: &IdArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let outputs = client.get_workspace_outputs(&args.id).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            return write_structured(writer.format(), &outputs);
        }
        writer.write_list(&output_rows(&outputs))
    }

    async fn activities(&self, args: &ActivitiesArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let writer = global.writer(&config);

        if let Some(activity_id) = &args.activity {
            let activity = client.get_workspace_activity(&args.id, activity_id).await?;
            return writer.write(&activity);
        }

        // The activities endpoint reports no total, so --all pages on length.
        let mut options = args.page.list_options();
        let mut activities = Vec::new();
        loop {
            let page = client.list_workspace_activities(&args.id, &options).await?;
            let len = page.actions.len();
            activities.extend(page.actions);
            let limit = options.limit.unwrap_or(DEFAULT_PAGE_SIZE);
            if !args.page.all || len == 0 || (len as u32) < limit {
                break;
            }
            options.offset = Some(options.offset.unwrap_or(0) + len as u32);
            options.limit = Some(limit);
        }

        writer.write_list(&activities)?;
        show_count(&writer, activities.len(), "activity");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    Plan,
    Apply,
    Destroy,
    Refresh,
}

impl Activity {
    fn name(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
            Self::Refresh => "refresh",
        }
    }

    fn is_destructive(&self) -> bool {
        matches!(self, Self::Apply | Self::Destroy)
    }

    async fn start(&self, client: &SchematicsClient, id: &str) -> Result<ActivityId> {
        let started = match self {
            Self::Plan => client.plan_workspace(id).await?,
            Self::Apply => client.apply_workspace(id).await?,
            Self::Destroy => client.destroy_workspace(id).await?,
            Self::Refresh => client.refresh_workspace(id).await?,
        };
        Ok(started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_rows_flatten_templates() {
        let outputs: Vec<OutputValues> = serde_json::from_value(serde_json::json!([
            {
                "id": "tmpl-1",
                "output_values": [
                    { "vpc_id": { "value": "r006-abc", "type": "string" } },
                    { "zones": { "value": ["us-south-1", "us-south-2"], "type": "list" } }
                ]
            }
        ]))
        .unwrap();

        let rows = output_rows(&outputs);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].template, "tmpl-1");
        assert_eq!(rows[0].row(false)[2], "r006-abc");
        assert_eq!(rows[1].row(false)[2], r#"["us-south-1","us-south-2"]"#);
    }

    #[test]
    fn test_variables_from_pairs() {
        let vars = variables(&["region=us-south".to_string(), "count=3".to_string()]).unwrap();
        assert_eq!(vars[0].name, "region");
        assert_eq!(vars[1].value.as_deref(), Some("3"));
        assert!(variables(&["broken".to_string()]).is_err());
    }

    #[test]
    fn test_destructive_activities() {
        assert!(Activity::Apply.is_destructive());
        assert!(Activity::Destroy.is_destructive());
        assert!(!Activity::Plan.is_destructive());
        assert!(!Activity::Refresh.is_destructive());
    }
}
