//
//  schematics-cli
//  cli/policy.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Agent assignment policies
//!
//! A policy sends jobs for its targets to the agents named in its
//! parameter. Targets are either explicit IDs (`--target`) or everything
//! matching a scope (`--scope-kind` with tags, resource groups and
//! locations).

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::api::common::{ListOptions, Profile, Region};
use crate::api::v2::{
    Policy, PolicyKind, PolicyParameter, PolicyRequest, PolicySelectorScope, PolicyTarget, SelectorKind,
};
use crate::output::{or_dash, print_field, print_header, print_optional, write_structured, TableOutput, TableRow};
use crate::util::{format_relative_time, format_time, read_document};

use super::{fetch_items, show_count, GlobalOptions, PageArgs};

/// Manage agent assignment policies
#[derive(Args, Debug)]
pub struct PolicyCommand {
    #[command(subcommand)]
    pub command: PolicySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum PolicySubcommand {
    /// List policies
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View policy details
    View(ViewArgs),

    /// Create an agent assignment policy
    Create(CreateArgs),

    /// Update a policy from a request document
    Update(UpdateArgs),

    /// Delete a policy
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Policy ID
    pub id: String,

    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON or YAML request document ('-' for stdin)
    #[arg(long, short = 'f', conflicts_with_all = ["name", "agents"])]
    pub file: Option<PathBuf>,

    /// Policy name
    #[arg(long, short = 'n', required_unless_present = "file")]
    pub name: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Agent that receives the jobs (repeatable)
    #[arg(long = "agent", required_unless_present = "file")]
    pub agents: Vec<String>,

    /// Workspace or action ID the policy applies to (repeatable)
    #[arg(long = "target", conflicts_with = "scope_kind")]
    pub targets: Vec<String>,

    /// Apply to every workspace, action, system or environment in scope
    #[arg(long)]
    pub scope_kind: Option<String>,

    /// Scope tag (repeatable)
    #[arg(long = "scope-tag", requires = "scope_kind")]
    pub scope_tags: Vec<String>,

    /// Scope resource group (repeatable)
    #[arg(long = "scope-resource-group", requires = "scope_kind")]
    pub scope_resource_groups: Vec<String>,

    /// Scope location (repeatable)
    #[arg(long = "scope-location", requires = "scope_kind")]
    pub scope_locations: Vec<Region>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Policy ID
    pub id: String,

    /// JSON or YAML request document
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Policy ID
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl CreateArgs {
    fn target(&self) -> Option<PolicyTarget> {
        match &self.scope_kind {
            Some(kind) => Some(PolicyTarget::scoped(vec![PolicySelectorScope {
                kind: Some(kind.clone()),
                tags: self.scope_tags.clone(),
                resource_groups: self.scope_resource_groups.clone(),
                locations: self.scope_locations.clone(),
            }])),
            None if !self.targets.is_empty() => Some(PolicyTarget::ids(self.targets.iter())),
            None => None,
        }
    }

    fn request(&self) -> PolicyRequest {
        PolicyRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            resource_group: self.resource_group.clone(),
            tags: self.tags.clone(),
            policy_kind: Some(PolicyKind::AgentAssignmentPolicy),
            policy_target: self.target(),
            policy_parameter: Some(PolicyParameter {
                agent_assignment_policy_parameter: Some(PolicyTarget::ids(self.agents.iter())),
            }),
            ..Default::default()
        }
    }
}

fn describe_target(target: Option<&PolicyTarget>) -> String {
    match target {
        Some(t) if t.selector_kind == SelectorKind::Ids => format!("{} id(s)", t.selector_ids.len()),
        Some(t) => format!("{} scope(s)", t.selector_scope.len()),
        None => "-".to_string(),
    }
}

impl TableRow for Policy {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "TARGETS", "STATE", "UPDATED"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            describe_target(self.policy_target.as_ref()),
            or_dash(self.state.as_ref().and_then(|s| s.state.as_deref())),
            or_dash(self.updated_at.as_deref().map(format_relative_time).as_deref()),
        ]
    }
}

impl TableOutput for Policy {
    fn print_table(&self, color: bool) {
        print_header(&self.name);
        if let Some(description) = &self.description {
            println!("{}", description);
        }
        println!();
        print_field("ID", &self.id, color);
        print_optional("State", self.state.as_ref().and_then(|s| s.state.as_deref()), color);
        if let Some(location) = self.location {
            print_field("Location", location.as_str(), color);
        }
        print_optional("Resource group", self.resource_group.as_deref(), color);
        print_optional("Created by", self.created_by.as_deref(), color);
        print_optional("Updated", self.updated_at.as_deref().map(format_time).as_deref(), color);

        if let Some(target) = &self.policy_target {
            println!();
            println!("{}", style("Applies to").bold());
            for id in &target.selector_ids {
                println!("  {}", id);
            }
            for scope in &target.selector_scope {
                let locations: Vec<&str> = scope.locations.iter().map(|l| l.as_str()).collect();
                println!(
                    "  {} tags=[{}] groups=[{}] locations=[{}]",
                    scope.kind.as_deref().unwrap_or("*"),
                    scope.tags.join(","),
                    scope.resource_groups.join(","),
                    locations.join(",")
                );
            }
        }

        let agents = self
            .policy_parameter
            .as_ref()
            .and_then(|p| p.agent_assignment_policy_parameter.as_ref());
        if let Some(agents) = agents {
            println!();
            println!("{}", style("Agents").bold());
            for id in &agents.selector_ids {
                println!("  {}", id);
            }
        }
    }
}

impl PolicyCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            PolicySubcommand::List(args) => self.list(args, global).await,
            PolicySubcommand::View(args) => self.view(args, global).await,
            PolicySubcommand::Create(args) => self.create(args, global).await,
            PolicySubcommand::Update(args) => self.update(args, global).await,
            PolicySubcommand::Delete(args) => self.delete(args, global).await,
        }
    }

    async fn list(&self, args: &ListArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?;

        let policies = fetch_items(&args.page, |opts: ListOptions| {
            let client = &client;
            async move { client.list_policies(&opts).await }
        })
        .await?;

        let writer = global.writer(&config);
        writer.write_list(&policies)?;
        show_count(&writer, policies.len(), "policy");
        Ok(())
    }

    async fn view(&self, args: &ViewArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let policy = client
            .get_policy(&args.id, args.detailed.then_some(Profile::Detailed))
            .await?;
        global.writer(&config).write(&policy)
    }

    async fn create(&self, args: &CreateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let mut request: PolicyRequest = match &args.file {
            Some(path) => read_document(path)?,
            None => {
                if args.targets.is_empty() && args.scope_kind.is_none() {
                    bail!("Pass --target or --scope-kind to choose what the policy applies to");
                }
                args.request()
            }
        };

        if request.location.is_none() {
            request.location = Some(config.core.region);
        }
        if request.resource_group.is_none() {
            request.resource_group = config.core.resource_group.clone();
        }

        let client = global.client(&config)?;
        let policy = client.create_policy(&request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&policy)?;
        } else {
            writer.write_success(&format!(
                "Created policy {} ({})",
                style(&policy.name).bold(),
                policy.id
            ));
        }
        Ok(())
    }

    async fn update(&self, args: &UpdateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let request: PolicyRequest = read_document(&args.file)?;
        if request == PolicyRequest::default() {
            bail!("Nothing to update in {}", args.file.display());
        }

        let client = global.client(&config)?.for_resource(&args.id);
        let policy = client.update_policy(&args.id, &request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&policy)?;
        } else {
            writer.write_success(&format!("Updated policy {}", policy.name));
        }
        Ok(())
    }

    async fn delete(&self, args: &DeleteArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        global
            .prompter(&config)
            .confirm_destructive(&format!("Delete policy {}?", args.id), args.yes)?;

        let client = global.client(&config)?.for_resource(&args.id);
        client.delete_policy(&args.id).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            write_structured(writer.format(), &serde_json::json!({ "id": args.id, "deleted": true }))?;
        } else {
            writer.write_success(&format!("Deleted policy {}", args.id));
        }
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
        command: PolicySubcommand,
    }

    fn create_args(args: &[&str]) -> CreateArgs {
        let mut argv = vec!["test", "create"];
        argv.extend_from_slice(args);
        match TestCli::try_parse_from(argv).unwrap().command {
            PolicySubcommand::Create(args) => args,
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_id_targets() {
        let args = create_args(&["--name", "prod", "--agent", "agent-1", "--target", "ws-1", "--target", "ws-2"]);
        let request = args.request();

        let target = request.policy_target.unwrap();
        assert_eq!(target.selector_kind, SelectorKind::Ids);
        assert_eq!(target.selector_ids, vec!["ws-1", "ws-2"]);

        let agents = request
            .policy_parameter
            .and_then(|p| p.agent_assignment_policy_parameter)
            .unwrap();
        assert_eq!(agents.selector_ids, vec!["agent-1"]);
    }

    #[test]
    fn test_scoped_target() {
        let args = create_args(&[
            "--name",
            "prod",
            "--agent",
            "agent-1",
            "--scope-kind",
            "workspace",
            "--scope-tag",
            "env:prod",
            "--scope-location",
            "eu-de",
        ]);
        let target = args.target().unwrap();
        assert_eq!(target.selector_kind, SelectorKind::Scoped);
        assert_eq!(target.selector_scope[0].tags, vec!["env:prod"]);
        assert_eq!(target.selector_scope[0].locations, vec![Region::EuDe]);
    }

    #[test]
    fn test_scope_flags_need_kind() {
        assert!(TestCli::try_parse_from(["test", "create", "--name", "p", "--agent", "a", "--scope-tag", "x"]).is_err());
    }
}
