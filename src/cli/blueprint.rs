//
//  schematics-cli
//  cli/blueprint.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::api::common::{ExternalSource, ListOptions, Profile, VariableData};
use crate::api::v2::{Blueprint, BlueprintRequest};
use crate::output::{
    format_status, or_dash, print_field, print_header, print_optional, write_structured, TableOutput,
    TableRow,
};
use crate::util::{format_relative_time, format_time, parse_key_value, read_document};

use super::{fetch_items, show_count, GlobalOptions, PageArgs};

/// Manage blueprints
#[derive(Args, Debug)]
pub struct BlueprintCommand {
    #[command(subcommand)]
    pub command: BlueprintSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum BlueprintSubcommand {
    /// List blueprints
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View blueprint details
    View(ViewArgs),

    /// Create a blueprint
    Create(CreateArgs),

    /// Update a blueprint from a request document
    Update(UpdateArgs),

    /// Delete a blueprint
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
    /// Blueprint ID
    pub id: String,

    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON or YAML request document ('-' for stdin)
    #[arg(long, short = 'f', conflicts_with_all = ["name", "repo_url"])]
    pub file: Option<PathBuf>,

    /// Blueprint name
    #[arg(long, short = 'n', required_unless_present = "file")]
    pub name: Option<String>,

    /// Git repository holding the blueprint template
    #[arg(long, required_unless_present = "file")]
    pub repo_url: Option<String>,

    #[arg(long)]
    pub branch: Option<String>,

    /// Folder of the template inside the repository
    #[arg(long)]
    pub folder: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Input variable as NAME=VALUE (repeatable)
    #[arg(long = "input", value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,

    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Blueprint ID
    pub id: String,

    /// JSON or YAML request document
    #[arg(long, short = 'f')]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Blueprint ID
    pub id: String,

    /// Destroy the resources of every module first
    #[arg(long)]
    pub destroy_resources: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

fn blueprint_status(blueprint: &Blueprint) -> &str {
    blueprint
        .state
        .as_ref()
        .and_then(|s| s.blueprint_status_code.as_deref())
        .unwrap_or("-")
}

impl TableRow for Blueprint {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "MODULES", "STATUS", "UPDATED"]
    }

    fn row(&self, color: bool) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.modules.len().to_string(),
            format_status(blueprint_status(self), color),
            or_dash(self.updated_at.as_deref().map(format_relative_time).as_deref()),
        ]
    }
}

impl TableOutput for Blueprint {
    fn print_table(&self, color: bool) {
        print_header(&self.name);
        if let Some(description) = &self.description {
            println!("{}", description);
        }
        println!();
        print_field("ID", &self.id, color);
        print_field("Status", &format_status(blueprint_status(self), color), color);
        print_optional(
            "Message",
            self.state
                .as_ref()
                .and_then(|s| s.blueprint_status_message.as_deref()),
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
        print_field("Modules", &self.modules.len().to_string(), color);
        if !self.tags.is_empty() {
            print_field("Tags", &self.tags.join(", "), color);
        }
        print_optional("Updated", self.updated_at.as_deref().map(format_time).as_deref(), color);

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

impl CreateArgs {
    fn request(&self) -> Result<BlueprintRequest> {
        let source = self.repo_url.as_ref().map(|url| {
            let mut source = ExternalSource::git(url.clone());
            if let Some(git) = source.git.as_mut() {
                git.git_branch = self.branch.clone();
                git.git_repo_folder = self.folder.clone();
            }
            source
        });
        let inputs = self
            .inputs
            .iter()
            .map(|pair| parse_key_value(pair).map(|(name, value)| VariableData::new(name, value)))
            .collect::<Result<Vec<_>>>()?;

        Ok(BlueprintRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            resource_group: self.resource_group.clone(),
            tags: self.tags.clone(),
            source,
            inputs,
            ..Default::default()
        })
    }
}

impl BlueprintCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            BlueprintSubcommand::List(args) => self.list(args, global).await,
            BlueprintSubcommand::View(args) => self.view(args, global).await,
            BlueprintSubcommand::Create(args) => self.create(args, global).await,
            BlueprintSubcommand::Update(args) => self.update(args, global).await,
            BlueprintSubcommand::Delete(args) => self.delete(args, global).await,
        }
    }

    async fn list(&self, args: &ListArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?;

        let blueprints = fetch_items(&args.page, |opts: ListOptions| {
            let client = &client;
            async move { client.list_blueprints(&opts).await }
        })
        .await?;

        let writer = global.writer(&config);
        writer.write_list(&blueprints)?;
        show_count(&writer, blueprints.len(), "blueprint");
        Ok(())
    }

    async fn view(&self, args: &ViewArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let blueprint = client
            .get_blueprint(&args.id, args.detailed.then_some(Profile::Detailed))
            .await?;
        global.writer(&config).write(&blueprint)
    }

    async fn create(&self, args: &CreateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let mut request: BlueprintRequest = match &args.file {
            Some(path) => read_document(path)?,
            None => args.request()?,
        };
        if request.location.is_none() {
            request.location = Some(config.core.region);
        }
        if request.resource_group.is_none() {
            request.resource_group = config.core.resource_group.clone();
        }

        let client = global.client(&config)?;
        let blueprint = client.create_blueprint(&request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&blueprint)?;
        } else {
            writer.write_success(&format!(
                "Created blueprint {} ({})",
                style(&blueprint.name).bold(),
                blueprint.id
            ));
        }
        Ok(())
    }

    async fn update(&self, args: &UpdateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let request: BlueprintRequest = read_document(&args.file)?;
        if request == BlueprintRequest::default() {
            bail!("Nothing to update in {}", args.file.display());
        }

        let client = global.client(&config)?.for_resource(&args.id);
        let blueprint = client.update_blueprint(&args.id, &request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&blueprint)?;
        } else {
            writer.write_success(&format!("Updated blueprint {}", blueprint.name));
        }
        Ok(())
    }

    async fn delete(&self, args: &DeleteArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let question = if args.destroy_resources {
            format!("Delete blueprint {} and destroy its resources?", args.id)
        } else {
            format!("Delete blueprint {}?", args.id)
        };
        global.prompter(&config).confirm_destructive(&question, args.yes)?;

        let client = global.client(&config)?.for_resource(&args.id);
        client
            .delete_blueprint(&args.id, args.destroy_resources.then_some(true))
            .await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            write_structured(writer.format(), &serde_json::json!({ "id": args.id, "deleted": true }))?;
        } else {
            writer.write_success(&format!("Deleted blueprint {}", args.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_from_flags() {
        let args = CreateArgs {
            file: None,
            name: Some("three-tier".to_string()),
            repo_url: Some("https://github.com/acme/blueprints".to_string()),
            branch: Some("main".to_string()),
            folder: Some("basic".to_string()),
            description: None,
            resource_group: None,
            inputs: vec!["region=eu-de".to_string()],
            tags: Vec::new(),
        };

        let request = args.request().unwrap();
        assert!(request.validate().is_ok());
        let git = request.source.unwrap().git.unwrap();
        assert_eq!(git.git_branch.as_deref(), Some("main"));
        assert_eq!(git.git_repo_folder.as_deref(), Some("basic"));
        assert_eq!(request.inputs[0].name, "region");
    }

    #[test]
    fn test_bad_input_is_rejected() {
        let args = CreateArgs {
            file: None,
            name: Some("bp".to_string()),
            repo_url: None,
            branch: None,
            folder: None,
            description: None,
            resource_group: None,
            inputs: vec!["novalue".to_string()],
            tags: Vec::new(),
        };
        assert!(args.request().is_err());
    }
}
