//
//  schematics-cli
//  cli/inventory.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::api::common::{ListOptions, Profile};
use crate::api::v2::{Inventory, InventoryRequest};
use crate::output::{or_dash, print_field, print_header, print_optional, write_structured, TableOutput, TableRow};
use crate::util::{format_relative_time, format_time, read_document};

use super::{fetch_items, show_count, GlobalOptions, PageArgs};

/// Manage resource inventories
#[derive(Args, Debug)]
pub struct InventoryCommand {
    #[command(subcommand)]
    pub command: InventorySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum InventorySubcommand {
    /// List inventories
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// View inventory details
    View(ViewArgs),

    /// Create an inventory
    Create(CreateArgs),

    /// Update an inventory
    Update(UpdateArgs),

    /// Delete an inventory
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
    /// Inventory ID
    pub id: String,

    #[arg(long)]
    pub detailed: bool,
}

/// Host sources; an inventory uses one or the other.
#[derive(Args, Debug)]
pub struct HostArgs {
    /// Ansible INI file listing the hosts
    #[arg(long, conflicts_with = "queries")]
    pub ini: Option<PathBuf>,

    /// Resource query ID resolving the hosts (repeatable)
    #[arg(long = "query")]
    pub queries: Vec<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON or YAML request document ('-' for stdin)
    #[arg(long, short = 'f', conflicts_with_all = ["name", "ini", "queries"])]
    pub file: Option<PathBuf>,

    /// Inventory name
    #[arg(long, short = 'n', required_unless_present = "file")]
    pub name: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    #[command(flatten)]
    pub hosts: HostArgs,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Inventory ID
    pub id: String,

    /// JSON or YAML document with the fields to change
    #[arg(long, short = 'f', conflicts_with_all = ["ini", "queries"])]
    pub file: Option<PathBuf>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[command(flatten)]
    pub hosts: HostArgs,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Inventory ID
    pub id: String,

    #[arg(long)]
    pub force: bool,

    #[arg(long)]
    pub propagate: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

fn read_ini(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

impl HostArgs {
    fn apply(&self, request: &mut InventoryRequest) -> Result<()> {
        if let Some(path) = &self.ini {
            request.inventories_ini = Some(read_ini(path)?);
        }
        request.resource_queries = self.queries.clone();
        Ok(())
    }
}

impl TableRow for Inventory {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "HOSTS FROM", "UPDATED"]
    }

    fn row(&self, _color: bool) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            host_source(self).to_string(),
            or_dash(self.updated_at.as_deref().map(format_relative_time).as_deref()),
        ]
    }
}

fn host_source(inventory: &Inventory) -> &'static str {
    if inventory.inventories_ini.is_some() {
        "ini"
    } else if !inventory.resource_queries.is_empty() {
        "queries"
    } else {
        "-"
    }
}

impl TableOutput for Inventory {
    fn print_table(&self, color: bool) {
        print_header(&self.name);
        if let Some(description) = &self.description {
            println!("{}", description);
        }
        println!();
        print_field("ID", &self.id, color);
        if let Some(location) = self.location {
            print_field("Location", location.as_str(), color);
        }
        print_optional("Resource group", self.resource_group.as_deref(), color);
        print_optional("Created by", self.created_by.as_deref(), color);
        print_optional("Updated", self.updated_at.as_deref().map(format_time).as_deref(), color);

        if !self.resource_queries.is_empty() {
            print_field("Queries", &self.resource_queries.join(", "), color);
        }
        if let Some(ini) = &self.inventories_ini {
            println!();
            println!("{}", style("Hosts").bold());
            for line in ini.lines() {
                println!("  {}", line);
            }
        }
    }
}

impl InventoryCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            InventorySubcommand::List(args) => self.list(args, global).await,
            InventorySubcommand::View(args) => self.view(args, global).await,
            InventorySubcommand::Create(args) => self.create(args, global).await,
            InventorySubcommand::Update(args) => self.update(args, global).await,
            InventorySubcommand::Delete(args) => self.delete(args, global).await,
        }
    }

    async fn list(&self, args: &ListArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?;

        let inventories = fetch_items(&args.page, |opts: ListOptions| {
            let client = &client;
            async move { client.list_inventories(&opts).await }
        })
        .await?;

        let writer = global.writer(&config);
        writer.write_list(&inventories)?;
        show_count(&writer, inventories.len(), "inventory");
        Ok(())
    }

    async fn view(&self, args: &ViewArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let client = global.client(&config)?.for_resource(&args.id);
        let inventory = client
            .get_inventory(&args.id, args.detailed.then_some(Profile::Detailed))
            .await?;
        global.writer(&config).write(&inventory)
    }

    async fn create(&self, args: &CreateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let mut request: InventoryRequest = match &args.file {
            Some(path) => read_document(path)?,
            None => {
                let mut request = InventoryRequest {
                    name: args.name.clone(),
                    description: args.description.clone(),
                    resource_group: args.resource_group.clone(),
                    ..Default::default()
                };
                args.hosts.apply(&mut request)?;
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
        let inventory = client.create_inventory(&request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&inventory)?;
        } else {
            writer.write_success(&format!(
                "Created inventory {} ({})",
                style(&inventory.name).bold(),
                inventory.id
            ));
        }
        Ok(())
    }

    async fn update(&self, args: &UpdateArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;

        let request = match &args.file {
            Some(path) => read_document(path)?,
            None => {
                let mut request = InventoryRequest {
                    description: args.description.clone(),
                    ..Default::default()
                };
                args.hosts.apply(&mut request)?;
                request
            }
        };
        if request == InventoryRequest::default() {
            bail!("Nothing to update. Pass --file, --description, --ini or --query");
        }

        let client = global.client(&config)?.for_resource(&args.id);
        let inventory = client.update_inventory(&args.id, &request).await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            writer.write(&inventory)?;
        } else {
            writer.write_success(&format!("Updated inventory {}", inventory.name));
        }
        Ok(())
    }

    async fn delete(&self, args: &DeleteArgs, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        global
            .prompter(&config)
            .confirm_destructive(&format!("Delete inventory {}?", args.id), args.yes)?;

        let client = global.client(&config)?.for_resource(&args.id);
        client
            .delete_inventory(
                &args.id,
                args.force.then_some(true),
                args.propagate.then_some(true),
            )
            .await?;

        let writer = global.writer(&config);
        if writer.format().is_structured() {
            write_structured(writer.format(), &serde_json::json!({ "id": args.id, "deleted": true }))?;
        } else {
            writer.write_success(&format!("Deleted inventory {}", args.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hosts_from_ini_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[web]\n10.0.0.4").unwrap();

        let hosts = HostArgs {
            ini: Some(file.path().to_path_buf()),
            queries: Vec::new(),
        };
        let mut request = InventoryRequest::default();
        hosts.apply(&mut request).unwrap();

        assert_eq!(request.inventories_ini.as_deref(), Some("[web]\n10.0.0.4\n"));
        assert!(request.resource_queries.is_empty());
    }

    #[test]
    fn test_host_source() {
        let mut inventory = Inventory::default();
        assert_eq!(host_source(&inventory), "-");
        inventory.resource_queries = vec!["q-1".to_string()];
        assert_eq!(host_source(&inventory), "queries");
    }
}
