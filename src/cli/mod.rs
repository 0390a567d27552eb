//
//  schematics-cli
//  cli/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Command-Line Interface
//!
//! `sch` groups its commands by Schematics resource:
//!
//! | Command | Resource |
//! |---------|----------|
//! | `sch auth` | IAM credentials |
//! | `sch workspace` | Terraform workspaces (v1) |
//! | `sch job` | Jobs (v2) |
//! | `sch action` | Ansible actions (v2) |
//! | `sch agent` | Schematics agents (v2) |
//! | `sch inventory` | Resource inventories (v2) |
//! | `sch policy` | Agent assignment policies (v2) |
//! | `sch blueprint` | Blueprints (v2) |
//! | `sch config` | Local configuration |
//! | `sch api` | Raw API requests |
//!
//! Global options such as `--region` and `--json` may appear anywhere on
//! the command line and are shared by all commands through
//! [`GlobalOptions`].

mod action;
mod agent;
mod api;
mod auth;
mod blueprint;
mod completion;
mod config;
mod inventory;
mod job;
mod policy;
mod workspace;

pub use action::ActionCommand;
pub use agent::AgentCommand;
pub use api::ApiCommand;
pub use auth::AuthCommand;
pub use blueprint::BlueprintCommand;
pub use completion::CompletionCommand;
pub use config::ConfigCommand;
pub use inventory::InventoryCommand;
pub use job::{JobCommand, JobFailed};
pub use policy::PolicyCommand;
pub use workspace::WorkspaceCommand;

use std::future::Future;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::api::common::{collect_all, ListOptions, ListPage, Region, Visibility};
use crate::api::{ApiError, SchematicsClient};
use crate::auth::{resolve_credentials, KeyringStore, DEFAULT_PROFILE};
use crate::config::Config;
use crate::interactive::Prompter;
use crate::output::{OutputFormat, OutputWriter};

#[derive(Parser, Debug)]
#[command(
    name = "sch",
    version,
    about = "Work with IBM Cloud Schematics from the command line",
    long_about = "sch manages IBM Cloud Schematics workspaces, jobs, actions, agents and more.\n\n\
                  Authenticate with 'sch auth login' or set IBMCLOUD_API_KEY.",
    propagate_version = true,
    after_help = "Use 'sch <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Options accepted by every command.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Schematics region (us-south, us-east, eu-gb, eu-de)
    #[arg(long, short = 'r', global = true, env = "SCH_REGION")]
    pub region: Option<Region>,

    /// Use the private service endpoint
    #[arg(long, global = true, env = "SCH_PRIVATE")]
    pub private: bool,

    /// Schematics API endpoint, overriding region and visibility
    #[arg(long, global = true, env = "SCH_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Credential profile in the system keyring
    #[arg(long, global = true, env = "SCH_PROFILE")]
    pub profile: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, conflicts_with = "yaml")]
    pub json: bool,

    /// Output as YAML
    #[arg(long, global = true)]
    pub yaml: bool,

    /// Never prompt; destructive commands then need --yes
    #[arg(long, global = true, env = "SCH_NO_PROMPT")]
    pub no_prompt: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage IAM credentials
    #[command(visible_alias = "login")]
    Auth(AuthCommand),

    /// Manage Terraform workspaces
    #[command(visible_alias = "ws")]
    Workspace(WorkspaceCommand),

    /// Create, inspect and follow jobs
    Job(JobCommand),

    /// Manage Ansible actions
    Action(ActionCommand),

    /// Manage Schematics agents
    Agent(AgentCommand),

    /// Manage resource inventories
    #[command(visible_alias = "inv")]
    Inventory(InventoryCommand),

    /// Manage agent assignment policies
    Policy(PolicyCommand),

    /// Manage blueprints
    #[command(visible_alias = "bp")]
    Blueprint(BlueprintCommand),

    /// Get and set configuration
    Config(ConfigCommand),

    /// Make an authenticated API request
    Api(ApiCommand),

    /// Generate shell completion scripts
    Completion(CompletionCommand),

    /// Show version information
    Version,
}

/// Paging flags shared by the list commands.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Maximum number of records to return
    #[arg(long, short = 'L')]
    pub limit: Option<u32>,

    /// Number of records to skip
    #[arg(long)]
    pub offset: Option<u32>,

    /// Fetch every page
    #[arg(long, conflicts_with = "offset")]
    pub all: bool,
}

impl PageArgs {
    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            offset: self.offset,
            limit: self.limit,
            ..ListOptions::default()
        }
    }
}

/// Fetches the page `args` selects, or every page with `--all`.
pub(crate) async fn fetch_items<P, F, Fut>(args: &PageArgs, mut fetch: F) -> Result<Vec<P::Item>, ApiError>
where
    P: ListPage,
    F: FnMut(ListOptions) -> Fut,
    Fut: Future<Output = Result<P, ApiError>>,
{
    if args.all {
        collect_all(args.list_options(), fetch).await
    } else {
        Ok(fetch(args.list_options()).await?.into_items())
    }
}

/// Prints "Showing N <noun>(s)" under a table.
pub(crate) fn show_count(writer: &OutputWriter, count: usize, noun: &str) {
    if !writer.format().is_structured() && count > 0 {
        println!();
        println!("Showing {} {}(s)", count, noun);
    }
}

impl GlobalOptions {
    /// Loads the config file with command-line overrides applied.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load()?;
        if let Some(region) = self.region {
            config.core.region = region;
        }
        if self.private {
            config.core.visibility = Visibility::Private;
        }
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
            config.core.endpoint = Some(endpoint.to_string());
        }
        Ok(config)
    }

    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or(DEFAULT_PROFILE)
    }

    /// `--json` and `--yaml` win over the configured output format.
    pub fn output_format(&self, config: &Config) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.yaml {
            OutputFormat::Yaml
        } else {
            config.core.output
        }
    }

    pub fn writer(&self, config: &Config) -> OutputWriter {
        OutputWriter::new(self.output_format(config))
    }

    pub fn prompter(&self, config: &Config) -> Prompter {
        Prompter::new(!self.no_prompt && config.prompt_enabled())
    }

    /// Builds an authenticated client.
    ///
    /// Fails with [`ApiError::AuthRequired`] when no credentials are found.
    pub fn client(&self, config: &Config) -> Result<SchematicsClient> {
        let credentials = resolve_credentials(&KeyringStore::new(), self.profile())
            .ok_or(ApiError::AuthRequired)?;
        tracing::debug!("using credentials from {}", credentials.source());

        let auth = credentials.into_authenticator(config.core.iam_endpoint.as_deref())?;
        let client = SchematicsClient::from_config(config)?.with_auth(auth);
        tracing::debug!(base_url = client.base_url(), "created client");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_anywhere() {
        let cli = Cli::try_parse_from(["sch", "workspace", "list", "--region", "eu-de", "--json"]).unwrap();
        assert_eq!(cli.global.region, Some(Region::EuDe));
        assert!(cli.global.json);
    }

    #[test]
    fn test_json_conflicts_with_yaml() {
        assert!(Cli::try_parse_from(["sch", "job", "list", "--json", "--yaml"]).is_err());
    }

    #[test]
    fn test_unknown_region_is_rejected() {
        assert!(Cli::try_parse_from(["sch", "--region", "mars", "job", "list"]).is_err());
    }

    #[test]
    fn test_output_format_precedence() {
        let mut config = Config::default();
        config.core.output = OutputFormat::Yaml;

        let global = GlobalOptions::default();
        assert_eq!(global.output_format(&config), OutputFormat::Yaml);

        let global = GlobalOptions {
            json: true,
            ..GlobalOptions::default()
        };
        assert_eq!(global.output_format(&config), OutputFormat::Json);
    }

    #[test]
    fn test_page_args() {
        let args = PageArgs {
            limit: Some(50),
            offset: Some(100),
            all: false,
        };
        let options = args.list_options();
        assert_eq!(options.limit, Some(50));
        assert_eq!(options.offset, Some(100));
        assert_eq!(options.sort, None);
    }
}
