//
//  schematics-cli
//  cli/config.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `sch config` reads and writes the config file directly; the global
//! `--region`/`--endpoint` overrides are not applied here.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use crate::config::{Config, KEYS};
use crate::output::{write_structured, TableBuilder};

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Print the value of a key
    Get(GetArgs),

    /// Set a key
    Set(SetArgs),

    /// Reset a key to its default
    Unset(UnsetArgs),

    /// List every key
    #[command(visible_alias = "ls")]
    List,

    /// Print the config file location
    Path,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Configuration key
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Configuration key
    pub key: String,

    /// New value
    pub value: String,
}

#[derive(Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key
    pub key: String,
}

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: Option<String>,
}

impl ConfigCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            ConfigSubcommand::Get(args) => self.get(args, global),
            ConfigSubcommand::Set(args) => self.set(args, global),
            ConfigSubcommand::Unset(args) => self.unset(args, global),
            ConfigSubcommand::List => self.list(global),
            ConfigSubcommand::Path => self.path(global),
        }
    }

    fn get(&self, args: &GetArgs, global: &GlobalOptions) -> Result<()> {
        let config = Config::load()?;
        let key = known_key(&args.key)?;
        let value = config.get(key);

        let format = global.output_format(&config);
        if format.is_structured() {
            write_structured(format, &ConfigEntry { key, value })?;
        } else if let Some(v) = value {
            println!("{}", v);
        }
        Ok(())
    }

    fn set(&self, args: &SetArgs, global: &GlobalOptions) -> Result<()> {
        let mut config = Config::load()?;
        config.set(&args.key, &args.value)?;
        config.save()?;

        tracing::debug!(key = %args.key, "updated configuration");
        global
            .writer(&config)
            .write_success(&format!("Set {} to {}", args.key, args.value.trim()));
        Ok(())
    }

    fn unset(&self, args: &UnsetArgs, global: &GlobalOptions) -> Result<()> {
        let mut config = Config::load()?;
        let key = known_key(&args.key)?;
        let default = Config::default().get(key).unwrap_or_default();
        config.set(key, &default)?;
        config.save()?;

        global.writer(&config).write_success(&format!("Unset {}", key));
        Ok(())
    }

    fn list(&self, global: &GlobalOptions) -> Result<()> {
        let config = Config::load()?;
        let entries: Vec<ConfigEntry> = config
            .keys()
            .into_iter()
            .map(|(key, value)| ConfigEntry { key, value })
            .collect();

        let format = global.output_format(&config);
        if format.is_structured() {
            return write_structured(format, &entries);
        }

        TableBuilder::new()
            .headers(["KEY", "VALUE"])
            .rows(entries.iter().map(|e| {
                let value = match &e.value {
                    Some(v) => v.clone(),
                    None => style("(not set)").dim().to_string(),
                };
                vec![e.key.to_string(), value]
            }))
            .print();
        Ok(())
    }

    fn path(&self, global: &GlobalOptions) -> Result<()> {
        let path = Config::config_path()?;
        if global.json || global.yaml {
            let format = if global.json {
                crate::output::OutputFormat::Json
            } else {
                crate::output::OutputFormat::Yaml
            };
            write_structured(format, &serde_json::json!({ "path": path }))?;
        } else {
            println!("{}", path.display());
        }
        Ok(())
    }
}

fn known_key(key: &str) -> Result<&'static str> {
    match KEYS.iter().find(|k| **k == key) {
        Some(k) => Ok(k),
        None => bail!(
            "Unknown configuration key '{}'. Valid keys: {}",
            key,
            KEYS.join(", ")
        ),
    }
}
