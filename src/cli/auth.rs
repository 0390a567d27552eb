//
//  schematics-cli
//  cli/auth.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! `sch auth` stores an IBM Cloud API key in the system keyring and
//! reports which identity the CLI acts as.
//!
//! Environment credentials (`IBMCLOUD_API_KEY`, `IBMCLOUD_IAM_TOKEN`) always
//! win over the keyring, which is what CI systems usually want.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use console::style;
use serde::Serialize;

use crate::api::common::Region;
use crate::api::ApiError;
use crate::auth::{
    read_secret_from_stdin, resolve_credentials, validate_api_key, Credentials, IamAuthenticator,
    KeyringStore, TokenClaims,
};
use crate::config::Config;
use crate::interactive::Prompter;
use crate::output::{print_field, print_optional, TableOutput};
use crate::util::format_relative_time;

use super::GlobalOptions;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Store an API key in the system keyring
    Login(LoginArgs),

    /// Remove the stored API key
    Logout,

    /// Show the active credentials
    Status,

    /// Print an IAM access token
    Token,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Read the API key from stdin
    #[arg(long)]
    pub with_api_key: bool,

    /// Store the key without exchanging it for a token first
    #[arg(long)]
    pub skip_verify: bool,
}

#[derive(Debug, Serialize)]
struct AuthStatus {
    profile: String,
    source: String,
    subject: Option<String>,
    account_id: Option<String>,
    expires_at: Option<String>,
    endpoint: String,
}

impl TableOutput for AuthStatus {
    fn print_table(&self, color: bool) {
        let check = if color {
            style("✓").green().to_string()
        } else {
            "✓".to_string()
        };
        match &self.subject {
            Some(subject) => println!("{} Logged in as {}", check, subject),
            None => println!("{} Credentials found", check),
        }
        println!();
        print_field("Profile", &self.profile, color);
        print_field("Source", &self.source, color);
        print_optional("Account", self.account_id.as_deref(), color);
        if let Some(expires) = &self.expires_at {
            print_field(
                "Token expires",
                &format!("{} ({})", expires, format_relative_time(expires)),
                color,
            );
        }
        print_field("Endpoint", &self.endpoint, color);
    }
}

impl AuthCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match &self.command {
            AuthSubcommand::Login(args) => login(args, global).await,
            AuthSubcommand::Logout => logout(global),
            AuthSubcommand::Status => status(global).await,
            AuthSubcommand::Token => token(global).await,
        }
    }
}

fn iam_authenticator(api_key: String, config: &Config) -> Result<IamAuthenticator, ApiError> {
    match config.core.iam_endpoint.as_deref() {
        Some(endpoint) => IamAuthenticator::with_endpoint(api_key, endpoint),
        None => IamAuthenticator::new(api_key),
    }
}

/// The access token for `credentials`, exchanging an API key if needed.
async fn access_token(credentials: Credentials, config: &Config) -> Result<String> {
    match credentials {
        Credentials::ApiKey { api_key, .. } => {
            let token = iam_authenticator(api_key, config)?.token().await?;
            Ok(token.access_token)
        }
        Credentials::Token { token, .. } => {
            Ok(token.strip_prefix("Bearer ").unwrap_or(&token).to_string())
        }
    }
}

async fn login(args: &LoginArgs, global: &GlobalOptions) -> Result<()> {
    let config = global.load_config()?;
    let writer = global.writer(&config);
    let prompter = global.prompter(&config);
    let profile = global.profile();

    let api_key = if args.with_api_key {
        read_secret_from_stdin()?
    } else if prompter.is_interactive() {
        println!("Create an API key at https://cloud.ibm.com/iam/apikeys");
        let key = prompter.password("IBM Cloud API key")?;
        if global.region.is_none() {
            choose_defaults(&prompter)?;
        }
        key
    } else {
        bail!("No API key given. Pipe one in with --with-api-key");
    };

    if !validate_api_key(&api_key) {
        bail!("Invalid API key format");
    }

    let mut subject = None;
    if !args.skip_verify {
        let token = iam_authenticator(api_key.clone(), &config)?
            .token()
            .await
            .context("Failed to verify API key")?;
        subject = TokenClaims::decode(&token.access_token)
            .ok()
            .map(|claims| claims.subject().to_string());
    }

    KeyringStore::new().store(profile, &api_key)?;
    tracing::debug!(profile, "stored API key");

    match subject {
        Some(subject) => writer.write_success(&format!("Logged in as {} (profile '{}')", subject, profile)),
        None => writer.write_success(&format!("Stored API key for profile '{}'", profile)),
    }
    if crate::auth::resolve_api_key().is_some() {
        writer.write_warning("IBMCLOUD_API_KEY is set and takes precedence over the stored key");
    }
    Ok(())
}

/// Asks for the default region and resource group and saves them.
fn choose_defaults(prompter: &Prompter) -> Result<()> {
    let mut config = Config::load()?;
    let current = Region::ALL
        .iter()
        .position(|r| *r == config.core.region)
        .unwrap_or_default();
    let region = Region::ALL[prompter.select("Default region", &Region::ALL, current)?];
    let group = prompter.input(
        "Default resource group (blank for the account default)",
        Some(config.core.resource_group.as_deref().unwrap_or_default()),
    )?;

    config.core.region = region;
    config.set("resource_group", &group)?;
    config.save()
}

fn logout(global: &GlobalOptions) -> Result<()> {
    let config = global.load_config()?;
    let writer = global.writer(&config);
    let profile = global.profile();

    if KeyringStore::new().delete(profile)? {
        writer.write_success(&format!("Logged out of profile '{}'", profile));
    } else {
        writer.write_info(&format!("Not logged in with profile '{}'", profile));
    }
    Ok(())
}

async fn status(global: &GlobalOptions) -> Result<()> {
    let config = global.load_config()?;
    let credentials =
        resolve_credentials(&KeyringStore::new(), global.profile()).ok_or(ApiError::AuthRequired)?;
    let source = credentials.source().to_string();

    let token = access_token(credentials, &config).await?;
    let claims = TokenClaims::decode(&token).ok();

    let endpoint = match config.core.endpoint.clone() {
        Some(endpoint) => endpoint,
        None => crate::api::client::endpoint_for(config.core.region, config.core.visibility),
    };

    let status = AuthStatus {
        profile: global.profile().to_string(),
        source,
        subject: claims.as_ref().map(|c| c.subject().to_string()),
        account_id: claims
            .as_ref()
            .and_then(|c| c.account_id())
            .map(str::to_string),
        expires_at: claims
            .as_ref()
            .and_then(|c| c.expires_at())
            .map(|t| t.to_rfc3339()),
        endpoint,
    };

    global.writer(&config).write(&status)
}

async fn token(global: &GlobalOptions) -> Result<()> {
    let config = global.load_config()?;
    let credentials =
        resolve_credentials(&KeyringStore::new(), global.profile()).ok_or(ApiError::AuthRequired)?;
    println!("{}", access_token(credentials, &config).await?);
    Ok(())
}
