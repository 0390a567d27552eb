//
//  schematics-cli
//  interactive/prompt.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Prompts
//!
//! `dialoguer` prompts behind a [`Prompter`] that knows whether prompting
//! is allowed. With `--no-prompt`, `prompt = "disabled"` in the config, or
//! no terminal on stdin, every prompt fails instead of blocking, and
//! destructive commands require `--yes`.

use anyhow::{bail, Result};
use dialoguer::{Confirm, Input, Password, Select};
use thiserror::Error;

/// The user declined a confirmation prompt.
#[derive(Debug, Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Clone, Copy)]
pub struct Prompter {
    interactive: bool,
}

impl Prompter {
    /// Prompts are shown only when `enabled` and stdin is a terminal.
    pub fn new(enabled: bool) -> Self {
        Self {
            interactive: enabled && console::user_attended(),
        }
    }

    /// A prompter that never prompts.
    pub fn disabled() -> Self {
        Self { interactive: false }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Asks before a destructive operation.
    ///
    /// `assume_yes` skips the question. Declining returns [`Cancelled`].
    pub fn confirm_destructive(&self, message: &str, assume_yes: bool) -> Result<()> {
        if assume_yes {
            return Ok(());
        }
        if !self.interactive {
            bail!("{} Pass --yes to confirm when prompts are disabled", message);
        }
        let confirmed = Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()?;
        if confirmed {
            Ok(())
        } else {
            Err(Cancelled.into())
        }
    }

    pub fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        self.ensure_interactive(message)?;
        let mut input = Input::<String>::new().with_prompt(message);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    pub fn password(&self, message: &str) -> Result<String> {
        self.ensure_interactive(message)?;
        Ok(Password::new().with_prompt(message).interact()?)
    }

    /// Picks one of `items`, starting on `default`.
    pub fn select<T: ToString>(&self, message: &str, items: &[T], default: usize) -> Result<usize> {
        self.ensure_interactive(message)?;
        Ok(Select::new()
            .with_prompt(message)
            .items(items)
            .default(default)
            .interact()?)
    }

    fn ensure_interactive(&self, message: &str) -> Result<()> {
        if !self.interactive {
            bail!("Cannot prompt for '{}': prompts are disabled", message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(Prompter::disabled().confirm_destructive("Delete?", true).is_ok());
    }

    #[test]
    fn test_disabled_prompter_requires_yes() {
        let err = Prompter::disabled()
            .confirm_destructive("Delete workspace?", false)
            .unwrap_err();
        assert!(err.to_string().contains("--yes"));
        assert!(err.downcast_ref::<Cancelled>().is_none());
    }

    #[test]
    fn test_disabled_prompter_refuses_input() {
        let prompter = Prompter::disabled();
        assert!(!prompter.is_interactive());
        assert!(prompter.input("Name", None).is_err());
        assert!(prompter.password("API key").is_err());
        assert!(prompter.select("Region", &["us-south"], 0).is_err());
    }
}
