//
//  schematics-cli
//  auth/keyring.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Key Storage
//!
//! `sch auth login` keeps the IAM API key in the platform keyring rather
//! than in the config file:
//!
//! - **macOS**: Keychain Services
//! - **Linux**: Secret Service API (GNOME Keyring, KWallet)
//! - **Windows**: Windows Credential Manager
//!
//! Entries use the service name `schematics-cli` and the profile name as
//! the user, so several accounts can be kept side by side.
//!
//! ## Example
//!
//! ```rust,no_run
//! use schematics_cli::auth::KeyringStore;
//!
//! fn login(api_key: &str) -> anyhow::Result<()> {
//!     let store = KeyringStore::new();
//!     store.store("default", api_key)?;
//!     assert!(store.get("default")?.is_some());
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use keyring::Entry;

/// Service name of every keyring entry written by `sch`.
pub const SERVICE_NAME: &str = "schematics-cli";

/// Profile used when none is given.
pub const DEFAULT_PROFILE: &str = "default";

/// API keys in the system keyring, one entry per profile.
///
/// No keyring access happens until a method is called. The first access
/// may prompt the user to unlock the keyring.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// A store under a different service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Stores the API key for `profile`, replacing any existing one.
    pub fn store(&self, profile: &str, api_key: &str) -> Result<()> {
        let entry = Entry::new(&self.service, profile)?;
        entry
            .set_password(api_key)
            .with_context(|| format!("Failed to store API key for profile '{}'", profile))?;
        Ok(())
    }

    /// Returns the API key for `profile`, or `None` when there is no entry.
    pub fn get(&self, profile: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, profile)?;
        match entry.get_password() {
            Ok(api_key) => Ok(Some(api_key)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the entry for `profile`. Returns `false` when there was none.
    pub fn delete(&self, profile: &str) -> Result<bool> {
        let entry = Entry::new(&self.service, profile)?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        assert_eq!(KeyringStore::default().service(), "schematics-cli");
        assert_eq!(KeyringStore::with_service("sch-test").service(), "sch-test");
    }
}
