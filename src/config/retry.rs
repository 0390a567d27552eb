//
//  schematics-cli
//  config/retry.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::RetryPolicy;

/// The `[retry]` section: how often transient failures are retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    #[serde(default = "default_max_retry_interval")]
    pub max_retry_interval_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_interval() -> u64 {
    1
}

fn default_max_retry_interval() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_interval_secs: default_retry_interval(),
            max_retry_interval_secs: default_max_retry_interval(),
        }
    }
}

impl RetryConfig {
    /// The client retry policy for these settings.
    ///
    /// A maximum interval below the initial interval is raised to it.
    pub fn policy(&self) -> RetryPolicy {
        let retry_interval = Duration::from_secs(self.retry_interval_secs);
        RetryPolicy {
            max_retries: self.max_retries,
            retry_interval,
            max_retry_interval: Duration::from_secs(self.max_retry_interval_secs).max(retry_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_client_default() {
        assert_eq!(RetryConfig::default().policy(), RetryPolicy::default());
    }

    #[test]
    fn test_max_interval_not_below_initial() {
        let config = RetryConfig {
            max_retries: 2,
            retry_interval_secs: 10,
            max_retry_interval_secs: 5,
        };
        assert_eq!(config.policy().max_retry_interval, Duration::from_secs(10));
    }
}
