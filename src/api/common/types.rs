//
//  schematics-cli
//  api/common/types.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Value types embedded by several Schematics resources.
//!
//! Jobs, actions and agents all carry input variables in the same
//! [`VariableData`] shape; actions and blueprints describe where their
//! templates come from with [`ExternalSource`]; most v2 resources expose a
//! [`UserState`] and a [`SystemLock`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ApiError;

/// A Schematics service location.
///
/// The location decides both the API endpoint host and where workspace and
/// job data is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    /// Dallas
    UsSouth,
    /// Washington DC
    UsEast,
    /// London
    EuGb,
    /// Frankfurt
    EuDe,
}

impl Region {
    /// All supported regions.
    pub const ALL: [Region; 4] = [Region::UsSouth, Region::UsEast, Region::EuGb, Region::EuDe];

    /// The hyphenated region name used in hosts and payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsSouth => "us-south",
            Self::UsEast => "us-east",
            Self::EuGb => "eu-gb",
            Self::EuDe => "eu-de",
        }
    }

    /// Extracts the region prefix of a resource ID such as
    /// `us-south.workspace.demo.1a2b3c4d`.
    pub fn from_resource_id(id: &str) -> Option<Self> {
        let prefix = id.split('.').next()?;
        Region::ALL.iter().copied().find(|r| r.as_str() == prefix)
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::UsSouth
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| {
                ApiError::InvalidArgument(format!(
                    "unknown region '{}', expected one of: us-south, us-east, eu-gb, eu-de",
                    s
                ))
            })
    }
}

/// Network visibility of the API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// `https://<region>.schematics.cloud.ibm.com`
    #[default]
    Public,
    /// `https://private-<region>.schematics.cloud.ibm.com`
    Private,
}

impl Visibility {
    /// The lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(ApiError::InvalidArgument(format!(
                "unknown visibility '{}', expected 'public' or 'private'",
                other
            ))),
        }
    }
}

/// An input, output or environment variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableData {
    /// Variable name.
    pub name: String,

    /// Variable value, always sent as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Use the template default instead of `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_default: Option<bool>,

    /// Type and display metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VariableMetadata>,

    /// Reference to the variable's origin (read-only).
    #[serde(default, skip_serializing)]
    pub link: Option<String>,
}

impl VariableData {
    /// Creates a plain string variable.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Creates a variable whose value is masked by the service.
    pub fn secure(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            metadata: Some(VariableMetadata {
                secure: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Returns `true` when the metadata marks the value as secure.
    pub fn is_secure(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.secure)
            .unwrap_or(false)
    }
}

/// Declared type of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Boolean,
    String,
    Integer,
    Date,
    Array,
    List,
    Map,
    Complex,
    Link,
    #[serde(other)]
    Unknown,
}

/// Metadata describing how a variable is typed, validated and displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableMetadata {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<VariableType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_data_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// User-controlled state of a resource (for example a disabled policy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_at: Option<String>,
}

/// Service-managed lock placed on a resource while a job runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemLock {
    #[serde(default)]
    pub sys_locked: Option<bool>,

    #[serde(default)]
    pub sys_locked_by: Option<String>,

    #[serde(default)]
    pub sys_locked_at: Option<String>,
}

impl SystemLock {
    /// Returns `true` while the service holds the lock.
    pub fn is_locked(&self) -> bool {
        self.sys_locked.unwrap_or(false)
    }
}

/// Kind of repository a template or playbook is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Local,
    GitHub,
    GitHubEnterprise,
    GitLab,
    IbmGitLab,
    #[serde(alias = "ibm_schematics_action_catalog")]
    IbmCloudCatalog,
    ExternalScm,
    CosBucket,
    /// A source kind this client does not model.
    #[serde(other)]
    Other,
}

/// Location of a template or playbook repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSource {
    pub source_type: SourceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_bucket: Option<CosBucketSource>,
}

impl ExternalSource {
    /// A Git repository source.
    pub fn git(repo_url: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::GitHub,
            git: Some(GitSource {
                git_repo_url: Some(repo_url.into()),
                ..Default::default()
            }),
            catalog: None,
            cos_bucket: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_git_repo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repo_folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_version_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_repo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CosBucketSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cos_bucket_url: Option<String>,
}

/// Bastion host used to reach target hosts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BastionResourceDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_parse_and_display() {
        assert_eq!("eu-de".parse::<Region>().unwrap(), Region::EuDe);
        assert_eq!(" US-South ".parse::<Region>().unwrap(), Region::UsSouth);
        assert!("mars-north".parse::<Region>().is_err());
        assert_eq!(Region::EuGb.to_string(), "eu-gb");
        assert_eq!(serde_json::to_string(&Region::UsEast).unwrap(), "\"us-east\"");
    }

    #[test]
    fn test_region_from_resource_id() {
        assert_eq!(
            Region::from_resource_id("eu-de.workspace.demo.1a2b3c4d"),
            Some(Region::EuDe)
        );
        assert_eq!(Region::from_resource_id("us-east.JOB.demo.9f8e7d"), Some(Region::UsEast));
        assert_eq!(Region::from_resource_id("a1b2c3"), None);
    }

    #[test]
    fn test_variable_serialization_skips_unset_fields() {
        let var = VariableData::new("region", "us-south");
        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(json, serde_json::json!({"name": "region", "value": "us-south"}));
    }

    #[test]
    fn test_secure_variable() {
        let var = VariableData::secure("api_key", "hunter2");
        assert!(var.is_secure());
        assert!(!VariableData::new("a", "b").is_secure());
    }

    #[test]
    fn test_unknown_variable_type() {
        let meta: VariableMetadata = serde_json::from_str(r#"{"type":"set"}"#).unwrap();
        assert_eq!(meta.variable_type, Some(VariableType::Unknown));
    }

    #[test]
    fn test_source_type_names() {
        assert_eq!(
            serde_json::to_string(&SourceType::GitHubEnterprise).unwrap(),
            "\"git_hub_enterprise\""
        );
        assert_eq!(
            serde_json::to_string(&SourceType::IbmGitLab).unwrap(),
            "\"ibm_git_lab\""
        );
    }

    #[test]
    fn test_unmodelled_source_type() {
        let source: ExternalSource =
            serde_json::from_str(r#"{"source_type":"bitbucket_git"}"#).unwrap();
        assert_eq!(source.source_type, SourceType::Other);
    }
}
