//
//  schematics-cli
//  api/v2/blueprints.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Blueprint API types and operations.
//!
//! A blueprint composes several workspaces (modules) from a blueprint
//! template and a configuration file, and drives them as one unit.

use serde::{Deserialize, Serialize};

use crate::api::client::{ApiRequest, SchematicsClient};
use crate::api::common::{
    impl_list_page, lenient, require, ApiError, ExternalSource, ListOptions, Profile, Region, SystemLock,
    UserState, VariableData,
};
use crate::api::v2::V2_MAX_LIMIT;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint_status_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint_status_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub schema_version: Option<String>,

    #[serde(default)]
    pub source: Option<ExternalSource>,

    #[serde(default)]
    pub config: Vec<serde_json::Value>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Region>,

    #[serde(default)]
    pub inputs: Vec<VariableData>,

    #[serde(default)]
    pub settings: Vec<VariableData>,

    #[serde(default)]
    pub flow: Option<serde_json::Value>,

    #[serde(default)]
    pub modules: Vec<serde_json::Value>,

    #[serde(default)]
    pub crn: Option<String>,

    #[serde(default)]
    pub account: Option<String>,

    #[serde(default)]
    pub user_state: Option<UserState>,

    #[serde(default)]
    pub state: Option<BlueprintState>,

    #[serde(default)]
    pub sys_lock: Option<SystemLock>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,
}

/// One page of `GET /v2/blueprints`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlueprintList {
    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub blueprints: Vec<Blueprint>,
}

impl_list_page!(BlueprintList, Blueprint, blueprints, total_count);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ExternalSource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config: Vec<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Region>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<VariableData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<VariableData>,
}

impl BlueprintRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", self.name.as_deref().unwrap_or_default())?;
        if self.source.is_none() {
            return Err(ApiError::MissingParameter("source"));
        }
        Ok(())
    }
}

impl SchematicsClient {
    pub async fn list_blueprints(&self, options: &ListOptions) -> Result<BlueprintList, ApiError> {
        options.validate(V2_MAX_LIMIT)?;
        self.send(options.apply(ApiRequest::get(&["v2", "blueprints"])))
            .await
    }

    pub async fn create_blueprint(&self, body: &BlueprintRequest) -> Result<Blueprint, ApiError> {
        body.validate()?;
        self.send(ApiRequest::post(&["v2", "blueprints"]).json(body)?)
            .await
    }

    pub async fn get_blueprint(
        &self,
        blueprint_id: &str,
        profile: Option<Profile>,
    ) -> Result<Blueprint, ApiError> {
        let blueprint_id = require("blueprint_id", blueprint_id)?;
        let request = ApiRequest::get(&["v2", "blueprints", blueprint_id])
            .query_opt("profile", profile.map(|p| p.as_str()));
        self.send(request).await
    }

    pub async fn update_blueprint(
        &self,
        blueprint_id: &str,
        body: &BlueprintRequest,
    ) -> Result<Blueprint, ApiError> {
        let blueprint_id = require("blueprint_id", blueprint_id)?;
        self.send(ApiRequest::patch(&["v2", "blueprints", blueprint_id]).json(body)?)
            .await
    }

    /// Deletes a blueprint; with `destroy_resources` its modules' resources
    /// are destroyed first, which needs the IAM refresh token.
    pub async fn delete_blueprint(
        &self,
        blueprint_id: &str,
        destroy_resources: Option<bool>,
    ) -> Result<(), ApiError> {
        let blueprint_id = require("blueprint_id", blueprint_id)?;
        let refresh_token = match destroy_resources {
            Some(true) => Some(self.refresh_token().await?),
            _ => None,
        };
        let request = ApiRequest::delete(&["v2", "blueprints", blueprint_id])
            .header_opt("refresh_token", refresh_token)
            .query_opt("destroy_resources", destroy_resources);
        self.send_empty(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blueprint_request_needs_source() {
        let mut request = BlueprintRequest {
            name: Some("three-tier".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            request.validate(),
            Err(ApiError::MissingParameter("source"))
        ));

        request.source = Some(ExternalSource::git("https://github.com/acme/blueprints"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blueprint_tolerates_unknown_fields() {
        let blueprint: Blueprint = serde_json::from_value(serde_json::json!({
            "id": "us-east.BLUEPRINT.three-tier.9",
            "name": "three-tier",
            "state": { "blueprint_status_code": "normal" },
            "cart_order_data": [{ "name": "x" }]
        }))
        .unwrap();
        assert_eq!(
            blueprint.state.and_then(|s| s.blueprint_status_code).as_deref(),
            Some("normal")
        );
    }
}
