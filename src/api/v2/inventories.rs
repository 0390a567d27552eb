//
//  schematics-cli
//  api/v2/inventories.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Inventory API types and operations.
//!
//! An inventory is the host list an action's playbook runs against, given
//! either inline as an INI document or as resource queries.

use serde::{Deserialize, Serialize};

use crate::api::client::{ApiRequest, SchematicsClient};
use crate::api::common::{
    impl_list_page, lenient, require, ApiError, ListOptions, Profile, Region,
};
use crate::api::v2::V2_MAX_LIMIT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Region>,

    #[serde(default)]
    pub resource_group: Option<String>,

    /// Hosts in Ansible INI format.
    #[serde(default)]
    pub inventories_ini: Option<String>,

    /// IDs of resource queries that resolve the hosts.
    #[serde(default)]
    pub resource_queries: Vec<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,
}

/// One page of `GET /v2/inventories`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryList {
    #[serde(default)]
    pub total_count: Option<u64>,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub inventories: Vec<Inventory>,
}

impl_list_page!(InventoryList, Inventory, inventories, total_count);

/// Body of `POST /v2/inventories` and `PATCH /v2/inventories/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Region>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventories_ini: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_queries: Vec<String>,
}

impl InventoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require("name", self.name.as_deref().unwrap_or_default())?;
        if self.inventories_ini.is_some() && !self.resource_queries.is_empty() {
            return Err(ApiError::InvalidArgument(
                "an inventory takes either inventories_ini or resource_queries, not both".to_string(),
            ));
        }
        Ok(())
    }
}

impl SchematicsClient {
    pub async fn list_inventories(&self, options: &ListOptions) -> Result<InventoryList, ApiError> {
        options.validate(V2_MAX_LIMIT)?;
        self.send(options.apply(ApiRequest::get(&["v2", "inventories"])))
            .await
    }

    pub async fn create_inventory(&self, body: &InventoryRequest) -> Result<Inventory, ApiError> {
        body.validate()?;
        self.send(ApiRequest::post(&["v2", "inventories"]).json(body)?)
            .await
    }

    pub async fn get_inventory(
        &self,
        inventory_id: &str,
        profile: Option<Profile>,
    ) -> Result<Inventory, ApiError> {
        let inventory_id = require("inventory_id", inventory_id)?;
        let request = ApiRequest::get(&["v2", "inventories", inventory_id])
            .query_opt("profile", profile.map(|p| p.as_str()));
        self.send(request).await
    }

    pub async fn update_inventory(
        &self,
        inventory_id: &str,
        body: &InventoryRequest,
    ) -> Result<Inventory, ApiError> {
        let inventory_id = require("inventory_id", inventory_id)?;
        self.send(ApiRequest::patch(&["v2", "inventories", inventory_id]).json(body)?)
            .await
    }

    pub async fn delete_inventory(
        &self,
        inventory_id: &str,
        force: Option<bool>,
        propagate: Option<bool>,
    ) -> Result<(), ApiError> {
        let inventory_id = require("inventory_id", inventory_id)?;
        let request = ApiRequest::delete(&["v2", "inventories", inventory_id])
            .query_opt("force", force)
            .query_opt("propagate", propagate);
        self.send_empty(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_request_validation() {
        let mut request = InventoryRequest {
            name: Some("hosts".to_string()),
            inventories_ini: Some("[web]\n10.0.0.1\n".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        request.resource_queries = vec!["q1".to_string()];
        assert!(request.validate().is_err());

        assert!(matches!(
            InventoryRequest::default().validate(),
            Err(ApiError::MissingParameter("name"))
        ));
    }
}
