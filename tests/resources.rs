//
//  schematics-cli
//  tests/resources.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

mod common;

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use schematics_cli::api::common::{collect_all, ExternalSource, ListOptions, Profile};
use schematics_cli::api::v2::{
    AgentJobKind, BlueprintRequest, CreateActionRequest, InventoryRequest, PolicyKind,
    PolicyParameter, PolicyRequest, PolicyTarget,
};
use schematics_cli::api::{ApiError, SchematicsClient};
use schematics_cli::auth::BearerTokenAuthenticator;
use serde_json::json;

const ACTION_ID: &str = "us-east.ACTION.web.1a2b";
const AGENT_ID: &str = "us-south.AGENT.edge.9f8e";
const INVENTORY_ID: &str = "us-south.INVENTORY.hosts.3c4d";
const POLICY_ID: &str = "us-south.POLICY.assign.5e6f";
const BLUEPRINT_ID: &str = "eu-de.BLUEPRINT.stack.7a8b";

/// A client whose bearer token has no refresh token.
fn static_token_client(server: &Server) -> SchematicsClient {
    SchematicsClient::with_endpoint(&server.url())
        .unwrap()
        .with_retry_policy(common::fast_retry())
        .with_auth(Arc::new(BearerTokenAuthenticator::new(common::ACCESS_TOKEN)))
}

// Actions

#[tokio::test]
async fn creates_action_from_git_source() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/actions")
        .match_header("X-Github-token", "ghp_private")
        .match_body(Matcher::PartialJson(json!({
            "name": "web-tier",
            "command_parameter": "site.yml",
            "source": {
                "source_type": "git_hub",
                "git": { "git_repo_url": "https://github.com/acme/playbooks" }
            }
        })))
        .with_status(201)
        .with_body(json!({ "id": ACTION_ID, "name": "web-tier" }).to_string())
        .create_async()
        .await;

    let mut request = CreateActionRequest::new("web-tier");
    request.command_parameter = Some("site.yml".to_string());
    request.source = Some(ExternalSource::git("https://github.com/acme/playbooks"));

    let client = common::client(&server);
    let action = client
        .create_action(&request, Some("ghp_private"))
        .await
        .unwrap();

    assert_eq!(action.id, ACTION_ID);
    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_action_name_is_rejected_locally() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/v2/actions").expect(0).create_async().await;

    let client = common::client(&server);
    let err = client
        .create_action(&CreateActionRequest::new("1-bad name"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn gets_detailed_action_profile() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", format!("/v2/actions/{}", ACTION_ID).as_str())
        .match_query(Matcher::UrlEncoded("profile".into(), "detailed".into()))
        .with_status(200)
        .with_body(json!({ "id": ACTION_ID, "name": "web-tier" }).to_string())
        .create_async()
        .await;

    let client = common::client(&server);
    client
        .get_action(ACTION_ID, Some(Profile::Detailed))
        .await
        .unwrap();
    mock.assert_async().await;
}

// Agents

#[tokio::test]
async fn runs_agent_job_with_force_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", format!("/v2/agents/{}/health", AGENT_ID).as_str())
        .match_header("force", "true")
        .with_status(202)
        .with_body(
            json!({
                "agent_id": AGENT_ID,
                "job_id": "health-job-1",
                "status_code": "job_pending"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);
    let job = client
        .run_agent_job(AGENT_ID, AgentJobKind::Health, true)
        .await
        .unwrap();

    assert_eq!(job.job_id.as_deref(), Some("health-job-1"));
    assert_eq!(job.status_code.as_deref(), Some("job_pending"));
    mock.assert_async().await;
}

#[tokio::test]
async fn reads_latest_agent_job() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v2/agents/{}/deploy", AGENT_ID).as_str())
        .with_status(200)
        .with_body(
            json!({
                "agent_id": AGENT_ID,
                "job_id": "deploy-job-7",
                "is_redeployed": false,
                "status_code": "job_finished"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);
    let job = client
        .get_agent_job(AGENT_ID, AgentJobKind::Deploy)
        .await
        .unwrap();

    assert_eq!(job.is_redeployed, Some(false));
}

#[tokio::test]
async fn deleting_agent_omits_refresh_token_when_unavailable() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v2/agents/{}", AGENT_ID).as_str())
        .match_header("refresh_token", Matcher::Missing)
        .match_header("force", "false")
        .with_status(204)
        .create_async()
        .await;

    let client = static_token_client(&server);
    client.delete_agent(AGENT_ID, false).await.unwrap();
    mock.assert_async().await;
}

fn agent_body(destroy: serde_json::Value) -> String {
    json!({
        "id": AGENT_ID,
        "name": "edge",
        "schematics_location": "us-south",
        "recent_destroy_job": destroy
    })
    .to_string()
}

#[tokio::test]
async fn tears_down_agent_resources_before_deleting() {
    let mut server = Server::new_async().await;
    let agent_path = format!("/v2/agents/{}", AGENT_ID);
    let resources = server
        .mock("DELETE", format!("{}/resources", agent_path).as_str())
        .match_header("refresh_token", common::REFRESH_TOKEN)
        .with_status(202)
        .expect(1)
        .create_async()
        .await;
    let destroying = server
        .mock("GET", agent_path.as_str())
        .match_query(Matcher::UrlEncoded("profile".into(), "detailed".into()))
        .with_status(200)
        .with_body(agent_body(json!({ "job_id": "destroy-1", "status_code": "job_in_progress" })))
        .expect(1)
        .create_async()
        .await;
    let destroyed = server
        .mock("GET", agent_path.as_str())
        .match_query(Matcher::UrlEncoded("profile".into(), "detailed".into()))
        .with_status(200)
        .with_body(agent_body(json!({ "job_id": "destroy-1", "status_code": "job_finished" })))
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", agent_path.as_str())
        .match_header("force", "true")
        .match_header("refresh_token", common::REFRESH_TOKEN)
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let client = common::client(&server);
    client.delete_agent_resources(AGENT_ID).await.unwrap();

    let mut seen = Vec::new();
    let agent = client
        .wait_for_agent_destroy_with(
            AGENT_ID,
            Duration::from_millis(5),
            Duration::from_secs(5),
            |job| seen.push(job.and_then(|j| j.status_code.clone())),
        )
        .await
        .unwrap();
    client.delete_agent(AGENT_ID, true).await.unwrap();

    assert!(agent.destroy_settled());
    assert_eq!(
        seen,
        vec![
            Some("job_in_progress".to_string()),
            Some("job_finished".to_string())
        ]
    );
    resources.assert_async().await;
    destroying.assert_async().await;
    destroyed.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn waiting_for_agent_destroy_times_out_without_a_destroy_job() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v2/agents/{}", AGENT_ID).as_str())
        .match_query(Matcher::UrlEncoded("profile".into(), "detailed".into()))
        .with_status(200)
        .with_body(json!({ "id": AGENT_ID, "name": "edge" }).to_string())
        .create_async()
        .await;

    let client = common::client(&server);
    let err = client
        .wait_for_agent_destroy(AGENT_ID, Duration::from_millis(10), Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Timeout(_)));
    assert!(err.to_string().contains("job_pending"));
}

#[tokio::test]
async fn deleting_agent_resources_requires_refresh_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v2/agents/{}/resources", AGENT_ID).as_str())
        .expect(0)
        .create_async()
        .await;

    let client = static_token_client(&server);
    let err = client.delete_agent_resources(AGENT_ID).await.unwrap_err();

    assert!(err.is_auth());
    mock.assert_async().await;
}

// Inventories

#[tokio::test]
async fn creates_inventory_from_ini() {
    let mut server = Server::new_async().await;
    let ini = "[web]\n10.0.0.4\n10.0.0.5\n";
    let mock = server
        .mock("POST", "/v2/inventories")
        .match_body(Matcher::Json(json!({
            "name": "web-hosts",
            "location": "us-south",
            "inventories_ini": ini
        })))
        .with_status(201)
        .with_body(
            json!({ "id": INVENTORY_ID, "name": "web-hosts", "inventories_ini": ini }).to_string(),
        )
        .create_async()
        .await;

    let request = InventoryRequest {
        name: Some("web-hosts".to_string()),
        location: Some("us-south".parse().unwrap()),
        inventories_ini: Some(ini.to_string()),
        ..Default::default()
    };

    let client = common::client(&server);
    let inventory = client.create_inventory(&request).await.unwrap();

    assert_eq!(inventory.inventories_ini.as_deref(), Some(ini));
    mock.assert_async().await;
}

#[tokio::test]
async fn inventory_cannot_mix_ini_and_queries() {
    let server = Server::new_async().await;
    let request = InventoryRequest {
        name: Some("mixed".to_string()),
        inventories_ini: Some("[all]\nhost".to_string()),
        resource_queries: vec!["query-1".to_string()],
        ..Default::default()
    };

    let client = common::client(&server);
    let err = client.create_inventory(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
}

#[tokio::test]
async fn deletes_inventory_with_force() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v2/inventories/{}", INVENTORY_ID).as_str())
        .match_query(Matcher::UrlEncoded("force".into(), "true".into()))
        .with_status(204)
        .create_async()
        .await;

    let client = common::client(&server);
    client
        .delete_inventory(INVENTORY_ID, Some(true), None)
        .await
        .unwrap();
    mock.assert_async().await;
}

// Policies

#[tokio::test]
async fn creates_agent_assignment_policy() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v2/settings/policies")
        .match_body(Matcher::PartialJson(json!({
            "name": "edge-workspaces",
            "policy_kind": "agent_assignment_policy",
            "policy_target": {
                "selector_kind": "ids",
                "selector_ids": ["us-south.workspace.demo.1a2b3c4d"]
            },
            "policy_parameter": {
                "agent_assignment_policy_parameter": {
                    "selector_kind": "ids",
                    "selector_ids": [AGENT_ID]
                }
            }
        })))
        .with_status(201)
        .with_body(json!({ "id": POLICY_ID, "name": "edge-workspaces" }).to_string())
        .create_async()
        .await;

    let request = PolicyRequest {
        name: Some("edge-workspaces".to_string()),
        policy_kind: Some(PolicyKind::AgentAssignmentPolicy),
        policy_target: Some(PolicyTarget::ids(["us-south.workspace.demo.1a2b3c4d"])),
        policy_parameter: Some(PolicyParameter {
            agent_assignment_policy_parameter: Some(PolicyTarget::ids([AGENT_ID])),
        }),
        ..Default::default()
    };

    let client = common::client(&server);
    let policy = client.create_policy(&request).await.unwrap();

    assert_eq!(policy.id, POLICY_ID);
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_policy_target_is_rejected() {
    let server = Server::new_async().await;
    let request = PolicyRequest {
        name: Some("nothing".to_string()),
        policy_kind: Some(PolicyKind::AgentAssignmentPolicy),
        policy_target: Some(PolicyTarget::ids(Vec::<String>::new())),
        ..Default::default()
    };

    let client = common::client(&server);
    let err = client.create_policy(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
}

// Blueprints

#[tokio::test]
async fn blueprint_needs_a_source() {
    let server = Server::new_async().await;
    let request = BlueprintRequest {
        name: Some("stack".to_string()),
        ..Default::default()
    };

    let client = common::client(&server);
    let err = client.create_blueprint(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingParameter("source")));
}

#[tokio::test]
async fn deleting_blueprint_with_resources_sends_refresh_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v2/blueprints/{}", BLUEPRINT_ID).as_str())
        .match_header("refresh_token", common::REFRESH_TOKEN)
        .match_query(Matcher::UrlEncoded("destroy_resources".into(), "true".into()))
        .with_status(202)
        .create_async()
        .await;

    let client = common::client(&server);
    client
        .delete_blueprint(BLUEPRINT_ID, Some(true))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn deleting_blueprint_alone_skips_refresh_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v2/blueprints/{}", BLUEPRINT_ID).as_str())
        .match_header("refresh_token", Matcher::Missing)
        .with_status(204)
        .create_async()
        .await;

    let client = static_token_client(&server);
    client.delete_blueprint(BLUEPRINT_ID, None).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn lists_blueprints_across_pages() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/v2/blueprints")
        .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
        .with_status(200)
        .with_body(
            json!({
                "total_count": 3,
                "offset": 0,
                "limit": 2,
                "blueprints": [{ "id": "bp-1" }, { "id": "bp-2" }]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/v2/blueprints")
        .match_query(Matcher::UrlEncoded("offset".into(), "2".into()))
        .with_status(200)
        .with_body(
            json!({
                "total_count": 3,
                "offset": 2,
                "limit": 2,
                "blueprints": [{ "id": "bp-3" }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);
    let options = ListOptions {
        offset: Some(0),
        limit: Some(2),
        ..ListOptions::default()
    };
    let blueprints = collect_all(options, |opts| {
        let client = &client;
        async move { client.list_blueprints(&opts).await }
    })
    .await
    .unwrap();

    let ids: Vec<_> = blueprints.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["bp-1", "bp-2", "bp-3"]);
    first.assert_async().await;
    second.assert_async().await;
}
