//
//  schematics-cli
//  tests/workspaces.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

mod common;

use mockito::{Matcher, Server};
use schematics_cli::api::common::ListOptions;
use schematics_cli::api::v1::{
    CreateWorkspaceRequest, DeleteWorkspaceOptions, TemplateRepoRequest, TemplateSourceDataRequest,
    UpdateWorkspaceRequest, WorkspaceStatusRequest,
};
use schematics_cli::api::ApiError;
use serde_json::json;

const WS_ID: &str = "us-south.workspace.demo.1a2b3c4d";

fn workspace_body(locked: bool) -> String {
    json!({
        "id": WS_ID,
        "name": "demo",
        "location": "us-south",
        "resource_group": "Default",
        "status": "ACTIVE",
        "type": ["terraform_v1.5"],
        "tags": ["env:dev"],
        "template_data": [{ "id": "tmpl-1", "folder": ".", "type": "terraform_v1.5" }],
        "workspace_status": { "frozen": false, "locked": locked }
    })
    .to_string()
}

#[tokio::test]
async fn lists_workspaces_with_paging() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/workspaces")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("offset".into(), "10".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .match_header("authorization", common::bearer().as_str())
        .with_status(200)
        .with_body(
            json!({
                "count": 11,
                "offset": 10,
                "limit": 5,
                "workspaces": [{ "id": WS_ID, "name": "demo" }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);
    let options = ListOptions {
        offset: Some(10),
        limit: Some(5),
        ..ListOptions::default()
    };
    let page = client.list_workspaces(&options).await.unwrap();

    assert_eq!(page.count, Some(11));
    assert_eq!(page.workspaces.len(), 1);
    assert_eq!(page.workspaces[0].name.as_deref(), Some("demo"));
    mock.assert_async().await;
}

#[tokio::test]
async fn rejects_limit_over_maximum_without_a_request() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let client = common::client(&server);
    let options = ListOptions {
        limit: Some(201),
        ..ListOptions::default()
    };
    let err = client.list_workspaces(&options).await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn gets_workspace_and_reads_lock_state() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/workspaces/{}", WS_ID).as_str())
        .with_status(200)
        .with_body(workspace_body(true))
        .create_async()
        .await;

    let client = common::client(&server);
    let workspace = client.get_workspace(WS_ID).await.unwrap();

    assert_eq!(workspace.id, WS_ID);
    assert!(workspace.is_locked());
    assert!(!workspace.is_frozen());
    assert_eq!(workspace.template_id(), Some("tmpl-1"));
}

#[tokio::test]
async fn empty_workspace_id_fails_before_sending() {
    let server = Server::new_async().await;
    let client = common::client(&server);

    let err = client.get_workspace("").await.unwrap_err();
    assert!(matches!(err, ApiError::MissingParameter("w_id")));
}

#[tokio::test]
async fn creates_workspace_with_github_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/workspaces")
        .match_header("X-Github-token", "ghp_secret")
        .match_body(Matcher::PartialJson(json!({
            "name": "demo",
            "type": ["terraform_v1.5"],
            "template_repo": { "url": "https://github.com/acme/infra", "branch": "main" }
        })))
        .with_status(201)
        .with_body(workspace_body(false))
        .create_async()
        .await;

    let request = CreateWorkspaceRequest {
        name: "demo".to_string(),
        location: Some("us-south".to_string()),
        template_type: vec!["terraform_v1.5".to_string()],
        template_data: vec![TemplateSourceDataRequest {
            folder: Some(".".to_string()),
            template_type: Some("terraform_v1.5".to_string()),
            ..Default::default()
        }],
        template_repo: Some(TemplateRepoRequest {
            url: Some("https://github.com/acme/infra".to_string()),
            branch: Some("main".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };

    let client = common::client(&server);
    let workspace = client
        .create_workspace(&request, Some("ghp_secret"))
        .await
        .unwrap();

    assert_eq!(workspace.id, WS_ID);
    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_template_type_is_rejected_locally() {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/v1/workspaces").expect(0).create_async().await;

    let request = CreateWorkspaceRequest {
        name: "demo".to_string(),
        template_type: vec!["terraform_v0.11".to_string()],
        ..Default::default()
    };

    let client = common::client(&server);
    let err = client.create_workspace(&request, None).await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn update_sends_only_set_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", format!("/v1/workspaces/{}", WS_ID).as_str())
        .match_body(Matcher::Json(json!({
            "description": "frozen for release",
            "workspace_status": { "frozen": true }
        })))
        .with_status(200)
        .with_body(workspace_body(false))
        .create_async()
        .await;

    let request = UpdateWorkspaceRequest {
        description: Some("frozen for release".to_string()),
        workspace_status: Some(WorkspaceStatusRequest {
            frozen: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let client = common::client(&server);
    client.update_workspace(WS_ID, &request).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_forwards_refresh_token_and_returns_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v1/workspaces/{}", WS_ID).as_str())
        .match_header("refresh_token", common::REFRESH_TOKEN)
        .match_query(Matcher::UrlEncoded("destroy_resources".into(), "true".into()))
        .with_status(200)
        .with_body("\"Deletion initiated\"")
        .create_async()
        .await;

    let client = common::client(&server);
    let options = DeleteWorkspaceOptions {
        destroy_resources: Some(true),
    };
    let message = client.delete_workspace(WS_ID, &options).await.unwrap();

    assert!(message.contains("Deletion initiated"));
    mock.assert_async().await;
}

#[tokio::test]
async fn apply_and_plan_use_their_methods() {
    let mut server = Server::new_async().await;
    let apply = server
        .mock("PUT", format!("/v1/workspaces/{}/apply", WS_ID).as_str())
        .match_header("refresh_token", common::REFRESH_TOKEN)
        .with_status(202)
        .with_body(json!({ "activityid": "act-apply" }).to_string())
        .create_async()
        .await;
    let plan = server
        .mock("POST", format!("/v1/workspaces/{}/plan", WS_ID).as_str())
        .with_status(202)
        .with_body(json!({ "activityid": "act-plan" }).to_string())
        .create_async()
        .await;

    let client = common::client(&server);
    assert_eq!(client.apply_workspace(WS_ID).await.unwrap().activityid, "act-apply");
    assert_eq!(client.plan_workspace(WS_ID).await.unwrap().activityid, "act-plan");

    apply.assert_async().await;
    plan.assert_async().await;
}

#[tokio::test]
async fn locked_workspace_maps_to_conflict() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", format!("/v1/workspaces/{}/destroy", WS_ID).as_str())
        .with_status(409)
        .with_body(json!({ "message": "Workspace is locked by a running job" }).to_string())
        .create_async()
        .await;

    let client = common::client(&server);
    let err = client.destroy_workspace(WS_ID).await.unwrap_err();

    match err {
        ApiError::Conflict(message) => assert!(message.contains("locked")),
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn reads_outputs_and_inputs() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v1/workspaces/{}/output_values", WS_ID).as_str())
        .with_status(200)
        .with_body(
            json!([{
                "id": "tmpl-1",
                "folder": ".",
                "output_values": [{ "vpc_id": { "value": "r006-1", "type": "string" } }]
            }])
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock(
            "GET",
            format!("/v1/workspaces/{}/template_data/tmpl-1/values", WS_ID).as_str(),
        )
        .with_status(200)
        .with_body(
            json!({
                "variablestore": [
                    { "name": "region", "value": "us-south", "type": "string" },
                    { "name": "api_key", "value": "", "secure": true }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);

    let outputs = client.get_workspace_outputs(WS_ID).await.unwrap();
    assert_eq!(outputs[0].flatten(), vec![("vpc_id".to_string(), json!("r006-1"))]);

    let inputs = client.get_workspace_inputs(WS_ID, "tmpl-1").await.unwrap();
    assert_eq!(inputs.variablestore.len(), 2);
    assert_eq!(inputs.variablestore[0].name.as_deref(), Some("region"));
}
