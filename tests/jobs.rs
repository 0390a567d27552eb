//
//  schematics-cli
//  tests/jobs.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

mod common;

use std::time::Duration;

use mockito::{Matcher, Server};
use schematics_cli::api::common::{ListOptions, Region, VariableData};
use schematics_cli::api::v2::{
    CommandName, CommandObject, CreateJobRequest, DeleteJobOptions, JobListScope, JobStatusCode,
    ListJobsOptions,
};
use schematics_cli::api::ApiError;
use serde_json::json;

const JOB_ID: &str = "us-south.JOB.demo.5e6f";
const WS_ID: &str = "us-south.workspace.demo.1a2b3c4d";

fn job_body(status: &str) -> String {
    json!({
        "id": JOB_ID,
        "command_object": "workspace",
        "command_object_id": WS_ID,
        "command_name": "workspace_apply",
        "location": "us-south",
        "status": {
            "workspace_job_status": {
                "workspace_name": "demo",
                "status_code": status,
                "status_message": format!("job is {}", status)
            }
        }
    })
    .to_string()
}

#[tokio::test]
async fn lists_jobs_with_filters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/jobs")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("resource".into(), "workspace".into()),
            Matcher::UrlEncoded("workspace_id".into(), WS_ID.into()),
            Matcher::UrlEncoded("list".into(), "latest".into()),
            Matcher::UrlEncoded("limit".into(), "20".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "total_count": 1,
                "offset": 0,
                "limit": 20,
                "jobs": [{ "id": JOB_ID, "command_name": "workspace_plan" }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);
    let options = ListJobsOptions {
        resource: Some(CommandObject::Workspace),
        workspace_id: Some(WS_ID.to_string()),
        list: Some(JobListScope::Latest),
        paging: ListOptions {
            limit: Some(20),
            ..ListOptions::default()
        },
        ..ListJobsOptions::default()
    };
    let page = client.list_jobs(&options).await.unwrap();

    assert_eq!(page.jobs.len(), 1);
    assert_eq!(page.jobs[0].command_name, Some(CommandName::WorkspacePlan));
    mock.assert_async().await;
}

#[tokio::test]
async fn create_job_sends_refresh_token() {
    let mut server = Server::new_async().await;
    let iam = common::mock_iam(&mut server, 1).await;
    let mock = server
        .mock("POST", "/v2/jobs")
        .match_header("authorization", common::bearer().as_str())
        .match_header("refresh_token", common::REFRESH_TOKEN)
        .match_body(Matcher::PartialJson(json!({
            "command_object": "action",
            "command_object_id": "us-east.ACTION.web.1",
            "command_name": "ansible_playbook_run",
            "command_parameter": "site.yml",
            "inputs": [{ "name": "env", "value": "prod" }]
        })))
        .with_status(201)
        .with_body(job_body("job_pending"))
        .create_async()
        .await;

    let mut request = CreateJobRequest::new(
        CommandObject::Action,
        "us-east.ACTION.web.1",
        CommandName::AnsiblePlaybookRun,
    );
    request.command_parameter = Some("site.yml".to_string());
    request.inputs = vec![VariableData::new("env", "prod")];

    let client = common::iam_client(&server);
    let job = client.create_job(&request).await.unwrap();

    assert_eq!(job.status_code(), Some(JobStatusCode::JobPending));
    iam.assert_async().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn playbook_run_must_target_an_action() {
    let server = Server::new_async().await;
    let request = CreateJobRequest::new(
        CommandObject::Workspace,
        WS_ID,
        CommandName::AnsiblePlaybookRun,
    );

    let client = common::client(&server);
    let err = client.create_job(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
}

#[tokio::test]
async fn delete_job_passes_force_and_propagate() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v2/jobs/{}", JOB_ID).as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("force".into(), "true".into()),
            Matcher::UrlEncoded("propagate".into(), "true".into()),
        ]))
        .with_status(204)
        .create_async()
        .await;

    let client = common::client(&server);
    let options = DeleteJobOptions {
        force: Some(true),
        propagate: Some(true),
    };
    client.delete_job(JOB_ID, &options).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn decodes_job_log() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v2/jobs/{}/logs", JOB_ID).as_str())
        .with_status(200)
        .with_body(
            json!({
                "job_id": JOB_ID,
                "format": "text",
                // "Apply complete!\n"
                "details": "QXBwbHkgY29tcGxldGUhCg=="
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);
    let log = client.get_job_logs(JOB_ID).await.unwrap();
    assert_eq!(log.text(), "Apply complete!\n");
}

#[tokio::test]
async fn wait_for_job_polls_until_terminal() {
    let mut server = Server::new_async().await;
    let path = format!("/v2/jobs/{}", JOB_ID);
    let running = server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_body(job_body("job_in_progress"))
        .expect(2)
        .create_async()
        .await;
    let finished = server
        .mock("GET", path.as_str())
        .with_status(200)
        .with_body(job_body("job_finished"))
        .expect(1)
        .create_async()
        .await;

    let client = common::client(&server);
    let mut seen = Vec::new();
    let job = client
        .wait_for_job_with(
            JOB_ID,
            Duration::from_millis(5),
            Duration::from_secs(5),
            |job| seen.push(job.status_code()),
        )
        .await
        .unwrap();

    assert_eq!(job.status_code(), Some(JobStatusCode::JobFinished));
    assert_eq!(
        seen,
        vec![
            Some(JobStatusCode::JobInProgress),
            Some(JobStatusCode::JobInProgress),
            Some(JobStatusCode::JobFinished)
        ]
    );
    running.assert_async().await;
    finished.assert_async().await;
}

#[tokio::test]
async fn failed_job_is_terminal_but_not_success() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v2/jobs/{}", JOB_ID).as_str())
        .with_status(200)
        .with_body(job_body("job_failed"))
        .create_async()
        .await;

    let client = common::client(&server);
    let job = client
        .wait_for_job(JOB_ID, Duration::from_millis(5), Duration::from_secs(5))
        .await
        .unwrap();

    let code = job.status_code().unwrap();
    assert!(code.is_terminal());
    assert!(!code.is_success());
    assert_eq!(
        job.status.as_ref().and_then(|s| s.message()),
        Some("job is job_failed")
    );
}

#[tokio::test]
async fn wait_for_job_times_out() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", format!("/v2/jobs/{}", JOB_ID).as_str())
        .with_status(200)
        .with_body(job_body("job_in_progress"))
        .create_async()
        .await;

    let client = common::client(&server);
    let err = client
        .wait_for_job(JOB_ID, Duration::from_millis(10), Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Timeout(_)));
}

#[tokio::test]
async fn zero_poll_interval_is_rejected_before_any_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", format!("/v2/jobs/{}", JOB_ID).as_str())
        .with_status(200)
        .with_body(job_body("job_in_progress"))
        .expect(0)
        .create_async()
        .await;

    let client = common::client(&server);
    let err = client
        .wait_for_job(JOB_ID, Duration::ZERO, Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidArgument(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn job_list_tolerates_unknown_locations_and_commands() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/jobs")
        .with_status(200)
        .with_body(
            json!({
                "total_count": 3,
                "offset": 0,
                "limit": 100,
                "jobs": [
                    {
                        "id": JOB_ID,
                        "command_object": "workspace",
                        "command_name": "workspace_plan",
                        "location": "us-south"
                    },
                    {
                        "id": "ca-tor.JOB.demo.9a8b",
                        "command_object": "workspace",
                        "command_name": "workspace_apply",
                        "location": "ca-tor"
                    },
                    {
                        "id": "us-east.JOB.flow.77cc",
                        "command_object": "capsule",
                        "command_name": "workspace_drift_detect",
                        "location": ""
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = common::client(&server);
    let page = client.list_jobs(&ListJobsOptions::default()).await.unwrap();

    assert_eq!(page.jobs.len(), 3);
    assert_eq!(page.jobs[0].location, Some(Region::UsSouth));
    assert_eq!(page.jobs[1].id, "ca-tor.JOB.demo.9a8b");
    assert_eq!(page.jobs[1].location, None);
    assert_eq!(page.jobs[1].command_name, Some(CommandName::WorkspaceApply));
    assert_eq!(page.jobs[2].command_object, None);
    assert_eq!(page.jobs[2].command_name, None);
    assert_eq!(page.jobs[2].location, None);
}
