//
//  schematics-cli
//  tests/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mockito::{Mock, Server};
use schematics_cli::api::{RetryPolicy, SchematicsClient};
use schematics_cli::auth::{BearerTokenAuthenticator, IamAuthenticator};

pub const ACCESS_TOKEN: &str = "test-access-token";
pub const REFRESH_TOKEN: &str = "test-refresh-token";

/// Short delays so retry tests finish quickly.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        retry_interval: Duration::from_millis(5),
        max_retry_interval: Duration::from_millis(20),
    }
}

/// A client against the mock server with a fixed bearer token.
pub fn client(server: &Server) -> SchematicsClient {
    SchematicsClient::with_endpoint(&server.url())
        .unwrap()
        .with_retry_policy(fast_retry())
        .with_auth(Arc::new(
            BearerTokenAuthenticator::new(ACCESS_TOKEN).with_refresh_token(REFRESH_TOKEN),
        ))
}

/// A client that exchanges an API key at the mock server's IAM endpoint.
pub fn iam_client(server: &Server) -> SchematicsClient {
    let auth = IamAuthenticator::with_endpoint("test-api-key", &server.url()).unwrap();
    SchematicsClient::with_endpoint(&server.url())
        .unwrap()
        .with_retry_policy(fast_retry())
        .with_auth(Arc::new(auth))
}

/// Mocks the IAM token exchange, expected exactly `hits` times.
pub async fn mock_iam(server: &mut Server, hits: usize) -> Mock {
    server
        .mock("POST", "/identity/token")
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "urn:ibm:params:oauth:grant-type:apikey".into(),
            ),
            mockito::Matcher::UrlEncoded("apikey".into(), "test-api-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "access_token": ACCESS_TOKEN,
                "refresh_token": REFRESH_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

pub fn bearer() -> String {
    format!("Bearer {}", ACCESS_TOKEN)
}
