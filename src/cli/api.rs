//
//  schematics-cli
//  cli/api.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Direct API access command
//!
//! Sends an authenticated request to any Schematics endpoint. Requests go
//! through the same client as every other command, so IAM token handling,
//! retries and region routing for resource IDs all apply.
//!
//! ## Examples
//!
//! ```bash
//! # Read a workspace
//! sch api /v1/workspaces/us-south.workspace.demo.1a2b
//!
//! # Query parameters, inline or with -q
//! sch api "/v2/jobs?resource=workspace" -q limit=10
//!
//! # Create an inventory with typed fields
//! sch api -X POST /v2/inventories -F name=hosts -F location=us-south
//!
//! # Send a request document
//! sch api -X PATCH /v2/actions/us-east.ACTION.web.1 --input patch.json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use reqwest::Method;
use serde_json::{Map, Value};

use crate::api::common::Region;
use crate::api::ApiRequest;
use crate::util::{parse_key_value, read_document};

use super::GlobalOptions;

/// Make an authenticated API request
#[derive(Args, Debug)]
pub struct ApiCommand {
    /// API path, for example /v2/jobs
    pub endpoint: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// Request header as 'Name: Value' (repeatable)
    #[arg(long, short = 'H')]
    pub header: Vec<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(long, short = 'q')]
    pub query: Vec<String>,

    /// Body field as key=value; numbers, booleans, null and JSON are typed,
    /// dots in the key nest objects (repeatable)
    #[arg(long, short = 'F', conflicts_with = "input")]
    pub field: Vec<String>,

    /// Body field kept as a string (repeatable)
    #[arg(long, conflicts_with = "input")]
    pub raw_field: Vec<String>,

    /// JSON or YAML request body file ('-' for stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print nothing on success
    #[arg(long)]
    pub silent: bool,
}

impl ApiCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let config = global.load_config()?;
        let request = self.build_request()?;

        let mut client = global.client(&config)?;
        if let Some(id) = self.resource_id() {
            client = client.for_resource(id);
        }
        tracing::debug!(method = %request.method(), path = %request.path(), "raw api request");

        let body = client.send_text(request).await?;
        if self.silent || body.trim().is_empty() {
            return Ok(());
        }

        let writer = global.writer(&config);
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => writer.write_value(&value),
            Err(_) => {
                println!("{}", body);
                Ok(())
            }
        }
    }

    fn build_request(&self) -> Result<ApiRequest> {
        let method = parse_method(&self.method)?;
        let (path, inline_query) = match self.endpoint.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.endpoint.as_str(), None),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            bail!("Endpoint '{}' has no path", self.endpoint);
        }
        let mut request = ApiRequest::new(method, &segments);

        if let Some(query) = inline_query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                request = request.query(&key, value);
            }
        }
        for pair in &self.query {
            let (key, value) = parse_key_value(pair)?;
            request = request.query(&key, value);
        }
        for header in &self.header {
            let (name, value) = header
                .split_once(':')
                .with_context(|| format!("expected 'Name: Value', got '{}'", header))?;
            request = request.header(name.trim(), value.trim());
        }

        if let Some(body) = self.build_body()? {
            request = request.json(&body)?;
        }
        Ok(request)
    }

    fn build_body(&self) -> Result<Option<Value>> {
        if let Some(path) = &self.input {
            return Ok(Some(read_document(path)?));
        }
        if self.field.is_empty() && self.raw_field.is_empty() {
            return Ok(None);
        }

        let mut body = Map::new();
        for field in &self.field {
            let (key, value) = parse_key_value(field)?;
            insert_nested(&mut body, &key, typed_value(&value))?;
        }
        for field in &self.raw_field {
            let (key, value) = parse_key_value(field)?;
            insert_nested(&mut body, &key, Value::String(value))?;
        }
        Ok(Some(Value::Object(body)))
    }

    /// First path segment that is a regional resource ID.
    fn resource_id(&self) -> Option<&str> {
        let path = self.endpoint.split('?').next().unwrap_or_default();
        path.split('/')
            .find(|segment| Region::from_resource_id(segment).is_some())
    }
}

fn parse_method(method: &str) -> Result<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        "HEAD" => Ok(Method::HEAD),
        other => bail!("Unsupported HTTP method: {}", other),
    }
}

fn typed_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                return Value::from(n);
            }
            if raw.starts_with('[') || raw.starts_with('{') {
                if let Ok(value) = serde_json::from_str(raw) {
                    return value;
                }
            }
            match raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(raw.to_string()),
            }
        }
    }
}

fn insert_nested(object: &mut Map<String, Value>, key: &str, value: Value) -> Result<()> {
    match key.split_once('.') {
        None => {
            object.insert(key.to_string(), value);
            Ok(())
        }
        Some((head, rest)) => {
            let child = object
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(map) => insert_nested(map, rest, value),
                _ => bail!("Field '{}' is already set to a non-object value", head),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(endpoint: &str) -> ApiCommand {
        ApiCommand {
            endpoint: endpoint.to_string(),
            method: "get".to_string(),
            header: Vec::new(),
            query: Vec::new(),
            field: Vec::new(),
            raw_field: Vec::new(),
            input: None,
            silent: false,
        }
    }

    #[test]
    fn test_path_and_inline_query() {
        let mut cmd = command("/v2/jobs/?resource=workspace");
        cmd.query = vec!["limit=10".to_string()];
        let request = cmd.build_request().unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/v2/jobs");
        assert_eq!(
            request.query_pairs(),
            &[
                ("resource".to_string(), "workspace".to_string()),
                ("limit".to_string(), "10".to_string())
            ]
        );
    }

    #[test]
    fn test_typed_nested_fields() {
        let mut cmd = command("/v2/inventories");
        cmd.method = "POST".to_string();
        cmd.field = vec![
            "name=hosts".to_string(),
            "count=3".to_string(),
            "source.git.branch=main".to_string(),
            "enabled=true".to_string(),
        ];
        cmd.raw_field = vec!["version=10".to_string()];

        let request = cmd.build_request().unwrap();
        let body = request.body().unwrap();
        assert_eq!(body["name"], "hosts");
        assert_eq!(body["count"], 3);
        assert_eq!(body["enabled"], true);
        assert_eq!(body["version"], "10");
        assert_eq!(body["source"]["git"]["branch"], "main");
    }

    #[test]
    fn test_conflicting_nested_field() {
        let mut cmd = command("/v2/actions");
        cmd.field = vec!["name=web".to_string(), "name.first=x".to_string()];
        assert!(cmd.build_request().is_err());
    }

    #[test]
    fn test_resource_id_detection() {
        let cmd = command("/v1/workspaces/eu-de.workspace.demo.77aa/actions");
        assert_eq!(cmd.resource_id(), Some("eu-de.workspace.demo.77aa"));
        assert_eq!(command("/v2/jobs").resource_id(), None);
    }

    #[test]
    fn test_unsupported_method() {
        assert!(parse_method("TRACE").is_err());
    }
}
