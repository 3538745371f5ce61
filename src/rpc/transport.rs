// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GraphQL transport.

use async_trait::async_trait;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("http error: {0}")]
    Http(String),

    #[error("graphql error: {0}")]
    Graphql(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Executes one GraphQL document against one endpoint.
///
/// Returns the `data` object of the response.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, endpoint: &str, query: &str, variables: Value)
        -> Result<Value, RpcError>;
}

/// HTTPS transport over reqwest.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(
        &self,
        endpoint: &str,
        query: &str,
        variables: Value,
    ) -> Result<Value, RpcError> {
        let response = self
            .http
            .post(endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http(format!("{endpoint} returned {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RpcError::MalformedResponse(e.to_string()))?;

        into_data(body)
    }
}

/// Split a GraphQL response body into its `data`, or the reported errors.
pub fn into_data(mut body: Value) -> Result<Value, RpcError> {
    if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
        return Err(RpcError::Graphql(errors.to_string()));
    }
    match body.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(RpcError::MalformedResponse("response has no data".into())),
    }
}
