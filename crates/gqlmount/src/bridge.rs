//! GraphQL execution bridge.
//!
//! Extracts the query payload from the request, calls the execution
//! engine and turns its output into a [`Reply`]. The bridge never writes
//! to the response: failures come back as [`ExecutionError`] and the
//! dispatcher decides how they are written.

use std::sync::Arc;

use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::QueryExtraction;
use crate::engine::{ExecutionCall, ExecutionEngine, OptionsFn, OptionsResolver};
use crate::error::ExecutionError;
use crate::request::IncomingRequest;
use crate::response::Reply;

/// Normalized single operation, as produced by [`QueryExtraction::Fields`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

pub struct GraphQLBridge {
    engine: Arc<dyn ExecutionEngine>,
    options: OptionsFn,
    extraction: QueryExtraction,
}

impl GraphQLBridge {
    pub fn new(engine: Arc<dyn ExecutionEngine>, options: OptionsFn, extraction: QueryExtraction) -> Self {
        Self {
            engine,
            options,
            extraction,
        }
    }

    /// Execute the request's operation.
    pub async fn execute(&self, req: &IncomingRequest) -> Result<Reply, ExecutionError> {
        let method = req.method();
        if *method != Method::GET && *method != Method::POST {
            return Err(ExecutionError::new("GraphQL only supports GET and POST requests.")
                .with_name("MethodNotAllowedError")
                .with_status(StatusCode::METHOD_NOT_ALLOWED.as_u16())
                .with_header(ALLOW, HeaderValue::from_static("GET, POST")));
        }

        let query = extract_query(req, self.extraction)?;
        debug!(%method, path = req.path(), extraction = ?self.extraction, "executing graphql request");

        let call = ExecutionCall {
            method: method.clone(),
            options: OptionsResolver::new(self.options.clone(), req.descriptor()),
            query,
            request: req.descriptor(),
        };
        let output = self.engine.execute(call).await?;

        Ok(Reply::json(StatusCode::OK, output.body).with_headers(output.headers))
    }
}

/// The query payload for `req` under the given extraction policy.
///
/// GET requests carry their payload in the query string; everything else
/// uses the parsed body.
pub fn extract_query(req: &IncomingRequest, extraction: QueryExtraction) -> Result<Value, ExecutionError> {
    let payload = if *req.method() == Method::GET {
        query_string_payload(req.query_string().unwrap_or(""))?
    } else {
        req.body().clone()
    };

    match extraction {
        QueryExtraction::Body => Ok(payload),
        QueryExtraction::Fields => normalize(payload, req.method()),
    }
}

fn query_string_payload(query: &str) -> Result<Value, ExecutionError> {
    let mut fields = Map::new();
    for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = match &*name {
            "variables" => parse_json_param(&value, "Variables are invalid JSON.")?,
            "extensions" => parse_json_param(&value, "Extensions are invalid JSON.")?,
            _ => Value::String(value.into_owned()),
        };
        fields.insert(name.into_owned(), value);
    }
    if fields.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Object(fields))
}

fn parse_json_param(raw: &str, message: &str) -> Result<Value, ExecutionError> {
    serde_json::from_str(raw).map_err(|_| bad_request(message))
}

fn normalize(payload: Value, method: &Method) -> Result<Value, ExecutionError> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .map(|item| normalize_one(item, method).and_then(to_value))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => normalize_one(other, method).and_then(to_value),
    }
}

fn normalize_one(payload: Value, method: &Method) -> Result<GraphQLPayload, ExecutionError> {
    let Value::Object(mut fields) = payload else {
        return Err(missing_query(method));
    };

    let extensions = match fields.remove("extensions") {
        Some(Value::String(raw)) => Some(parse_json_param(&raw, "Extensions are invalid JSON.")?),
        Some(Value::Null) | None => None,
        Some(other) => Some(other),
    };
    let variables = match fields.remove("variables") {
        Some(Value::String(raw)) => Some(parse_json_param(&raw, "Variables are invalid JSON.")?),
        Some(Value::Null) | None => None,
        Some(other) => Some(other),
    };
    let query = match fields.remove("query") {
        Some(Value::String(query)) if !query.is_empty() => Some(query),
        _ => None,
    };
    let operation_name = match fields.remove("operationName") {
        Some(Value::String(name)) => Some(name),
        _ => None,
    };

    let persisted = extensions
        .as_ref()
        .is_some_and(|e| e.get("persistedQuery").is_some());
    if query.is_none() && !persisted {
        return Err(missing_query(method));
    }

    Ok(GraphQLPayload {
        query,
        operation_name,
        variables,
        extensions,
    })
}

fn to_value(payload: GraphQLPayload) -> Result<Value, ExecutionError> {
    serde_json::to_value(payload).map_err(|e| ExecutionError::new(e.to_string()))
}

fn missing_query(method: &Method) -> ExecutionError {
    if *method == Method::GET {
        bad_request("GET query missing.")
    } else {
        bad_request("POST body missing.")
    }
}

fn bad_request(message: &str) -> ExecutionError {
    ExecutionError::new(message)
        .with_name("BadRequestError")
        .with_status(StatusCode::BAD_REQUEST.as_u16())
}
