//! Exploration page negotiation and rendering.
//!
//! A GET whose `Accept` header prefers `text/html` over
//! `application/json` receives the interactive playground instead of
//! being executed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_graphql::http::{GraphQLPlaygroundConfig, playground_source};
use http::{HeaderValue, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::accept;
use crate::request::IncomingRequest;
use crate::response::Reply;

/// Passthrough options for the exploration page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaygroundOptions {
    pub title: Option<String>,
    pub settings: BTreeMap<String, Value>,
}

/// Parameters for one render.
#[derive(Debug, Clone, Copy)]
pub struct PlaygroundPage<'a> {
    pub endpoint: &'a str,
    pub subscription_endpoint: Option<&'a str>,
    pub options: &'a PlaygroundOptions,
}

/// Produces the exploration page HTML.
pub trait PlaygroundRenderer: Send + Sync {
    fn render(&self, page: &PlaygroundPage<'_>) -> String;
}

/// Renders GraphQL Playground through `async-graphql`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphQLPlaygroundRenderer;

impl PlaygroundRenderer for GraphQLPlaygroundRenderer {
    fn render(&self, page: &PlaygroundPage<'_>) -> String {
        let mut config = GraphQLPlaygroundConfig::new(page.endpoint);
        if let Some(endpoint) = page.subscription_endpoint {
            config = config.subscription_endpoint(endpoint);
        }
        if let Some(title) = page.options.title.as_deref() {
            config = config.title(title);
        }
        for (name, value) in &page.options.settings {
            match async_graphql::Value::from_json(value.clone()) {
                Ok(value) => config = config.with_setting(name, value),
                Err(e) => warn!(setting = %name, error = %e, "skipping playground setting"),
            }
        }
        playground_source(config)
    }
}

/// Decides whether a request gets the exploration page.
#[derive(Clone)]
pub struct PlaygroundNegotiator {
    endpoint: String,
    subscription_endpoint: Option<String>,
    options: Option<PlaygroundOptions>,
    renderer: Arc<dyn PlaygroundRenderer>,
}

impl PlaygroundNegotiator {
    pub fn new(
        endpoint: impl Into<String>,
        subscription_endpoint: Option<String>,
        options: Option<PlaygroundOptions>,
        renderer: Arc<dyn PlaygroundRenderer>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            subscription_endpoint,
            options,
            renderer,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.options.is_some()
    }

    /// Enabled, a GET, and the client prefers HTML.
    pub fn wants_playground(&self, req: &IncomingRequest) -> bool {
        self.is_enabled() && *req.method() == Method::GET && accept::prefers_html(req.headers())
    }

    /// Render the page when the request wants it; `None` defers to
    /// GraphQL execution.
    pub fn try_render(&self, req: &IncomingRequest) -> Option<Reply> {
        if !self.wants_playground(req) {
            return None;
        }
        let options = self.options.as_ref()?;

        let html = self.renderer.render(&PlaygroundPage {
            endpoint: &self.endpoint,
            subscription_endpoint: self.subscription_endpoint.as_deref(),
            options,
        });
        debug!(endpoint = %self.endpoint, bytes = html.len(), "rendered playground");

        Some(Reply::raw(
            StatusCode::OK,
            HeaderValue::from_static("text/html"),
            html,
        ))
    }
}

impl fmt::Debug for PlaygroundNegotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaygroundNegotiator")
            .field("endpoint", &self.endpoint)
            .field("subscription_endpoint", &self.subscription_endpoint)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
