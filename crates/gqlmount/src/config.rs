//! Mount configuration.
//!
//! [`MountConfig`] is built once when the handler is created and is
//! read-only afterwards. [`MountSettings`] is its TOML file form.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DEFAULT_PATH;
use crate::engine::{OptionsFn, default_options};
use crate::error_mapper::ErrorCallback;
use crate::health::LivenessProbe;
use crate::playground::{GraphQLPlaygroundRenderer, PlaygroundOptions, PlaygroundRenderer};

/// Default request body limit (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Where the liveness route lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTopology {
    /// Mounted as its own route, outside the dispatch chain.
    #[default]
    Standalone,
    /// First route inside the dispatch chain, ahead of the playground.
    Chained,
}

/// How the bridge reads the query payload out of the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryExtraction {
    /// Pass the whole parsed body through; the engine validates its shape.
    #[default]
    Body,
    /// Pull `query`, `variables`, `operationName`, `extensions` out of the
    /// body and reject requests without a query.
    Fields,
}

/// Liveness settings.
#[derive(Clone, Default)]
pub struct HealthCheck {
    pub disabled: bool,
    pub probe: Option<LivenessProbe>,
    pub topology: HealthTopology,
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("disabled", &self.disabled)
            .field("probe", &self.probe.is_some())
            .field("topology", &self.topology)
            .finish()
    }
}

/// Construction-time configuration of a mounted endpoint.
#[derive(Clone)]
pub struct MountConfig {
    pub path: String,
    pub subscriptions_path: Option<String>,
    pub health: HealthCheck,
    pub on_error: Option<ErrorCallback>,
    pub playground: Option<PlaygroundOptions>,
    pub renderer: Arc<dyn PlaygroundRenderer>,
    pub options: OptionsFn,
    pub extraction: QueryExtraction,
    pub body_limit: usize,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            subscriptions_path: None,
            health: HealthCheck::default(),
            on_error: None,
            playground: None,
            renderer: Arc::new(GraphQLPlaygroundRenderer),
            options: default_options(),
            extraction: QueryExtraction::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl MountConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_subscriptions_path(mut self, path: impl Into<String>) -> Self {
        self.subscriptions_path = Some(path.into());
        self
    }

    pub fn with_playground(mut self, options: PlaygroundOptions) -> Self {
        self.playground = Some(options);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn PlaygroundRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn with_liveness_probe(mut self, probe: LivenessProbe) -> Self {
        self.health.probe = Some(probe);
        self
    }

    pub fn with_health_topology(mut self, topology: HealthTopology) -> Self {
        self.health.topology = topology;
        self
    }

    pub fn disable_health_check(mut self) -> Self {
        self.health.disabled = true;
        self
    }

    pub fn with_options(mut self, options: OptionsFn) -> Self {
        self.options = options;
        self
    }

    pub fn with_extraction(mut self, extraction: QueryExtraction) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl fmt::Debug for MountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountConfig")
            .field("path", &self.path)
            .field("subscriptions_path", &self.subscriptions_path)
            .field("health", &self.health)
            .field("on_error", &self.on_error.is_some())
            .field("playground", &self.playground)
            .field("extraction", &self.extraction)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

/// File form of the mount configuration.
///
/// ```toml
/// path = "/graphql"
/// subscriptions_path = "/graphql/ws"
/// disable_health_check = false
/// health_topology = "chained"
/// extraction = "fields"
///
/// [playground]
/// title = "My API"
/// settings = { "editor.theme" = "light" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountSettings {
    pub path: String,
    pub subscriptions_path: Option<String>,
    pub disable_health_check: bool,
    pub health_topology: HealthTopology,
    pub extraction: QueryExtraction,
    pub body_limit: usize,
    pub playground: Option<PlaygroundSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaygroundSettings {
    pub enabled: bool,
    pub title: Option<String>,
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Default for PlaygroundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            title: None,
            settings: BTreeMap::new(),
        }
    }
}

impl Default for MountSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            subscriptions_path: None,
            disable_health_check: false,
            health_topology: HealthTopology::default(),
            extraction: QueryExtraction::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            playground: Some(PlaygroundSettings::default()),
        }
    }
}

impl MountSettings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let settings: MountSettings = toml::from_str(content)?;
        if !settings.path.starts_with('/') {
            anyhow::bail!("mount path must start with '/': {}", settings.path);
        }
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Build a [`MountConfig`]. Callbacks (probe, error handler,
    /// options resolver) are attached afterwards with the `with_*`
    /// builders.
    pub fn into_config(self) -> MountConfig {
        let playground = self
            .playground
            .filter(|p| p.enabled)
            .map(|p| PlaygroundOptions {
                title: p.title,
                settings: p.settings,
            });

        MountConfig {
            path: self.path,
            subscriptions_path: self.subscriptions_path,
            health: HealthCheck {
                disabled: self.disable_health_check,
                probe: None,
                topology: self.health_topology,
            },
            playground,
            extraction: self.extraction,
            body_limit: self.body_limit,
            ..MountConfig::default()
        }
    }
}
