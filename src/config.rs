use anyhow::{Context, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::sync::Arc;
use tracing::warn;

use crate::reasoning::ReasoningStrength;
use crate::routing::RoutingTable;

/// Payload constraints of the backend behind the routed models.
///
/// Replaces the historical pair of flags (strict-schema backend, rich-content
/// support); the fourth combination of those flags was unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityProfile {
    /// Backend accepts requests as sent.
    #[default]
    None,
    /// Backend rejects some JSON-schema keywords in tool definitions.
    SchemaOnly,
    /// Backend also needs plain-text content and non-streaming calls.
    SchemaAndFlatten,
}

impl CapabilityProfile {
    /// Map the legacy flag pair onto a profile.
    pub fn from_flags(strict_schema: bool, rich_content: bool) -> Self {
        match (strict_schema, rich_content) {
            (false, _) => Self::None,
            (true, true) => Self::SchemaOnly,
            (true, false) => Self::SchemaAndFlatten,
        }
    }

    pub fn sanitizes_schemas(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn flattens_content(&self) -> bool {
        matches!(self, Self::SchemaAndFlatten)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SchemaOnly => "schema-only",
            Self::SchemaAndFlatten => "schema-and-flatten",
        }
    }
}

impl<'de> Deserialize<'de> for CapabilityProfile {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ProfileVisitor;

        impl<'de> Visitor<'de> for ProfileVisitor {
            type Value = CapabilityProfile;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(
                    r#""none", "schema-only", "schema-and-flatten" or {"strictSchema": bool, "richContent": bool}"#,
                )
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                match v {
                    "none" => Ok(CapabilityProfile::None),
                    "schema-only" => Ok(CapabilityProfile::SchemaOnly),
                    "schema-and-flatten" => Ok(CapabilityProfile::SchemaAndFlatten),
                    other => Err(de::Error::unknown_variant(
                        other,
                        &["none", "schema-only", "schema-and-flatten"],
                    )),
                }
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut strict_schema = false;
                let mut rich_content = false;
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "strictSchema" => strict_schema = map.next_value()?,
                        "richContent" => rich_content = map.next_value()?,
                        other => {
                            return Err(de::Error::unknown_field(
                                other,
                                &["strictSchema", "richContent"],
                            ))
                        }
                    }
                }
                Ok(CapabilityProfile::from_flags(strict_schema, rich_content))
            }
        }

        deserializer.deserialize_any(ProfileVisitor)
    }
}

/// Routing section: which model triggers classification and where each
/// strength goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_routed_model")]
    #[serde(rename = "routedModel")]
    pub routed_model: String,

    #[serde(default)]
    pub models: RoutingTable,

    #[serde(default)]
    pub capability: CapabilityProfile,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            routed_model: default_routed_model(),
            models: RoutingTable::default(),
            capability: CapabilityProfile::default(),
        }
    }
}

/// Gateway the rewritten requests are forwarded to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub api_base_url: String,

    /// Replaces the client's `authorization` header when set.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Parsed JSON configuration (deserializable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    #[serde(rename = "Router")]
    pub router: RouterConfig,

    #[serde(rename = "Upstream")]
    pub upstream: UpstreamConfig,

    #[serde(default = "default_port")]
    #[serde(rename = "PORT")]
    pub port: u16,

    #[serde(default = "default_host")]
    #[serde(rename = "HOST")]
    pub host: String,

    #[serde(default = "default_timeout")]
    #[serde(rename = "API_TIMEOUT_MS")]
    pub api_timeout_ms: u64,

    /// Maximum number of idle connections per host in the shared HTTP pool.
    #[serde(default = "default_pool_max_idle_per_host")]
    #[serde(rename = "POOL_MAX_IDLE_PER_HOST")]
    pub pool_max_idle_per_host: usize,

    /// Idle connection timeout in milliseconds (0 = no timeout).
    #[serde(default = "default_pool_idle_timeout_ms")]
    #[serde(rename = "POOL_IDLE_TIMEOUT_MS")]
    pub pool_idle_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("routed model identifier must not be empty")]
    EmptyRoutedModel,
    #[error("model for {strength} reasoning must not be empty")]
    EmptyRouteTarget { strength: ReasoningStrength },
    #[error("upstream api_base_url must start with http:// or https://, got {url:?}")]
    InvalidUpstreamUrl { url: String },
}

/// Command-line / environment overrides applied once after the file is parsed.
#[derive(Debug, Clone, Default)]
pub struct RouteOverrides {
    pub routed_model: Option<String>,
    pub none_model: Option<String>,
    pub low_model: Option<String>,
    pub medium_model: Option<String>,
    pub high_model: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl RouteOverrides {
    pub fn apply(&self, file: &mut ConfigFile) {
        if let Some(model) = &self.routed_model {
            file.router.routed_model = model.clone();
        }
        for (strength, model) in [
            (ReasoningStrength::None, &self.none_model),
            (ReasoningStrength::Low, &self.low_model),
            (ReasoningStrength::Medium, &self.medium_model),
            (ReasoningStrength::High, &self.high_model),
        ] {
            if let Some(model) = model {
                file.router.models.set(strength, model.clone());
            }
        }
        if let Some(host) = &self.host {
            file.host = host.clone();
        }
        if let Some(port) = self.port {
            file.port = port;
        }
    }
}

impl ConfigFile {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.router.routed_model.trim().is_empty() {
            return Err(ConfigError::EmptyRoutedModel);
        }
        for (strength, model) in self.router.models.entries() {
            if model.trim().is_empty() {
                return Err(ConfigError::EmptyRouteTarget { strength });
            }
        }
        let url = &self.upstream.api_base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUpstreamUrl { url: url.clone() });
        }
        Ok(())
    }

    /// Strengths whose target is the routed model itself. Every request of
    /// such a strength trips the self-route guard.
    pub fn self_routed_strengths(&self) -> Vec<ReasoningStrength> {
        self.router
            .models
            .entries()
            .filter(|(_, model)| *model == self.router.routed_model)
            .map(|(strength, _)| strength)
            .collect()
    }
}

/// Runtime configuration shared across all handlers via Axum state.
/// Wraps the parsed config plus a shared reqwest::Client connection pool.
#[derive(Debug, Clone)]
pub struct Config {
    inner: Arc<ConfigInner>,
}

#[derive(Debug)]
struct ConfigInner {
    file: ConfigFile,
    http_client: reqwest::Client,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        Self::from_file_with_overrides(path, &RouteOverrides::default())
    }

    pub fn from_file_with_overrides(path: &str, overrides: &RouteOverrides) -> Result<Self> {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;
        let mut file: ConfigFile =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        overrides.apply(&mut file);
        Self::from_config_file(file)
    }

    /// Validate `file` and build the shared HTTP client.
    pub fn from_config_file(file: ConfigFile) -> Result<Self> {
        file.validate().context("Invalid configuration")?;

        for strength in file.self_routed_strengths() {
            warn!(
                strength = %strength,
                model = %file.router.routed_model,
                "route target equals the routed model; these requests will pass through unchanged"
            );
        }

        // Build a single shared reqwest::Client with a properly-sized connection pool.
        let mut client_builder = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(file.api_timeout_ms))
            .pool_max_idle_per_host(file.pool_max_idle_per_host)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .tcp_nodelay(true);

        if file.pool_idle_timeout_ms > 0 {
            client_builder = client_builder
                .pool_idle_timeout(std::time::Duration::from_millis(file.pool_idle_timeout_ms));
        }

        let http_client = client_builder.build()?;

        Ok(Config {
            inner: Arc::new(ConfigInner { file, http_client }),
        })
    }

    pub fn router(&self) -> &RouterConfig {
        &self.inner.file.router
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.inner.file.upstream
    }

    pub fn host(&self) -> &str {
        &self.inner.file.host
    }

    pub fn port(&self) -> u16 {
        self.inner.file.port
    }

    pub fn api_timeout_ms(&self) -> u64 {
        self.inner.file.api_timeout_ms
    }

    /// Get the shared HTTP client. One pool for all requests.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.inner.http_client
    }

    /// Full upstream URL for an inbound path such as `/v1/messages`.
    pub fn upstream_url(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.upstream().api_base_url.trim_end_matches('/'),
            path
        )
    }
}

fn default_routed_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_port() -> u16 {
    3456
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_timeout() -> u64 {
    600000 // 10 minutes
}

fn default_pool_max_idle_per_host() -> usize {
    64
}

fn default_pool_idle_timeout_ms() -> u64 {
    90000 // 90 seconds
}
