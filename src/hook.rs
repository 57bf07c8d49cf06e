//! Pre-call hook: the single entry point the gateway runs for every request.
//!
//! ```text
//! model == routed? ──no──> Bypass (unchanged)
//!        │yes
//!   Classify ─> Select ──self-route──> Bypass (unchanged, warning)
//!                  │route
//!                Adapt ─> Rewrite model
//! ```
//!
//! Adaptation never touches `model`, `reasoning_effort` or `thinking`, so
//! classifying before adapting gives the same result as the reverse order and
//! lets a self-route trip return the request exactly as received.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RouterConfig;
use crate::metrics;
use crate::reasoning::{classify, ReasoningStrength};
use crate::routing::{RoutingTable, Selection};
use crate::transformer::RequestAdapter;

/// What the hook did with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Not addressed to the routed model; returned untouched.
    Bypass,
    /// The selected target equals the request's own model; returned untouched.
    SelfRoute {
        strength: ReasoningStrength,
        model: String,
    },
    /// Model rewritten (and payload adapted for the backend profile).
    Rewritten {
        strength: ReasoningStrength,
        from: String,
        to: String,
    },
}

/// Receives routing events. Implementations must not block.
pub trait RouteObserver: Send + Sync {
    fn on_bypass(&self, model: Option<&str>) {
        let _ = model;
    }

    fn on_rewrite(&self, strength: ReasoningStrength, from: &str, to: &str) {
        let _ = (strength, from, to);
    }

    fn on_self_route(&self, strength: ReasoningStrength, model: &str) {
        let _ = (strength, model);
    }
}

/// Default observer: `tracing` events plus prometheus counters.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver;

impl RouteObserver for TracingObserver {
    fn on_bypass(&self, model: Option<&str>) {
        debug!(model = model.unwrap_or("unknown"), "not a routed model, passing through");
        metrics::record_bypass();
    }

    fn on_rewrite(&self, strength: ReasoningStrength, from: &str, to: &str) {
        info!(strength = %strength, from, to, "routed by reasoning strength");
        metrics::record_decision(strength);
    }

    fn on_self_route(&self, strength: ReasoningStrength, model: &str) {
        warn!(
            strength = %strength,
            model,
            "route target equals request model, leaving request unchanged"
        );
        metrics::record_self_route(strength);
    }
}

/// Classifies, selects and adapts requests addressed to the routed model.
///
/// Immutable after construction; share it as `Arc<PreCallHook>`.
pub struct PreCallHook {
    routed_model: String,
    table: RoutingTable,
    adapter: RequestAdapter,
    observer: Arc<dyn RouteObserver>,
}

impl PreCallHook {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            routed_model: config.routed_model.clone(),
            table: config.models.clone(),
            adapter: RequestAdapter::new(config.capability),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RouteObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn routed_model(&self) -> &str {
        &self.routed_model
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn adapter(&self) -> &RequestAdapter {
        &self.adapter
    }

    /// Run the hook and return the outgoing request.
    pub fn apply(&self, request: Value) -> Value {
        self.evaluate(request).0
    }

    /// Run the hook, returning the outgoing request and the decision taken.
    pub fn evaluate(&self, request: Value) -> (Value, RouteOutcome) {
        let current = match request.get("model").and_then(Value::as_str) {
            Some(model) if model == self.routed_model => model.to_string(),
            other => {
                self.observer.on_bypass(other);
                return (request, RouteOutcome::Bypass);
            }
        };

        let strength = classify(&request);

        let target = match self.table.select(strength, &current) {
            Selection::Route(target) => target.to_string(),
            Selection::SelfRoute(model) => {
                self.observer.on_self_route(strength, model);
                let outcome = RouteOutcome::SelfRoute {
                    strength,
                    model: current,
                };
                return (request, outcome);
            }
        };

        let mut request = self.adapter.adapt(request);
        if let Some(request_obj) = request.as_object_mut() {
            request_obj.insert("model".to_string(), Value::String(target.clone()));
        }

        self.observer.on_rewrite(strength, &current, &target);
        (
            request,
            RouteOutcome::Rewritten {
                strength,
                from: current,
                to: target,
            },
        )
    }
}

impl std::fmt::Debug for PreCallHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreCallHook")
            .field("routed_model", &self.routed_model)
            .field("table", &self.table)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}
