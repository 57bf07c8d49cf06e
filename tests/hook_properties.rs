//! Behavioural properties of the pre-call hook through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use reasoning_router::config::{CapabilityProfile, RouterConfig};
use reasoning_router::hook::{PreCallHook, RouteObserver, RouteOutcome};
use reasoning_router::reasoning::ReasoningStrength;
use reasoning_router::routing::RoutingTable;
use reasoning_router::transform::sanitize_schema;

const ROUTED: &str = "claude-sonnet-4-20250514";

#[derive(Default)]
struct CountingObserver {
    rewrites: AtomicUsize,
    self_routes: AtomicUsize,
    bypasses: AtomicUsize,
}

impl RouteObserver for CountingObserver {
    fn on_bypass(&self, _model: Option<&str>) {
        self.bypasses.fetch_add(1, Ordering::Relaxed);
    }

    fn on_rewrite(&self, _strength: ReasoningStrength, _from: &str, _to: &str) {
        self.rewrites.fetch_add(1, Ordering::Relaxed);
    }

    fn on_self_route(&self, _strength: ReasoningStrength, _model: &str) {
        self.self_routes.fetch_add(1, Ordering::Relaxed);
    }
}

fn hook(config: RouterConfig) -> (PreCallHook, Arc<CountingObserver>) {
    let observer = Arc::new(CountingObserver::default());
    (
        PreCallHook::new(&config).with_observer(observer.clone()),
        observer,
    )
}

fn with_budget(budget: u64) -> Value {
    json!({
        "model": ROUTED,
        "thinking": {"type": "enabled", "budget_tokens": budget}
    })
}

#[test]
fn identity_for_every_other_model() {
    let (hook, observer) = hook(RouterConfig {
        capability: CapabilityProfile::SchemaAndFlatten,
        ..RouterConfig::default()
    });

    for model in ["gpt-4o", "claude-opus-4", "high-reasoning", "", "CLAUDE-SONNET-4-20250514"] {
        let request = json!({
            "model": model,
            "reasoning_effort": "high",
            "stream": true,
            "system": [{"type": "text", "text": "s"}]
        });
        assert_eq!(hook.apply(request.clone()), request, "model {:?}", model);
    }
    assert_eq!(observer.bypasses.load(Ordering::Relaxed), 5);
    assert_eq!(observer.rewrites.load(Ordering::Relaxed), 0);
}

#[test]
fn threshold_boundaries_select_expected_models() {
    let (hook, _) = hook(RouterConfig::default());
    for (budget, model) in [
        (1u64, "low-reasoning"),
        (7999, "low-reasoning"),
        (8000, "medium-reasoning"),
        (15999, "medium-reasoning"),
        (16000, "high-reasoning"),
        (128000, "high-reasoning"),
    ] {
        let out = hook.apply(with_budget(budget));
        assert_eq!(out["model"], model, "budget {}", budget);
    }
}

#[test]
fn no_signal_routes_to_none_entry() {
    let table = RoutingTable {
        none: "haiku".to_string(),
        ..RoutingTable::default()
    };
    let (hook, _) = hook(RouterConfig {
        models: table,
        ..RouterConfig::default()
    });

    let (out, outcome) = hook.evaluate(json!({"model": ROUTED, "max_tokens": 10}));
    assert_eq!(out["model"], "haiku");
    assert!(matches!(
        outcome,
        RouteOutcome::Rewritten {
            strength: ReasoningStrength::None,
            ..
        }
    ));
}

#[test]
fn sonnet_with_large_budget_routes_high() {
    let (hook, observer) = hook(RouterConfig::default());
    let out = hook.apply(json!({
        "model": "claude-sonnet-4-20250514",
        "thinking": {"type": "enabled", "budget_tokens": 20000}
    }));
    assert_eq!(
        out,
        json!({
            "model": "high-reasoning",
            "thinking": {"type": "enabled", "budget_tokens": 20000}
        })
    );
    assert_eq!(observer.rewrites.load(Ordering::Relaxed), 1);
}

#[test]
fn self_route_fires_exactly_one_warning() {
    let table = RoutingTable {
        high: ROUTED.to_string(),
        ..RoutingTable::default()
    };
    let (hook, observer) = hook(RouterConfig {
        models: table,
        ..RouterConfig::default()
    });

    let request = with_budget(30000);
    let out = hook.apply(request.clone());
    assert_eq!(out, request);
    assert_eq!(observer.self_routes.load(Ordering::Relaxed), 1);
    assert_eq!(observer.rewrites.load(Ordering::Relaxed), 0);
}

#[test]
fn sanitizer_is_idempotent_on_tool_schema() {
    let schema = json!({
        "type": "object",
        "properties": {
            "path": {"type": "string", "minLength": 1, "description": "File path"},
            "edits": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "old": {"type": "string", "minLength": 1},
                        "at": {"type": "string", "format": "date-time"}
                    },
                    "required": ["old"]
                }
            }
        },
        "required": ["path", "edits"]
    });
    let once = sanitize_schema(&schema);
    assert_eq!(sanitize_schema(&once), once);
    assert_eq!(once["required"], json!(["path", "edits"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_match_sequential() {
    let (hook, observer) = hook(RouterConfig {
        capability: CapabilityProfile::SchemaAndFlatten,
        ..RouterConfig::default()
    });
    let hook = Arc::new(hook);

    let requests: Vec<Value> = (0..256u64)
        .map(|i| match i % 4 {
            0 => json!({"model": "other", "stream": true}),
            1 => with_budget(i * 100),
            2 => json!({"model": ROUTED, "reasoning_effort": "medium", "stream": true,
                        "messages": [{"role": "user", "content": [{"type": "text", "text": "x"}]}]}),
            _ => json!({"model": ROUTED}),
        })
        .collect();

    let expected: Vec<Value> = requests.iter().map(|r| hook.apply(r.clone())).collect();

    let mut handles = Vec::new();
    for request in requests {
        let hook = hook.clone();
        handles.push(tokio::spawn(async move { hook.apply(request) }));
    }

    let mut actual = Vec::new();
    for handle in handles {
        actual.push(handle.await.unwrap());
    }

    assert_eq!(actual, expected);
    // Two passes (sequential + concurrent), 64 bypasses each.
    assert_eq!(observer.bypasses.load(Ordering::Relaxed), 128);
    assert_eq!(observer.rewrites.load(Ordering::Relaxed), 384);
}
