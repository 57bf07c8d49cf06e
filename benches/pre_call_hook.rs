use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use reasoning_router::config::{CapabilityProfile, RouterConfig};
use reasoning_router::hook::{PreCallHook, RouteObserver};

/// Keeps logging and metrics out of the measurement.
struct Silent;

impl RouteObserver for Silent {}

fn agent_request() -> Value {
    let tools: Vec<Value> = (0..16)
        .map(|i| {
            json!({
                "name": format!("tool_{}", i),
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "minLength": 1},
                        "when": {"type": "string", "format": "date-time"},
                        "items": {"type": "array", "minItems": 1, "items": {"type": "string"}}
                    }
                }
            })
        })
        .collect();
    let messages: Vec<Value> = (0..32)
        .map(|i| {
            json!({
                "role": if i % 2 == 0 { "user" } else { "assistant" },
                "content": [{"type": "text", "text": "lorem ipsum dolor sit amet "}, {"type": "text", "text": "consectetur"}]
            })
        })
        .collect();
    json!({
        "model": "claude-sonnet-4-20250514",
        "stream": true,
        "thinking": {"type": "enabled", "budget_tokens": 12000},
        "system": [{"type": "text", "text": "You are a coding agent."}],
        "messages": messages,
        "tools": tools
    })
}

fn bench_hook(c: &mut Criterion) {
    let request = agent_request();

    for profile in [
        CapabilityProfile::None,
        CapabilityProfile::SchemaOnly,
        CapabilityProfile::SchemaAndFlatten,
    ] {
        let config = RouterConfig {
            capability: profile,
            ..RouterConfig::default()
        };
        let hook = PreCallHook::new(&config).with_observer(std::sync::Arc::new(Silent));
        c.bench_function(&format!("pre_call_hook/{}", profile.as_str()), |b| {
            b.iter(|| hook.apply(black_box(request.clone())))
        });
    }

    let hook = PreCallHook::new(&RouterConfig::default()).with_observer(std::sync::Arc::new(Silent));
    let bypass = json!({"model": "gpt-4o", "messages": []});
    c.bench_function("pre_call_hook/bypass", |b| {
        b.iter(|| hook.apply(black_box(bypass.clone())))
    });
}

criterion_group!(benches, bench_hook);
criterion_main!(benches);
