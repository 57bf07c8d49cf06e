//! Reasoning-strength model router.
//!
//! A pre-call stage for LLM gateways: requests addressed to one configured
//! model are classified by their reasoning hints (`reasoning_effort`,
//! `thinking.budget_tokens`), rewritten to a strength-specific backend model,
//! and optionally reshaped for backends with a restricted payload format.
//!
//! The [`hook::PreCallHook`] is usable on its own; the `reasoning-router`
//! binary wraps it in a small forwarding proxy.

pub mod config;
pub mod hook;
pub mod metrics;
pub mod reasoning;
pub mod router;
pub mod routing;
pub mod sse;
pub mod transform;
pub mod transformer;

pub use config::{CapabilityProfile, Config, RouterConfig};
pub use hook::{PreCallHook, RouteObserver, RouteOutcome};
pub use reasoning::ReasoningStrength;
pub use routing::RoutingTable;
