//! Request transformers for capability-restricted backends.
//!
//! A [`RequestAdapter`] is a [`TransformerChain`] chosen by the configured
//! [`CapabilityProfile`]. Chains are built once at startup and shared by
//! every request.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::config::CapabilityProfile;
use crate::transform::content::FlattenContentTransformer;
use crate::transform::schema::SchemaSanitizeTransformer;

// ============================================================================
// Transformer Trait
// ============================================================================

/// A single request rewrite step.
///
/// Transformers never fail: shapes they do not understand are passed
/// through unchanged.
pub trait Transformer: Send + Sync {
    /// Rewrite an outgoing request body.
    fn transform_request(&self, request: Value) -> Value {
        request
    }

    /// Get the transformer's name for logging and debugging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Forces `stream: false` for backends that cannot stream.
#[derive(Debug, Clone, Default)]
pub struct DisableStreamTransformer;

impl Transformer for DisableStreamTransformer {
    fn name(&self) -> &str {
        "disable-stream"
    }

    fn transform_request(&self, mut request: Value) -> Value {
        if let Some(request_obj) = request.as_object_mut() {
            request_obj.insert("stream".to_string(), Value::Bool(false));
        }
        request
    }
}

// ============================================================================
// Transformer Chain
// ============================================================================

/// A chain of transformers applied in sequence.
#[derive(Clone, Default)]
pub struct TransformerChain {
    transformers: Vec<Arc<dyn Transformer>>,
}

impl TransformerChain {
    /// Create a new empty transformer chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transformer to the chain.
    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Apply all transformers in the chain to a request.
    pub fn apply_request(&self, mut request: Value) -> Value {
        for transformer in &self.transformers {
            debug!(name = %transformer.name(), "applying request transformer");
            request = transformer.transform_request(request);
            trace!(after = %request, "request after transformation");
        }
        request
    }

    /// Transformer names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl std::fmt::Debug for TransformerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ============================================================================
// Request Adapter
// ============================================================================

/// Payload adaptation for the configured backend capability profile.
///
/// | profile              | chain                                              |
/// |----------------------|----------------------------------------------------|
/// | `None`               | (empty)                                            |
/// | `SchemaOnly`         | `schema-sanitize`                                  |
/// | `SchemaAndFlatten`   | `schema-sanitize`, `disable-stream`, `flatten-content` |
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    profile: CapabilityProfile,
    chain: TransformerChain,
}

impl RequestAdapter {
    pub fn new(profile: CapabilityProfile) -> Self {
        let mut chain = TransformerChain::new();
        if profile.sanitizes_schemas() {
            chain = chain.with_transformer(Arc::new(SchemaSanitizeTransformer));
        }
        if profile.flattens_content() {
            chain = chain
                .with_transformer(Arc::new(DisableStreamTransformer))
                .with_transformer(Arc::new(FlattenContentTransformer));
        }
        Self { profile, chain }
    }

    pub fn profile(&self) -> CapabilityProfile {
        self.profile
    }

    /// True when adaptation leaves every request untouched.
    pub fn is_passthrough(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn chain(&self) -> &TransformerChain {
        &self.chain
    }

    pub fn adapt(&self, request: Value) -> Value {
        if self.is_passthrough() {
            return request;
        }
        self.chain.apply_request(request)
    }
}

// ============================================================================
// Tests
// ============================================================================
