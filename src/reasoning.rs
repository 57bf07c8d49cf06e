//! Reasoning-strength classification.
//!
//! Reads the two reasoning hints a client may send and collapses them into a
//! single [`ReasoningStrength`]:
//! - `reasoning_effort` (OpenAI style): `"low" | "medium" | "high"`
//! - `thinking` (Anthropic style): `{"type": "enabled", "budget_tokens": N}`
//!
//! `reasoning_effort` wins whenever it is present. Nothing here fails: missing
//! or malformed hints classify as [`ReasoningStrength::None`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Budgets below this are `Low`.
pub const MEDIUM_BUDGET_THRESHOLD: f64 = 8000.0;

/// Budgets at or above this are `High`.
pub const HIGH_BUDGET_THRESHOLD: f64 = 16000.0;

/// Ordered reasoning level: `None < Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningStrength {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl ReasoningStrength {
    pub const ALL: [ReasoningStrength; 4] = [
        ReasoningStrength::None,
        ReasoningStrength::Low,
        ReasoningStrength::Medium,
        ReasoningStrength::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Map an enabled thinking budget onto a level.
    pub fn from_budget(budget_tokens: f64) -> Self {
        if budget_tokens < MEDIUM_BUDGET_THRESHOLD {
            Self::Low
        } else if budget_tokens < HIGH_BUDGET_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for ReasoningStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for strings that are not one of the four level names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reasoning strength: {0}")]
pub struct UnknownStrength(pub String);

impl FromStr for ReasoningStrength {
    type Err = UnknownStrength;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(UnknownStrength(other.to_string())),
        }
    }
}

/// Classify a request body.
///
/// Precedence:
/// 1. a non-null `reasoning_effort` is taken verbatim (unknown values are `None`,
///    and `thinking` is not consulted)
/// 2. `thinking.type == "enabled"` with a numeric `budget_tokens` maps through
///    [`ReasoningStrength::from_budget`]
/// 3. anything else is `None`
pub fn classify(request: &Value) -> ReasoningStrength {
    match request.get("reasoning_effort") {
        Some(Value::Null) | None => {}
        Some(effort) => {
            return effort
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
        }
    }

    let Some(thinking) = request.get("thinking").and_then(Value::as_object) else {
        return ReasoningStrength::None;
    };

    if thinking.get("type").and_then(Value::as_str) != Some("enabled") {
        return ReasoningStrength::None;
    }

    thinking
        .get("budget_tokens")
        .and_then(Value::as_f64)
        .map(ReasoningStrength::from_budget)
        .unwrap_or_default()
}
