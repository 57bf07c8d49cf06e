use serde::{Deserialize, Serialize};

use crate::reasoning::ReasoningStrength;

/// Strength → backend model identifier, one entry per level.
///
/// Built once from config and never mutated; clone-free sharing happens
/// through the owning [`crate::hook::PreCallHook`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    #[serde(default = "default_none_model")]
    pub none: String,

    #[serde(default = "default_low_model")]
    pub low: String,

    #[serde(default = "default_medium_model")]
    pub medium: String,

    #[serde(default = "default_high_model")]
    pub high: String,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            none: default_none_model(),
            low: default_low_model(),
            medium: default_medium_model(),
            high: default_high_model(),
        }
    }
}

/// Result of picking a target model for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Rewrite the request's model to this identifier.
    Route(&'a str),
    /// The table points back at the model the request already names.
    /// Rewriting would dispatch the request to ourselves again.
    SelfRoute(&'a str),
}

impl RoutingTable {
    pub fn model_for(&self, strength: ReasoningStrength) -> &str {
        match strength {
            ReasoningStrength::None => &self.none,
            ReasoningStrength::Low => &self.low,
            ReasoningStrength::Medium => &self.medium,
            ReasoningStrength::High => &self.high,
        }
    }

    /// Pick the target for `strength`, refusing to route a request onto the
    /// identifier it already carries.
    pub fn select(&self, strength: ReasoningStrength, current_model: &str) -> Selection<'_> {
        let target = self.model_for(strength);
        if target == current_model {
            Selection::SelfRoute(target)
        } else {
            Selection::Route(target)
        }
    }

    /// Iterate `(strength, model)` pairs in ascending strength order.
    pub fn entries(&self) -> impl Iterator<Item = (ReasoningStrength, &str)> {
        ReasoningStrength::ALL
            .into_iter()
            .map(move |strength| (strength, self.model_for(strength)))
    }

    pub(crate) fn set(&mut self, strength: ReasoningStrength, model: String) {
        match strength {
            ReasoningStrength::None => self.none = model,
            ReasoningStrength::Low => self.low = model,
            ReasoningStrength::Medium => self.medium = model,
            ReasoningStrength::High => self.high = model,
        }
    }
}

fn default_none_model() -> String {
    "none-reasoning".to_string()
}

fn default_low_model() -> String {
    "low-reasoning".to_string()
}

fn default_medium_model() -> String {
    "medium-reasoning".to_string()
}

fn default_high_model() -> String {
    "high-reasoning".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_strength() {
        let table = RoutingTable::default();
        assert_eq!(table.model_for(ReasoningStrength::None), "none-reasoning");
        assert_eq!(table.model_for(ReasoningStrength::Low), "low-reasoning");
        assert_eq!(table.model_for(ReasoningStrength::Medium), "medium-reasoning");
        assert_eq!(table.model_for(ReasoningStrength::High), "high-reasoning");
    }

    #[test]
    fn partial_table_fills_defaults() {
        let table: RoutingTable = serde_json::from_str(r#"{"high": "opus-max"}"#).unwrap();
        assert_eq!(table.high, "opus-max");
        assert_eq!(table.none, "none-reasoning");
        assert_eq!(table.low, "low-reasoning");
    }

    #[test]
    fn select_routes_to_table_entry() {
        let table = RoutingTable::default();
        assert_eq!(
            table.select(ReasoningStrength::Medium, "claude-sonnet-4-20250514"),
            Selection::Route("medium-reasoning")
        );
    }

    #[test]
    fn select_guards_against_self_route() {
        let table = RoutingTable {
            low: "claude-sonnet-4-20250514".to_string(),
            ..RoutingTable::default()
        };
        assert_eq!(
            table.select(ReasoningStrength::Low, "claude-sonnet-4-20250514"),
            Selection::SelfRoute("claude-sonnet-4-20250514")
        );
        // Other strengths are unaffected.
        assert_eq!(
            table.select(ReasoningStrength::High, "claude-sonnet-4-20250514"),
            Selection::Route("high-reasoning")
        );
    }

    #[test]
    fn entries_in_strength_order() {
        let table = RoutingTable::default();
        let strengths: Vec<_> = table.entries().map(|(s, _)| s).collect();
        assert_eq!(strengths, ReasoningStrength::ALL.to_vec());
    }

    #[test]
    fn set_replaces_single_entry() {
        let mut table = RoutingTable::default();
        table.set(ReasoningStrength::Medium, "sonnet-thinking".to_string());
        assert_eq!(table.medium, "sonnet-thinking");
        assert_eq!(table.low, "low-reasoning");
    }
}
