use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the results of a rule's conditions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShowWhen {
    /// Every condition must hold.
    #[default]
    All,
    /// At least one condition must hold.
    Any,
}

/// Comparison applied between a trigger field's value and the condition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    /// Any operator name this build does not recognise. Always evaluates to `false`.
    #[serde(other)]
    Unknown,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::Unknown => "unknown",
        }
    }
}

/// One comparison against an earlier field's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    #[serde(rename = "fieldId", default)]
    pub trigger_field_id: String,
    #[serde(rename = "condition", default)]
    pub operator: Operator,
    #[serde(rename = "value", default)]
    pub comparison_value: Value,
}

impl Condition {
    pub fn new(trigger_field_id: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            trigger_field_id: trigger_field_id.into(),
            operator,
            comparison_value: value,
        }
    }
}

/// Conditional logic attached to every field (`conditionalLogic` in documents).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRule {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub show_when: ShowWhen,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl VisibilityRule {
    /// Enabled rule that requires every condition.
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            enabled: true,
            show_when: ShowWhen::All,
            conditions,
        }
    }

    /// Enabled rule that requires any one condition.
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            enabled: true,
            show_when: ShowWhen::Any,
            conditions,
        }
    }

    /// Conditions that take part in evaluation; empty while the rule is disabled.
    pub fn active_conditions(&self) -> &[Condition] {
        if self.enabled { &self.conditions } else { &[] }
    }

    pub fn references(&self, field_id: &str) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.trigger_field_id == field_id)
    }
}
