use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::responses::is_blank;
use crate::spec::field::FieldSpec;
use crate::spec::form::FormSpec;
use crate::spec::logic::Operator;

/// Authoring-time verdict for one field's conditional logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct RuleValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl RuleValidation {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Checks a field's rule against the fields it may reference.
///
/// Every problem is reported, so an author can fix them all in one pass.
pub fn validate_visibility_rule(field: &FieldSpec, all_fields: &[FieldSpec]) -> RuleValidation {
    let rule = &field.conditional_logic;
    if !rule.enabled {
        return RuleValidation::from_errors(Vec::new());
    }

    let mut errors = Vec::new();
    if rule.conditions.is_empty() {
        errors.push("At least one condition is required when conditional logic is enabled".into());
    }

    for (index, condition) in rule.conditions.iter().enumerate() {
        let number = index + 1;

        if condition.operator == Operator::Unknown {
            errors.push(format!("Condition {}: Unsupported operator", number));
        }

        if is_blank(&condition.comparison_value) {
            errors.push(format!("Condition {}: Value is required", number));
        }

        if condition.trigger_field_id.is_empty() {
            errors.push(format!("Condition {}: Field is required", number));
            continue;
        }

        match all_fields
            .iter()
            .find(|candidate| candidate.id == condition.trigger_field_id)
        {
            None => errors.push(format!(
                "Condition {}: Referenced field does not exist",
                number
            )),
            Some(trigger) if trigger.order >= field.order => errors.push(format!(
                "Condition {}: Referenced field must come before this field",
                number
            )),
            Some(trigger) if !trigger.kind.can_trigger() => errors.push(format!(
                "Condition {}: Referenced field cannot be used as a condition source",
                number
            )),
            Some(_) => {}
        }
    }

    RuleValidation::from_errors(errors)
}

/// Fields an author may pick as the trigger of `field`'s conditions.
pub fn trigger_candidates<'a>(
    field: &FieldSpec,
    all_fields: &'a [FieldSpec],
) -> Vec<&'a FieldSpec> {
    let mut candidates: Vec<&FieldSpec> = all_fields
        .iter()
        .filter(|candidate| candidate.order < field.order && candidate.kind.can_trigger())
        .collect();
    candidates.sort_by_key(|candidate| candidate.order);
    candidates
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub message: String,
}

/// Result of checking a whole form before it is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct FormCheck {
    pub valid: bool,
    #[serde(default)]
    pub issues: Vec<FormIssue>,
}

pub fn validate_form(spec: &FormSpec) -> FormCheck {
    let mut issues = Vec::new();

    if spec.title.trim().is_empty() {
        issues.push(FormIssue {
            field_id: None,
            message: "Form title is required".into(),
        });
    }

    let mut seen_ids = BTreeSet::new();
    let mut seen_orders = BTreeSet::new();
    for field in &spec.fields {
        let field_issue = |message: String| FormIssue {
            field_id: Some(field.id.clone()),
            message,
        };

        if field.id.is_empty() {
            issues.push(field_issue("Field id is required".into()));
        } else if !seen_ids.insert(field.id.as_str()) {
            issues.push(field_issue(format!("Field '{}' appears more than once", field.id)));
        }
        if !seen_orders.insert(field.order) {
            issues.push(field_issue(format!(
                "Order {} is used by more than one field",
                field.order
            )));
        }
        if field.label.trim().is_empty() {
            issues.push(field_issue("Label is required".into()));
        }
        if field.kind.has_options() && field.options.is_empty() {
            issues.push(field_issue(format!(
                "{} fields need at least one option",
                field.kind.display_name()
            )));
        }

        let rule = validate_visibility_rule(field, &spec.fields);
        issues.extend(rule.errors.into_iter().map(field_issue));
    }

    FormCheck {
        valid: issues.is_empty(),
        issues,
    }
}
