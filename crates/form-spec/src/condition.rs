use serde_json::{Number, Value};

use crate::responses::is_blank;
use crate::spec::logic::{Condition, Operator};

/// Evaluates one condition against the trigger field's current value.
///
/// A missing or blank value never satisfies a condition, whatever the operator.
pub fn evaluate_condition(condition: &Condition, trigger_value: Option<&Value>) -> bool {
    let Some(value) = trigger_value.filter(|value| !is_blank(value)) else {
        return false;
    };

    match condition.operator {
        Operator::Equals => strict_equals(value, &condition.comparison_value),
        Operator::NotEquals => !strict_equals(value, &condition.comparison_value),
        Operator::Contains => contains_ignore_case(value, &condition.comparison_value),
        Operator::NotContains => !contains_ignore_case(value, &condition.comparison_value),
        Operator::Unknown => false,
    }
}

/// Type-sensitive equality: `"1"` never equals `1`, but `1` equals `1.0`.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| strict_equals(left, right))
        }
        _ => left == right,
    }
}

fn contains_ignore_case(haystack: &Value, needle: &Value) -> bool {
    stringify(haystack)
        .to_lowercase()
        .contains(&stringify(needle).to_lowercase())
}

/// Text form of a value, following how browsers coerce values to strings.
///
/// Arrays join their items with `,` and print `null` items as nothing, so
/// `["Red", "Blue"]` becomes `Red,Blue`.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number_text(number),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => stringify(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Integers print exactly. Floats use the shortest round-trip digits and
/// switch to `1e+21` / `1e-7` style exponents outside `[1e-6, 1e21)`.
fn number_text(number: &Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(uint) = number.as_u64() {
        return uint.to_string();
    }
    match number.as_f64() {
        Some(float) if float == 0.0 => "0".to_string(),
        Some(float) if float.abs() >= 1e21 || float.abs() < 1e-6 => {
            let text = format!("{:e}", float);
            match text.split_once('e') {
                Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                    format!("{}e+{}", mantissa, exponent)
                }
                _ => text,
            }
        }
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cond(operator: Operator, value: Value) -> Condition {
        Condition::new("fldTrigger", operator, value)
    }

    #[test]
    fn equals_matches_exact_value() {
        let condition = cond(Operator::Equals, json!("X"));
        assert!(evaluate_condition(&condition, Some(&json!("X"))));
        assert!(!evaluate_condition(&condition, Some(&json!("Y"))));
        assert!(!evaluate_condition(&condition, Some(&json!("x"))));
    }

    #[test]
    fn equals_is_type_sensitive() {
        assert!(!evaluate_condition(&cond(Operator::Equals, json!("1")), Some(&json!(1))));
        assert!(evaluate_condition(&cond(Operator::Equals, json!(1.0)), Some(&json!(1))));
        assert!(evaluate_condition(&cond(Operator::NotEquals, json!("1")), Some(&json!(1))));
    }

    #[test]
    fn zero_is_a_present_value() {
        assert!(evaluate_condition(&cond(Operator::Equals, json!(0)), Some(&json!(0))));
        assert!(evaluate_condition(&cond(Operator::Contains, json!("0")), Some(&json!(0))));
    }

    #[test]
    fn absent_values_never_match() {
        let operators = [
            Operator::Equals,
            Operator::NotEquals,
            Operator::Contains,
            Operator::NotContains,
            Operator::Unknown,
        ];
        for operator in operators {
            let condition = cond(operator, json!("anything"));
            assert!(!evaluate_condition(&condition, None));
            assert!(!evaluate_condition(&condition, Some(&json!(null))));
            assert!(!evaluate_condition(&condition, Some(&json!(""))));
            assert!(!evaluate_condition(&condition, Some(&json!([]))));
        }
    }

    #[test]
    fn contains_ignores_case() {
        let condition = cond(Operator::Contains, json!("air"));
        assert!(evaluate_condition(&condition, Some(&json!("Airtable"))));
        assert!(!evaluate_condition(&condition, Some(&json!("Notion"))));
        let negated = cond(Operator::NotContains, json!("AIR"));
        assert!(!evaluate_condition(&negated, Some(&json!("airtable"))));
        assert!(evaluate_condition(&negated, Some(&json!("Notion"))));
    }

    #[test]
    fn contains_searches_multi_select_values() {
        let condition = cond(Operator::Contains, json!("blue"));
        assert!(evaluate_condition(&condition, Some(&json!(["Red", "Blue"]))));
        assert!(!evaluate_condition(&condition, Some(&json!(["Red", "Green"]))));
    }

    #[test]
    fn array_equality_is_element_wise() {
        let condition = cond(Operator::Equals, json!(["Red", "Blue"]));
        assert!(evaluate_condition(&condition, Some(&json!(["Red", "Blue"]))));
        assert!(!evaluate_condition(&condition, Some(&json!(["Blue", "Red"]))));
        assert!(!evaluate_condition(&condition, Some(&json!("Red,Blue"))));
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let condition = cond(Operator::Unknown, json!("X"));
        assert!(!evaluate_condition(&condition, Some(&json!("X"))));
    }

    #[test]
    fn stringify_follows_browser_coercion() {
        assert_eq!(stringify(&json!(1.0)), "1");
        assert_eq!(stringify(&json!(2.5)), "2.5");
        assert_eq!(stringify(&json!(-0.0)), "0");
        assert_eq!(stringify(&json!(["a", null, 3])), "a,,3");
        assert_eq!(stringify(&json!({ "k": "v" })), "[object Object]");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(1e20)), "100000000000000000000");
        assert_eq!(stringify(&json!(1e21)), "1e+21");
        assert_eq!(stringify(&json!(-1.5e28)), "-1.5e+28");
        assert_eq!(stringify(&json!(0.000001)), "0.000001");
        assert_eq!(stringify(&json!(1e-7)), "1e-7");
        assert_eq!(stringify(&json!(2.5e-8)), "2.5e-8");
    }
}
