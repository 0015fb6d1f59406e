use crate::condition::evaluate_condition;
use crate::responses::ResponseMap;
use crate::spec::field::FieldSpec;
use crate::spec::logic::ShowWhen;

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Decides whether a field's own rule holds for the responses as given.
///
/// Answers are read as-is. Use [`resolve_visibility`] when an answer may sit
/// in a field that is itself hidden.
pub fn is_field_visible(field: &FieldSpec, responses: &ResponseMap) -> bool {
    let conditions = field.conditional_logic.active_conditions();
    if conditions.is_empty() {
        return true;
    }

    let mut results = conditions.iter().map(|condition| {
        evaluate_condition(condition, responses.get(&condition.trigger_field_id))
    });

    match field.conditional_logic.show_when {
        ShowWhen::All => results.all(|matched| matched),
        ShowWhen::Any => results.any(|matched| matched),
    }
}

/// Visible fields in display order. The input list is left untouched.
pub fn get_visible_fields<'a>(
    fields: &'a [FieldSpec],
    responses: &ResponseMap,
) -> Vec<&'a FieldSpec> {
    let visibility = resolve_visibility(fields, responses);
    let mut ordered: Vec<&FieldSpec> = fields.iter().collect();
    ordered.sort_by_key(|field| field.order);
    ordered.retain(|field| visibility.get(&field.id).copied().unwrap_or(false));
    ordered
}

/// Visibility of every field, resolved once in display order.
///
/// A hidden field's answer is treated as absent for every field after it, so
/// a stale answer left behind in a hidden field cannot keep another field
/// shown. Triggers placed later in the order are read as absent too.
pub fn resolve_visibility(fields: &[FieldSpec], responses: &ResponseMap) -> VisibilityMap {
    let mut ordered: Vec<&FieldSpec> = fields.iter().collect();
    ordered.sort_by_key(|field| field.order);

    let mut shown = ResponseMap::new();
    let mut visibility = VisibilityMap::new();
    for field in ordered {
        let visible = is_field_visible(field, &shown);
        if visible && let Some(value) = responses.get(&field.id) {
            shown.insert(field.id.clone(), value.clone());
        }
        visibility.insert(field.id.clone(), visible);
    }
    visibility
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::field::FieldType;
    use crate::spec::logic::{Condition, Operator, VisibilityRule};
    use serde_json::json;

    fn responses(value: serde_json::Value) -> ResponseMap {
        crate::responses::from_value(&value)
    }

    fn gated(rule: VisibilityRule) -> FieldSpec {
        FieldSpec::new("fldGated", FieldType::SingleLineText, "Gated", 5).with_rule(rule)
    }

    #[test]
    fn disabled_rule_is_always_visible() {
        let mut rule = VisibilityRule::all(vec![Condition::new(
            "fldA",
            Operator::Equals,
            json!("never"),
        )]);
        rule.enabled = false;
        let field = gated(rule);
        assert!(is_field_visible(&field, &ResponseMap::new()));
        assert!(is_field_visible(&field, &responses(json!({ "fldA": "other" }))));
    }

    #[test]
    fn enabled_rule_without_conditions_is_visible() {
        let field = gated(VisibilityRule::any(vec![]));
        assert!(is_field_visible(&field, &ResponseMap::new()));
    }

    #[test]
    fn all_versus_any() {
        let conditions = vec![
            Condition::new("fldA", Operator::Equals, json!("Yes")),
            Condition::new("fldB", Operator::Equals, json!("Yes")),
        ];
        let answers = responses(json!({ "fldA": "Yes", "fldB": "No" }));
        assert!(!is_field_visible(&gated(VisibilityRule::all(conditions.clone())), &answers));
        assert!(is_field_visible(&gated(VisibilityRule::any(conditions)), &answers));
    }

    #[test]
    fn visible_fields_are_sorted_and_filtered() {
        let fields = vec![
            FieldSpec::new("third", FieldType::SingleLineText, "Third", 3),
            FieldSpec::new("first", FieldType::SingleSelect, "First", 1)
                .with_options(["Yes", "No"]),
            FieldSpec::new("second", FieldType::MultilineText, "Second", 2).with_rule(
                VisibilityRule::all(vec![Condition::new("first", Operator::Equals, json!("Yes"))]),
            ),
        ];

        let hidden: Vec<_> = get_visible_fields(&fields, &ResponseMap::new())
            .into_iter()
            .map(|field| field.id.as_str())
            .collect();
        assert_eq!(hidden, vec!["first", "third"]);

        let answers = responses(json!({ "first": "Yes" }));
        let shown: Vec<_> = get_visible_fields(&fields, &answers)
            .into_iter()
            .map(|field| field.id.as_str())
            .collect();
        assert_eq!(shown, vec!["first", "second", "third"]);
        assert_eq!(fields[0].id, "third");
    }

    #[test]
    fn equal_orders_keep_list_position() {
        let fields = vec![
            FieldSpec::new("b", FieldType::SingleLineText, "B", 1),
            FieldSpec::new("a", FieldType::SingleLineText, "A", 1),
        ];
        let ids: Vec<_> = get_visible_fields(&fields, &ResponseMap::new())
            .into_iter()
            .map(|field| field.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn visibility_map_covers_every_field() {
        let fields = vec![
            FieldSpec::new("a", FieldType::SingleLineText, "A", 0),
            FieldSpec::new("b", FieldType::SingleLineText, "B", 1).with_rule(VisibilityRule::all(
                vec![Condition::new("a", Operator::Contains, json!("go"))],
            )),
        ];
        let map = resolve_visibility(&fields, &ResponseMap::new());
        assert_eq!(map.get("a"), Some(&true));
        assert_eq!(map.get("b"), Some(&false));
    }

    #[test]
    fn hidden_trigger_hides_its_dependents() {
        let fields = vec![
            FieldSpec::new("a", FieldType::SingleSelect, "A", 0).with_options(["Yes", "No"]),
            FieldSpec::new("b", FieldType::SingleLineText, "B", 1).with_rule(VisibilityRule::all(
                vec![Condition::new("a", Operator::Equals, json!("Yes"))],
            )),
            FieldSpec::new("c", FieldType::SingleLineText, "C", 2).with_rule(VisibilityRule::all(
                vec![Condition::new("b", Operator::Contains, json!("go"))],
            )),
        ];
        let answers = responses(json!({ "a": "No", "b": "go on", "c": "left over" }));

        assert!(is_field_visible(&fields[2], &answers));
        let map = resolve_visibility(&fields, &answers);
        assert_eq!(map.get("b"), Some(&false));
        assert_eq!(map.get("c"), Some(&false));
        let ids: Vec<_> = get_visible_fields(&fields, &answers)
            .into_iter()
            .map(|field| field.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn later_trigger_reads_as_absent() {
        let fields = vec![
            FieldSpec::new("early", FieldType::SingleLineText, "Early", 0).with_rule(
                VisibilityRule::all(vec![Condition::new("late", Operator::Equals, json!("x"))]),
            ),
            FieldSpec::new("late", FieldType::SingleLineText, "Late", 1),
        ];
        let map = resolve_visibility(&fields, &responses(json!({ "late": "x" })));
        assert_eq!(map.get("early"), Some(&false));
    }
}
