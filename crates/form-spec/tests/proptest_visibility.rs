//! Property tests for visibility evaluation.

use form_spec::{
    Condition, FieldSpec, FieldType, Operator, ResponseMap, ShowWhen, VisibilityRule,
    evaluate_condition, get_visible_fields, is_field_visible, resolve_visibility,
};
use proptest::prelude::*;
use serde_json::Value;

fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        any::<f64>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(|v| serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..3)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn operator_strategy() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Equals),
        Just(Operator::NotEquals),
        Just(Operator::Contains),
        Just(Operator::NotContains),
        Just(Operator::Unknown),
    ]
}

fn condition_strategy() -> impl Strategy<Value = Condition> {
    ("f[0-4]", operator_strategy(), json_value_strategy(2))
        .prop_map(|(id, operator, value)| Condition::new(id, operator, value))
}

fn responses_strategy() -> impl Strategy<Value = ResponseMap> {
    prop::collection::btree_map("f[0-4]", json_value_strategy(2), 0..5)
        .prop_map(|map| map.into_iter().collect())
}

fn fields_strategy() -> impl Strategy<Value = Vec<FieldSpec>> {
    prop::collection::vec(
        (
            -5i64..5,
            any::<bool>(),
            any::<bool>(),
            prop::collection::vec(condition_strategy(), 0..3),
        ),
        0..6,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (order, enabled, any_mode, conditions))| {
                FieldSpec::new(format!("f{}", index), FieldType::SingleLineText, "F", order)
                    .with_rule(VisibilityRule {
                        enabled,
                        show_when: if any_mode { ShowWhen::Any } else { ShowWhen::All },
                        conditions,
                    })
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn disabled_rules_are_always_visible(
        conditions in prop::collection::vec(condition_strategy(), 0..4),
        responses in responses_strategy(),
    ) {
        let rule = VisibilityRule {
            enabled: false,
            show_when: ShowWhen::All,
            conditions,
        };
        let field = FieldSpec::new("f9", FieldType::MultilineText, "F", 9).with_rule(rule);
        prop_assert!(is_field_visible(&field, &responses));
    }

    #[test]
    fn evaluation_never_panics(
        condition in condition_strategy(),
        trigger in prop::option::of(json_value_strategy(2)),
    ) {
        let _ = evaluate_condition(&condition, trigger.as_ref());
    }

    #[test]
    fn negated_operators_are_complements_for_present_values(
        comparison in json_value_strategy(1),
        trigger in json_value_strategy(1),
    ) {
        prop_assume!(!form_spec::is_blank(&trigger));
        let equals = Condition::new("f0", Operator::Equals, comparison.clone());
        let not_equals = Condition::new("f0", Operator::NotEquals, comparison.clone());
        prop_assert_ne!(
            evaluate_condition(&equals, Some(&trigger)),
            evaluate_condition(&not_equals, Some(&trigger))
        );
        let contains = Condition::new("f0", Operator::Contains, comparison.clone());
        let not_contains = Condition::new("f0", Operator::NotContains, comparison);
        prop_assert_ne!(
            evaluate_condition(&contains, Some(&trigger)),
            evaluate_condition(&not_contains, Some(&trigger))
        );
    }

    #[test]
    fn visible_fields_are_sorted_idempotent_and_filtered(
        fields in fields_strategy(),
        responses in responses_strategy(),
    ) {
        let first = get_visible_fields(&fields, &responses);
        let second = get_visible_fields(&fields, &responses);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.windows(2).all(|pair| pair[0].order <= pair[1].order));
        prop_assert!(first.iter().all(|field| is_field_visible(field, &responses)));
        let visibility = resolve_visibility(&fields, &responses);
        prop_assert!(first.iter().all(|field| visibility[&field.id]));
    }

    #[test]
    fn visible_fields_only_read_visible_triggers(
        fields in fields_strategy(),
        responses in responses_strategy(),
    ) {
        let visibility = resolve_visibility(&fields, &responses);
        let visible: ResponseMap = responses
            .iter()
            .filter(|(id, _)| visibility.get(*id).copied().unwrap_or(false))
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        let again = resolve_visibility(&fields, &visible);
        prop_assert_eq!(visibility, again);
    }
}
