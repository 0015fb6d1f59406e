use serde_json::{Map, Value, json};

use crate::spec::field::{FieldSpec, FieldType};
use crate::spec::form::FormSpec;
use crate::visibility::VisibilityMap;

/// JSON Schema describing the responses accepted for the visible fields.
pub fn generate(spec: &FormSpec, visibility: &VisibilityMap) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in spec.sorted_fields() {
        if !visibility.get(&field.id).copied().unwrap_or(true) {
            continue;
        }
        properties.insert(field.id.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(field.id.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": spec.title,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn field_schema(field: &FieldSpec) -> Value {
    let mut schema = match field.kind {
        FieldType::SingleLineText | FieldType::MultilineText => json!({ "type": "string" }),
        FieldType::SingleSelect => json!({ "type": "string", "enum": field.option_names() }),
        FieldType::MultipleSelect => json!({
            "type": "array",
            "items": { "type": "string", "enum": field.option_names() },
            "uniqueItems": true,
        }),
        FieldType::Attachment => json!({
            "type": "array",
            "items": { "type": "object" },
        }),
    };
    schema["title"] = Value::String(field.label.clone());
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::ResponseMap;
    use crate::spec::logic::{Condition, Operator, VisibilityRule};
    use crate::visibility::resolve_visibility;

    #[test]
    fn schema_only_lists_visible_fields() {
        let mut spec = FormSpec::new("jobs", "Application");
        spec.fields = vec![
            FieldSpec::new("fldRole", FieldType::SingleSelect, "Role", 0)
                .with_options(["Engineer", "Designer"])
                .required(),
            FieldSpec::new("fldRepo", FieldType::SingleLineText, "Repository", 1)
                .required()
                .with_rule(VisibilityRule::all(vec![Condition::new(
                    "fldRole",
                    Operator::Equals,
                    json!("Engineer"),
                )])),
        ];

        let visibility = resolve_visibility(&spec.fields, &ResponseMap::new());
        let schema = generate(&spec, &visibility);
        let props = schema["properties"].as_object().expect("properties");
        assert!(props.contains_key("fldRole"));
        assert!(!props.contains_key("fldRepo"));
        assert_eq!(schema["required"], json!(["fldRole"]));
        assert_eq!(props["fldRole"]["enum"], json!(["Engineer", "Designer"]));
    }
}
