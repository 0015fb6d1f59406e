use serde_json::Value;
use tracing::{debug, warn};

use crate::responses::{ResponseMap, ValidationError, ValidationResult, is_blank};
use crate::spec::field::{FieldSpec, FieldType};
use crate::spec::form::{FormSpec, SubmissionPolicy};
use crate::visibility::{VisibilityMap, resolve_visibility};

/// Visibility used when accepting a submission.
///
/// With `trust_client` every field counts as shown, which is how the legacy
/// endpoint behaved.
pub fn submission_visibility(
    spec: &FormSpec,
    responses: &ResponseMap,
    policy: &SubmissionPolicy,
) -> VisibilityMap {
    if policy.trust_client {
        spec.fields
            .iter()
            .map(|field| (field.id.clone(), true))
            .collect()
    } else {
        resolve_visibility(&spec.fields, responses)
    }
}

/// Server-side check of a submitted response set.
pub fn validate_submission(
    spec: &FormSpec,
    responses: &ResponseMap,
    policy: &SubmissionPolicy,
) -> ValidationResult {
    let visibility = submission_visibility(spec, responses, policy);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();
    let mut hidden_fields = Vec::new();

    for field in spec.sorted_fields() {
        let value = responses.get(&field.id).filter(|value| !is_blank(value));
        if !visibility.get(&field.id).copied().unwrap_or(true) {
            if value.is_some() {
                hidden_fields.push(field.id.clone());
            }
            continue;
        }

        match value {
            None if field.required => missing_required.push(field.id.clone()),
            None => {}
            Some(value) => errors.extend(validate_field_value(field, value, policy)),
        }
    }

    let unknown_fields: Vec<String> = responses
        .keys()
        .filter(|key| spec.field(key).is_none())
        .cloned()
        .collect();

    debug!(
        form_id = %spec.id,
        visible = visibility.values().filter(|visible| **visible).count(),
        hidden_values = hidden_fields.len(),
        "resolved submission visibility"
    );
    if policy.reject_hidden_values && !hidden_fields.is_empty() {
        warn!(
            form_id = %spec.id,
            fields = ?hidden_fields,
            "submission carries values for hidden fields"
        );
    }

    let hidden_ok = hidden_fields.is_empty() || !policy.reject_hidden_values;
    ValidationResult {
        valid: errors.is_empty()
            && missing_required.is_empty()
            && unknown_fields.is_empty()
            && hidden_ok,
        errors,
        missing_required,
        hidden_fields,
        unknown_fields,
    }
}

/// Type and option checks for one non-blank value.
pub fn validate_field_value(
    field: &FieldSpec,
    value: &Value,
    policy: &SubmissionPolicy,
) -> Vec<ValidationError> {
    match field.kind {
        FieldType::SingleLineText | FieldType::MultilineText => {
            if value.is_string() {
                Vec::new()
            } else {
                vec![type_mismatch(field)]
            }
        }
        FieldType::SingleSelect => match value.as_str() {
            Some(choice) if field.has_option(choice) => Vec::new(),
            Some(_) => vec![base_error(
                field,
                format!("Invalid option selected for {}", field.label),
                "invalid_option",
            )],
            None => vec![type_mismatch(field)],
        },
        FieldType::MultipleSelect => {
            let Some(items) = value.as_array() else {
                return vec![type_mismatch(field)];
            };
            let invalid: Vec<String> = items
                .iter()
                .filter(|item| !item.as_str().is_some_and(|choice| field.has_option(choice)))
                .map(crate::condition::stringify)
                .collect();
            if invalid.is_empty() {
                Vec::new()
            } else {
                vec![base_error(
                    field,
                    format!(
                        "Invalid options selected for {}: {}",
                        field.label,
                        invalid.join(", ")
                    ),
                    "invalid_option",
                )]
            }
        }
        FieldType::Attachment => validate_attachment(field, value, policy),
    }
}

fn validate_attachment(
    field: &FieldSpec,
    value: &Value,
    policy: &SubmissionPolicy,
) -> Vec<ValidationError> {
    let files: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => return vec![type_mismatch(field)],
    };

    if files.iter().any(|file| !file.is_object()) {
        return vec![type_mismatch(field)];
    }

    let oversized = files.iter().any(|file| {
        file.get("size")
            .and_then(Value::as_u64)
            .is_some_and(|size| size > policy.max_attachment_bytes)
    });
    if oversized {
        vec![base_error(
            field,
            format!(
                "File size for {} must be less than {}MB",
                field.label,
                policy.max_attachment_bytes / (1024 * 1024)
            ),
            "attachment_too_large",
        )]
    } else {
        Vec::new()
    }
}

fn type_mismatch(field: &FieldSpec) -> ValidationError {
    base_error(
        field,
        format!("{} expects a {} value", field.label, field.kind.display_name()),
        "type_mismatch",
    )
}

fn base_error(field: &FieldSpec, message: String, code: &str) -> ValidationError {
    ValidationError {
        field_id: Some(field.id.clone()),
        path: Some(format!("/{}", field.id)),
        message,
        code: Some(code.into()),
    }
}
