use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::responses::{ResponseMap, ValidationResult, is_blank};
use crate::spec::field::{FieldSpec, FieldType};
use crate::spec::form::{FormSpec, SubmissionPolicy};
use crate::validate::{submission_visibility, validate_submission};
use crate::visibility::{VisibilityMap, resolve_visibility};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("form '{0}' is not accepting submissions")]
    FormInactive(String),
    #[error("submission rejected with {} problem(s)", .0.problem_count())]
    Rejected(ValidationResult),
}

/// One accepted value, as logged alongside the created record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEntry {
    pub field_id: String,
    pub field_name: String,
    pub field_type: FieldType,
    pub value: Value,
}

/// Values ready to be written to the table, keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SubmissionRecord {
    pub fields: Map<String, Value>,
    pub entries: Vec<SubmissionEntry>,
}

/// Keeps only answers for currently visible fields, dropping blank ones.
///
/// This is what a form renderer sends on submit.
pub fn filter_visible_responses(fields: &[FieldSpec], responses: &ResponseMap) -> ResponseMap {
    let visibility = resolve_visibility(fields, responses);
    fields
        .iter()
        .filter(|field| visibility.get(&field.id).copied().unwrap_or(false))
        .filter_map(|field| {
            responses
                .get(&field.id)
                .filter(|value| !is_blank(value))
                .map(|value| (field.id.clone(), value.clone()))
        })
        .collect()
}

/// Maps visible, non-blank responses onto table columns.
pub fn build_record(
    spec: &FormSpec,
    responses: &ResponseMap,
    visibility: &VisibilityMap,
) -> SubmissionRecord {
    let mut record = SubmissionRecord::default();
    for field in spec.sorted_fields() {
        if !visibility.get(&field.id).copied().unwrap_or(true) {
            continue;
        }
        let Some(value) = responses.get(&field.id).filter(|value| !is_blank(value)) else {
            continue;
        };
        let column = if field.name.is_empty() {
            field.label.clone()
        } else {
            field.name.clone()
        };
        record.fields.insert(column.clone(), value.clone());
        record.entries.push(SubmissionEntry {
            field_id: field.id.clone(),
            field_name: column,
            field_type: field.kind,
            value: value.clone(),
        });
    }
    record
}

/// Validates a submission and builds the record to write.
pub fn prepare_submission(
    spec: &FormSpec,
    responses: &ResponseMap,
    policy: &SubmissionPolicy,
) -> Result<SubmissionRecord, SubmissionError> {
    if !spec.is_active {
        return Err(SubmissionError::FormInactive(spec.id.clone()));
    }

    let validation = validate_submission(spec, responses, policy);
    if !validation.valid {
        return Err(SubmissionError::Rejected(validation));
    }

    let visibility = submission_visibility(spec, responses, policy);
    let record = build_record(spec, responses, &visibility);
    debug!(form_id = %spec.id, columns = record.fields.len(), "prepared submission record");
    Ok(record)
}
