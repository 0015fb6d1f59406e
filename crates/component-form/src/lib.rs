use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    FieldSpec, FormSpec, RenderPayload, ResponseMap, SubmissionError, SubmissionPolicy,
    build_render_payload, filter_visible_responses, get_visible_fields,
    prepare_submission as prepare_record, render_json_ui as form_render_json_ui,
    render_text as form_render_text, resolve_visibility,
    responses_schema as form_responses_schema, trigger_candidates as form_trigger_candidates,
    validate_form, validate_submission as form_validate_submission, validate_visibility_rule,
};

pub mod wasm;

const DEFAULT_SPEC: &str = include_str!("../../form-spec/tests/fixtures/event_signup.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse responses: {0}")]
    ResponsesParse(#[source] serde_json::Error),
    #[error("failed to parse field: {0}")]
    FieldParse(#[source] serde_json::Error),
    #[error("form '{0}' is not available")]
    FormUnavailable(String),
    #[error("field '{0}' is not part of the form")]
    FieldUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_spec_json: Option<String>,
    #[serde(default)]
    policy: Option<SubmissionPolicy>,
}

struct LoadedForm {
    spec: FormSpec,
    policy: SubmissionPolicy,
}

fn load_config(config_json: &str) -> Result<ComponentConfig, ComponentError> {
    if config_json.trim().is_empty() {
        Ok(ComponentConfig::default())
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)
    }
}

fn ensure_form(form_id: &str, config_json: &str) -> Result<LoadedForm, ComponentError> {
    let config = load_config(config_json)?;
    let spec_json = config.form_spec_json.as_deref().unwrap_or(DEFAULT_SPEC);
    let spec: FormSpec = serde_json::from_str(spec_json).map_err(ComponentError::ConfigParse)?;
    if spec.id != form_id {
        return Err(ComponentError::FormUnavailable(form_id.to_string()));
    }
    Ok(LoadedForm {
        spec,
        policy: config.policy.unwrap_or_default(),
    })
}

/// Lenient parse used while a respondent is typing; unreadable input means no answers yet.
fn parse_responses(responses_json: &str) -> ResponseMap {
    serde_json::from_str::<Value>(responses_json)
        .ok()
        .and_then(|value| value.as_object().cloned())
        .unwrap_or_default()
}

fn parse_responses_strict(responses_json: &str) -> Result<ResponseMap, ComponentError> {
    let value: Value =
        serde_json::from_str(responses_json).map_err(ComponentError::ResponsesParse)?;
    // Accept both a bare map and the `{ "responses": {...} }` request body.
    let value = match value.get("responses") {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => value,
    };
    Ok(form_spec::responses::from_value(&value))
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(form_id: &str, config_json: &str) -> String {
    respond(
        ensure_form(form_id, config_json)
            .and_then(|form| serde_json::to_value(form.spec).map_err(ComponentError::JsonEncode)),
    )
}

/// Ordered ids of the visible fields plus the full visibility map.
pub fn visible_fields(form_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(ensure_form(form_id, config_json).map(|form| {
        let responses = parse_responses(responses_json);
        let visible: Vec<&str> = get_visible_fields(&form.spec.fields, &responses)
            .into_iter()
            .map(|field| field.id.as_str())
            .collect();
        let visibility = resolve_visibility(&form.spec.fields, &responses);
        json!({
            "visible": visible,
            "visibility": visibility,
        })
    }))
}

pub fn check_form(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|form| {
        serde_json::to_value(validate_form(&form.spec)).map_err(ComponentError::JsonEncode)
    }))
}

/// Checks a field being edited against the saved form, replacing the saved copy.
pub fn check_field_rule(form_id: &str, config_json: &str, field_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|form| {
        let field: FieldSpec =
            serde_json::from_str(field_json).map_err(ComponentError::FieldParse)?;
        let mut fields = form.spec.fields;
        match fields.iter_mut().find(|existing| existing.id == field.id) {
            Some(existing) => *existing = field.clone(),
            None => fields.push(field.clone()),
        }
        serde_json::to_value(validate_visibility_rule(&field, &fields))
            .map_err(ComponentError::JsonEncode)
    }))
}

/// Fields that may drive the visibility of `field_id`.
pub fn trigger_candidates(form_id: &str, config_json: &str, field_id: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|form| {
        let field = form
            .spec
            .field(field_id)
            .ok_or_else(|| ComponentError::FieldUnavailable(field_id.to_string()))?;
        let candidates: Vec<Value> = form_trigger_candidates(field, &form.spec.fields)
            .into_iter()
            .map(|candidate| {
                json!({
                    "id": candidate.id,
                    "label": candidate.label,
                    "type": candidate.kind.as_str(),
                    "options": candidate.option_names(),
                })
            })
            .collect();
        Ok(Value::Array(candidates))
    }))
}

fn render_payload(
    form_id: &str,
    config_json: &str,
    responses_json: &str,
) -> Result<RenderPayload, ComponentError> {
    let form = ensure_form(form_id, config_json)?;
    let responses = parse_responses(responses_json);
    Ok(build_render_payload(&form.spec, &responses))
}

pub fn render_text(form_id: &str, config_json: &str, responses_json: &str) -> String {
    respond_string(
        render_payload(form_id, config_json, responses_json)
            .map(|payload| form_render_text(&payload)),
    )
}

pub fn render_json_ui(form_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(
        render_payload(form_id, config_json, responses_json)
            .map(|payload| form_render_json_ui(&payload)),
    )
}

/// Responses a renderer should send on submit.
pub fn filter_responses(form_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(ensure_form(form_id, config_json).map(|form| {
        let responses = parse_responses(responses_json);
        Value::Object(filter_visible_responses(&form.spec.fields, &responses))
    }))
}

pub fn responses_schema(form_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(ensure_form(form_id, config_json).map(|form| {
        let responses = parse_responses(responses_json);
        let visibility = resolve_visibility(&form.spec.fields, &responses);
        form_responses_schema(&form.spec, &visibility)
    }))
}

pub fn validate_submission(form_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|form| {
        let responses = parse_responses_strict(responses_json)?;
        let result = form_validate_submission(&form.spec, &responses, &form.policy);
        serde_json::to_value(result).map_err(ComponentError::JsonEncode)
    }))
}

/// Validates and maps a submission onto table columns.
///
/// Rejections are reported in-band as `{"status": "error", ...}` so a host
/// can forward the validation details to the respondent.
pub fn prepare_submission(form_id: &str, config_json: &str, responses_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|form| {
        let responses = parse_responses_strict(responses_json)?;
        match prepare_record(&form.spec, &responses, &form.policy) {
            Ok(record) => {
                debug!(form_id, columns = record.fields.len(), "submission accepted");
                Ok(json!({
                    "status": "accepted",
                    "fields": record.fields,
                    "entries": serde_json::to_value(&record.entries)
                        .map_err(ComponentError::JsonEncode)?,
                }))
            }
            Err(SubmissionError::Rejected(validation)) => Ok(json!({
                "status": "error",
                "validation": serde_json::to_value(&validation)
                    .map_err(ComponentError::JsonEncode)?,
            })),
            Err(err @ SubmissionError::FormInactive(_)) => Ok(json!({
                "status": "error",
                "error": err.to_string(),
            })),
        }
    }))
}

/// Responses map with one answer replaced, as produced by a change event.
pub fn with_response(responses_json: &str, field_id: &str, value_json: &str) -> String {
    let mut map: Map<String, Value> = parse_responses(responses_json);
    match serde_json::from_str::<Value>(value_json) {
        Ok(value) => {
            map.insert(field_id.to_string(), value);
            Value::Object(map).to_string()
        }
        Err(err) => json!({ "error": format!("failed to parse value: {}", err) }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: &str) -> Value {
        serde_json::from_str(payload).expect("valid json")
    }

    #[test]
    fn describe_returns_spec_json() {
        let spec = parse(&describe("event-signup", ""));
        assert_eq!(spec["id"], "event-signup");
        assert_eq!(spec["fields"].as_array().map(Vec::len), Some(6));
    }

    #[test]
    fn unknown_form_is_an_error() {
        let value = parse(&describe("other-form", ""));
        assert_eq!(value["error"], "form 'other-form' is not available");
    }

    #[test]
    fn visible_fields_follow_responses() {
        let value = parse(&visible_fields("event-signup", "", r#"{"fldAttend":"No"}"#));
        assert_eq!(value["visible"], json!(["fldAttend", "fldReason", "fldName", "fldPhoto"]));
        assert_eq!(value["visibility"]["fldDiet"], false);
    }

    #[test]
    fn unreadable_responses_hide_conditional_fields() {
        let value = parse(&visible_fields("event-signup", "", "not json"));
        assert_eq!(value["visible"], json!(["fldAttend", "fldName", "fldPhoto"]));
    }

    #[test]
    fn field_rule_check_uses_edited_copy() {
        let field = json!({
            "airtableFieldId": "fldAttend",
            "fieldType": "singleSelect",
            "label": "Will you attend?",
            "order": 0,
            "options": [{ "name": "Yes" }],
            "conditionalLogic": {
                "enabled": true,
                "showWhen": "any",
                "conditions": [{ "fieldId": "fldName", "condition": "equals", "value": "x" }]
            }
        });
        let value = parse(&check_field_rule("event-signup", "", &field.to_string()));
        assert_eq!(value["valid"], false);
        assert_eq!(
            value["errors"][0],
            "Condition 1: Referenced field must come before this field"
        );
    }

    #[test]
    fn candidates_exclude_later_and_attachment_fields() {
        let value = parse(&trigger_candidates("event-signup", "", "fldNotes"));
        let ids: Vec<_> = value
            .as_array()
            .expect("array")
            .iter()
            .map(|entry| entry["id"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["fldAttend", "fldDiet", "fldReason", "fldName"]);
    }

    #[test]
    fn prepare_reports_rejection_in_band() {
        let value = parse(&prepare_submission("event-signup", "", r#"{"responses":{}}"#));
        assert_eq!(value["status"], "error");
        assert_eq!(
            value["validation"]["missing_required"],
            json!(["fldAttend", "fldName"])
        );
    }

    #[test]
    fn prepare_accepts_request_body() {
        let body = json!({ "responses": { "fldAttend": "Yes", "fldName": "Ana" } });
        let value = parse(&prepare_submission("event-signup", "", &body.to_string()));
        assert_eq!(value["status"], "accepted");
        assert_eq!(value["fields"]["Full name"], "Ana");
    }

    #[test]
    fn policy_from_config_allows_hidden_values() {
        let config = json!({ "policy": { "reject_hidden_values": false } }).to_string();
        let body = json!({ "fldAttend": "Yes", "fldName": "Ana", "fldReason": "n/a" });
        let value = parse(&validate_submission("event-signup", &config, &body.to_string()));
        assert_eq!(value["valid"], true);
        assert_eq!(value["hidden_fields"], json!(["fldReason"]));
    }

    #[test]
    fn filtered_responses_pass_server_validation() {
        let raw = json!({
            "fldAttend": "No",
            "fldDiet": ["Vegan"],
            "fldReason": "busy",
            "fldName": "Ana",
            "fldNotes": "no nuts"
        });
        let filtered = parse(&filter_responses("event-signup", "", &raw.to_string()));
        assert!(filtered.get("fldNotes").is_none());
        let value = parse(&validate_submission("event-signup", "", &filtered.to_string()));
        assert_eq!(value["valid"], true);
        assert_eq!(value["hidden_fields"], json!([]));
    }

    #[test]
    fn with_response_replaces_one_answer() {
        let updated = parse(&with_response(r#"{"fldName":"A"}"#, "fldName", r#""Ana""#));
        assert_eq!(updated, json!({ "fldName": "Ana" }));
    }
}
