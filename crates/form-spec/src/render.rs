use serde_json::{Map, Value, json};

use crate::{
    condition::stringify,
    responses::{ResponseMap, is_blank},
    responses_schema,
    spec::{field::FieldType, form::FormSpec},
    visibility::resolve_visibility,
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// A visible required field is still blank.
    NeedInput,
    /// Every visible required field has a value.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// Describes a single field for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub id: String,
    pub label: String,
    pub kind: FieldType,
    pub order: i64,
    pub required: bool,
    pub visible: bool,
    pub current_value: Option<Value>,
    pub options: Vec<String>,
}

/// Collected payload shared by the text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_title: String,
    pub description: Option<String>,
    pub status: RenderStatus,
    pub next_field_id: Option<String>,
    pub show_progress: bool,
    pub progress: RenderProgress,
    pub fields: Vec<RenderField>,
    pub schema: Value,
}

impl RenderPayload {
    pub fn visible_fields(&self) -> impl Iterator<Item = &RenderField> {
        self.fields.iter().filter(|field| field.visible)
    }
}

/// Build the renderer payload for the current responses.
///
/// Fields come out in display order with their visibility resolved, so a
/// builder preview and a public form show the same thing.
pub fn build_render_payload(spec: &FormSpec, responses: &ResponseMap) -> RenderPayload {
    let visibility = resolve_visibility(&spec.fields, responses);

    let fields = spec
        .sorted_fields()
        .into_iter()
        .map(|field| RenderField {
            id: field.id.clone(),
            label: field.label.clone(),
            kind: field.kind,
            order: field.order,
            required: field.required,
            visible: visibility.get(&field.id).copied().unwrap_or(true),
            current_value: responses.get(&field.id).cloned(),
            options: field.option_names(),
        })
        .collect::<Vec<_>>();

    let answered = fields
        .iter()
        .filter(|field| field.visible)
        .filter(|field| field.current_value.as_ref().is_some_and(|value| !is_blank(value)))
        .count();
    let total = fields.iter().filter(|field| field.visible).count();

    let next_field_id = fields
        .iter()
        .find(|field| {
            field.visible
                && field.required
                && field.current_value.as_ref().is_none_or(is_blank)
        })
        .map(|field| field.id.clone());

    let status = if next_field_id.is_some() {
        RenderStatus::NeedInput
    } else {
        RenderStatus::Complete
    };

    RenderPayload {
        form_id: spec.id.clone(),
        form_title: spec.title.clone(),
        description: spec.description.clone(),
        status,
        next_field_id,
        show_progress: spec.settings.show_progress_bar,
        progress: RenderProgress { answered, total },
        fields,
        schema: responses_schema::generate(spec, &visibility),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.as_str().to_string()));
            map.insert(
                "input".into(),
                Value::String(field.kind.input_kind().as_str().to_string()),
            );
            map.insert("order".into(), Value::from(field.order));
            map.insert("required".into(), Value::Bool(field.required));
            map.insert("visible".into(), Value::Bool(field.visible));
            if let Some(current_value) = &field.current_value {
                map.insert("current_value".into(), current_value.clone());
            }
            if !field.options.is_empty() {
                map.insert(
                    "options".into(),
                    Value::Array(field.options.iter().cloned().map(Value::String).collect()),
                );
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    let mut ui = json!({
        "form_id": payload.form_id,
        "form_title": payload.form_title,
        "description": payload.description,
        "status": payload.status.as_str(),
        "next_field_id": payload.next_field_id,
        "fields": fields,
        "schema": payload.schema,
    });
    if payload.show_progress {
        ui["progress"] = json!({
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        });
    }
    ui
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {} ({})", payload.form_title, payload.form_id));
    if let Some(description) = &payload.description {
        lines.push(description.clone());
    }
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));

    match &payload.next_field_id {
        Some(next) => lines.push(format!("Next field: {}", next)),
        None => lines.push("All visible required fields are answered.".to_string()),
    }

    lines.push("Visible fields:".to_string());
    for field in payload.visible_fields() {
        let mut entry = format!(" - {} ({}, {})", field.id, field.label, field.kind.display_name());
        if field.required {
            entry.push_str(" [required]");
        }
        if let Some(value) = field.current_value.as_ref().filter(|value| !is_blank(value)) {
            entry.push_str(&format!(" = {}", stringify(value)));
        }
        lines.push(entry);
    }

    let hidden: Vec<&str> = payload
        .fields
        .iter()
        .filter(|field| !field.visible)
        .map(|field| field.id.as_str())
        .collect();
    if !hidden.is_empty() {
        lines.push(format!("Hidden fields: {}", hidden.join(", ")));
    }

    lines.join("\n")
}
