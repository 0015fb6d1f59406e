use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Respondent values keyed by field id.
pub type ResponseMap = Map<String, Value>;

/// True when a value counts as "no answer yet".
///
/// `0` is an answer; `false`, `null`, `""` and `[]` are not.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Number(_) | Value::Object(_) => false,
    }
}

/// Reads a response set from a JSON value, treating anything but an object as empty.
pub fn from_value(value: &Value) -> ResponseMap {
    value.as_object().cloned().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Outcome of checking a submitted response set against a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub missing_required: Vec<String>,
    #[serde(default)]
    pub hidden_fields: Vec<String>,
    #[serde(default)]
    pub unknown_fields: Vec<String>,
}

impl ValidationResult {
    pub fn problem_count(&self) -> usize {
        self.errors.len()
            + self.missing_required.len()
            + self.hidden_fields.len()
            + self.unknown_fields.len()
    }
}
