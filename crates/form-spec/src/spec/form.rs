use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::field::FieldSpec;

/// Upload ceiling applied to attachment values unless a policy overrides it.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Errors raised by edits to a form's field list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("field '{0}' already exists in the form")]
    DuplicateField(String),
    #[error("field '{0}' is not part of the form")]
    UnknownField(String),
    #[error("position {index} is out of range for {len} fields")]
    PositionOutOfRange { index: usize, len: usize },
    #[error("field type '{0}' is not supported")]
    UnsupportedFieldType(String),
}

/// Presentation and access settings stored with a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSettings {
    #[serde(default = "default_true")]
    pub allow_multiple_submissions: bool,
    #[serde(default)]
    pub require_login: bool,
    #[serde(default = "default_true")]
    pub show_progress_bar: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            allow_multiple_submissions: true,
            require_login: false,
            show_progress_bar: true,
        }
    }
}

/// How the submission endpoint treats a response set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionPolicy {
    /// Skip server-side visibility and treat every field as shown.
    #[serde(default)]
    pub trust_client: bool,
    /// Reject submissions that carry values for hidden fields instead of dropping them.
    #[serde(default = "default_true")]
    pub reject_hidden_values: bool,
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            trust_client: false,
            reject_hidden_values: true,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attachment_bytes() -> u64 {
    DEFAULT_MAX_ATTACHMENT_BYTES
}

/// Persisted form definition over one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSpec {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub airtable_base_id: String,
    #[serde(default)]
    pub airtable_base_name: String,
    #[serde(default)]
    pub airtable_table_id: String,
    #[serde(default)]
    pub airtable_table_name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub settings: FormSettings,
}

impl FormSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            airtable_base_id: String::new(),
            airtable_base_name: String::new(),
            airtable_table_id: String::new(),
            airtable_table_name: String::new(),
            fields: Vec::new(),
            is_active: true,
            settings: FormSettings::default(),
        }
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == field_id)
    }

    pub fn field_mut(&mut self, field_id: &str) -> Option<&mut FieldSpec> {
        self.fields.iter_mut().find(|field| field.id == field_id)
    }

    /// Fields in display order. Ties keep their list position.
    pub fn sorted_fields(&self) -> Vec<&FieldSpec> {
        let mut fields: Vec<&FieldSpec> = self.fields.iter().collect();
        fields.sort_by_key(|field| field.order);
        fields
    }

    /// Rewrites `order` as contiguous positions following the current display order.
    pub fn reindex(&mut self) {
        self.fields.sort_by_key(|field| field.order);
        for (position, field) in self.fields.iter_mut().enumerate() {
            field.order = position as i64;
        }
    }

    /// Appends a field after every existing one.
    pub fn add_field(&mut self, mut field: FieldSpec) -> Result<(), SpecError> {
        if self.field(&field.id).is_some() {
            return Err(SpecError::DuplicateField(field.id));
        }
        self.reindex();
        field.order = self.fields.len() as i64;
        self.fields.push(field);
        Ok(())
    }

    /// Removes a field and every condition that used it as a trigger.
    ///
    /// A rule left without conditions is switched off.
    pub fn remove_field(&mut self, field_id: &str) -> Result<FieldSpec, SpecError> {
        let position = self
            .fields
            .iter()
            .position(|field| field.id == field_id)
            .ok_or_else(|| SpecError::UnknownField(field_id.to_string()))?;
        let removed = self.fields.remove(position);
        for field in &mut self.fields {
            let rule = &mut field.conditional_logic;
            let before = rule.conditions.len();
            rule.conditions.retain(|condition| condition.trigger_field_id != field_id);
            if before > 0 && rule.conditions.is_empty() {
                rule.enabled = false;
            }
        }
        self.reindex();
        Ok(removed)
    }

    /// Moves a field to `index` in display order.
    ///
    /// Conditions that end up pointing forward are left in place; `validate_form`
    /// reports them so the author can fix the rule.
    pub fn move_field(&mut self, field_id: &str, index: usize) -> Result<(), SpecError> {
        self.reindex();
        let len = self.fields.len();
        let position = self
            .fields
            .iter()
            .position(|field| field.id == field_id)
            .ok_or_else(|| SpecError::UnknownField(field_id.to_string()))?;
        if index >= len {
            return Err(SpecError::PositionOutOfRange { index, len });
        }
        let field = self.fields.remove(position);
        self.fields.insert(index, field);
        for (position, field) in self.fields.iter_mut().enumerate() {
            field.order = position as i64;
        }
        Ok(())
    }
}
