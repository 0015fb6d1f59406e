use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::form::SpecError;
use crate::spec::logic::VisibilityRule;

/// Column types a form field can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    SingleLineText,
    MultilineText,
    SingleSelect,
    MultipleSelect,
    Attachment,
}

/// Input widget a renderer should use for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    TextArea,
    Select,
    Checkboxes,
    File,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::TextArea => "textarea",
            InputKind::Select => "select",
            InputKind::Checkboxes => "checkboxes",
            InputKind::File => "file",
        }
    }
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        FieldType::SingleLineText,
        FieldType::MultilineText,
        FieldType::SingleSelect,
        FieldType::MultipleSelect,
        FieldType::Attachment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::SingleLineText => "singleLineText",
            FieldType::MultilineText => "multilineText",
            FieldType::SingleSelect => "singleSelect",
            FieldType::MultipleSelect => "multipleSelect",
            FieldType::Attachment => "attachment",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FieldType::SingleLineText => "Short Text",
            FieldType::MultilineText => "Long Text",
            FieldType::SingleSelect => "Single Select",
            FieldType::MultipleSelect => "Multi Select",
            FieldType::Attachment => "File Upload",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FieldType::SingleLineText => "Single line of text input",
            FieldType::MultilineText => "Multi-line text area for longer responses",
            FieldType::SingleSelect => "Dropdown with predefined options (single choice)",
            FieldType::MultipleSelect => "Checkboxes with predefined options (multiple choices)",
            FieldType::Attachment => "File upload field for documents and images",
        }
    }

    /// Whether values of this type can drive another field's visibility.
    ///
    /// Attachments carry no comparable scalar value.
    pub fn can_trigger(&self) -> bool {
        !matches!(self, FieldType::Attachment)
    }

    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::SingleSelect | FieldType::MultipleSelect)
    }

    pub fn input_kind(&self) -> InputKind {
        match self {
            FieldType::SingleLineText => InputKind::Text,
            FieldType::MultilineText => InputKind::TextArea,
            FieldType::SingleSelect => InputKind::Select,
            FieldType::MultipleSelect => InputKind::Checkboxes,
            FieldType::Attachment => InputKind::File,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = SpecError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| SpecError::UnsupportedFieldType(raw.to_string()))
    }
}

/// A selectable choice of a select field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl FieldOption {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("sel{}", name),
            name,
            color: None,
        }
    }
}

/// One configurable question of a form, backed by a table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    #[serde(rename = "airtableFieldId")]
    pub id: String,
    #[serde(rename = "airtableFieldName", default)]
    pub name: String,
    #[serde(rename = "fieldType")]
    pub kind: FieldType,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(rename = "conditionalLogic", default)]
    pub conditional_logic: VisibilityRule,
}

impl FieldSpec {
    /// Builds an optional field whose column name matches its label.
    pub fn new(
        id: impl Into<String>,
        kind: FieldType,
        label: impl Into<String>,
        order: i64,
    ) -> Self {
        let label = label.into();
        Self {
            id: id.into(),
            name: label.clone(),
            kind,
            label,
            required: false,
            order,
            options: Vec::new(),
            conditional_logic: VisibilityRule::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = names.into_iter().map(FieldOption::named).collect();
        self
    }

    pub fn with_rule(mut self, rule: VisibilityRule) -> Self {
        self.conditional_logic = rule;
        self
    }

    /// Default configuration for a freshly selected table column.
    pub fn from_table_field(column: &TableField) -> Result<Self, SpecError> {
        let kind = column.kind.parse::<FieldType>()?;
        Ok(Self {
            id: column.id.clone(),
            name: column.name.clone(),
            kind,
            label: column.name.clone(),
            required: false,
            order: 0,
            options: column
                .options
                .as_ref()
                .map(|options| options.choices.clone())
                .unwrap_or_default(),
            conditional_logic: VisibilityRule::default(),
        })
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|option| option.name == name)
    }

    pub fn option_names(&self) -> Vec<String> {
        self.options.iter().map(|option| option.name.clone()).collect()
    }
}

/// Column metadata as reported by the table schema API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<TableFieldOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct TableFieldOptions {
    #[serde(default)]
    pub choices: Vec<FieldOption>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_type_names_round_trip_through_from_str() {
        for kind in FieldType::ALL {
            assert_eq!(kind.as_str().parse::<FieldType>(), Ok(kind));
        }
        assert_eq!(
            "formula".parse::<FieldType>(),
            Err(SpecError::UnsupportedFieldType("formula".into()))
        );
    }

    #[test]
    fn only_attachment_cannot_trigger() {
        let triggers: Vec<_> = FieldType::ALL
            .into_iter()
            .filter(FieldType::can_trigger)
            .collect();
        assert_eq!(triggers.len(), 4);
        assert!(!FieldType::Attachment.can_trigger());
    }

    #[test]
    fn table_column_becomes_default_field() {
        let column: TableField = serde_json::from_value(json!({
            "id": "fldColor",
            "name": "Favourite colour",
            "type": "singleSelect",
            "options": { "choices": [
                { "id": "selRed", "name": "Red", "color": "redLight2" },
                { "id": "selBlue", "name": "Blue" }
            ]}
        }))
        .expect("deserialize");

        let field = FieldSpec::from_table_field(&column).expect("supported");
        assert_eq!(field.id, "fldColor");
        assert_eq!(field.label, "Favourite colour");
        assert_eq!(field.kind, FieldType::SingleSelect);
        assert!(!field.required);
        assert!(!field.conditional_logic.enabled);
        assert_eq!(field.option_names(), vec!["Red", "Blue"]);
    }

    #[test]
    fn unsupported_column_is_rejected() {
        let column = TableField {
            id: "fldTotal".into(),
            name: "Total".into(),
            kind: "rollup".into(),
            options: None,
        };
        assert!(matches!(
            FieldSpec::from_table_field(&column),
            Err(SpecError::UnsupportedFieldType(kind)) if kind == "rollup"
        ));
    }

    #[test]
    fn document_uses_persisted_key_names() {
        let field = FieldSpec::new("fldName", FieldType::SingleLineText, "Name", 0).required();
        let value = serde_json::to_value(&field).expect("serialize");
        assert_eq!(value["airtableFieldId"], "fldName");
        assert_eq!(value["airtableFieldName"], "Name");
        assert_eq!(value["fieldType"], "singleLineText");
        assert_eq!(value["conditionalLogic"]["showWhen"], "all");
    }
}
