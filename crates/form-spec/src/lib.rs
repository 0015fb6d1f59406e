#![allow(missing_docs)]

pub mod condition;
pub mod render;
pub mod responses;
pub mod responses_schema;
pub mod rules;
pub mod spec;
pub mod submission;
pub mod validate;
pub mod visibility;

pub use condition::evaluate_condition;
pub use render::{
    RenderField, RenderPayload, RenderProgress, RenderStatus, build_render_payload,
    render_json_ui, render_text,
};
pub use responses::{ResponseMap, ValidationError, ValidationResult, is_blank};
pub use responses_schema::generate as responses_schema;
pub use rules::{
    FormCheck, FormIssue, RuleValidation, trigger_candidates, validate_form,
    validate_visibility_rule,
};
pub use spec::{
    Condition, FieldOption, FieldSpec, FieldType, FormSettings, FormSpec, Operator, ShowWhen,
    SpecError, SubmissionPolicy, TableField, VisibilityRule,
};
pub use submission::{
    SubmissionEntry, SubmissionError, SubmissionRecord, build_record, filter_visible_responses,
    prepare_submission,
};
pub use validate::{validate_field_value, validate_submission};
pub use visibility::{VisibilityMap, get_visible_fields, is_field_visible, resolve_visibility};
