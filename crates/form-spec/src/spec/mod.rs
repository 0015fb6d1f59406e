pub mod field;
pub mod form;
pub mod logic;

pub use field::{FieldOption, FieldSpec, FieldType, InputKind, TableField, TableFieldOptions};
pub use form::{
    DEFAULT_MAX_ATTACHMENT_BYTES, FormSettings, FormSpec, SpecError, SubmissionPolicy,
};
pub use logic::{Condition, Operator, ShowWhen, VisibilityRule};
