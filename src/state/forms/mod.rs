//! Form domain layer
//!
//! Typed registration sections, name-based field access, and the draft
//! that collects them while the applicant moves through the steps.

mod field;
mod form_state;

pub use field::{display_value, FieldEdit, FieldSpec};
pub use form_state::{
    BasicInfo, ContactInfo, DocumentsInfo, FamilyInfo, FormDraft, ProfessionalInfo, StepData,
    StepFields, StepKey,
};
