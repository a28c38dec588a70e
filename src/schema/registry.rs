//! Ordered step definitions and schema lookup

use super::rules::{CrossFieldRule, FieldRule, Format, StepSchema, ValidationMode};
use super::ValidationResult;
use crate::error::ConfigurationError;
use crate::state::{FormDraft, StepData, StepKey};

const GENDERS: &[&str] = &["male", "female", "other"];
const MARITAL_STATUSES: &[&str] = &["single", "married", "divorced", "widowed"];

/// One entry of the ordered step list
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub key: StepKey,
    pub label: &'static str,
    pub schema: StepSchema,
}

impl StepDefinition {
    pub fn new(key: StepKey, label: &'static str, schema: StepSchema) -> Self {
        Self { key, label, schema }
    }
}

/// Immutable, ordered set of step definitions
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    definitions: Vec<StepDefinition>,
}

impl SchemaRegistry {
    pub fn new(definitions: Vec<StepDefinition>) -> Result<Self, ConfigurationError> {
        if definitions.is_empty() {
            return Err(ConfigurationError::NoSteps);
        }
        for (i, def) in definitions.iter().enumerate() {
            if definitions[..i].iter().any(|d| d.key == def.key) {
                return Err(ConfigurationError::DuplicateStep(def.key));
            }
        }
        Ok(Self { definitions })
    }

    /// The five-step consular registration form
    pub fn consular_registration() -> Result<Self, ConfigurationError> {
        let definitions = vec![
            StepDefinition::new(
                StepKey::BasicInfo,
                "Basic information",
                StepSchema::new()
                    .field("last_name", vec![FieldRule::Required, FieldRule::MaxLength(80)])
                    .field("first_name", vec![FieldRule::Required, FieldRule::MaxLength(80)])
                    .field(
                        "birth_date",
                        vec![FieldRule::Required, FieldRule::Format(Format::Date)],
                    )
                    .field("birth_place", vec![FieldRule::Required, FieldRule::MaxLength(120)])
                    .field("nationality", vec![FieldRule::Required, FieldRule::MaxLength(60)])
                    .field("gender", vec![FieldRule::OneOf(GENDERS)]),
            ),
            StepDefinition::new(
                StepKey::Contact,
                "Contact details",
                StepSchema::new()
                    .field(
                        "email",
                        vec![FieldRule::Required, FieldRule::Format(Format::Email)],
                    )
                    .field(
                        "phone",
                        vec![FieldRule::Required, FieldRule::Format(Format::Phone)],
                    )
                    .field("address", vec![FieldRule::Required, FieldRule::MinLength(5)])
                    .field("city", vec![FieldRule::Required])
                    .field("postal_code", vec![FieldRule::Format(Format::PostalCode)])
                    .field("country", vec![FieldRule::Required]),
            ),
            StepDefinition::new(
                StepKey::Family,
                "Family situation",
                StepSchema::new()
                    .field(
                        "marital_status",
                        vec![FieldRule::Required, FieldRule::OneOf(MARITAL_STATUSES)],
                    )
                    .field("spouse_name", vec![FieldRule::MaxLength(120)])
                    .field("father_name", vec![FieldRule::Required, FieldRule::MaxLength(120)])
                    .field("mother_name", vec![FieldRule::Required, FieldRule::MaxLength(120)])
                    .field(
                        "children_count",
                        vec![FieldRule::Format(Format::Digits), FieldRule::MaxLength(2)],
                    )
                    .cross(CrossFieldRule::RequiredWhen {
                        field: "spouse_name",
                        when: "marital_status",
                        equals: "married",
                    }),
            ),
            StepDefinition::new(
                StepKey::Professional,
                "Professional situation",
                StepSchema::new()
                    .field("occupation", vec![FieldRule::Required, FieldRule::MaxLength(120)])
                    .field("employer", vec![FieldRule::MaxLength(120)])
                    .field("work_start_date", vec![FieldRule::Format(Format::Date)])
                    .field("work_end_date", vec![FieldRule::Format(Format::Date)])
                    .cross(CrossFieldRule::DateAfter {
                        earlier: "work_start_date",
                        later: "work_end_date",
                    }),
            ),
            StepDefinition::new(
                StepKey::Documents,
                "Identity documents",
                StepSchema::new()
                    .field(
                        "passport_number",
                        vec![FieldRule::Required, FieldRule::Format(Format::PassportNumber)],
                    )
                    .field(
                        "passport_issue_date",
                        vec![FieldRule::Required, FieldRule::Format(Format::Date)],
                    )
                    .field(
                        "passport_expiry_date",
                        vec![FieldRule::Required, FieldRule::Format(Format::Date)],
                    )
                    .field("issuing_authority", vec![FieldRule::Required])
                    .field("national_id_number", vec![FieldRule::Format(Format::Digits)])
                    .cross(CrossFieldRule::DateAfter {
                        earlier: "passport_issue_date",
                        later: "passport_expiry_date",
                    }),
            ),
        ];

        Self::new(definitions)
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    pub fn step_keys(&self) -> Vec<StepKey> {
        self.definitions.iter().map(|d| d.key).collect()
    }

    pub fn contains(&self, key: StepKey) -> bool {
        self.position(key).is_some()
    }

    pub fn position(&self, key: StepKey) -> Option<usize> {
        self.definitions.iter().position(|d| d.key == key)
    }

    pub fn definition(&self, key: StepKey) -> Result<&StepDefinition, ConfigurationError> {
        self.definitions
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| ConfigurationError::UnknownStep(key.to_string()))
    }

    /// Validate one step's data. Pure: no state is kept between calls.
    pub fn validate(
        &self,
        key: StepKey,
        data: &StepData,
        mode: ValidationMode,
    ) -> Result<ValidationResult, ConfigurationError> {
        let definition = self.definition(key)?;
        if data.key() != key {
            return Err(ConfigurationError::StepMismatch {
                expected: key,
                found: data.key(),
            });
        }
        definition.schema.check(data.fields(), mode)
    }

    /// Validate the draft's slice for `key`; a missing slice validates as empty
    pub fn validate_draft(
        &self,
        key: StepKey,
        draft: &FormDraft,
        mode: ValidationMode,
    ) -> Result<ValidationResult, ConfigurationError> {
        match draft.get(key) {
            Some(data) => self.validate(key, data, mode),
            None => self.validate(key, &StepData::empty(key), mode),
        }
    }
}
