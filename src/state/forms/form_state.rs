//! Registration form sections and the in-progress draft

use super::field::FieldSpec;
use crate::error::ConfigurationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifies one section of the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKey {
    BasicInfo,
    Contact,
    Family,
    Professional,
    Documents,
}

impl StepKey {
    pub const ALL: [StepKey; 5] = [
        StepKey::BasicInfo,
        StepKey::Contact,
        StepKey::Family,
        StepKey::Professional,
        StepKey::Documents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicInfo => "basic_info",
            Self::Contact => "contact",
            Self::Family => "family",
            Self::Professional => "professional",
            Self::Documents => "documents",
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKey {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownStep(s.to_string()))
    }
}

/// Name-based access to the fields of one form section
pub trait StepFields {
    fn key(&self) -> StepKey;
    fn value(&self, name: &str) -> Option<&str>;
    fn value_mut(&mut self, name: &str) -> Option<&mut String>;

    fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigurationError> {
        let step = self.key();
        match self.value_mut(name) {
            Some(slot) => {
                *slot = value.to_string();
                Ok(())
            }
            None => Err(ConfigurationError::UnknownField {
                step,
                field: name.to_string(),
            }),
        }
    }
}

macro_rules! step_section {
    (
        $(#[$meta:meta])*
        $name:ident => $key:ident {
            $($field:ident: $label:literal, $hint:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(pub $field: String,)+
        }

        impl $name {
            pub const FIELDS: &'static [FieldSpec] = &[
                $(FieldSpec::new(stringify!($field), $label, $hint),)+
            ];
        }

        impl StepFields for $name {
            fn key(&self) -> StepKey {
                StepKey::$key
            }

            fn value(&self, name: &str) -> Option<&str> {
                match name {
                    $(stringify!($field) => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            fn value_mut(&mut self, name: &str) -> Option<&mut String> {
                match name {
                    $(stringify!($field) => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

step_section! {
    /// Civil identity of the applicant
    BasicInfo => BasicInfo {
        last_name: "Last name", "(required)";
        first_name: "First name(s)", "(required)";
        birth_date: "Date of birth", "YYYY-MM-DD";
        birth_place: "Place of birth", "(required)";
        nationality: "Nationality", "(required)";
        gender: "Gender", "male / female / other";
    }
}

step_section! {
    /// How the consulate can reach the applicant
    ContactInfo => Contact {
        email: "Email", "name@example.org";
        phone: "Phone", "+33 6 12 34 56 78";
        address: "Street address", "(required)";
        city: "City", "(required)";
        postal_code: "Postal code", "(optional)";
        country: "Country of residence", "(required)";
    }
}

step_section! {
    FamilyInfo => Family {
        marital_status: "Marital status", "single / married / divorced / widowed";
        spouse_name: "Spouse full name", "(required if married)";
        father_name: "Father's full name", "(required)";
        mother_name: "Mother's full name", "(required)";
        children_count: "Number of children", "0";
    }
}

step_section! {
    ProfessionalInfo => Professional {
        occupation: "Occupation", "(required)";
        employer: "Employer", "(optional)";
        work_start_date: "Employment start", "YYYY-MM-DD (optional)";
        work_end_date: "Employment end", "YYYY-MM-DD (optional)";
    }
}

step_section! {
    /// Identity documents held by the applicant
    DocumentsInfo => Documents {
        passport_number: "Passport number", "A1234567";
        passport_issue_date: "Passport issued on", "YYYY-MM-DD";
        passport_expiry_date: "Passport expires on", "YYYY-MM-DD";
        issuing_authority: "Issuing authority", "(required)";
        national_id_number: "National ID number", "(optional)";
    }
}

/// Field values for one step, tagged by the step they belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "fields", rename_all = "snake_case")]
pub enum StepData {
    BasicInfo(BasicInfo),
    Contact(ContactInfo),
    Family(FamilyInfo),
    Professional(ProfessionalInfo),
    Documents(DocumentsInfo),
}

impl StepData {
    /// Empty section for `key`
    pub fn empty(key: StepKey) -> Self {
        match key {
            StepKey::BasicInfo => StepData::BasicInfo(BasicInfo::default()),
            StepKey::Contact => StepData::Contact(ContactInfo::default()),
            StepKey::Family => StepData::Family(FamilyInfo::default()),
            StepKey::Professional => StepData::Professional(ProfessionalInfo::default()),
            StepKey::Documents => StepData::Documents(DocumentsInfo::default()),
        }
    }

    pub fn key(&self) -> StepKey {
        self.fields().key()
    }

    pub fn fields(&self) -> &dyn StepFields {
        match self {
            StepData::BasicInfo(f) => f,
            StepData::Contact(f) => f,
            StepData::Family(f) => f,
            StepData::Professional(f) => f,
            StepData::Documents(f) => f,
        }
    }

    pub fn fields_mut(&mut self) -> &mut dyn StepFields {
        match self {
            StepData::BasicInfo(f) => f,
            StepData::Contact(f) => f,
            StepData::Family(f) => f,
            StepData::Professional(f) => f,
            StepData::Documents(f) => f,
        }
    }

    /// Field descriptors for `key` without needing an instance
    pub fn field_specs_for(key: StepKey) -> &'static [FieldSpec] {
        match key {
            StepKey::BasicInfo => BasicInfo::FIELDS,
            StepKey::Contact => ContactInfo::FIELDS,
            StepKey::Family => FamilyInfo::FIELDS,
            StepKey::Professional => ProfessionalInfo::FIELDS,
            StepKey::Documents => DocumentsInfo::FIELDS,
        }
    }
}

/// In-progress form data, keyed by step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormDraft {
    steps: BTreeMap<StepKey, StepData>,
}

/// Sections are decoded one by one: a section under an unknown step name, or
/// one that no longer decodes, is dropped without losing the others.
impl<'de> Deserialize<'de> for FormDraft {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut steps = BTreeMap::new();
        for (name, section) in raw {
            let Ok(key) = name.parse::<StepKey>() else {
                tracing::warn!(step = %name, "Dropping stored section for unknown step");
                continue;
            };
            match serde_json::from_value::<StepData>(section) {
                Ok(data) => {
                    steps.insert(key, data);
                }
                Err(e) => {
                    tracing::warn!(step = %key, error = %e, "Dropping undecodable stored section")
                }
            }
        }
        Ok(Self { steps })
    }
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, key: StepKey) -> Option<&StepData> {
        self.steps.get(&key)
    }

    /// Section for `key`, created empty on first access
    fn section_mut(&mut self, key: StepKey) -> &mut StepData {
        self.steps.entry(key).or_insert_with(|| StepData::empty(key))
    }

    pub fn set_field(
        &mut self,
        key: StepKey,
        field: &str,
        value: &str,
    ) -> Result<(), ConfigurationError> {
        // Reject unknown fields before creating the section
        if !StepData::field_specs_for(key).iter().any(|f| f.name == field) {
            return Err(ConfigurationError::UnknownField {
                step: key,
                field: field.to_string(),
            });
        }
        self.section_mut(key).fields_mut().set(field, value)
    }

    pub fn value(&self, key: StepKey, field: &str) -> Option<&str> {
        self.steps.get(&key).and_then(|data| data.fields().value(field))
    }

    pub fn keys(&self) -> impl Iterator<Item = StepKey> + '_ {
        self.steps.keys().copied()
    }

    /// Drop sections not accepted by `keep`, and sections stored under the wrong key.
    /// Returns the keys that were dropped.
    pub fn retain_declared(&mut self, keep: impl Fn(StepKey) -> bool) -> Vec<StepKey> {
        let dropped: Vec<StepKey> = self
            .steps
            .iter()
            .filter(|(key, data)| !keep(**key) || data.key() != **key)
            .map(|(key, _)| *key)
            .collect();
        for key in &dropped {
            self.steps.remove(key);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod step_key {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_parse_known_keys() {
            for key in StepKey::ALL {
                assert_eq!(key.as_str().parse::<StepKey>().unwrap(), key);
            }
        }

        #[test]
        fn test_parse_unknown_key_is_configuration_error() {
            let err = "passport".parse::<StepKey>().unwrap_err();
            assert_eq!(err, ConfigurationError::UnknownStep("passport".to_string()));
        }

        #[test]
        fn test_serializes_snake_case() {
            let json = serde_json::to_string(&StepKey::BasicInfo).unwrap();
            assert_eq!(json, "\"basic_info\"");
        }
    }

    mod step_data {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_empty_has_matching_key() {
            for key in StepKey::ALL {
                assert_eq!(StepData::empty(key).key(), key);
            }
        }

        #[test]
        fn test_set_and_read_field_by_name() {
            let mut data = StepData::empty(StepKey::BasicInfo);
            data.fields_mut().set("last_name", "Doe").unwrap();
            assert_eq!(data.fields().value("last_name"), Some("Doe"));
            match data {
                StepData::BasicInfo(ref info) => assert_eq!(info.last_name, "Doe"),
                _ => panic!("expected basic info"),
            }
        }

        #[test]
        fn test_set_unknown_field_fails() {
            let mut data = StepData::empty(StepKey::Contact);
            let err = data.fields_mut().set("fax", "123").unwrap_err();
            assert_eq!(
                err,
                ConfigurationError::UnknownField {
                    step: StepKey::Contact,
                    field: "fax".to_string()
                }
            );
        }

        #[test]
        fn test_field_specs_match_instances() {
            for key in StepKey::ALL {
                let data = StepData::empty(key);
                assert_eq!(data.key(), key);
                for spec in StepData::field_specs_for(key) {
                    assert!(data.fields().value(spec.name).is_some(), "{}", spec.name);
                }
            }
        }

        #[test]
        fn test_missing_fields_deserialize_as_empty() {
            let json = r#"{"step":"contact","fields":{"email":"a@b.org"}}"#;
            let data: StepData = serde_json::from_str(json).unwrap();
            assert_eq!(data.fields().value("email"), Some("a@b.org"));
            assert_eq!(data.fields().value("phone"), Some(""));
        }
    }

    mod form_draft {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_new_is_empty() {
            assert!(FormDraft::new().is_empty());
        }

        #[test]
        fn test_set_field_creates_section() {
            let mut draft = FormDraft::new();
            draft
                .set_field(StepKey::BasicInfo, "last_name", "Doe")
                .unwrap();
            assert_eq!(draft.value(StepKey::BasicInfo, "last_name"), Some("Doe"));
            assert_eq!(draft.keys().collect::<Vec<_>>(), vec![StepKey::BasicInfo]);
        }

        #[test]
        fn test_set_unknown_field_does_not_create_section() {
            let mut draft = FormDraft::new();
            assert!(draft.set_field(StepKey::Documents, "visa", "x").is_err());
            assert!(draft.is_empty());
        }

        #[test]
        fn test_retain_declared_drops_undeclared_and_mismatched() {
            let mut draft = FormDraft::new();
            draft.set_field(StepKey::BasicInfo, "last_name", "Doe").unwrap();
            draft.set_field(StepKey::Documents, "passport_number", "X1").unwrap();
            draft
                .steps
                .insert(StepKey::Family, StepData::empty(StepKey::Contact));

            let dropped = draft.retain_declared(|key| key != StepKey::Documents);
            assert_eq!(dropped, vec![StepKey::Family, StepKey::Documents]);
            assert_eq!(draft.keys().collect::<Vec<_>>(), vec![StepKey::BasicInfo]);
        }

        #[test]
        fn test_unknown_stored_step_keeps_other_sections() {
            let json = r#"{
                "basic_info": {"step": "basic_info", "fields": {"last_name": "Doe"}},
                "visa": {"step": "visa", "fields": {"kind": "tourist"}},
                "contact": {"step": "contact", "fields": 42}
            }"#;
            let draft: FormDraft = serde_json::from_str(json).unwrap();
            assert_eq!(draft.keys().collect::<Vec<_>>(), vec![StepKey::BasicInfo]);
            assert_eq!(draft.value(StepKey::BasicInfo, "last_name"), Some("Doe"));
        }

        #[test]
        fn test_non_object_draft_is_an_error() {
            assert!(serde_json::from_str::<FormDraft>("[1, 2]").is_err());
        }

        #[test]
        fn test_json_shape_is_keyed_by_step() {
            let mut draft = FormDraft::new();
            draft.set_field(StepKey::Contact, "city", "Dakar").unwrap();
            let value = serde_json::to_value(&draft).unwrap();
            assert_eq!(value["contact"]["step"], "contact");
            assert_eq!(value["contact"]["fields"]["city"], "Dakar");
        }
    }
}
