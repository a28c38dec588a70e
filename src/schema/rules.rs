//! Declarative validation rules

use super::ValidationResult;
use crate::error::ConfigurationError;
use crate::state::StepFields;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]{5,18}[0-9]$").unwrap());
static PASSPORT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{6,9}$").unwrap());
static POSTAL_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 -]{1,8}[A-Za-z0-9]$").unwrap());

/// ISO calendar date used by every date field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// How much of a step to check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Only fields that hold a value; requiredness is not checked
    Partial,
    /// Every rule, including required fields
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Phone,
    Date,
    PassportNumber,
    Digits,
    PostalCode,
}

impl Format {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Format::Email => EMAIL_PATTERN.is_match(value),
            Format::Phone => PHONE_PATTERN.is_match(value),
            Format::Date => parse_date(value).is_some(),
            Format::PassportNumber => PASSPORT_PATTERN.is_match(value),
            Format::Digits => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            Format::PostalCode => POSTAL_CODE_PATTERN.is_match(value),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Format::Email => "must be a valid email address",
            Format::Phone => "must be a valid phone number",
            Format::Date => "must be a date in YYYY-MM-DD format",
            Format::PassportNumber => "must be 6 to 9 uppercase letters or digits",
            Format::Digits => "must contain only digits",
            Format::PostalCode => "must be a valid postal code",
        }
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// A rule on a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Format(Format),
    OneOf(&'static [&'static str]),
}

impl FieldRule {
    /// Check a trimmed, non-empty value. `Required` is handled by the caller.
    fn check(&self, value: &str) -> Option<String> {
        match self {
            FieldRule::Required => None,
            FieldRule::MinLength(min) if value.chars().count() < *min => {
                Some(format!("must be at least {min} characters"))
            }
            FieldRule::MaxLength(max) if value.chars().count() > *max => {
                Some(format!("must be at most {max} characters"))
            }
            FieldRule::Format(format) if !format.matches(value) => {
                Some(format.message().to_string())
            }
            FieldRule::OneOf(options) if !options.iter().any(|o| o.eq_ignore_ascii_case(value)) => {
                Some(format!("must be one of: {}", options.join(", ")))
            }
            _ => None,
        }
    }
}

/// A rule relating two fields of the same step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossFieldRule {
    /// `later` must be a date strictly after `earlier`
    DateAfter {
        earlier: &'static str,
        later: &'static str,
    },
    /// `field` is required when `when` equals `equals` (case-insensitive)
    RequiredWhen {
        field: &'static str,
        when: &'static str,
        equals: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: &'static str,
    pub rules: Vec<FieldRule>,
}

impl FieldSchema {
    pub fn is_required(&self) -> bool {
        self.rules.contains(&FieldRule::Required)
    }
}

/// Rules for one step
#[derive(Debug, Clone, Default)]
pub struct StepSchema {
    pub fields: Vec<FieldSchema>,
    pub cross_field: Vec<CrossFieldRule>,
}

impl StepSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rules: Vec<FieldRule>) -> Self {
        self.fields.push(FieldSchema { name, rules });
        self
    }

    pub fn cross(mut self, rule: CrossFieldRule) -> Self {
        self.cross_field.push(rule);
        self
    }

    /// Validate `data` against this schema
    pub fn check(
        &self,
        data: &dyn StepFields,
        mode: ValidationMode,
    ) -> Result<ValidationResult, ConfigurationError> {
        let mut result = ValidationResult::default();

        for field in &self.fields {
            let value = lookup(data, field.name)?.trim();
            if value.is_empty() {
                if mode == ValidationMode::Full && field.is_required() {
                    result.add(field.name, "is required");
                }
                continue;
            }
            for rule in &field.rules {
                if let Some(message) = rule.check(value) {
                    result.add(field.name, message);
                }
            }
        }

        for rule in &self.cross_field {
            match rule {
                CrossFieldRule::DateAfter { earlier, later } => {
                    let start = parse_date(lookup(data, earlier)?.trim());
                    let end = parse_date(lookup(data, later)?.trim());
                    // Unparseable operands are already reported by their format rule
                    if let (Some(start), Some(end)) = (start, end) {
                        if end <= start {
                            result.add(later, format!("must be after {earlier}"));
                        }
                    }
                }
                CrossFieldRule::RequiredWhen {
                    field,
                    when,
                    equals,
                } => {
                    if mode == ValidationMode::Partial {
                        continue;
                    }
                    let trigger = lookup(data, when)?.trim();
                    if trigger.eq_ignore_ascii_case(equals) && lookup(data, field)?.trim().is_empty()
                    {
                        result.add(field, format!("is required when {when} is {equals}"));
                    }
                }
            }
        }

        Ok(result)
    }
}

fn lookup<'a>(data: &'a dyn StepFields, name: &str) -> Result<&'a str, ConfigurationError> {
    data.value(name)
        .ok_or_else(|| ConfigurationError::UnknownField {
            step: data.key(),
            field: name.to_string(),
        })
}
