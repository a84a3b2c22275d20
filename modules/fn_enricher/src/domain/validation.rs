use std::fmt;

use thiserror::Error;

use crate::contract::model::{NewUser, RawNameRecord};

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Name,
    Surname,
    Patronymic,
}

impl NameField {
    pub const fn as_str(self) -> &'static str {
        match self {
            NameField::Name => "name",
            NameField::Surname => "surname",
            NameField::Patronymic => "patronymic",
        }
    }
}

/// The first rule a field broke. Rules run in order: blank, length, format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Blank,
    Length,
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: NameField,
    pub violation: Violation,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.as_str();
        match self.violation {
            Violation::Blank => write!(f, "{field}: cannot be blank"),
            Violation::Length => write!(
                f,
                "{field}: the length must be between {MIN_NAME_LEN} and {MAX_NAME_LEN}"
            ),
            Violation::Format => write!(f, "{field}: must be in a valid format"),
        }
    }
}

/// All violations found in one record, ordered by field name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.message())]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Human readable message, also used as the metric label and as
    /// `errMessage` of the published rejection.
    pub fn message(&self) -> String {
        let joined = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        format!("{joined}.")
    }
}

/// A name that passed format validation. Only constructible via [`ValidatedName::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedName {
    name: String,
    surname: String,
    patronymic: String,
}

impl ValidatedName {
    pub fn parse(raw: &RawNameRecord) -> Result<Self, ValidationError> {
        let violations: Vec<FieldViolation> = [
            (NameField::Name, raw.name.as_str(), true),
            (NameField::Patronymic, raw.patronymic.as_str(), false),
            (NameField::Surname, raw.surname.as_str(), true),
        ]
        .into_iter()
        .filter_map(|(field, value, required)| {
            check_part(value, required).map(|violation| FieldViolation { field, violation })
        })
        .collect();

        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        Ok(Self {
            name: raw.name.clone(),
            surname: raw.surname.clone(),
            patronymic: raw.patronymic.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn patronymic(&self) -> &str {
        &self.patronymic
    }

    /// Combine with the resolved attributes into a record ready for storage.
    pub fn enrich(self, age: i32, gender: String, nationality: String) -> NewUser {
        NewUser {
            name: self.name,
            surname: self.surname,
            patronymic: self.patronymic,
            age,
            gender,
            nationality,
        }
    }
}

fn check_part(value: &str, required: bool) -> Option<Violation> {
    if value.is_empty() {
        // optional parts skip the remaining rules when empty
        return required.then_some(Violation::Blank);
    }
    let len = value.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        return Some(Violation::Length);
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(Violation::Format);
    }
    None
}
