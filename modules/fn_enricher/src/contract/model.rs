use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Unvalidated full-name payload as it arrives on the inbound topic.
/// Missing and `null` fields decode as empty strings and are caught by
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawNameRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub surname: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub patronymic: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload published to the rejection topic when validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRecord {
    #[serde(flatten)]
    pub record: RawNameRecord,
    #[serde(rename = "errMessage")]
    pub err_message: String,
}

impl RejectionRecord {
    pub fn new(record: RawNameRecord, err_message: impl Into<String>) -> Self {
        Self {
            record,
            err_message: err_message.into(),
        }
    }
}

/// Fully enriched user ready to be stored. Identity and timestamps are
/// assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub age: i32,
    pub gender: String,
    pub nationality: String,
}

/// Persisted user record. This is also the JSON shape kept in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    pub age: i32,
    pub gender: String,
    pub nationality: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update data for a user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Column a user listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Surname,
    Patronymic,
    Age,
    Gender,
    Nationality,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parse the public field name. Unknown names fall back to `Id`.
    pub fn parse(s: &str) -> Self {
        match s {
            "name" => Self::Name,
            "surname" => Self::Surname,
            "patronymic" => Self::Patronymic,
            "age" => Self::Age,
            "gender" => Self::Gender,
            "nationality" => Self::Nationality,
            "createdAt" => Self::CreatedAt,
            "updatedAt" => Self::UpdatedAt,
            _ => Self::Id,
        }
    }
}

pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// Listing parameters for stored users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    /// Substring matched against name, surname and patronymic.
    pub text: Option<String>,
    pub limit: u64,
    pub offset: u64,
    pub sort: SortField,
    pub descending: bool,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            text: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            sort: SortField::Id,
            descending: false,
        }
    }
}
