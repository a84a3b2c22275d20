use serde::Deserialize;

use super::LookupResponse;
use crate::domain::error::{Attribute, LookupError};

/// `{"count": int, "name": string, "age": int}`; `age` is null for unknown names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgeResponse {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub name: String,
    pub age: Option<i64>,
}

impl LookupResponse for AgeResponse {
    type Value = i32;
    const ATTRIBUTE: Attribute = Attribute::Age;

    fn into_value(self, name: &str) -> Result<i32, LookupError> {
        match self.age {
            Some(age) if age > 0 => i32::try_from(age).map_err(|_| {
                LookupError::decode(Self::ATTRIBUTE, format!("age out of range: {age}"))
            }),
            _ => Err(LookupError::empty(
                Self::ATTRIBUTE,
                name,
                "age is missing, negative or equal to zero",
            )),
        }
    }
}

/// `{"count": int, "name": string, "gender": string, "probability": float}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenderResponse {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub name: String,
    pub gender: Option<String>,
    #[serde(default)]
    pub probability: f64,
}

impl LookupResponse for GenderResponse {
    type Value = String;
    const ATTRIBUTE: Attribute = Attribute::Gender;

    fn into_value(self, name: &str) -> Result<String, LookupError> {
        self.gender
            .filter(|gender| !gender.is_empty())
            .ok_or_else(|| LookupError::empty(Self::ATTRIBUTE, name, "gender is empty"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryProbability {
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub probability: f64,
}

/// `{"count": int, "name": string, "country": [{"country_id": string, "probability": float}]}`
/// The first entry is the most probable country.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NationalityResponse {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: Vec<CountryProbability>,
}

impl LookupResponse for NationalityResponse {
    type Value = String;
    const ATTRIBUTE: Attribute = Attribute::Nationality;

    fn into_value(self, name: &str) -> Result<String, LookupError> {
        self.country
            .into_iter()
            .next()
            .map(|c| c.country_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LookupError::empty(Self::ATTRIBUTE, name, "country is empty"))
    }
}
