use std::fmt;

use thiserror::Error;

/// The enrichable attribute a lookup resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Age,
    Gender,
    Nationality,
}

impl Attribute {
    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::Age => "age",
            Attribute::Gender => "gender",
            Attribute::Nationality => "nationality",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single external lookup call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{attribute} lookup timed out")]
    Timeout { attribute: Attribute },

    #[error("{attribute} lookup transport error: {message}")]
    Transport { attribute: Attribute, message: String },

    #[error("{attribute} lookup: response status code: {status}")]
    Status { attribute: Attribute, status: u16 },

    #[error("{attribute} lookup: malformed response: {message}")]
    Decode { attribute: Attribute, message: String },

    #[error("{attribute} lookup: {reason}, name: {name}")]
    Empty {
        attribute: Attribute,
        name: String,
        reason: &'static str,
    },

    #[error("{attribute} lookup: invalid endpoint: {message}")]
    InvalidUrl { attribute: Attribute, message: String },
}

impl LookupError {
    pub fn timeout(attribute: Attribute) -> Self {
        Self::Timeout { attribute }
    }

    pub fn transport(attribute: Attribute, message: impl Into<String>) -> Self {
        Self::Transport {
            attribute,
            message: message.into(),
        }
    }

    pub fn status(attribute: Attribute, status: u16) -> Self {
        Self::Status { attribute, status }
    }

    pub fn decode(attribute: Attribute, message: impl Into<String>) -> Self {
        Self::Decode {
            attribute,
            message: message.into(),
        }
    }

    pub fn empty(attribute: Attribute, name: impl Into<String>, reason: &'static str) -> Self {
        Self::Empty {
            attribute,
            name: name.into(),
            reason,
        }
    }

    pub fn invalid_url(attribute: Attribute, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            attribute,
            message: message.into(),
        }
    }

    pub fn attribute(&self) -> Attribute {
        match self {
            Self::Timeout { attribute }
            | Self::Transport { attribute, .. }
            | Self::Status { attribute, .. }
            | Self::Decode { attribute, .. }
            | Self::Empty { attribute, .. }
            | Self::InvalidUrl { attribute, .. } => *attribute,
        }
    }
}

/// Outcome of a failed message handling.
///
/// Validation failures are not represented here: they are resolved into a
/// published rejection and a successful return.
#[derive(Error, Debug)]
pub enum HandleError {
    #[error("decode message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("encode rejection: {0}")]
    EncodeRejection(#[source] serde_json::Error),

    #[error("publish rejection: {message}")]
    Publish { message: String },

    #[error("enrich: {0}")]
    Lookup(#[from] LookupError),

    #[error("db create user: {message}")]
    Storage { message: String },

    #[error("cache set: {message}")]
    Cache { message: String },

    #[error("handling cancelled")]
    Cancelled,
}

impl HandleError {
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }
}
