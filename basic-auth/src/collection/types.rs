//! Request and response types shared by every credential collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credentials::{Credentials, TokenError};
use crate::database::time::datetime_to_ms;

/// Input to `create`: the user key and an optional `username:password` token.
///
/// When `token` is absent or empty, random credentials are generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDetails {
    pub user: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl CredentialDetails {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: Some(token.into()),
        }
    }

    /// Details that ask the collection to generate credentials.
    pub fn generated(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: None,
        }
    }
}

/// A stored credential as handed to callers: the user key and its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user: String,
    pub token: String,
}

impl CredentialRecord {
    pub fn credentials(&self) -> Result<Credentials, TokenError> {
        Credentials::from_token(&self.token)
    }
}

/// Listing entry; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub user: String,
    pub username: String,
}

/// Optional bounds on the last-update time of listed credentials.
///
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn start_ms(&self) -> Option<i64> {
        self.start.map(datetime_to_ms)
    }

    pub fn end_ms(&self) -> Option<i64> {
        self.end.map(datetime_to_ms)
    }

    /// Whether an epoch-millisecond timestamp falls inside the range.
    pub fn contains_ms(&self, ms: i64) -> bool {
        self.start_ms().is_none_or(|start| ms >= start)
            && self.end_ms().is_none_or(|end| ms <= end)
    }
}
