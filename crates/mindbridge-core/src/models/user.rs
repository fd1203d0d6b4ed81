use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Who a user is to the children they manage.
///
/// Serialized in title case (`"Parent"`) as the backend stores it, but parsed
/// case-insensitively so CLI input like `teacher` works too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Parent,
    Teacher,
    Psychologist,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Parent, Role::Teacher, Role::Psychologist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "Parent",
            Role::Teacher => "Teacher",
            Role::Psychologist => "Psychologist",
        }
    }

    /// Parents and teachers act as guardians of child records.
    pub fn is_guardian(&self) -> bool {
        matches!(self, Role::Parent | Role::Teacher)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The cached copy of the signed-in user, as returned by login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub mobile: String,
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
}

/// A bearer token plus the user it was issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub token_type: String,
    pub user: User,
    /// Absolute expiry computed from the login response's `expires_in`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<jiff::Timestamp>,
}

impl Credentials {
    /// Build credentials from a login response, anchoring `expires_in`
    /// (seconds) at `now`.
    pub fn issued(
        token: String,
        token_type: String,
        user: User,
        expires_in: Option<i64>,
        now: jiff::Timestamp,
    ) -> Self {
        let expires_at = expires_in
            .and_then(|secs| now.checked_add(jiff::SignedDuration::from_secs(secs)).ok());
        Self {
            token,
            token_type,
            user,
            expires_at,
        }
    }

    /// A token without a recorded expiry never expires client-side.
    pub fn is_expired(&self, now: jiff::Timestamp) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
}

/// Body of `POST /api/auth/signup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub role: Role,
    pub name: String,
    pub school: Option<String>,
    pub mobile: String,
    pub password: String,
    pub otp: String,
}
